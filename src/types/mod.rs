//! 类型系统模块：定义代码分析网关的核心数据类型。
//!
//! # Types Module
//!
//! Strongly-typed representations of what flows through the analysis
//! pipeline: the requested [`Task`], the per-call [`GenerationRequest`], the
//! raw model outcome and the task-specific [`StructuredResult`].
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Task`] | One of analyze / optimize / convert / explain |
//! | [`GenerationRequest`] | Submitted code plus languages and task |
//! | [`RawModelResponse`] | Model text or the reason there is none |
//! | [`StructuredResult`] | Normalized, always fully populated reply |
//!
//! ## Example
//!
//! ```rust
//! use xenovate::types::{GenerationRequest, Task};
//!
//! let request = GenerationRequest::new(Task::Convert, "print(1)", "python")
//!     .with_target_language("java");
//! assert_eq!(request.target_language(), "java");
//! ```

pub mod result;
pub mod task;

pub use result::{
    AlgorithmAnalysis, CodeConversion, CodeExplanation, OptimizationSuggestion, StructuredResult,
};
pub use task::{GenerationRequest, RawModelResponse, Task, DEFAULT_TARGET_LANGUAGE};
