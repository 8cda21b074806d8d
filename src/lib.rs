//! # xenovate
//!
//! 代码分析网关：把用户提交的源代码交给 Gemini，并将模型的自由文本回复整理为结构化 JSON。
//!
//! Code-analysis gateway that forwards submitted source code to a hosted
//! text-generation model and reshapes its free-text reply into structured
//! fields.
//!
//! ## Overview
//!
//! Four tasks are supported: analyze (time/space complexity plus an
//! explanation), optimize, convert to another language, and explain. Each
//! request goes through the same pipeline:
//!
//! ```text
//! GenerationRequest -> PromptBuilder -> ModelInvoker -> normalize -> StructuredResult
//! ```
//!
//! ## Core Guarantees
//!
//! - **Always structured**: every call returns a fully populated result, even
//!   when the model is unreachable or replies with unparseable text
//! - **Decided once**: whether the model is live is settled at start-up by a
//!   single probe and never re-checked
//! - **One call per request**: no retries, no caching
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use xenovate::{CodeAssistant, GenerationRequest, ModelInvoker, Task};
//! use xenovate::config::GatewayConfig;
//!
//! #[tokio::main]
//! async fn main() -> xenovate::Result<()> {
//!     let config = GatewayConfig::from_env()?;
//!     let invoker = ModelInvoker::connect(&config.model).await;
//!     let assistant = CodeAssistant::new(Arc::new(invoker));
//!
//!     let request = GenerationRequest::new(Task::Analyze, "def f(xs): return sorted(xs)", "python");
//!     let result = assistant.run(&request).await;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Tasks, requests and structured results |
//! | [`prompt`] | Per-task instruction templates |
//! | [`drivers`] | Gemini request/response wire format |
//! | [`transport`] | HTTP transport behind the [`transport::GenerationTransport`] seam |
//! | [`invoker`] | Model handle and availability decision |
//! | [`normalize`] | Fence stripping, JSON decode, rescue extraction, fallbacks |
//! | [`assistant`] | The composed pipeline |
//! | [`config`] | Environment / YAML / keyring configuration |
//! | [`persistence`] | Supabase store for algorithms and analyses |
//! | [`gateway`] | axum HTTP routes and the WebSocket channel |

pub mod assistant;
pub mod config;
pub mod drivers;
pub mod gateway;
pub mod invoker;
pub mod normalize;
pub mod persistence;
pub mod prompt;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use assistant::CodeAssistant;
pub use invoker::{ModelAvailability, ModelInvoker};
pub use normalize::normalize;
pub use prompt::PromptBuilder;
pub use types::{GenerationRequest, RawModelResponse, StructuredResult, Task};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext, GenerationFailure};
