//! Task selection and per-call request data.

use serde::{Deserialize, Serialize};

use crate::error::GenerationFailure;

/// Target language used for conversions when the caller names none.
pub const DEFAULT_TARGET_LANGUAGE: &str = "python";

/// The operation a caller asks the gateway to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Analyze,
    Optimize,
    Convert,
    Explain,
}

impl Task {
    pub const ALL: [Task; 4] = [Task::Analyze, Task::Optimize, Task::Convert, Task::Explain];

    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Analyze => "analyze",
            Task::Optimize => "optimize",
            Task::Convert => "convert",
            Task::Explain => "explain",
        }
    }

    /// JSON keys the prompt asks the model to produce. Empty for [`Task::Explain`],
    /// which requests plain prose.
    pub fn expected_fields(&self) -> &'static [&'static str] {
        match self {
            Task::Analyze => &["time_complexity", "space_complexity", "explanation"],
            Task::Optimize => &["optimized_code", "improvements"],
            Task::Convert => &["original_code", "target_language", "converted_code"],
            Task::Explain => &[],
        }
    }

    pub fn wants_json(&self) -> bool {
        !self.expected_fields().is_empty()
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Task {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "analyze" => Ok(Task::Analyze),
            "optimize" => Ok(Task::Optimize),
            "convert" => Ok(Task::Convert),
            "explain" => Ok(Task::Explain),
            other => Err(format!("Unknown task: {}", other)),
        }
    }
}

/// One incoming analysis call. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub task: Task,
    pub code: String,
    /// Source language of `code`.
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
}

impl GenerationRequest {
    pub fn new(task: Task, code: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            task,
            code: code.into(),
            language: language.into(),
            target_language: None,
        }
    }

    pub fn with_target_language(mut self, target: impl Into<String>) -> Self {
        self.target_language = Some(target.into());
        self
    }

    /// Requested conversion target, or [`DEFAULT_TARGET_LANGUAGE`].
    pub fn target_language(&self) -> &str {
        self.target_language
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TARGET_LANGUAGE)
    }
}

/// Outcome of a single invoker call, as seen by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawModelResponse {
    Text(String),
    Failure(GenerationFailure),
}

impl From<Result<String, GenerationFailure>> for RawModelResponse {
    fn from(outcome: Result<String, GenerationFailure>) -> Self {
        match outcome {
            Ok(text) => RawModelResponse::Text(text),
            Err(failure) => RawModelResponse::Failure(failure),
        }
    }
}

impl From<String> for RawModelResponse {
    fn from(text: String) -> Self {
        RawModelResponse::Text(text)
    }
}

impl From<&str> for RawModelResponse {
    fn from(text: &str) -> Self {
        RawModelResponse::Text(text.to_string())
    }
}

impl From<GenerationFailure> for RawModelResponse {
    fn from(failure: GenerationFailure) -> Self {
        RawModelResponse::Failure(failure)
    }
}
