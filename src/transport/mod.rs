//! Transport layer: one outbound generation call per invocation.
//!
//! [`GenerationTransport`] is the seam the invoker is built on. The production
//! implementation is [`HttpTransport`]; tests substitute their own.

pub mod http;

pub use http::HttpTransport;

use async_trait::async_trait;

/// Sends a prompt to the model and returns its raw text.
///
/// Implementations must be safe to call from many in-flight requests at once
/// and must not retry on their own.
#[async_trait]
pub trait GenerationTransport: Send + Sync + std::fmt::Debug {
    /// Model identifier this transport talks to.
    fn model(&self) -> &str;

    /// Non-blocking call.
    async fn generate(&self, prompt: &str) -> Result<String, TransportError>;

    /// Blocking call. Must not be used from inside an async runtime.
    fn generate_blocking(&self, prompt: &str) -> Result<String, TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{class}: HTTP {status}: {message}")]
    Status {
        status: u16,
        class: String,
        message: String,
    },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Model returned no text (finish reason: {0})")]
    EmptyReply(String),

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Build a status error from an unsuccessful HTTP reply.
    ///
    /// Gemini wraps failures as `{"error": {"message": ...}}`; other bodies
    /// are carried through truncated.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(|m| m.as_str())
                    .map(String::from)
            })
            .unwrap_or_else(|| truncate(body.trim(), 200));
        TransportError::Status {
            status,
            class: classify_status(status, body).to_string(),
            message,
        }
    }

    /// Error class for status failures, `None` otherwise.
    pub fn class(&self) -> Option<&str> {
        match self {
            TransportError::Status { class, .. } => Some(class),
            _ => None,
        }
    }
}

/// Map an HTTP status (and body hints) to a standard error class.
pub fn classify_status(status: u16, body: &str) -> &'static str {
    let lowered = body.to_ascii_lowercase();
    match status {
        429 if lowered.contains("quota") || lowered.contains("resource has been exhausted") => {
            "quota_exhausted"
        }
        429 => "rate_limited",
        401 | 403 => "authentication",
        400 if lowered.contains("api key") || lowered.contains("api_key_invalid") => {
            "authentication"
        }
        400 | 422 => "invalid_request",
        404 => "not_found",
        408 => "timeout",
        413 => "request_too_large",
        500..=599 => "server_error",
        _ => "http_error",
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
