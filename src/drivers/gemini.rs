//! Gemini Generate API 驱动：实现 Google Gemini 特有的请求/响应格式转换
//!
//! Google Gemini generateContent API driver. Key differences from chat-style APIs:
//! - Uses `contents` instead of `messages`, with `parts` instead of `content`.
//! - `generationConfig` wraps temperature, top-p/top-k and `maxOutputTokens`.
//! - Response: `candidates[0].content.parts[*].text`.
//! - API key is passed as `?key=` query parameter, not in headers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transport::TransportError;

/// Sampling parameters sent with every generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
        }
    }
}

/// Google Gemini generateContent API driver.
#[derive(Debug, Clone)]
pub struct GeminiDriver {
    model: String,
    generation: GenerationConfig,
}

impl GeminiDriver {
    pub fn new(model: impl Into<String>, generation: GenerationConfig) -> Self {
        Self {
            model: model.into(),
            generation,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Path of the non-streaming endpoint, relative to the API base URL.
    pub fn generate_path(&self) -> String {
        format!("/models/{}:generateContent", self.model)
    }

    /// Build the request body for a single-turn prompt.
    pub fn build_request(&self, prompt: &str) -> Value {
        serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
            "generationConfig": {
                "temperature": self.generation.temperature,
                "topP": self.generation.top_p,
                "topK": self.generation.top_k,
                "maxOutputTokens": self.generation.max_output_tokens,
            },
        })
    }

    /// Extract the reply text from a generateContent response body.
    ///
    /// All text parts of the first candidate are concatenated. A reply with no
    /// text is an error: either the prompt was blocked or the candidate was
    /// cut off before producing anything.
    pub fn parse_response(&self, body: &Value) -> Result<String, TransportError> {
        if let Some(error) = body.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown provider error");
            return Err(TransportError::Provider(message.to_string()));
        }

        let text: String = body
            .pointer("/candidates/0/content/parts")
            .and_then(|p| p.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                    .collect()
            })
            .unwrap_or_default();

        if !text.is_empty() {
            return Ok(text);
        }

        if let Some(reason) = body
            .pointer("/promptFeedback/blockReason")
            .and_then(|r| r.as_str())
        {
            return Err(TransportError::Provider(format!(
                "prompt blocked: {}",
                reason
            )));
        }

        let finish = body
            .pointer("/candidates/0/finishReason")
            .and_then(|r| r.as_str())
            .unwrap_or("none");
        Err(TransportError::EmptyReply(finish.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_build_request() {
        let driver = GeminiDriver::new("gemini-1.5-flash", GenerationConfig::default());
        let body = driver.build_request("Hello");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Hello");
        assert_eq!(body["generationConfig"]["temperature"], 0.7);
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[test]
    fn test_gemini_generate_path() {
        let driver = GeminiDriver::new("gemini-1.5-flash", GenerationConfig::default());
        assert_eq!(driver.generate_path(), "/models/gemini-1.5-flash:generateContent");
    }

    #[test]
    fn test_gemini_parse_response_joins_parts() {
        let driver = GeminiDriver::new("gemini-1.5-flash", GenerationConfig::default());
        let body = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{"text": "Hello, "}, {"text": "world"}], "role": "model" },
                "finishReason": "STOP"
            }]
        });
        assert_eq!(driver.parse_response(&body).unwrap(), "Hello, world");
    }

    #[test]
    fn test_gemini_blocked_prompt() {
        let driver = GeminiDriver::new("gemini-1.5-flash", GenerationConfig::default());
        let body = serde_json::json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = driver.parse_response(&body).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_gemini_empty_candidate() {
        let driver = GeminiDriver::new("gemini-1.5-flash", GenerationConfig::default());
        let body = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{"text": ""}], "role": "model" },
                "finishReason": "MAX_TOKENS"
            }]
        });
        match driver.parse_response(&body) {
            Err(TransportError::EmptyReply(reason)) => assert_eq!(reason, "max_tokens"),
            other => panic!("Expected EmptyReply, got {:?}", other),
        }
    }
}
