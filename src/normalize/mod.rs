//! 响应规范化：把模型的自由文本整理成结构化结果。
//!
//! # Response Normalization
//!
//! Turns raw model text (or the reason there is none) into a fully populated
//! [`StructuredResult`]. Normalization never fails and never panics; every
//! path ends in a well-formed result.
//!
//! ## Paths
//!
//! | Input | Result |
//! |-------|--------|
//! | [`GenerationFailure::ModelUnavailable`] | fixed fallback result |
//! | [`GenerationFailure::GenerationError`] | fixed result embedding the cause |
//! | text that decodes as the task's JSON object | decoded fields, sentinel defaults |
//! | text that does not decode | rescue extraction (Analyze) or partial-failure sentinels |
//! | Explain text | cleaned prose |
//!
//! Text handling order: [`fence::strip_fences`], then (JSON tasks)
//! [`decode::decode_object`], then [`rescue`] on mismatch, and
//! [`markdown::clean`] on prose fields only.
//!
//! ```rust
//! use xenovate::normalize::normalize;
//! use xenovate::types::{GenerationRequest, Task};
//!
//! let request = GenerationRequest::new(Task::Analyze, "for x in xs: print(x)", "python");
//! let raw = "```json\n{\"time_complexity\": \"O(n)\", \"space_complexity\": \"O(1)\", \"explanation\": \"A **single** pass\"}\n```";
//! let result = normalize(&request, raw);
//! let analysis = result.as_analysis().unwrap();
//! assert_eq!(analysis.time_complexity, "O(n)");
//! assert_eq!(analysis.explanation, "A single pass");
//! ```

pub mod decode;
pub mod fallback;
pub mod fence;
pub mod markdown;
pub mod rescue;

use tracing::debug;

use crate::error::GenerationFailure;
use crate::types::{
    AlgorithmAnalysis, CodeConversion, CodeExplanation, GenerationRequest,
    OptimizationSuggestion, RawModelResponse, StructuredResult, Task,
};

pub use decode::DecodeMismatch;

/// Normalize one model outcome for `request`.
pub fn normalize(request: &GenerationRequest, raw: impl Into<RawModelResponse>) -> StructuredResult {
    match raw.into() {
        RawModelResponse::Text(text) => normalize_text(request, &text),
        RawModelResponse::Failure(failure) => normalize_failure(request, &failure),
    }
}

/// Total-failure path: no text was produced.
pub fn normalize_failure(request: &GenerationRequest, failure: &GenerationFailure) -> StructuredResult {
    fallback::for_failure(request, failure)
}

/// Text path: fence stripping, then decode-then-rescue for JSON tasks.
pub fn normalize_text(request: &GenerationRequest, text: &str) -> StructuredResult {
    let body = fence::strip_fences(text);
    match request.task {
        Task::Analyze => decode_analysis(body)
            .unwrap_or_else(|mismatch| {
                debug!(task = %request.task, %mismatch, "rescuing analysis from free text");
                rescue_analysis(body)
            })
            .into(),
        Task::Optimize => decode_optimization(body, request)
            .map(StructuredResult::from)
            .unwrap_or_else(|mismatch| {
                debug!(task = %request.task, %mismatch, "optimization reply not decodable");
                fallback::unparsed_optimization(request)
            }),
        Task::Convert => decode_conversion(body, request)
            .map(StructuredResult::from)
            .unwrap_or_else(|mismatch| {
                debug!(task = %request.task, %mismatch, "conversion reply not decodable");
                fallback::unparsed_conversion(request)
            }),
        Task::Explain => CodeExplanation {
            explanation: prose(body),
        }
        .into(),
    }
}

fn decode_analysis(body: &str) -> Result<AlgorithmAnalysis, DecodeMismatch> {
    let obj = decode::decode_object(body, Task::Analyze.expected_fields())?;
    Ok(AlgorithmAnalysis {
        time_complexity: decode::string_field(&obj, "time_complexity")
            .unwrap_or_else(|| fallback::UNKNOWN.to_string()),
        space_complexity: decode::string_field(&obj, "space_complexity")
            .unwrap_or_else(|| fallback::UNKNOWN.to_string()),
        explanation: prose(&decode::string_field(&obj, "explanation").unwrap_or_default()),
    })
}

fn rescue_analysis(body: &str) -> AlgorithmAnalysis {
    AlgorithmAnalysis {
        time_complexity: rescue::complexity_after(body, rescue::TIME_LABEL)
            .unwrap_or_else(|| fallback::UNKNOWN.to_string()),
        space_complexity: rescue::complexity_after(body, rescue::SPACE_LABEL)
            .unwrap_or_else(|| fallback::UNKNOWN.to_string()),
        explanation: prose(body),
    }
}

fn decode_optimization(
    body: &str,
    request: &GenerationRequest,
) -> Result<OptimizationSuggestion, DecodeMismatch> {
    let obj = decode::decode_object(body, Task::Optimize.expected_fields())?;
    let mut improvements: Vec<String> = decode::string_list(&obj, "improvements")
        .iter()
        .map(|s| markdown::clean(s).trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if improvements.is_empty() {
        improvements.push(fallback::NO_IMPROVEMENTS.to_string());
    }
    Ok(OptimizationSuggestion {
        optimized_code: decode::string_field(&obj, "optimized_code")
            .unwrap_or_else(|| request.code.clone()),
        improvements,
    })
}

fn decode_conversion(
    body: &str,
    request: &GenerationRequest,
) -> Result<CodeConversion, DecodeMismatch> {
    let obj = decode::decode_object(body, Task::Convert.expected_fields())?;
    Ok(CodeConversion {
        original_code: decode::string_field(&obj, "original_code")
            .unwrap_or_else(|| request.code.clone()),
        // The requested target is authoritative; the model's echo is ignored.
        target_language: request.target_language().to_string(),
        converted_code: decode::string_field(&obj, "converted_code")
            .unwrap_or_else(|| fallback::CONVERSION_FAILED.to_string()),
    })
}

/// Cleaned prose, or the no-explanation sentinel when nothing is left.
fn prose(text: &str) -> String {
    let cleaned = markdown::clean(text);
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        fallback::NO_EXPLANATION.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(task: Task) -> GenerationRequest {
        GenerationRequest::new(task, "def f(xs): return sorted(xs)", "python")
    }

    #[test]
    fn test_analysis_json_with_missing_fields_uses_defaults() {
        let result = normalize(&request(Task::Analyze), r#"{"time_complexity": "O(n log n)"}"#);
        let analysis = result.as_analysis().unwrap();
        assert_eq!(analysis.time_complexity, "O(n log n)");
        assert_eq!(analysis.space_complexity, fallback::UNKNOWN);
        assert_eq!(analysis.explanation, fallback::NO_EXPLANATION);
    }

    #[test]
    fn test_analysis_rescue_keeps_full_text_as_explanation() {
        let raw = "Time Complexity: O(n²)\nSpace Complexity: O(1)\n\nThis is a **bubble sort**.";
        let result = normalize(&request(Task::Analyze), raw);
        let analysis = result.as_analysis().unwrap();
        assert_eq!(analysis.time_complexity, "O(n²)");
        assert_eq!(analysis.space_complexity, "O(1)");
        assert_eq!(
            analysis.explanation,
            "Time Complexity: O(n²)\nSpace Complexity: O(1)\n\nThis is a bubble sort."
        );
    }

    #[test]
    fn test_analysis_rescue_without_labels() {
        let result = normalize(&request(Task::Analyze), "It sorts the list in O(n log n).");
        let analysis = result.as_analysis().unwrap();
        assert_eq!(analysis.time_complexity, fallback::UNKNOWN);
        assert_eq!(analysis.space_complexity, fallback::UNKNOWN);
    }

    #[test]
    fn test_optimization_decoded() {
        let raw = r#"```json
{"optimized_code": "def f(xs):\n    return sorted(xs)", "improvements": ["Use **built-in** sorted", ""]}
```"#;
        let result = normalize(&request(Task::Optimize), raw);
        let opt = result.as_optimization().unwrap();
        assert_eq!(opt.optimized_code, "def f(xs):\n    return sorted(xs)");
        assert_eq!(opt.improvements, vec!["Use built-in sorted"]);
    }

    #[test]
    fn test_optimization_empty_improvements_get_sentinel() {
        let raw = r#"{"optimized_code": "x", "improvements": []}"#;
        let result = normalize(&request(Task::Optimize), raw);
        assert_eq!(
            result.as_optimization().unwrap().improvements,
            vec![fallback::NO_IMPROVEMENTS]
        );
    }

    #[test]
    fn test_optimization_code_keeps_asterisks() {
        let raw = r#"{"optimized_code": "y = a ** 2 * b", "improvements": ["ok"]}"#;
        let result = normalize(&request(Task::Optimize), raw);
        assert_eq!(result.as_optimization().unwrap().optimized_code, "y = a ** 2 * b");
    }

    #[test]
    fn test_optimization_undecodable() {
        let result = normalize(&request(Task::Optimize), "Just use sorted().");
        let opt = result.as_optimization().unwrap();
        assert_eq!(opt.optimized_code, "def f(xs): return sorted(xs)");
        assert_eq!(opt.improvements, vec![fallback::UNPARSED_OPTIMIZATION]);
    }

    #[test]
    fn test_conversion_ignores_echoed_target() {
        let req = request(Task::Convert).with_target_language("java");
        let raw = r#"{"original_code": "x", "target_language": "kotlin", "converted_code": "int x;"}"#;
        let result = normalize(&req, raw);
        let conv = result.as_conversion().unwrap();
        assert_eq!(conv.target_language, "java");
        assert_eq!(conv.converted_code, "int x;");
        assert_eq!(conv.original_code, "x");
    }

    #[test]
    fn test_conversion_missing_code_sentinel() {
        let req = request(Task::Convert).with_target_language("go");
        let result = normalize(&req, r#"{"target_language": "go"}"#);
        let conv = result.as_conversion().unwrap();
        assert_eq!(conv.converted_code, fallback::CONVERSION_FAILED);
        assert_eq!(conv.original_code, req.code);
    }

    #[test]
    fn test_explain_strips_fence_and_markdown() {
        let raw = "```\nThe function **sorts** the `xs` list.\n```";
        let result = normalize(&request(Task::Explain), raw);
        assert_eq!(
            result.as_explanation().unwrap().explanation,
            "The function sorts the xs list."
        );
    }

    #[test]
    fn test_explain_never_attempts_json() {
        let raw = r#"{"explanation": "json-looking prose"}"#;
        let result = normalize(&request(Task::Explain), raw);
        assert_eq!(result.as_explanation().unwrap().explanation, raw);
    }

    #[test]
    fn test_blank_text_yields_sentinels() {
        for task in Task::ALL {
            let result = normalize(&request(task), "   ");
            assert_eq!(result.task(), task);
        }
        let result = normalize(&request(Task::Explain), "```\n```");
        assert_eq!(result.as_explanation().unwrap().explanation, fallback::NO_EXPLANATION);
    }

    #[test]
    fn test_failure_goes_to_fixed_fallback() {
        let result = normalize(&request(Task::Optimize), GenerationFailure::ModelUnavailable);
        assert_eq!(
            result.as_optimization().unwrap().improvements,
            vec![fallback::FALLBACK_OPTIMIZATION]
        );
    }
}
