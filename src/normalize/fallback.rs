//! Sentinel values and fixed fallback results.

use crate::error::GenerationFailure;
use crate::types::{
    AlgorithmAnalysis, CodeConversion, CodeExplanation, GenerationRequest,
    OptimizationSuggestion, StructuredResult, Task,
};

pub const UNKNOWN: &str = "Unknown";
pub const NO_EXPLANATION: &str = "No explanation available";
pub const NO_IMPROVEMENTS: &str = "No improvements available.";
pub const CONVERSION_FAILED: &str = "# Conversion failed. Please try again.";
pub const UNPARSED_OPTIMIZATION: &str =
    "Unable to parse optimization suggestions. Please try again.";
pub const UNPARSED_CONVERSION: &str = "# Unable to convert code. Please try again.";

pub const FALLBACK_TIME_COMPLEXITY: &str = "O(n)";
pub const FALLBACK_SPACE_COMPLEXITY: &str = "O(1)";
pub const FALLBACK_ANALYSIS: &str = "This is a fallback implementation. The actual analysis would be performed by the Google AI model.";
pub const FALLBACK_OPTIMIZATION: &str = "This is a fallback implementation. The actual optimization would be performed by the Google AI model.";
pub const FALLBACK_CONVERSION: &str = "# This is a fallback implementation. The actual conversion would be performed by the Google AI model.";
pub const FALLBACK_EXPLANATION: &str = "This is a fallback implementation. The actual explanation would be provided by the Google AI model.";

/// Fixed result for a request whose generation produced no text.
pub fn for_failure(request: &GenerationRequest, failure: &GenerationFailure) -> StructuredResult {
    let cause = match failure {
        GenerationFailure::ModelUnavailable => None,
        GenerationFailure::GenerationError { cause } => Some(cause.as_str()),
    };

    match request.task {
        Task::Analyze => AlgorithmAnalysis {
            time_complexity: FALLBACK_TIME_COMPLEXITY.to_string(),
            space_complexity: FALLBACK_SPACE_COMPLEXITY.to_string(),
            explanation: match cause {
                None => FALLBACK_ANALYSIS.to_string(),
                Some(c) => format!("Error analyzing code: {}", c),
            },
        }
        .into(),
        Task::Optimize => OptimizationSuggestion {
            optimized_code: request.code.clone(),
            improvements: vec![match cause {
                None => FALLBACK_OPTIMIZATION.to_string(),
                Some(c) => format!("Error optimizing code: {}", c),
            }],
        }
        .into(),
        Task::Convert => CodeConversion {
            original_code: request.code.clone(),
            target_language: request.target_language().to_string(),
            converted_code: match cause {
                None => FALLBACK_CONVERSION.to_string(),
                Some(c) => format!("# Error converting code: {}", c),
            },
        }
        .into(),
        Task::Explain => CodeExplanation {
            explanation: match cause {
                None => FALLBACK_EXPLANATION.to_string(),
                Some(c) => format!("Error explaining code: {}", c),
            },
        }
        .into(),
    }
}

/// Optimize reply that was present but not decodable.
pub fn unparsed_optimization(request: &GenerationRequest) -> StructuredResult {
    OptimizationSuggestion {
        optimized_code: request.code.clone(),
        improvements: vec![UNPARSED_OPTIMIZATION.to_string()],
    }
    .into()
}

/// Convert reply that was present but not decodable.
pub fn unparsed_conversion(request: &GenerationRequest) -> StructuredResult {
    CodeConversion {
        original_code: request.code.clone(),
        target_language: request.target_language().to_string(),
        converted_code: UNPARSED_CONVERSION.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_and_error_paths_differ() {
        let request = GenerationRequest::new(Task::Explain, "x", "python");
        let unavailable = for_failure(&request, &GenerationFailure::ModelUnavailable);
        let errored = for_failure(&request, &GenerationFailure::generation("timeout"));
        assert_eq!(
            unavailable.as_explanation().unwrap().explanation,
            FALLBACK_EXPLANATION
        );
        assert_eq!(
            errored.as_explanation().unwrap().explanation,
            "Error explaining code: timeout"
        );
    }

    #[test]
    fn test_analysis_fallback_keeps_fixed_complexities_on_error() {
        let request = GenerationRequest::new(Task::Analyze, "x", "python");
        let result = for_failure(&request, &GenerationFailure::generation("boom"));
        let analysis = result.as_analysis().unwrap();
        assert_eq!(analysis.time_complexity, "O(n)");
        assert_eq!(analysis.space_complexity, "O(1)");
        assert!(analysis.explanation.contains("Error"));
    }

    #[test]
    fn test_conversion_fallback_echoes_request() {
        let request =
            GenerationRequest::new(Task::Convert, "print(1)", "python").with_target_language("java");
        let result = for_failure(&request, &GenerationFailure::ModelUnavailable);
        let conversion = result.as_conversion().unwrap();
        assert_eq!(conversion.original_code, "print(1)");
        assert_eq!(conversion.target_language, "java");
        assert_eq!(conversion.converted_code, FALLBACK_CONVERSION);
    }
}
