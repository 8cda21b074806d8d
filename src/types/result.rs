//! Task-specific structured results.
//!
//! Field names match the JSON contract exposed by the gateway
//! (`time_complexity`, `optimized_code`, ...). Every field is always present;
//! the normalizer substitutes sentinels rather than leaving anything empty.

use serde::{Deserialize, Serialize};

use super::task::Task;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmAnalysis {
    pub time_complexity: String,
    pub space_complexity: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationSuggestion {
    pub optimized_code: String,
    pub improvements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeConversion {
    pub original_code: String,
    pub target_language: String,
    pub converted_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExplanation {
    pub explanation: String,
}

/// Normalized reply for any task.
///
/// Serialized untagged, so the wire shape is just the inner record's fields.
/// Variant order matters for deserialization: records with more required
/// fields come first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructuredResult {
    Analysis(AlgorithmAnalysis),
    Conversion(CodeConversion),
    Optimization(OptimizationSuggestion),
    Explanation(CodeExplanation),
}

impl StructuredResult {
    pub fn task(&self) -> Task {
        match self {
            StructuredResult::Analysis(_) => Task::Analyze,
            StructuredResult::Optimization(_) => Task::Optimize,
            StructuredResult::Conversion(_) => Task::Convert,
            StructuredResult::Explanation(_) => Task::Explain,
        }
    }

    pub fn as_analysis(&self) -> Option<&AlgorithmAnalysis> {
        match self {
            StructuredResult::Analysis(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_optimization(&self) -> Option<&OptimizationSuggestion> {
        match self {
            StructuredResult::Optimization(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_conversion(&self) -> Option<&CodeConversion> {
        match self {
            StructuredResult::Conversion(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_explanation(&self) -> Option<&CodeExplanation> {
        match self {
            StructuredResult::Explanation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AlgorithmAnalysis> for StructuredResult {
    fn from(v: AlgorithmAnalysis) -> Self {
        StructuredResult::Analysis(v)
    }
}

impl From<OptimizationSuggestion> for StructuredResult {
    fn from(v: OptimizationSuggestion) -> Self {
        StructuredResult::Optimization(v)
    }
}

impl From<CodeConversion> for StructuredResult {
    fn from(v: CodeConversion) -> Self {
        StructuredResult::Conversion(v)
    }
}

impl From<CodeExplanation> for StructuredResult {
    fn from(v: CodeExplanation) -> Self {
        StructuredResult::Explanation(v)
    }
}
