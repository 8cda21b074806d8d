//! Row shapes for the store tables.
//!
//! Read-side timestamps are kept as the store returns them; `timestamp`
//! columns without a zone do not carry an offset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// An algorithm submitted for storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlgorithm {
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub code: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmRecord {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnalysis {
    pub algorithm_id: i64,
    pub time_complexity: String,
    pub space_complexity: String,
    #[serde(default)]
    pub optimization_suggestions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub algorithm_id: i64,
    pub time_complexity: String,
    pub space_complexity: String,
    #[serde(default)]
    pub optimization_suggestions: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

// Insert bodies: the caller's fields plus store-side timestamps.

#[derive(Serialize)]
pub(crate) struct AlgorithmRow<'a> {
    #[serde(flatten)]
    pub algorithm: &'a NewAlgorithm,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub(crate) struct AnalysisRow<'a> {
    #[serde(flatten)]
    pub analysis: &'a NewAnalysis,
    pub created_at: DateTime<Utc>,
}
