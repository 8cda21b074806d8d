use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::config::SUPPORTED_MODELS;
use crate::error::Error;
use crate::persistence::{
    AlgorithmRecord, AnalysisRecord, NewAlgorithm, NewAnalysis, SupabaseStore, UserRecord,
};
use crate::types::{GenerationRequest, StructuredResult, Task};

use super::AppState;

/// Body of the analysis routes.
#[derive(Debug, Clone, Deserialize)]
pub struct AlgorithmInput {
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl AlgorithmInput {
    fn into_request(self, task: Task) -> GenerationRequest {
        debug!(
            %task,
            user_id = self.user_id.as_deref().unwrap_or("-"),
            session_id = self.session_id.as_deref().unwrap_or("-"),
            "analysis request"
        );
        GenerationRequest::new(task, self.code, self.language)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConvertQuery {
    pub target_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub model: String,
    pub mode: String,
    pub api_configured: bool,
    pub supported_models: Vec<String>,
}

pub async fn root(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "message": format!(
            "Xenovate API is running [{}]",
            state.assistant.availability().label()
        )
    }))
}

pub async fn models(State(state): State<Arc<AppState>>) -> Json<ModelStatus> {
    Json(ModelStatus {
        model: state.assistant.model().to_string(),
        mode: state.assistant.availability().label().to_string(),
        api_configured: state.api_configured,
        supported_models: SUPPORTED_MODELS.iter().map(|m| m.to_string()).collect(),
    })
}

async fn run(state: &AppState, request: GenerationRequest) -> Json<StructuredResult> {
    Json(state.assistant.run(&request).await)
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(input): Json<AlgorithmInput>,
) -> Json<StructuredResult> {
    run(&state, input.into_request(Task::Analyze)).await
}

pub async fn optimize(
    State(state): State<Arc<AppState>>,
    Json(input): Json<AlgorithmInput>,
) -> Json<StructuredResult> {
    run(&state, input.into_request(Task::Optimize)).await
}

pub async fn convert(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConvertQuery>,
    Json(input): Json<AlgorithmInput>,
) -> Json<StructuredResult> {
    let request = input
        .into_request(Task::Convert)
        .with_target_language(query.target_language);
    run(&state, request).await
}

pub async fn explain(
    State(state): State<Arc<AppState>>,
    Json(input): Json<AlgorithmInput>,
) -> Json<StructuredResult> {
    run(&state, input.into_request(Task::Explain)).await
}

// ---- persistence ----

/// Failure of a store route, rendered as `{"error": ...}`.
#[derive(Debug)]
pub enum StoreRouteError {
    NotConfigured,
    NotFound(String),
    Store(Error),
}

impl From<Error> for StoreRouteError {
    fn from(e: Error) -> Self {
        StoreRouteError::Store(e)
    }
}

impl IntoResponse for StoreRouteError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            StoreRouteError::NotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "persistence is not configured".to_string(),
            ),
            StoreRouteError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            StoreRouteError::Store(e) => {
                warn!(error = %e, "store request failed");
                let status = match e {
                    Error::Remote { .. } | Error::Transport(_) => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn store(state: &AppState) -> Result<&SupabaseStore, StoreRouteError> {
    state.store.as_ref().ok_or(StoreRouteError::NotConfigured)
}

pub async fn save_algorithm(
    State(state): State<Arc<AppState>>,
    Json(algorithm): Json<NewAlgorithm>,
) -> Result<(StatusCode, Json<AlgorithmRecord>), StoreRouteError> {
    let saved = store(&state)?.save_algorithm(&algorithm).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserRecord>, StoreRouteError> {
    store(&state)?
        .get_user(&user_id)
        .await?
        .map(Json)
        .ok_or_else(|| StoreRouteError::NotFound(format!("user {}", user_id)))
}

pub async fn user_algorithms(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<AlgorithmRecord>>, StoreRouteError> {
    Ok(Json(store(&state)?.user_algorithms(&user_id).await?))
}

pub async fn save_analysis(
    State(state): State<Arc<AppState>>,
    Json(analysis): Json<NewAnalysis>,
) -> Result<(StatusCode, Json<AnalysisRecord>), StoreRouteError> {
    let saved = store(&state)?.save_analysis(&analysis).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}
