//! 网关模块：HTTP 路由与 WebSocket 双工通道。
//!
//! # Gateway
//!
//! axum front end over [`CodeAssistant`]. Analysis routes always answer 200
//! with a structured payload; failures travel inside sentinel content.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /` | service status line |
//! | `GET /api/models` | model and mode report |
//! | `POST /api/analyze`, `/api/optimize`, `/api/explain` | one task per call |
//! | `POST /api/convert?target_language=` | conversion |
//! | `GET /ws/:client_id` | duplex channel, see [`ws`] |
//! | `POST /api/algorithms`, `GET /api/users/:user_id`, `GET /api/users/:user_id/algorithms`, `POST /api/analyses` | store, 503 without one |

pub mod routes;
pub mod ws;

pub use ws::{ChannelReply, ChannelRequest, ConnectionRegistry};

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::assistant::CodeAssistant;
use crate::config::GatewayConfig;
use crate::invoker::ModelInvoker;
use crate::persistence::SupabaseStore;
use crate::Result;

/// Shared, read-mostly state handed to every handler.
#[derive(Debug)]
pub struct AppState {
    pub assistant: CodeAssistant,
    pub store: Option<SupabaseStore>,
    pub registry: ConnectionRegistry,
    /// Whether a model credential was configured at all.
    pub api_configured: bool,
}

impl AppState {
    pub fn new(assistant: CodeAssistant, store: Option<SupabaseStore>, api_configured: bool) -> Self {
        Self {
            assistant,
            store,
            registry: ConnectionRegistry::default(),
            api_configured,
        }
    }

    /// Probe the model and open the store described by `config`.
    pub async fn from_config(config: &GatewayConfig) -> Result<Self> {
        let invoker = ModelInvoker::connect(&config.model).await;
        info!(
            model = invoker.model(),
            mode = invoker.availability().label(),
            "model availability settled"
        );
        let store = match &config.store {
            Some(store) => Some(SupabaseStore::new(store)?),
            None => {
                info!("no Supabase store configured; persistence routes disabled");
                None
            }
        };
        let api_configured = config
            .model
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        Ok(Self::new(CodeAssistant::new(Arc::new(invoker)), store, api_configured))
    }
}

pub fn router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/api/models", get(routes::models))
        .route("/api/analyze", post(routes::analyze))
        .route("/api/optimize", post(routes::optimize))
        .route("/api/convert", post(routes::convert))
        .route("/api/explain", post(routes::explain))
        .route("/api/algorithms", post(routes::save_algorithm))
        .route("/api/users/:user_id", get(routes::get_user))
        .route("/api/users/:user_id/algorithms", get(routes::user_algorithms))
        .route("/api/analyses", post(routes::save_analysis))
        .route("/ws/:client_id", get(ws::ws_handler))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `*` anywhere in `origins` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let values: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(values))
}

/// Bind, serve until Ctrl-C, then drain.
pub async fn serve(config: GatewayConfig) -> Result<()> {
    let state = Arc::new(AppState::from_config(&config).await?);
    let app = router(state, &config.cors_origins);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(%address, "xenovate gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("xenovate gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
