//! Duplex channel: `GET /ws/:client_id`.
//!
//! Inbound text frames are JSON objects whose `action` names the task:
//!
//! ```json
//! {"action": "convert", "id": 3, "code": "print(1)", "language": "python", "target_language": "go"}
//! ```
//!
//! Each frame is handled on its own task, so replies may arrive out of order;
//! the optional `id` is echoed back to correlate them. A reply carries
//! `action` plus the result fields. Frames that do not parse get
//! `{"error": ...}`. Non-text frames are ignored.
//!
//! Replies are addressed to the client id through the [`ConnectionRegistry`],
//! so after a reconnect they reach the newest connection for that id.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::types::{GenerationRequest, StructuredResult, Task};

use super::AppState;

/// One inbound channel message, discriminated by `action`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ChannelRequest {
    Analyze(ChannelPayload),
    Optimize(ChannelPayload),
    Convert(ChannelPayload),
    Explain(ChannelPayload),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelPayload {
    #[serde(default)]
    pub id: Option<Value>,
    pub code: String,
    pub language: String,
    /// Convert only; defaults to the default target language.
    #[serde(default)]
    pub target_language: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ChannelRequest {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn task(&self) -> Task {
        match self {
            ChannelRequest::Analyze(_) => Task::Analyze,
            ChannelRequest::Optimize(_) => Task::Optimize,
            ChannelRequest::Convert(_) => Task::Convert,
            ChannelRequest::Explain(_) => Task::Explain,
        }
    }

    /// Split into the echoed id and the generation request.
    pub fn into_request(self) -> (Option<Value>, GenerationRequest) {
        let task = self.task();
        let payload = match self {
            ChannelRequest::Analyze(p)
            | ChannelRequest::Optimize(p)
            | ChannelRequest::Convert(p)
            | ChannelRequest::Explain(p) => p,
        };
        let mut request = GenerationRequest::new(task, payload.code, payload.language);
        if task == Task::Convert {
            if let Some(target) = payload.target_language {
                request = request.with_target_language(target);
            }
        }
        (payload.id, request)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub action: Task,
    #[serde(flatten)]
    pub result: StructuredResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelError {
    pub error: String,
}

#[derive(Debug)]
struct Connection {
    id: Uuid,
    sender: mpsc::UnboundedSender<String>,
}

/// Live channel connections keyed by client id.
///
/// Registering an id that is already present replaces the old entry; the
/// replaced connection keeps running but is no longer addressable. A
/// connection only ever removes its own entry.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<HashMap<String, Connection>>>,
}

impl ConnectionRegistry {
    pub async fn register(&self, client_id: &str, sender: mpsc::UnboundedSender<String>) -> Uuid {
        let id = Uuid::new_v4();
        let previous = self
            .inner
            .write()
            .await
            .insert(client_id.to_string(), Connection { id, sender });
        if previous.is_some() {
            debug!(client_id, "replaced existing channel connection");
        }
        id
    }

    /// Remove `client_id` if it still refers to connection `id`.
    pub async fn unregister(&self, client_id: &str, id: Uuid) -> bool {
        let mut inner = self.inner.write().await;
        match inner.get(client_id) {
            Some(conn) if conn.id == id => {
                inner.remove(client_id);
                true
            }
            _ => false,
        }
    }

    /// Queue `message` for `client_id`. `false` when the client is gone.
    pub async fn send(&self, client_id: &str, message: String) -> bool {
        match self.inner.read().await.get(client_id) {
            Some(conn) => conn.sender.send(message).is_ok(),
            None => false,
        }
    }

    pub async fn is_connected(&self, client_id: &str) -> bool {
        self.inner.read().await.contains_key(client_id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, client_id, state))
}

async fn handle_socket(socket: WebSocket, client_id: String, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let conn_id = state.registry.register(&client_id, tx).await;
    let connections = state.registry.len().await;
    info!(%client_id, connections, "channel connected");

    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Cancelled on disconnect so in-flight generations for this socket stop.
    let cancel = CancellationToken::new();
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let state = state.clone();
                let cancel = cancel.clone();
                let client_id = client_id.clone();
                tokio::spawn(async move {
                    deliver(&state, &client_id, &text, &cancel).await;
                });
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(%client_id, error = %e, "channel read failed");
                break;
            }
        }
    }

    cancel.cancel();
    state.registry.unregister(&client_id, conn_id).await;
    writer.abort();
    info!(%client_id, "channel disconnected");
}

/// Handle one text frame and queue its reply for `client_id`.
///
/// Returns `false` when the reply was dropped: the frame's socket closed
/// while it was being handled, or the client id is no longer registered.
pub async fn deliver(
    state: &AppState,
    client_id: &str,
    text: &str,
    cancel: &CancellationToken,
) -> bool {
    let Some(reply) = handle_text(state, text, cancel).await else {
        return false;
    };
    if cancel.is_cancelled() {
        debug!(client_id, "dropping reply for closed channel");
        return false;
    }
    if !state.registry.send(client_id, reply).await {
        debug!(client_id, "dropping reply for disconnected channel");
        return false;
    }
    true
}

/// Process one text frame into its serialized reply.
pub async fn handle_text(state: &AppState, text: &str, cancel: &CancellationToken) -> Option<String> {
    let encoded = match ChannelRequest::parse(text) {
        Ok(message) => {
            let (id, request) = message.into_request();
            let result = state.assistant.run_with_cancel(&request, cancel).await;
            serde_json::to_string(&ChannelReply {
                id,
                action: request.task,
                result,
            })
        }
        Err(e) => {
            warn!(error = %e, "rejected channel message");
            serde_json::to_string(&ChannelError { error: e.to_string() })
        }
    };
    match encoded {
        Ok(reply) => Some(reply),
        Err(e) => {
            warn!(error = %e, "failed to encode channel reply");
            None
        }
    }
}
