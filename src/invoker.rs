//! Model invoker: owns the single model handle and decides, once, whether the
//! process runs against the live model or in fallback mode.
//!
//! The decision is made at construction and never revisited. In fallback mode
//! every call fails immediately with [`GenerationFailure::ModelUnavailable`]
//! and no network I/O happens. In active mode each call reaches the transport
//! exactly once: no retry, no backoff, no caching.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ModelConfig;
use crate::error::GenerationFailure;
use crate::transport::{GenerationTransport, HttpTransport};

/// Prompt sent once at start-up to verify the credential and model.
pub const PROBE_PROMPT: &str = "Hello";

/// Whether generation calls reach the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelAvailability {
    Active,
    Fallback,
}

impl ModelAvailability {
    pub fn is_active(&self) -> bool {
        matches!(self, ModelAvailability::Active)
    }

    /// Label used in status responses.
    pub fn label(&self) -> &'static str {
        match self {
            ModelAvailability::Active => "ACTIVE",
            ModelAvailability::Fallback => "FALLBACK MODE",
        }
    }
}

#[derive(Debug)]
enum ModelHandle {
    Active(Arc<dyn GenerationTransport>),
    Fallback { model: String, reason: String },
}

/// Calls the generation service, or refuses to when in fallback mode.
///
/// Read-only after construction; share it behind an `Arc` across requests.
#[derive(Debug)]
pub struct ModelInvoker {
    handle: ModelHandle,
}

impl ModelInvoker {
    /// An invoker that never calls the model.
    pub fn fallback(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            handle: ModelHandle::Fallback {
                model: model.into(),
                reason: reason.into(),
            },
        }
    }

    /// An active invoker over an already-verified transport. Skips the probe.
    pub fn with_transport(transport: Arc<dyn GenerationTransport>) -> Self {
        Self {
            handle: ModelHandle::Active(transport),
        }
    }

    /// Run the handshake probe and settle availability.
    pub async fn probe(transport: Arc<dyn GenerationTransport>) -> Self {
        match transport.generate(PROBE_PROMPT).await {
            Ok(_) => Self::activated(transport),
            Err(e) => Self::probe_failed(transport.model(), e.to_string()),
        }
    }

    /// Blocking variant of [`ModelInvoker::probe`].
    pub fn probe_blocking(transport: Arc<dyn GenerationTransport>) -> Self {
        match transport.generate_blocking(PROBE_PROMPT) {
            Ok(_) => Self::activated(transport),
            Err(e) => Self::probe_failed(transport.model(), e.to_string()),
        }
    }

    /// Build the HTTP transport from `config` and probe it.
    ///
    /// A missing credential or a transport that cannot be constructed puts the
    /// invoker in fallback mode without any network call.
    pub async fn connect(config: &ModelConfig) -> Self {
        match Self::transport_for(config) {
            Ok(transport) => Self::probe(transport).await,
            Err(invoker) => invoker,
        }
    }

    /// Blocking variant of [`ModelInvoker::connect`]. Must not be called from
    /// inside an async runtime.
    pub fn connect_blocking(config: &ModelConfig) -> Self {
        match Self::transport_for(config) {
            Ok(transport) => Self::probe_blocking(transport),
            Err(invoker) => invoker,
        }
    }

    fn transport_for(config: &ModelConfig) -> Result<Arc<dyn GenerationTransport>, Self> {
        let Some(api_key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            info!(model = %config.model, "no API credential configured; using fallback mode");
            return Err(Self::fallback(&config.model, "no API credential configured"));
        };
        match HttpTransport::new(config, api_key) {
            Ok(transport) => Ok(Arc::new(transport)),
            Err(e) => {
                warn!(model = %config.model, error = %e, "model transport unavailable; using fallback mode");
                Err(Self::fallback(&config.model, e.to_string()))
            }
        }
    }

    fn activated(transport: Arc<dyn GenerationTransport>) -> Self {
        info!(model = transport.model(), "model initialized successfully");
        Self::with_transport(transport)
    }

    fn probe_failed(model: &str, reason: String) -> Self {
        warn!(model, error = %reason, "model probe failed; using fallback mode");
        Self::fallback(model, reason)
    }

    pub fn availability(&self) -> ModelAvailability {
        match self.handle {
            ModelHandle::Active(_) => ModelAvailability::Active,
            ModelHandle::Fallback { .. } => ModelAvailability::Fallback,
        }
    }

    pub fn model(&self) -> &str {
        match &self.handle {
            ModelHandle::Active(t) => t.model(),
            ModelHandle::Fallback { model, .. } => model,
        }
    }

    /// Why the invoker is in fallback mode, if it is.
    pub fn fallback_reason(&self) -> Option<&str> {
        match &self.handle {
            ModelHandle::Active(_) => None,
            ModelHandle::Fallback { reason, .. } => Some(reason),
        }
    }

    fn transport(&self) -> Result<&Arc<dyn GenerationTransport>, GenerationFailure> {
        match &self.handle {
            ModelHandle::Active(t) => Ok(t),
            ModelHandle::Fallback { .. } => Err(GenerationFailure::ModelUnavailable),
        }
    }

    /// One non-blocking generation call.
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationFailure> {
        let transport = self.transport()?;
        debug!(model = transport.model(), prompt_bytes = prompt.len(), "generating");
        transport.generate(prompt).await.map_err(|e| {
            warn!(model = transport.model(), error = %e, "generation failed");
            GenerationFailure::generation(e.to_string())
        })
    }

    /// One blocking generation call.
    pub fn generate_blocking(&self, prompt: &str) -> Result<String, GenerationFailure> {
        let transport = self.transport()?;
        debug!(model = transport.model(), prompt_bytes = prompt.len(), "generating (blocking)");
        transport.generate_blocking(prompt).map_err(|e| {
            warn!(model = transport.model(), error = %e, "generation failed");
            GenerationFailure::generation(e.to_string())
        })
    }

    /// Like [`ModelInvoker::generate`], but gives up as soon as `cancel` fires.
    /// The in-flight request is dropped.
    pub async fn generate_with_cancel(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, GenerationFailure> {
        // Fallback mode must report unavailability, not cancellation.
        self.transport()?;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(model = self.model(), "generation cancelled");
                Err(GenerationFailure::generation("generation cancelled"))
            }
            outcome = self.generate(prompt) => outcome,
        }
    }
}
