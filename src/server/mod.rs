//! HTTP server hosting the agents.
//!
//! Routes:
//! - `GET  /health`                       service health
//! - `GET  /ping`                         runtime-host liveness
//! - `GET  /api/v1/agents`                registered agents
//! - `POST /api/v1/agents/{kind}/invoke`  run one agent
//! - `POST /invocations`                  run an agent named in the payload

pub mod reload;

use crate::agent::profile::profile_for;
use crate::agent::AgentRegistry;
use crate::cli::Args;
use crate::config::Config;
use crate::models::{payload_text, AgentEnvelope, AgentRequest, AnalysisKind, FallbackEnvelope};
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<RwLock<Arc<AgentRegistry>>>,
}

impl AppState {
    pub fn new(registry: AgentRegistry) -> Self {
        Self {
            registry: Arc::new(RwLock::new(Arc::new(registry))),
        }
    }

    /// Current registry. In-flight requests keep the one they started with.
    pub async fn registry(&self) -> Arc<AgentRegistry> {
        Arc::clone(&*self.registry.read().await)
    }

    pub async fn replace_registry(&self, registry: AgentRegistry) {
        *self.registry.write().await = Arc::new(registry);
    }
}

/// JSON error response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Entry in the agent listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct AgentSummary {
    pub kind: AnalysisKind,
    pub agent: String,
    pub confidence_score: f64,
    pub data_sources: Vec<String>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ping", get(ping))
        .route("/api/v1/agents", get(list_agents))
        .route("/api/v1/agents/{kind}/invoke", post(invoke_agent))
        .route("/invocations", post(invocations))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry().await;
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "model": registry.model(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn ping() -> impl IntoResponse {
    Json(json!({ "status": "Healthy" }))
}

async fn list_agents(State(state): State<AppState>) -> Json<Vec<AgentSummary>> {
    let registry = state.registry().await;
    let agents = registry
        .agents()
        .map(|agent| {
            let profile = agent.profile();
            AgentSummary {
                kind: profile.kind,
                agent: profile.agent.to_string(),
                confidence_score: profile.confidence_score,
                data_sources: profile.data_sources.iter().map(|s| s.to_string()).collect(),
            }
        })
        .collect();
    Json(agents)
}

async fn invoke_agent(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AgentEnvelope>, ApiError> {
    let kind: AnalysisKind = kind
        .parse()
        .map_err(|e: String| ApiError::new(StatusCode::NOT_FOUND, e))?;

    match payload {
        Ok(Json(payload)) => run(&state, kind, &AgentRequest::from_payload(&payload))
            .await
            .map(Json),
        Err(rejection) => Ok(Json(rejected(kind, &rejection))),
    }
}

/// `POST /invocations`: the payload may name an `agent`; market otherwise.
async fn invocations(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AgentEnvelope>, ApiError> {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return Ok(Json(rejected(AnalysisKind::Market, &rejection))),
    };

    let kind = match payload_text(&payload, "agent") {
        None => AnalysisKind::Market,
        Some(name) => name
            .parse()
            .map_err(|e: String| ApiError::new(StatusCode::BAD_REQUEST, e))?,
    };

    run(&state, kind, &AgentRequest::from_payload(&payload))
        .await
        .map(Json)
}

/// Fallback envelope for a body that is not JSON.
fn rejected(kind: AnalysisKind, rejection: &JsonRejection) -> AgentEnvelope {
    let agent = profile_for(kind).agent;
    warn!("{} received an unreadable payload: {}", agent, rejection.body_text());
    AgentEnvelope::Fallback(FallbackEnvelope::new(agent, rejection.body_text()))
}

async fn run(
    state: &AppState,
    kind: AnalysisKind,
    request: &AgentRequest,
) -> Result<AgentEnvelope, ApiError> {
    let registry = state.registry().await;
    let agent = registry.get(kind).ok_or_else(|| {
        ApiError::new(
            StatusCode::NOT_FOUND,
            format!("No agent registered for {}", kind),
        )
    })?;

    info!("Invoking {} agent", kind);
    let envelope = agent.invoke(request).await;
    debug!(
        "{} returned {} chars (fallback: {})",
        envelope.agent(),
        envelope.analysis().len(),
        envelope.is_fallback()
    );
    Ok(envelope)
}

/// Start the server and block until shutdown.
pub async fn serve(
    config: Config,
    args: Args,
    config_path: Option<PathBuf>,
    reload: bool,
) -> Result<()> {
    let registry = AgentRegistry::from_config(&config.model)
        .context("Failed to initialize agent runtime client")?;
    let state = AppState::new(registry);

    let reloader = if reload {
        match config_path {
            Some(path) => Some(reload::spawn_reloader(
                reload::ConfigWatcher::new(path),
                state.clone(),
                args,
                Duration::from_millis(config.server.reload_interval_ms.max(100)),
            )),
            None => {
                warn!("--reload given but there is no config file to watch");
                None
            }
        }
    } else {
        None
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        "Serving {} agents on http://{} (model {}, runtime {})",
        AnalysisKind::ALL.len(),
        addr,
        config.model.name,
        config.model.runtime_url
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(handle) = reloader {
        handle.abort();
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
