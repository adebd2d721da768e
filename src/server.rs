//! HTTP API for the chat service.
//!
//! [`router`] builds the axum routes over an [`AppState`]; [`serve`] wires up
//! the knowledge store and language-model provider from config and runs the
//! listener until Ctrl-C.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::chat::{lock_store, ChatOrchestrator, ReplySource};
use crate::config::QabotConfig;
use crate::knowledge::types::{ExportEntry, StatsResponse};
use crate::knowledge::KnowledgeStore;
use crate::llm;

/// Errors returned from HTTP handlers, rendered as `{status, message}` JSON.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Empty message")]
    EmptyMessage,

    #[error("Error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::EmptyMessage => StatusCode::BAD_REQUEST,
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "chat request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub chat: ChatOrchestrator,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    status: &'static str,
    message: String,
    source: ReplySource,
    learned: usize,
}

/// Build the API router.
pub fn router(state: AppState, debug: bool) -> Router {
    let router = Router::new()
        .route("/api/chat", post(chat))
        .route("/api/health", get(health))
        .route("/api/stats", get(stats))
        .route("/api/knowledge", get(knowledge))
        .with_state(state);

    if debug {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// POST /api/chat
async fn chat(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    // A missing, malformed, or non-string message is treated as empty.
    let message = body
        .ok()
        .and_then(|Json(v)| v.get("message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_default();

    if message.is_empty() {
        return Err(ApiError::EmptyMessage);
    }

    let reply = state.chat.respond(&message).await?;

    Ok(Json(ChatResponse {
        status: "success",
        message: reply.message,
        source: reply.source,
        learned: reply.learned_count,
    }))
}

/// GET /api/health
async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/stats
async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let store = lock_store(state.chat.store())?;
    Ok(Json(store.get_stats()))
}

/// GET /api/knowledge
async fn knowledge(State(state): State<AppState>) -> Result<Json<Vec<ExportEntry>>, ApiError> {
    let store = lock_store(state.chat.store())?;
    Ok(Json(store.export_all()))
}

/// Open the store, create the provider, and serve until Ctrl-C.
pub async fn serve(config: QabotConfig) -> anyhow::Result<()> {
    let path = config.resolved_knowledge_path();
    let store = KnowledgeStore::open(&path)?;
    tracing::info!(path = %path.display(), records = store.len(), "knowledge store ready");

    let provider = llm::create_provider(&config.llm);
    match &provider {
        Some(p) => tracing::info!(provider = p.name(), model = %config.llm.model, "language model configured"),
        None => tracing::info!("running in demo mode (no OpenAI API key configured)"),
    }

    let chat = ChatOrchestrator::new(Arc::new(Mutex::new(store)), provider);
    let app = router(AppState { chat }, config.server.debug);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, debug = config.server.debug, "serving on http://{bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
