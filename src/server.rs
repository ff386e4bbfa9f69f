//! Triage HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/agent` | One conversation turn: context + chat model reply |
//! | `POST` | `/context` | Build the clinical context payload only |
//! | `GET`  | `/health` | Version, cache state and dataset fingerprint |
//! | `GET`  | `/kb/stats` | Knowledge-base summary (loads the cache if needed) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "pet.species is required" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404).
//! A failed model call on `/agent` is not an error response: it returns
//! status 500 with `{ "ok": false, "error", "details", "conversationId" }`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted; the mobile client and
//! its web build call the server cross-origin.

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::agent::{load_system_prompt, normalize_symptom_keys, Agent, AgentRequest};
use crate::cache::KnowledgeBaseCache;
use crate::config::Config;
use crate::context::ContextBuilder;
use crate::llm::create_chat_model;
use crate::sources::create_source;
use crate::stats::KnowledgeBaseStats;
use crate::traits::ChatModel;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    agent: Arc<Agent>,
}

impl AppState {
    /// Wire the source, cache, context builder and chat model from config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let cache = Arc::new(KnowledgeBaseCache::new(create_source(config)?));
        let model = create_chat_model(&config.agent)?;
        let system_prompt = load_system_prompt(&config.agent)?;
        Ok(Self::new(config, cache, model, system_prompt))
    }

    pub fn new(
        config: &Config,
        cache: Arc<KnowledgeBaseCache>,
        model: Arc<dyn ChatModel>,
        system_prompt: String,
    ) -> Self {
        let builder = ContextBuilder::new(cache, &config.context);
        Self {
            agent: Arc::new(Agent::new(builder, model, system_prompt)),
        }
    }

    pub fn cache(&self) -> &Arc<KnowledgeBaseCache> {
        self.agent.builder().cache()
    }
}

/// All routes with CORS applied.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/agent", post(handle_agent))
        .route("/context", post(handle_context))
        .route("/health", get(handle_health))
        .route("/kb/stats", get(handle_kb_stats))
        .fallback(handle_not_found)
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind` and runs until the process is
/// terminated. With `warm_on_start`, the knowledge base is loaded in the
/// background right away instead of on the first request.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;

    if config.server.warm_on_start {
        let cache = state.cache().clone();
        tokio::spawn(async move {
            cache.load().await;
        });
    }

    let app = router(state);
    let bind_addr = config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(bind = %bind_addr, "triage server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

async fn handle_not_found(uri: Uri) -> AppError {
    not_found(format!("no route for {}", uri.path()))
}

// ============ POST /agent ============

async fn handle_agent(
    State(state): State<AppState>,
    Json(request): Json<AgentRequest>,
) -> Result<Response, AppError> {
    if !request.has_species() {
        return Err(bad_request("pet.species is required"));
    }

    let reply = state.agent.process(&request).await;
    let status = if reply.ok {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(reply)).into_response())
}

// ============ POST /context ============

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContextRequest {
    #[serde(default)]
    pet: Value,
    #[serde(default)]
    symptom_keys: Value,
    #[serde(default)]
    user_lang: Option<String>,
    #[serde(default)]
    user_level: Option<String>,
}

async fn handle_context(
    State(state): State<AppState>,
    Json(request): Json<ContextRequest>,
) -> Json<Value> {
    let symptom_keys = normalize_symptom_keys(&request.symptom_keys);
    let payload = state
        .agent
        .builder()
        .build_json(
            &request.pet,
            &symptom_keys,
            request.user_lang.as_deref(),
            request.user_level.as_deref(),
        )
        .await;
    Json(payload)
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    version: String,
    kb_loaded: bool,
    loaded_at: Option<DateTime<Utc>>,
    fingerprint: Option<String>,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let kb = state.cache().get();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        kb_loaded: kb.is_some(),
        loaded_at: state.cache().loaded_at(),
        fingerprint: kb.and_then(|kb| kb.fingerprint.clone()),
    })
}

// ============ GET /kb/stats ============

async fn handle_kb_stats(State(state): State<AppState>) -> Json<KnowledgeBaseStats> {
    let kb = state.cache().load().await;
    Json(KnowledgeBaseStats::from_kb(&kb))
}
