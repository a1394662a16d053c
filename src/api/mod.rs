//! HTTP API server exposing the agent endpoint.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::core::agent::{Agent, LlmProvider};
use crate::core::session::{DEFAULT_USER_ID, SessionStore};

/// Shared application state.
pub struct AppState {
    /// The LLM provider (absent when no API key is configured).
    pub provider: Option<Arc<dyn LlmProvider>>,

    /// In-memory session registry.
    pub sessions: SessionStore,

    /// Model identifier for agent requests.
    pub model: String,

    /// Token cap per reply.
    pub max_tokens: u32,

    /// Instruction persona bound to every session.
    pub instruction: String,
}

impl AppState {
    /// Build state from configuration.
    ///
    /// A missing API key leaves the provider unset; requests then fail with
    /// the session-initialization error rather than at startup.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            provider: config.agent.create_provider().ok(),
            sessions: SessionStore::default(),
            model: config.agent.model.clone(),
            max_tokens: config.agent.max_tokens,
            instruction: config.agent.instruction.clone(),
        }
    }
}

type SharedState = Arc<AppState>;

/// `OpenAPI` documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "TaskPilot API",
        description = "HTTP API for the TaskPilot agent endpoint",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(health, run_agent),
    components(schemas(AgentRequest, AgentReply))
)]
struct ApiDoc;

/// Request body for the agent endpoint.
#[derive(Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    /// The user message to forward to the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Session to continue; defaults to the fixed shared session when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Response body for a successful agent reply.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentReply {
    /// The concatenated agent reply.
    pub reply: String,

    /// Session id to echo back on the next request.
    pub session_id: String,
}

/// Build the application router.
#[must_use]
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/agent", post(run_agent).fallback(method_not_allowed))
        .route("/health", get(health))
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP API server.
///
/// # Errors
///
/// Returns an error if the server fails to bind or start.
pub async fn serve(config: &Config, host: &str, port: u16) -> anyhow::Result<()> {
    let state: SharedState = Arc::new(AppState::from_config(config));

    if state.provider.is_none() {
        tracing::warn!(
            api_key_env = %config.agent.api_key_env,
            "no API key configured; agent requests will fail"
        );
    }

    let app = router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "starting HTTP API server");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service healthy", body = String))
)]
async fn health() -> &'static str {
    "ok"
}

/// Non-POST methods on the agent route.
async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "message": "Method not allowed" })),
    )
        .into_response()
}

/// Forward a message to the agent and return the concatenated reply.
///
/// Resolves the session (creating it on first use), streams the agent's
/// events, and accumulates the final text in emission order. The handler
/// future is dropped when the client disconnects, which cancels the
/// upstream provider stream.
#[utoipa::path(
    post,
    path = "/api/agent",
    request_body = AgentRequest,
    responses(
        (status = 200, description = "Agent reply", body = AgentReply),
        (status = 400, description = "Missing message"),
        (status = 405, description = "Method not allowed"),
        (status = 500, description = "Agent failure")
    )
)]
async fn run_agent(State(state): State<SharedState>, Json(request): Json<AgentRequest>) -> Response {
    let Some(message) = request.message.as_deref().filter(|m| !m.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Message is required." })),
        )
            .into_response();
    };

    let Some(provider) = state.provider.clone() else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to initialize agent session." })),
        )
            .into_response();
    };

    let (session_id, conversation) = state.sessions.resolve(
        DEFAULT_USER_ID,
        request.session_id.as_deref(),
        &state.instruction,
    );

    let mut agent = Agent::resume(provider, &state.model, state.max_tokens, conversation);

    match agent.reply(message).await {
        Ok(reply) => {
            state
                .sessions
                .commit(DEFAULT_USER_ID, &session_id, agent.into_conversation());

            (StatusCode::OK, Json(AgentReply { reply, session_id })).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, session_id = %session_id, "agent request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Something went wrong." })),
            )
                .into_response()
        }
    }
}
