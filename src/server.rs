//! HTTP server for the kitchen.
//!
//! A thin axum transport over [`Kitchen`]. Every handler resolves its
//! inputs, calls one kitchen operation, and serializes the result.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Status, version and recipe count |
//! | `GET`  | `/api/recipes` | `{"recipes": [...]}`, name and description of each |
//! | `GET`  | `/api/recipe/{name}` | One normalized recipe |
//! | `GET`  | `/api/search?q=` | Recipe names containing `q` |
//! | `POST` | `/api/sessions` | Open a cooking session |
//! | `DELETE` | `/api/sessions/{id}` | Close a cooking session |
//! | `POST` | `/api/cook` | Start cooking a recipe |
//! | `POST` | `/api/next` | Advance to the next step |
//! | `POST` | `/api/ask` | Ask a question |
//! | `POST` | `/api/reload` | Re-read the recipe directory |
//!
//! Session-aware endpoints accept an optional `session_id`; without one they
//! use the shared default session. `/api/ask` also accepts the recipe as
//! `current_recipe`.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "no_active_session", "message": "..." } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `no_active_session` (409), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the browser front end
//! can be served from anywhere.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use guided_kitchen_core::models::RecipeSummary;
use guided_kitchen_core::session::{Advance, CookingStart, SessionId};
use guided_kitchen_core::{KitchenError, RecipeRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::catalog::ReloadSummary;
use crate::config::Config;
use crate::kitchen::{AskResponse, Kitchen};

type AppState = Arc<Kitchen>;

/// Load the kitchen from `config` and serve it on the configured address.
///
/// The `PORT` environment variable, when set, overrides the bind port.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let (kitchen, report) = Kitchen::from_config(config)?;
    if !report.skipped.is_empty() {
        info!(skipped = report.skipped.len(), "some recipe files were skipped");
    }

    let bind_addr = config.server.effective_bind();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, recipes = kitchen.recipe_count(), "kitchen server listening");
    println!("Kitchen server listening on http://{}", bind_addr);

    serve(listener, Arc::new(kitchen)).await
}

/// Serve an already-built kitchen on an already-bound listener.
pub async fn serve(
    listener: tokio::net::TcpListener,
    kitchen: Arc<Kitchen>,
) -> anyhow::Result<()> {
    axum::serve(listener, router(kitchen)).await?;
    Ok(())
}

pub fn router(kitchen: Arc<Kitchen>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/recipes", get(handle_list_recipes))
        .route("/api/recipe/{name}", get(handle_get_recipe))
        .route("/api/search", get(handle_search))
        .route("/api/sessions", post(handle_create_session))
        .route("/api/sessions/{id}", delete(handle_close_session))
        .route("/api/cook", post(handle_cook))
        .route("/api/next", post(handle_next))
        .route("/api/ask", post(handle_ask))
        .route("/api/reload", post(handle_reload))
        .layer(cors)
        .with_state(kitchen)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "bad_request",
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal",
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<KitchenError> for AppError {
    fn from(err: KitchenError) -> Self {
        let message = err.to_string();
        match err {
            KitchenError::NotFound(_) | KitchenError::UnknownSession(_) => Self {
                status: StatusCode::NOT_FOUND,
                code: "not_found",
                message,
            },
            KitchenError::NoActiveSession => Self {
                status: StatusCode::CONFLICT,
                code: "no_active_session",
                message,
            },
            KitchenError::EmptyQuestion => Self::bad_request(message),
            KitchenError::MalformedSource { .. } | KitchenError::StorageNotDirectory(_) => {
                Self::internal(message)
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    recipes: usize,
}

async fn handle_health(State(kitchen): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        recipes: kitchen.recipe_count(),
    })
}

// ============ Recipes ============

#[derive(Serialize)]
struct RecipeListResponse {
    recipes: Vec<RecipeSummary>,
}

async fn handle_list_recipes(State(kitchen): State<AppState>) -> Json<RecipeListResponse> {
    Json(RecipeListResponse {
        recipes: kitchen.list_recipes(),
    })
}

async fn handle_get_recipe(
    State(kitchen): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<RecipeRecord>, AppError> {
    Ok(Json(kitchen.get_recipe(&name)?))
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

#[derive(Serialize)]
struct SearchResponse {
    query: String,
    results: Vec<String>,
}

async fn handle_search(
    State(kitchen): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let results = kitchen.search(&params.q);
    Json(SearchResponse {
        query: params.q,
        results,
    })
}

// ============ Sessions ============

#[derive(Serialize)]
struct SessionResponse {
    session_id: SessionId,
}

async fn handle_create_session(
    State(kitchen): State<AppState>,
) -> (StatusCode, Json<SessionResponse>) {
    let session_id = kitchen.create_session();
    (StatusCode::CREATED, Json(SessionResponse { session_id }))
}

async fn handle_close_session(
    State(kitchen): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: SessionId = id.parse()?;
    kitchen.close_session(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct CookRequest {
    recipe_name: String,
    #[serde(default)]
    session_id: Option<SessionId>,
}

#[derive(Serialize)]
struct CookResponse {
    success: bool,
    #[serde(flatten)]
    start: CookingStart,
    message: String,
}

async fn handle_cook(
    State(kitchen): State<AppState>,
    body: Result<Json<CookRequest>, JsonRejection>,
) -> Result<Json<CookResponse>, AppError> {
    let Json(req) = body?;
    let start = kitchen.start_cooking(req.session_id.as_ref(), &req.recipe_name)?;
    let message = format!(
        "Let's cook {}! Gather your ingredients, then ask for the next step.",
        start.recipe_name
    );
    Ok(Json(CookResponse {
        success: true,
        start,
        message,
    }))
}

#[derive(Deserialize, Default)]
struct NextRequest {
    #[serde(default)]
    session_id: Option<SessionId>,
}

/// The body is optional here: an empty request advances the default session.
async fn handle_next(
    State(kitchen): State<AppState>,
    body: Bytes,
) -> Result<Json<Advance>, AppError> {
    let req: NextRequest = if body.iter().all(u8::is_ascii_whitespace) {
        NextRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::bad_request(e.to_string()))?
    };
    Ok(Json(kitchen.advance_step(req.session_id.as_ref())?))
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default, alias = "current_recipe")]
    recipe_name: Option<String>,
    #[serde(default)]
    session_id: Option<SessionId>,
}

async fn handle_ask(
    State(kitchen): State<AppState>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, AppError> {
    let Json(req) = body?;
    let reply = kitchen
        .ask(
            &req.question,
            req.recipe_name.as_deref(),
            req.session_id.as_ref(),
        )
        .await?;
    Ok(Json(reply))
}

// ============ POST /api/reload ============

async fn handle_reload(State(kitchen): State<AppState>) -> Result<Json<ReloadSummary>, AppError> {
    let summary = tokio::task::spawn_blocking(move || kitchen.reload())
        .await
        .map_err(|e| AppError::internal(e.to_string()))?
        .map_err(|e| {
            error!(error = %e, "reload failed");
            AppError::internal(format!("{:#}", e))
        })?;
    Ok(Json(summary))
}
