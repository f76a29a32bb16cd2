//! HTTP request handlers

use super::assets::{get_index_html, serve_static};
use super::types::{
    AppInfoResponse, ChatRequest, ChatResponse, CreateSessionResponse, ErrorResponse, ImageInfo,
    SessionResponse, SuccessResponse, TurnView, UploadImageRequest,
};
use super::AppState;
use crate::chat::TurnError;
use crate::llm::LlmErrorKind;
use crate::session::{Session, SessionHandle};
use crate::system_prompt::{APP_EMOJI, APP_NAME};
use crate::upload::{decode_upload_base64, normalize_upload, ImageError, ImagePayload};
use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::sync::MutexGuard;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    // base64 inflates by 4/3; leave room for the JSON wrapper
    let body_limit = (state.max_upload_bytes / 3)
        .saturating_mul(4)
        .saturating_add(64 * 1024);

    Router::new()
        // Root serves the page
        .route("/", get(serve_spa))
        .route("/assets/*path", get(serve_static))
        .route("/api/app", get(app_info))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/image", post(upload_image).delete(clear_image))
        .route("/api/sessions/:id/chat", post(send_chat))
        .route("/api/sessions/:id/reset", post(reset_session))
        .route("/version", get(get_version))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

// ============================================================
// Page
// ============================================================

async fn serve_spa() -> impl IntoResponse {
    match get_index_html() {
        Some(content) => Html(content).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - UI not found</h1>".to_string()),
        )
            .into_response(),
    }
}

async fn app_info(State(state): State<AppState>) -> Json<AppInfoResponse> {
    let settings = state.chat.settings();
    Json(AppInfoResponse {
        app_name: APP_NAME,
        app_emoji: APP_EMOJI,
        model: state.chat.model_id().to_string(),
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
    })
}

// ============================================================
// Session lifecycle
// ============================================================

async fn create_session(State(state): State<AppState>) -> Json<CreateSessionResponse> {
    let id = state.sessions.create().await;
    let live_sessions = state.sessions.count().await;
    tracing::info!(session_id = %id, live_sessions, "Session created");
    Json(CreateSessionResponse { id })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = find_session(&state, &id).await?;
    let session = handle.lock().await;
    Ok(Json(session_view(id, &session)))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    if state.sessions.remove(&id).await {
        Ok(Json(SuccessResponse { success: true }))
    } else {
        Err(AppError::NotFound(format!("Session not found: {id}")))
    }
}

async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let handle = find_session(&state, &id).await?;
    let mut session = lock_idle(&handle)?;
    session.reset();
    tracing::info!(session_id = %id, "Workspace cleared");
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Image slot
// ============================================================

async fn upload_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UploadImageRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = find_session(&state, &id).await?;
    let max_bytes = state.max_upload_bytes;

    // Decoding and JPEG encoding are CPU-bound
    let payload = tokio::task::spawn_blocking(move || {
        let bytes = decode_upload_base64(&req.data, max_bytes)?;
        normalize_upload(&bytes)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Image task failed: {e}")))??;

    let (width, height) = payload.dimensions();
    let mut session = lock_idle(&handle)?;
    session.set_image(Some(payload));
    tracing::info!(session_id = %id, width, height, "Image attached");

    Ok(Json(session_view(id, &session)))
}

async fn clear_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let handle = find_session(&state, &id).await?;
    lock_idle(&handle)?.set_image(None);
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Chat
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let handle = find_session(&state, &id).await?;
    // The guard is held across the backend call, so a second submission for
    // this session is rejected until the first one finishes.
    let mut session = lock_idle(&handle)?;

    let reply = state
        .chat
        .handle_user_input(&mut session, &req.text)
        .await?;

    Ok(Json(ChatResponse::new(reply)))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("atelier ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Helpers
// ============================================================

async fn find_session(state: &AppState, id: &str) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))
}

/// Lock a session that is not mid-turn
fn lock_idle(handle: &SessionHandle) -> Result<MutexGuard<'_, Session>, AppError> {
    handle.try_lock().map_err(|_| {
        AppError::Conflict("A reply is still being prepared for this session".to_string())
    })
}

fn session_view(id: String, session: &Session) -> SessionResponse {
    SessionResponse {
        id,
        turns: session.all_turns().iter().map(TurnView::from).collect(),
        image: session.image().map(image_info),
    }
}

fn image_info(image: &ImagePayload) -> ImageInfo {
    let (width, height) = image.dimensions();
    ImageInfo {
        data_url: image.data_url(),
        width,
        height,
    }
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    PayloadTooLarge(String),
    Upstream { status: StatusCode, message: String },
    Internal(String),
}

impl From<ImageError> for AppError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::TooLarge { .. } => AppError::PayloadTooLarge(e.to_string()),
            ImageError::Encode(_) => AppError::Internal(e.to_string()),
            ImageError::Empty
            | ImageError::InvalidBase64(_)
            | ImageError::Unsupported(_)
            | ImageError::Decode(_) => AppError::BadRequest(e.to_string()),
        }
    }
}

impl From<TurnError> for AppError {
    fn from(e: TurnError) -> Self {
        match &e {
            TurnError::EmptyInput => AppError::BadRequest(e.to_string()),
            TurnError::Backend(llm) => {
                let status = match llm.kind {
                    LlmErrorKind::Network => StatusCode::GATEWAY_TIMEOUT,
                    LlmErrorKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
                    LlmErrorKind::ServerError
                    | LlmErrorKind::Auth
                    | LlmErrorKind::InvalidRequest
                    | LlmErrorKind::Unknown => StatusCode::BAD_GATEWAY,
                };
                AppError::Upstream {
                    status,
                    message: e.to_string(),
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Upstream { status, message } => (status, message),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
