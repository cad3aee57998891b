//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    CreateSessionResponse, ErrorResponse, FilesResponse, NoticeRequest, QuestionRequest,
    QueuedResponse, SelectSubjectRequest, SessionResponse, SuccessResponse, UploadQuery,
};
use super::AppState;
use crate::backend::{BackendError, BackendErrorKind};
use crate::controller::ControllerError;
use crate::render::render_transcript;
use crate::session::{Workspace, WorkspaceError};
use crate::transcript::TransitionError;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use std::sync::Arc;

/// Largest document accepted for upload
const UPLOAD_LIMIT: usize = 50 * 1024 * 1024;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(close_session))
        // Transcript views
        .route("/api/sessions/:id/view", get(view_session))
        .route("/api/sessions/:id/stream", get(stream_session))
        // Subject library
        .route(
            "/api/sessions/:id/files",
            get(list_files)
                .post(upload_file)
                .layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        .route("/api/sessions/:id/files/:file_id", delete(delete_file))
        .route(
            "/api/sessions/:id/files/:file_id/download",
            get(download_file),
        )
        // Transcript actions
        .route(
            "/api/sessions/:id/subject",
            post(select_subject).delete(clear_subject),
        )
        .route("/api/sessions/:id/questions", post(ask_question))
        .route("/api/sessions/:id/notices", post(post_notice))
        .with_state(state)
}

async fn workspace(state: &AppState, id: &str) -> Result<Arc<Workspace>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))
}

// ============================================================
// Session Lifecycle
// ============================================================

async fn create_session(State(state): State<AppState>) -> Json<CreateSessionResponse> {
    let (session_id, _) = state.sessions.create().await;
    Json(CreateSessionResponse { session_id })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let ws = workspace(&state, &id).await?;
    let transcript = ws.controller().snapshot();
    Ok(Json(SessionResponse {
        busy: transcript.is_busy(),
        transcript,
        subjects: ws.subjects().await,
    }))
}

async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.sessions.remove(&id).await {
        return Err(AppError::NotFound(format!("Session not found: {id}")));
    }
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Transcript Views
// ============================================================

async fn view_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let ws = workspace(&state, &id).await?;
    let transcript = ws.controller().snapshot();
    Ok(Html(render_transcript(&transcript, state.markup)))
}

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let ws = workspace(&state, &id).await?;
    Ok(sse_stream(ws.controller().subscribe()))
}

// ============================================================
// Subject Library
// ============================================================

async fn list_files(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FilesResponse>, AppError> {
    let ws = workspace(&state, &id).await?;
    let files = ws.refresh_subjects().await?;
    Ok(Json(FilesResponse { files }))
}

async fn upload_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<FilesResponse>, AppError> {
    let ws = workspace(&state, &id).await?;
    ws.upload(&query.filename, body.to_vec()).await?;
    Ok(Json(FilesResponse {
        files: ws.subjects().await,
    }))
}

async fn delete_file(
    State(state): State<AppState>,
    Path((id, file_id)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, AppError> {
    let ws = workspace(&state, &id).await?;
    ws.delete(&file_id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn download_file(
    State(state): State<AppState>,
    Path((id, file_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let ws = workspace(&state, &id).await?;
    let filename = ws
        .subjects()
        .await
        .into_iter()
        .find(|s| s.id == file_id)
        .map_or_else(|| file_id.clone(), |s| s.filename);
    let bytes = ws.download(&file_id).await?;

    let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', ""));
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

// ============================================================
// Transcript Actions
// ============================================================

async fn select_subject(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SelectSubjectRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let ws = workspace(&state, &id).await?;
    ws.select(&req.subject_id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn clear_subject(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let ws = workspace(&state, &id).await?;
    ws.controller().clear_subject().await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn ask_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<QuestionRequest>,
) -> Result<Json<QueuedResponse>, AppError> {
    let ws = workspace(&state, &id).await?;
    ws.controller().submit_question(req.question).await?;
    Ok(Json(QueuedResponse { queued: true }))
}

async fn post_notice(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<NoticeRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let ws = workspace(&state, &id).await?;
    ws.controller().append_system_turn(req.text).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    BadGateway(String),
    Internal(String),
}

impl From<BackendError> for AppError {
    fn from(e: BackendError) -> Self {
        match e.kind {
            BackendErrorKind::NotFound => AppError::NotFound(e.message),
            BackendErrorKind::Validation => AppError::BadRequest(e.message),
            BackendErrorKind::Network | BackendErrorKind::Server | BackendErrorKind::Unknown => {
                AppError::BadGateway(e.message)
            }
        }
    }
}

impl From<ControllerError> for AppError {
    fn from(e: ControllerError) -> Self {
        let message = e.to_string();
        match e {
            ControllerError::Rejected(TransitionError::EmptyQuestion | TransitionError::NoSubject) => {
                AppError::BadRequest(message)
            }
            ControllerError::Rejected(TransitionError::Busy | TransitionError::Hydrating) => {
                AppError::Conflict(message)
            }
            ControllerError::Rejected(TransitionError::Stale(_)) | ControllerError::Stopped => {
                AppError::Internal(message)
            }
        }
    }
}

impl From<WorkspaceError> for AppError {
    fn from(e: WorkspaceError) -> Self {
        match e {
            WorkspaceError::UnknownSubject(_) => AppError::NotFound(e.to_string()),
            WorkspaceError::Backend(e) => e.into(),
            WorkspaceError::Controller(e) => e.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
