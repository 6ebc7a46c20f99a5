use crate::api_response::{HealthResponse, SessionResponse};
use crate::ask_handler::ask_question;
use crate::upload_handler::upload_file;
use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use qa_system::{DocumentProcessor, QuestionAnswerer, SessionStore};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

/// Header a client may use instead of the `session_id` body field.
pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Clone)]
pub struct AppState {
    pub store: SessionStore,
    pub processor: Arc<DocumentProcessor>,
    pub answerer: Arc<dyn QuestionAnswerer>,
}

impl AppState {
    pub fn new(processor: DocumentProcessor, answerer: Arc<dyn QuestionAnswerer>) -> Self {
        Self {
            store: SessionStore::new(),
            processor: Arc::new(processor),
            answerer,
        }
    }
}

pub fn create_router(state: AppState, max_upload_bytes: Option<usize>) -> Router {
    let body_limit = match max_upload_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/upload", post(upload_file))
        .route("/ask", post(ask_question))
        .route("/sessions", post(create_session))
        .route("/health", get(health))
        .layer(body_limit)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn create_session() -> Json<SessionResponse> {
    let session_id = Uuid::new_v4().to_string();
    log::info!("Issued session {}", session_id);
    Json(SessionResponse { session_id })
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        backend: state.answerer.backend_name().to_string(),
        sessions: state.store.len().await,
    })
}
