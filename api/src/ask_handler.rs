use crate::api_error::*;
use crate::app::{AppState, SESSION_HEADER};
use crate::ask_payload::AskPayload;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use qa_system::session_store::resolve_session_id;
use qa_system::Answer;

pub async fn ask_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AskPayload>, JsonRejection>,
) -> Result<Json<Answer>, ApiError> {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            log::debug!("Unreadable ask payload: {}", rejection);
            AskPayload::default()
        }
    };

    let question = payload
        .question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::bad_request(QUESTION_MISSING))?
        .to_string();

    let header_session = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok());
    let session_id = resolve_session_id([header_session, payload.session_id.as_deref()])
        .ok_or_else(|| ApiError::bad_request(INVALID_SESSION))?;

    let context = state
        .store
        .context(&session_id)
        .await
        .ok_or_else(|| ApiError::bad_request(NO_TEXT))?;

    log::info!("Question for session '{}': {}", session_id, question);

    let answerer = state.answerer.clone();
    let answer = tokio::task::spawn_blocking(move || answerer.answer(&question, &context))
        .await
        .map_err(|e| ApiError::Internal(format!("Error answering question: {}", e)))?
        .map_err(|e| {
            log::error!("Inference failed: {:#}", e);
            ApiError::Internal(format!("Error answering question: {:#}", e))
        })?;

    log::debug!("Answer (score {:.4}): {}", answer.score, answer.answer);
    Ok(Json(answer))
}
