use crate::api_error::*;
use crate::api_response::UploadResponse;
use crate::app::{AppState, SESSION_HEADER};
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{HeaderMap, StatusCode},
    Json,
};
use qa_system::document_processor::{is_pdf_filename, sanitize_filename};
use qa_system::session_store::resolve_session_id;

struct FilePart {
    filename: String,
    bytes: Bytes,
}

/// Body-limit overruns surface while streaming fields; report them as such.
fn multipart_error(e: MultipartError, what: &str) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        log::warn!("Upload rejected: {}", e);
        ApiError::PayloadTooLarge(UPLOAD_TOO_LARGE.to_string())
    } else {
        ApiError::BadRequest(format!("{}: {}", what, e))
    }
}

pub async fn upload_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|rejection| {
        log::debug!("Upload without a multipart body: {}", rejection);
        ApiError::bad_request(NO_FILE_PART)
    })?;

    let mut file: Option<FilePart> = None;
    let mut form_session: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Malformed multipart body"))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            // A `file` part without a filename is a plain form value, not an upload.
            Some("file") if file.is_none() && field.file_name().is_some() => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, "Failed to read upload"))?;
                file = Some(FilePart { filename, bytes });
            }
            Some("session_id") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, "Failed to read session_id"))?;
                form_session = Some(value);
            }
            _ => {}
        }
    }

    let FilePart { filename, bytes } = file.ok_or_else(|| ApiError::bad_request(NO_FILE_PART))?;
    if filename.trim().is_empty() {
        return Err(ApiError::bad_request(NO_SELECTED_FILE));
    }
    if !is_pdf_filename(&filename) {
        return Err(ApiError::bad_request(INVALID_FORMAT));
    }
    let filename = sanitize_filename(&filename).ok_or_else(|| ApiError::bad_request(NO_SELECTED_FILE))?;

    let header_session = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok());
    let session_id = resolve_session_id([header_session, form_session.as_deref()])
        .ok_or_else(|| ApiError::bad_request(INVALID_SESSION))?;

    let processor = state.processor.clone();
    let task_session = session_id.clone();
    let task_filename = filename.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        processor.process_upload(&task_session, &task_filename, &bytes)
    })
    .await
    .unwrap_or_else(|join_error| Err(anyhow::anyhow!("extraction task failed: {}", join_error)));

    match outcome {
        Ok(document) => {
            log::info!("File '{}' submitted successfully (session '{}')", filename, session_id);
            log::debug!("Extracted text:\n{}", document.content);
            state.store.replace(&session_id, document).await;

            Ok(Json(UploadResponse {
                message: format!("File '{}' submitted successfully and text extracted.", filename),
                session_id,
            }))
        }
        Err(e) => {
            log::error!("Failed to process '{}': {:#}", filename, e);
            state.store.clear(&session_id).await;
            Err(ApiError::Internal(format!("Error processing file: {:#}", e)))
        }
    }
}
