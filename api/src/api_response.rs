use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub session_id: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
    pub sessions: usize,
}
