use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct AskPayload {
    pub question: Option<String>,
    pub session_id: Option<String>,
}
