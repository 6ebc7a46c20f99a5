use crate::models::Document;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;

/// Session used by clients that never name one.
pub const DEFAULT_SESSION: &str = "default";

fn session_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid session id regex"))
}

pub fn validate_session_id(id: &str) -> bool {
    session_id_pattern().is_match(id)
}

/// Picks the effective session: the first non-empty candidate, or the default.
/// Returns `None` when that candidate is not a valid id.
pub fn resolve_session_id<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<String> {
    let chosen = candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|id| !id.is_empty())
        .unwrap_or(DEFAULT_SESSION);

    validate_session_id(chosen).then(|| chosen.to_string())
}

/// Extracted documents keyed by session. Each session holds at most one
/// document and every upload replaces it.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    documents: Arc<RwLock<HashMap<String, Document>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn replace(&self, session_id: &str, document: Document) -> Option<Document> {
        let previous = self
            .documents
            .write()
            .await
            .insert(session_id.to_string(), document);
        if let Some(prev) = &previous {
            log::debug!("Session '{}' dropped context from '{}'", session_id, prev.filename);
        }
        previous
    }

    pub async fn clear(&self, session_id: &str) -> Option<Document> {
        self.documents.write().await.remove(session_id)
    }

    pub async fn get(&self, session_id: &str) -> Option<Document> {
        self.documents.read().await.get(session_id).cloned()
    }

    /// Text to answer from, or `None` if nothing usable was extracted yet.
    pub async fn context(&self, session_id: &str) -> Option<String> {
        self.documents
            .read()
            .await
            .get(session_id)
            .filter(|doc| !doc.is_blank())
            .map(|doc| doc.content.clone())
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn doc(name: &str, text: &str) -> Document {
        Document::new(name, PathBuf::from(name), text.to_string())
    }

    #[test]
    fn session_ids_are_path_safe() {
        assert!(validate_session_id("default"));
        assert!(validate_session_id("3f2b6c1e-0d7a-4c4e-9d35-1b8f0a2e7c11"));
        assert!(!validate_session_id("../etc"));
        assert!(!validate_session_id(""));
        assert!(!validate_session_id(&"a".repeat(65)));
    }

    #[test]
    fn resolve_prefers_first_non_empty_candidate() {
        assert_eq!(resolve_session_id([None, None]).as_deref(), Some(DEFAULT_SESSION));
        assert_eq!(resolve_session_id([Some("  "), Some("team-a")]).as_deref(), Some("team-a"));
        assert_eq!(resolve_session_id([Some("hdr"), Some("form")]).as_deref(), Some("hdr"));
        assert_eq!(resolve_session_id([Some("no/slashes")]), None);
    }

    #[tokio::test]
    async fn replace_overwrites_previous_document() {
        let store = SessionStore::new();
        assert!(store.replace(DEFAULT_SESSION, doc("first.pdf", "alpha")).await.is_none());

        let previous = store.replace(DEFAULT_SESSION, doc("second.pdf", "beta")).await;

        assert_eq!(previous.map(|d| d.filename).as_deref(), Some("first.pdf"));
        assert_eq!(store.context(DEFAULT_SESSION).await.as_deref(), Some("beta"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn sessions_do_not_share_context() {
        let store = SessionStore::new();
        store.replace("a", doc("a.pdf", "apples")).await;
        store.replace("b", doc("b.pdf", "bananas")).await;

        assert_eq!(store.context("a").await.as_deref(), Some("apples"));
        assert_eq!(store.context("b").await.as_deref(), Some("bananas"));
        assert!(store.context(DEFAULT_SESSION).await.is_none());
    }

    #[tokio::test]
    async fn blank_document_has_no_context() {
        let store = SessionStore::new();
        store.replace("s", doc("scan.pdf", "   \n")).await;

        assert!(store.get("s").await.is_some());
        assert!(store.context("s").await.is_none());

        store.clear("s").await;
        assert!(store.is_empty().await);
    }
}
