use anyhow::{Context, Result};
use qa_system::{BackendKind, QaModelConfig};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub upload_dir: PathBuf,
    /// `None` leaves request bodies unbounded.
    pub max_upload_bytes: Option<usize>,
    pub qa: QaModelConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = QaModelConfig::default();

        let qa = QaModelConfig {
            backend: parse_or(&get, "QA_BACKEND", BackendKind::Auto)?,
            model_path: get("QA_MODEL_PATH").map(PathBuf::from).unwrap_or(defaults.model_path),
            tokenizer_path: get("QA_TOKENIZER_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.tokenizer_path),
            max_seq_len: parse_or(&get, "QA_MAX_SEQ_LEN", defaults.max_seq_len)?,
            doc_stride: parse_or(&get, "QA_DOC_STRIDE", defaults.doc_stride)?,
            max_answer_len: parse_or(&get, "QA_MAX_ANSWER_LEN", defaults.max_answer_len)?,
            intra_threads: parse_or(&get, "QA_INTRA_THREADS", defaults.intra_threads)?,
        };

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<usize>()
                    .with_context(|| format!("MAX_UPLOAD_BYTES must be a byte count, got '{}'", raw))?,
            ),
            None => None,
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:5000".to_string()),
            upload_dir: get("UPLOAD_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("uploads")),
            max_upload_bytes,
            qa,
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {} '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:5000");
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.max_upload_bytes, None);
        assert_eq!(config.qa.backend, BackendKind::Auto);
        assert_eq!(config.qa.max_seq_len, 384);
        assert_eq!(config.qa.doc_stride, 128);
        assert_eq!(config.qa.max_answer_len, 15);
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("UPLOAD_DIR", "/tmp/pdfs"),
            ("QA_BACKEND", "keyword"),
            ("QA_DOC_STRIDE", "64"),
            ("MAX_UPLOAD_BYTES", "1048576"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/pdfs"));
        assert_eq!(config.qa.backend, BackendKind::Keyword);
        assert_eq!(config.qa.doc_stride, 64);
        assert_eq!(config.max_upload_bytes, Some(1_048_576));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[("UPLOAD_DIR", "  ")]).unwrap();
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        assert!(config_from(&[("QA_MAX_SEQ_LEN", "lots")]).is_err());
        assert!(config_from(&[("MAX_UPLOAD_BYTES", "-1")]).is_err());
        assert!(config_from(&[("QA_BACKEND", "gemini")]).is_err());
    }
}
