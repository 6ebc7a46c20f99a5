use crate::keyword_service::KeywordAnswerer;
use crate::models::{Answer, BackendKind, QaModelConfig};
use crate::onnx_service::OnnxAnswerer;
use anyhow::Result;
use std::sync::Arc;

/// Extractive question answering over a plain-text context.
///
/// Implementations are synchronous and may be slow; async callers should run
/// them on a blocking thread.
pub trait QuestionAnswerer: Send + Sync {
    fn answer(&self, question: &str, context: &str) -> Result<Answer>;

    fn backend_name(&self) -> &'static str;
}

pub fn load_answerer(config: &QaModelConfig) -> Result<Arc<dyn QuestionAnswerer>> {
    let model_present = config.model_path.exists() && config.tokenizer_path.exists();

    match config.backend {
        BackendKind::Keyword => {
            log::info!("Using keyword question answering");
            Ok(Arc::new(KeywordAnswerer::new()))
        }
        BackendKind::Onnx => Ok(Arc::new(OnnxAnswerer::load(config)?)),
        BackendKind::Auto if model_present => Ok(Arc::new(OnnxAnswerer::load(config)?)),
        BackendKind::Auto => {
            log::warn!(
                "QA model not found at {} / {}, falling back to keyword answering",
                config.model_path.display(),
                config.tokenizer_path.display()
            );
            Ok(Arc::new(KeywordAnswerer::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn missing_model_config(backend: BackendKind) -> QaModelConfig {
        QaModelConfig {
            backend,
            model_path: PathBuf::from("does/not/exist.onnx"),
            tokenizer_path: PathBuf::from("does/not/exist.json"),
            ..QaModelConfig::default()
        }
    }

    #[test]
    fn auto_falls_back_to_keyword_without_model() {
        let answerer = load_answerer(&missing_model_config(BackendKind::Auto)).unwrap();
        assert_eq!(answerer.backend_name(), "keyword");
    }

    #[test]
    fn forced_onnx_without_model_is_an_error() {
        assert!(load_answerer(&missing_model_config(BackendKind::Onnx)).is_err());
    }
}
