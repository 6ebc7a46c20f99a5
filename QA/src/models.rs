use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub path: PathBuf,
    pub content: String,
    pub uploaded_at: SystemTime,
}

impl Document {
    pub fn new(filename: impl Into<String>, path: PathBuf, content: String) -> Self {
        Self {
            filename: filename.into(),
            path,
            content,
            uploaded_at: SystemTime::now(),
        }
    }

    /// True when extraction produced nothing a question could be answered from.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// An answer span picked out of the context.
///
/// `start` and `end` are byte offsets into the context the question was asked
/// against, so `&context[start..end]` is the raw span before trimming. The
/// keyword backend joins wrapped lines, so its `answer` may show a space where
/// that span has a line break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub score: f32,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Auto,
    Onnx,
    Keyword,
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(BackendKind::Auto),
            "onnx" => Ok(BackendKind::Onnx),
            "keyword" => Ok(BackendKind::Keyword),
            other => Err(anyhow::anyhow!(
                "unknown QA backend '{}', expected auto, onnx or keyword",
                other
            )),
        }
    }
}

/// Settings for loading a question-answering backend.
#[derive(Debug, Clone)]
pub struct QaModelConfig {
    pub backend: BackendKind,
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub max_seq_len: usize,
    pub doc_stride: usize,
    pub max_answer_len: usize,
    pub intra_threads: usize,
}

impl Default for QaModelConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Auto,
            model_path: PathBuf::from("models/qa.onnx"),
            tokenizer_path: PathBuf::from("models/tokenizer.json"),
            max_seq_len: 384,
            doc_stride: 128,
            max_answer_len: 15,
            intra_threads: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_parses_case_insensitively() {
        assert_eq!("ONNX".parse::<BackendKind>().unwrap(), BackendKind::Onnx);
        assert_eq!(" keyword ".parse::<BackendKind>().unwrap(), BackendKind::Keyword);
        assert!("gemini".parse::<BackendKind>().is_err());
    }

    #[test]
    fn whitespace_only_document_is_blank() {
        let doc = Document::new("a.pdf", PathBuf::from("uploads/a.pdf"), " \n\t".to_string());
        assert!(doc.is_blank());
    }
}
