pub mod models;
pub mod document_processor;
pub mod session_store;
pub mod answer_service;
pub mod keyword_service;
pub mod onnx_service;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

pub use models::*;
pub use document_processor::DocumentProcessor;
pub use session_store::{SessionStore, DEFAULT_SESSION};
pub use answer_service::{load_answerer, QuestionAnswerer};
pub use keyword_service::KeywordAnswerer;
pub use onnx_service::OnnxAnswerer;
