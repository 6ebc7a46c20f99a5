// Answers a single question about a PDF from the command line, using the
// same extraction and QA backends as the HTTP server in ../api.

use anyhow::Result;
use clap::Parser;
use qa_system::document_processor::extract_pdf_text;
use qa_system::{load_answerer, BackendKind, QaModelConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "qa_system", about = "Ask a question about a PDF")]
struct Args {
    /// PDF to read
    pdf: PathBuf,

    /// Question to answer from the PDF's text
    question: String,

    /// QA backend: auto, onnx or keyword
    #[arg(long, default_value = "auto")]
    backend: BackendKind,

    #[arg(long, default_value = "models/qa.onnx")]
    model: PathBuf,

    #[arg(long, default_value = "models/tokenizer.json")]
    tokenizer: PathBuf,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let config = QaModelConfig {
        backend: args.backend,
        model_path: args.model,
        tokenizer_path: args.tokenizer,
        ..QaModelConfig::default()
    };
    let answerer = load_answerer(&config)?;

    let text = extract_pdf_text(&args.pdf)?;
    if text.trim().is_empty() {
        return Err(anyhow::anyhow!("no text extracted from {}", args.pdf.display()));
    }

    let answer = answerer.answer(&args.question, &text)?;
    println!("{}", answer.answer);
    println!("score: {:.4} ({} backend)", answer.score, answerer.backend_name());

    Ok(())
}
