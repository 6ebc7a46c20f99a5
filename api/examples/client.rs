// Uploads a PDF to a running server and asks it a question.
//
//   cargo run -p api --example client -- path/to/doc.pdf "What is this about?"
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let pdf_path = args.next().ok_or("usage: client <pdf> <question>")?;
    let question = args.next().ok_or("usage: client <pdf> <question>")?;
    let base_url = std::env::var("QA_SERVER").unwrap_or_else(|_| "http://127.0.0.1:5000".to_string());

    let client = Client::new();

    println!("Health Check:");
    let health: serde_json::Value = client
        .get(format!("{}/health", base_url))
        .send()
        .await?
        .json()
        .await?;
    println!("{}", serde_json::to_string_pretty(&health)?);

    let session: serde_json::Value = client
        .post(format!("{}/sessions", base_url))
        .send()
        .await?
        .json()
        .await?;
    let session_id = session["session_id"].as_str().unwrap_or("default").to_string();
    println!("\nSession: {}", session_id);

    let filename = std::path::Path::new(&pdf_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload.pdf".to_string());
    let bytes = tokio::fs::read(&pdf_path).await?;
    let form = Form::new()
        .text("session_id", session_id.clone())
        .part("file", Part::bytes(bytes).file_name(filename).mime_str("application/pdf")?);

    println!("\nUpload:");
    let upload = client
        .post(format!("{}/upload", base_url))
        .multipart(form)
        .send()
        .await?;
    println!("Status: {}", upload.status());
    let upload_json: serde_json::Value = upload.json().await?;
    println!("{}", serde_json::to_string_pretty(&upload_json)?);

    println!("\nAsk:");
    let answer = client
        .post(format!("{}/ask", base_url))
        .json(&json!({ "question": question, "session_id": session_id }))
        .send()
        .await?;
    println!("Status: {}", answer.status());
    let answer_json: serde_json::Value = answer.json().await?;
    println!("{}", serde_json::to_string_pretty(&answer_json)?);

    Ok(())
}
