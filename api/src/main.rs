mod api_error;
mod api_response;
mod app;
mod ask_handler;
mod ask_payload;
mod config;
mod upload_handler;

use anyhow::{Context, Result};
use app::{create_router, AppState};
use config::ServerConfig;
use qa_system::{load_answerer, DocumentProcessor};

#[tokio::main]
async fn main() {
    // Initialize environment variables and logging
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        log::error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: ServerConfig) -> Result<()> {
    let processor = DocumentProcessor::new(&config.upload_dir);
    processor.ensure_upload_dir()?;

    // Model loading reads hundreds of megabytes; keep it off the runtime threads.
    let qa_config = config.qa.clone();
    let answerer = tokio::task::spawn_blocking(move || load_answerer(&qa_config)).await??;
    log::info!(
        "QA backend '{}' ready, uploads go to {}",
        answerer.backend_name(),
        processor.upload_dir().display()
    );

    let app = create_router(AppState::new(processor, answerer), config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    log::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
