use anyhow::Result;
use clap::Parser;
use swift_upload::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("Upload finished"),
        Err(e) => tracing::error!(error = ?e, "Upload failed"),
    }
    result
}
