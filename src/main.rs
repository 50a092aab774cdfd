// src/main.rs
use anyhow::Result;
use clap::Parser;
use stock_indicator_pipeline::cli::{execute_command, Cli};
use stock_indicator_pipeline::config::Settings;
use stock_indicator_pipeline::error::PipelineError;
use stock_indicator_pipeline::pipeline::Pipeline;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize environment
    dotenv::dotenv().ok();

    // Initialize logging, info unless RUST_LOG says otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Parse command line arguments
    let cli = Cli::parse();

    let outcome = match Settings::load().and_then(Pipeline::from_settings) {
        Ok(pipeline) => execute_command(cli.command, pipeline).await,
        Err(e) => Err(e),
    };

    // Failures are reported, not turned into an exit code
    if let Err(e) = outcome {
        error!("Pipeline failed: {}", e);
        report(&e);
    }

    Ok(())
}

fn report(error: &PipelineError) {
    println!("Error: {}", error);
    for hint in error.hints() {
        println!("  - {}", hint);
    }
}
