//! HTTP server for the SQL Optimizer frontend

use anyhow::Result;
use sql_optimizer::observability::init_tracing;
use sql_optimizer::{server, OptimizerConfig, OptimizerEngine};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();
    init_tracing();

    let config = OptimizerConfig::from_env()?;
    if config.ai_enabled() {
        info!(provider = %config.llm.provider, model = %config.llm.model, "API key found - AI analysis enabled");
    } else {
        warn!("No API key found - serving heuristic analysis only");
    }

    let engine = Arc::new(OptimizerEngine::from_config(&config));
    server::serve(engine, &config.bind_address()).await?;
    Ok(())
}
