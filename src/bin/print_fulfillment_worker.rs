//! Print Fulfillment Worker Binary
//!
//! Runs the batch scheduler and the three queue consumers until Ctrl-C.

use anyhow::Context;
use tokio::signal;
use tracing::info;

use print_fulfillment::config::ConfigManager;
use print_fulfillment::logging::init_structured_logging;
use print_fulfillment::orchestration::{Collaborators, PrintFulfillmentSystem};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_structured_logging();

    let manager = ConfigManager::load().context("loading configuration")?;
    info!(
        environment = %manager.environment(),
        "🚀 Starting print fulfillment worker"
    );
    info!(config = %manager.debug_config(), "Effective configuration");

    let (collaborators, database) = Collaborators::connect(manager.config())
        .await
        .context("connecting to PostgreSQL")?;

    let system = PrintFulfillmentSystem::build(manager.config(), collaborators);
    system
        .create_queues()
        .await
        .context("creating pgmq queues")?;

    let handle = system.start();

    signal::ctrl_c().await?;
    info!("Shutdown signal received");

    handle.stop().await.context("stopping worker")?;
    database.close().await;
    info!("Print fulfillment worker stopped");

    Ok(())
}
