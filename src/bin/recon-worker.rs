//! Worker process entrypoint.
//!
//! Runs both dispatch paths against one shared pool: the polling loop
//! claiming pending jobs on its interval, and the ingestion queue worker
//! consuming queued requests under the queue retry policy.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use recon_core::clients::accounting::{AccountingApiClient, AccountingGateway};
use recon_core::clients::pos::{PosApiClient, PosGateway};
use recon_core::config::ConfigManager;
use recon_core::database::DatabaseConnection;
use recon_core::messaging::PgmqClient;
use recon_core::orchestration::{
    IngestionQueueWorker, InvoiceSynchronizer, JobClaimer, LoteProcessor,
    TransactionRegistrar, ValidationPipeline, WorkerLoop,
};

#[tokio::main]
async fn main() -> Result<()> {
    recon_core::logging::init_structured_logging();

    let manager = ConfigManager::load()?;
    let config = manager.config().clone();

    info!(
        environment = manager.environment(),
        config = %manager.debug_config(),
        "Starting reconciliation worker"
    );

    let database = DatabaseConnection::connect(&config.database).await?;
    database.migrate().await?;
    let pool = database.pool().clone();

    let pos: Arc<dyn PosGateway> = Arc::new(PosApiClient::new(config.pos.clone())?);
    let accounting: Arc<dyn AccountingGateway> =
        Arc::new(AccountingApiClient::new(config.accounting.clone())?);

    let claimer = Arc::new(JobClaimer::new(pool.clone()));
    let processor = Arc::new(LoteProcessor::new(
        pool.clone(),
        Arc::clone(&pos),
        TransactionRegistrar::new(pool.clone()),
        ValidationPipeline::new(pool.clone(), Arc::clone(&pos), Arc::clone(&accounting)),
        InvoiceSynchronizer::new(pool.clone(), Arc::clone(&accounting)),
    ));

    let queue = PgmqClient::new_with_pool(pool.clone()).await;
    queue.create_queue(&config.queue.ingestion_queue).await?;

    let worker_loop = WorkerLoop::new(
        pool.clone(),
        Arc::clone(&claimer),
        Arc::clone(&processor),
        &config.worker,
    );
    let queue_worker = IngestionQueueWorker::new(
        pool,
        queue,
        claimer,
        processor,
        config.queue.clone(),
    );

    tokio::join!(worker_loop.run(), queue_worker.run());

    Ok(())
}
