//! Wires the components of a local cluster together and runs it to completion.

use crate::config::ClusterConfig;
use crate::coordinator::master::{Master, RunSummary};
use crate::executor::pool::WorkerPool;
use crate::executor::types::WorkOrder;
use crate::executor::worker::Worker;
use crate::ingestion::collector::{CollectedResults, Collector};
use crate::ingestion::reader::BatchReader;
use crate::transport::fetcher::PayloadFetcher;
use crate::transport::proxy::PayloadProxy;

use anyhow::Result;
use tokio::io::AsyncBufRead;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub results: CollectedResults,
}

/// Runs every record of `reader` through a pool of local workers and returns
/// once the collector has written the last result.
pub async fn run<R>(
    config: &ClusterConfig,
    reader: BatchReader<R>,
    collector: Collector,
) -> Result<RunOutcome>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (pool, pool_task) = WorkerPool::<WorkOrder>::spawn();
    let (collector, collector_task) = collector.spawn();
    let (reader, reader_task) = reader.spawn();

    let (transport, transport_task) = match &config.transport {
        Some(transport_config) => {
            let (handle, addr, task) = PayloadProxy::start(transport_config).await?;
            tracing::info!("Oversized work items are served from {}", addr);
            (Some(handle), Some(task))
        }
        None => (None, None),
    };

    let master = Master::new(reader, collector, pool, transport, config.max_inline_bytes);
    let handle = master.handle();
    let master_task = master.spawn();

    let workers = Worker::spawn_many(config.worker_count, &handle, &PayloadFetcher::new());
    handle.start();
    drop(handle);

    let summary = master_task.await?;

    pool_task.await?;
    reader_task.await?;
    if let Some(task) = transport_task {
        task.await?;
    }
    for worker in workers {
        worker.await?;
    }
    let results = collector_task.await??;

    Ok(RunOutcome { summary, results })
}
