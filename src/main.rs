use clap::Parser;
use distributed_cracker::cluster;
use distributed_cracker::config::{CliArgs, ClusterConfig};
use distributed_cracker::ingestion::collector::Collector;
use distributed_cracker::ingestion::reader::BatchReader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = ClusterConfig::from_args(&args)?;

    tracing::info!(
        "Cracking {} with {} workers (batch size {})",
        args.input.display(),
        config.worker_count,
        config.batch_size
    );

    let reader = BatchReader::open(&args.input, &config).await?;
    let outcome = cluster::run(&config, reader, Collector::stdout()).await?;

    tracing::info!(
        "Done: {} records in {} batches, {} cracked, {} failed, {} batches rejected, {:?}",
        outcome.summary.records,
        outcome.summary.batches,
        outcome.summary.cracked,
        outcome.summary.failed,
        outcome.summary.rejected_batches,
        outcome.summary.elapsed
    );

    Ok(())
}
