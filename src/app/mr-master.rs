use anyhow::{Context, Result};
use clap::Parser;
use mrwc::artifact::ArtifactStore;
use mrwc::cmd::master::Args;
use mrwc::master::{input, Master, Topology};
use mrwc::utils;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    utils::init_tracing();
    let args = Args::parse();

    // Everything that can be wrong with the setup fails here, before any task is sent.
    let topology = Topology::load(&args.config).context("Error reading worker config")?;
    info!("Worker topology: {}", topology);
    let lines = input::read_lines(&args.input).context("Failed to read input file")?;
    let master = Master::new(topology, args.master_config(), ArtifactStore::new(&args.work_dir))?;

    let summary = master.run(&lines).await.context("MapReduce run aborted")?;
    info!(
        "Counted {} distinct words over {} chunks and {} reduce tasks into {}",
        summary.counts.len(),
        summary.chunks,
        summary.reduce_tasks,
        summary.output.display()
    );
    Ok(())
}
