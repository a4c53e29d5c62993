use anyhow::Result;
use clap::Parser;
use mrwc::artifact::ArtifactStore;
use mrwc::cmd::mapper::Args;
use mrwc::{mapper, server, utils};

#[tokio::main]
async fn main() -> Result<()> {
    utils::init_tracing();
    let args = Args::parse();

    let listener = server::bind(&args.host, args.port).await?;
    mapper::serve(listener, ArtifactStore::new(&args.work_dir), args.max_concurrent).await
}
