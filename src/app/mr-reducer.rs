use anyhow::Result;
use clap::Parser;
use mrwc::artifact::ArtifactStore;
use mrwc::cmd::reducer::Args;
use mrwc::{reducer, server, utils};

#[tokio::main]
async fn main() -> Result<()> {
    utils::init_tracing();
    let args = Args::parse();

    let listener = server::bind(&args.host, args.port).await?;
    reducer::serve(listener, ArtifactStore::new(&args.work_dir), args.max_concurrent).await
}
