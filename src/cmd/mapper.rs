use std::path::PathBuf;

use clap::Parser;

use crate::DEFAULT_MAX_CONCURRENT;

#[derive(Parser, Debug)]
#[command(version, about = "Serves map tasks on one endpoint until killed", long_about = None)]
pub struct Args {
    /// Port to listen on
    pub port: u16,
    /// Address to bind
    #[clap(long, default_value = "127.0.0.1")]
    pub host: String,
    /// Directory mapper outputs are written to
    #[clap(short, long, default_value = ".")]
    pub work_dir: PathBuf,
    /// Maximum number of map tasks handled at once
    #[clap(long, default_value_t = DEFAULT_MAX_CONCURRENT)]
    pub max_concurrent: usize,
}
