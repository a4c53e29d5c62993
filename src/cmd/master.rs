use std::path::PathBuf;

use clap::Parser;

use crate::master::MasterConfig;
use crate::{DEFAULT_CHUNK_SIZE, DEFAULT_REDUCE_TASKS};

#[derive(Parser, Debug)]
#[command(version, about = "Runs one word count job over the mappers and reducers of a topology", long_about = None)]
pub struct Args {
    /// Worker topology file listing mapper and reducer endpoints
    #[clap(short, long, default_value = "workers.json")]
    pub config: PathBuf,
    /// Input file, or glob spec for several input files
    #[clap(short, long)]
    pub input: String,
    /// Final output file, relative to the work directory
    #[clap(short, long, default_value = "final_output.txt")]
    pub output: PathBuf,
    /// Directory shared with the services for intermediate artifacts
    #[clap(short, long, default_value = ".")]
    pub work_dir: PathBuf,
    /// Number of input lines per map task
    #[clap(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
    /// Number of reduce tasks
    #[clap(long, default_value_t = DEFAULT_REDUCE_TASKS)]
    pub reduce_tasks: usize,
}

impl Args {
    pub fn master_config(&self) -> MasterConfig {
        MasterConfig {
            chunk_size: self.chunk_size,
            reduce_tasks: self.reduce_tasks,
            output: self.output.clone(),
        }
    }
}
