//! The master: drives one MapReduce run from input lines to the final artifact.
//!
//! A run has two strictly sequential phases. In the map phase every chunk of
//! input is sent to a mapper at the same time, and the master waits for all of
//! them. Only then does the reduce phase send every reduce task to a reducer,
//! again waiting for all of them, before the reducer outputs are merged.
//!
//! Nothing is retried. The first failed call aborts the run; artifacts written
//! by tasks that already finished are left in the work directory.
//!
//! Reducers do not partition keys: each one aggregates every mapper output, so
//! the merged result holds each true count multiplied by the number of reduce
//! tasks.

use std::path::{Path, PathBuf};

use futures::future::try_join_all;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::artifact::{self, ArtifactStore};
use crate::error::{Phase, RunError};
use crate::rpc::mapper_client::MapperClient;
use crate::rpc::reducer_client::ReducerClient;
use crate::rpc::{MapTask, ReduceTask, Reply};
use crate::workload::wc;
use crate::{WordCounts, DEFAULT_CHUNK_SIZE, DEFAULT_REDUCE_TASKS, STATUS_COMPLETED};

pub mod input;
pub mod topology;

pub use topology::Topology;

/// Run parameters fixed when the master is built.
#[derive(Debug, Clone)]
pub struct MasterConfig {
    /// Maximum number of input lines per chunk.
    pub chunk_size: usize,
    /// Number of reduce tasks dispatched.
    pub reduce_tasks: usize,
    /// Final artifact, relative to the work directory unless absolute.
    pub output: PathBuf,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            reduce_tasks: DEFAULT_REDUCE_TASKS,
            output: PathBuf::from("final_output.txt"),
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub chunks: usize,
    pub reduce_tasks: usize,
    pub output: PathBuf,
    pub counts: WordCounts,
}

pub struct Master {
    topology: Topology,
    config: MasterConfig,
    store: ArtifactStore,
}

impl Master {
    pub fn new(topology: Topology, config: MasterConfig, store: ArtifactStore) -> Result<Self, RunError> {
        if config.chunk_size == 0 {
            return Err(RunError::Config("chunk size must be at least 1".into()));
        }
        if config.reduce_tasks == 0 {
            return Err(RunError::Config("reduce task count must be at least 1".into()));
        }
        Ok(Self {
            topology,
            config,
            store,
        })
    }

    /// Runs the whole pipeline over `lines`.
    pub async fn run(&self, lines: &[String]) -> Result<RunSummary, RunError> {
        let span = info_span!("run", id = %Uuid::new_v4());
        self.run_phases(lines).instrument(span).await
    }

    async fn run_phases(&self, lines: &[String]) -> Result<RunSummary, RunError> {
        let chunks = split(lines, self.config.chunk_size);
        info!(
            "Split {} lines into {} chunks for {} mappers",
            lines.len(),
            chunks.len(),
            self.topology.mappers().len()
        );

        self.map_phase(&chunks).await?;
        info!("All map tasks are completed.");

        self.reduce_phase(chunks.len()).await?;
        info!("All reduce tasks are completed.");

        let output = self.store.resolve(&self.config.output);
        let counts = {
            let store = self.store.clone();
            let output = output.clone();
            let reduce_tasks = self.config.reduce_tasks;
            tokio::task::spawn_blocking(move || merge(&store, reduce_tasks, &output))
                .await
                .map_err(|e| RunError::Artifact(e.into()))?
                .map_err(RunError::Artifact)?
        };
        info!("Final output file created: {}", output.display());

        Ok(RunSummary {
            chunks: chunks.len(),
            reduce_tasks: self.config.reduce_tasks,
            output,
            counts,
        })
    }

    async fn map_phase(&self, chunks: &[String]) -> Result<(), RunError> {
        let calls = chunks.iter().enumerate().map(|(i, chunk)| {
            let endpoint = self.topology.mapper_for(i);
            let task = MapTask {
                chunk_id: i as i64,
                chunk_data: chunk.clone(),
            };
            assign_map_task(endpoint, task).instrument(info_span!("map", chunk_id = i, endpoint))
        });
        try_join_all(calls).await?;
        Ok(())
    }

    async fn reduce_phase(&self, num_mappers: usize) -> Result<(), RunError> {
        let calls = (0..self.config.reduce_tasks).map(|t| {
            let endpoint = self.topology.reducer_for(t);
            let task = ReduceTask {
                task_id: t as i64,
                num_mappers: num_mappers as i64,
            };
            assign_reduce_task(endpoint, task).instrument(info_span!("reduce", task_id = t, endpoint))
        });
        try_join_all(calls).await?;
        Ok(())
    }
}

/// Groups `lines` into chunks of at most `size` lines, each joined by `\n`.
///
/// Yields `ceil(lines.len() / size)` chunks; only the last may be short.
pub fn split(lines: &[String], size: usize) -> Vec<String> {
    lines.chunks(size.max(1)).map(|chunk| chunk.join("\n")).collect()
}

/// Sums reducer outputs `0..reduce_tasks` into the final artifact at `output`,
/// removing each reducer output once it has been read.
pub fn merge(store: &ArtifactStore, reduce_tasks: usize, output: &Path) -> anyhow::Result<WordCounts> {
    let mut total = WordCounts::new();
    for task_id in 0..reduce_tasks as i64 {
        let path = store.reduce_output(task_id);
        let counts = artifact::read_counts(&path)?;
        wc::reduce(&mut total, counts);
        artifact::remove(&path)?;
    }
    artifact::write_counts(output, &total)?;
    Ok(total)
}

fn endpoint_url(endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}

async fn assign_map_task(endpoint: &str, task: MapTask) -> Result<(), RunError> {
    let chunk_id = task.chunk_id;
    let mut client = MapperClient::connect(endpoint_url(endpoint))
        .await
        .map_err(|source| RunError::Connect {
            phase: Phase::Map,
            endpoint: endpoint.to_string(),
            task_id: chunk_id,
            source,
        })?
        .max_encoding_message_size(usize::MAX)
        .max_decoding_message_size(usize::MAX);
    debug!("Sending map task");
    let reply = client
        .serve_request(task)
        .await
        .map_err(|status| RunError::Remote {
            phase: Phase::Map,
            endpoint: endpoint.to_string(),
            task_id: chunk_id,
            status,
        })?
        .into_inner();
    check_reply(Phase::Map, endpoint, chunk_id, reply)
}

async fn assign_reduce_task(endpoint: &str, task: ReduceTask) -> Result<(), RunError> {
    let task_id = task.task_id;
    let mut client = ReducerClient::connect(endpoint_url(endpoint))
        .await
        .map_err(|source| RunError::Connect {
            phase: Phase::Reduce,
            endpoint: endpoint.to_string(),
            task_id,
            source,
        })?
        .max_encoding_message_size(usize::MAX)
        .max_decoding_message_size(usize::MAX);
    debug!("Sending reduce task");
    let reply = client
        .compute(task)
        .await
        .map_err(|status| RunError::Remote {
            phase: Phase::Reduce,
            endpoint: endpoint.to_string(),
            task_id,
            status,
        })?
        .into_inner();
    check_reply(Phase::Reduce, endpoint, task_id, reply)
}

fn check_reply(phase: Phase, endpoint: &str, task_id: i64, reply: Reply) -> Result<(), RunError> {
    if reply.status == STATUS_COMPLETED {
        debug!("Task completed");
        Ok(())
    } else {
        Err(RunError::UnexpectedReply {
            phase,
            endpoint: endpoint.to_string(),
            task_id,
            status: reply.status,
        })
    }
}
