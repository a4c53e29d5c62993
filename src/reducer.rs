//! The reducer service.
//!
//! Answers `Reducer.Compute`: reads every mapper output `0..num_mappers`,
//! sums the counts and writes them to the task's reducer output artifact.
//! There is no key partitioning, so every reduce task produces the full
//! aggregate of all mapper outputs.

use std::path::PathBuf;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use thiserror::Error;
use tonic::{Request, Response, Status};
use tracing::{debug, error, info};

use crate::artifact::{self, ArtifactStore};
use crate::rpc::reducer_server::{Reducer, ReducerServer};
use crate::rpc::{Reply, ReduceTask};
use crate::server::{self, CallLimit};
use crate::workload::wc;
use crate::{WordCounts, STATUS_COMPLETED};

pub struct ReducerService {
    store: ArtifactStore,
    limit: CallLimit,
}

impl ReducerService {
    pub fn new(store: ArtifactStore, max_concurrent: usize) -> Self {
        Self {
            store,
            limit: CallLimit::new(max_concurrent),
        }
    }
}

/// Why a reduce task could not run.
#[derive(Debug, Error)]
pub enum ReduceFailure {
    /// A mapper output the task depends on does not exist.
    #[error("mapper output {} does not exist", .0.display())]
    MissingInput(PathBuf),
    #[error("{0:#}")]
    Io(anyhow::Error),
}

impl From<ReduceFailure> for Status {
    fn from(failure: ReduceFailure) -> Self {
        match &failure {
            ReduceFailure::MissingInput(_) => Status::not_found(failure.to_string()),
            ReduceFailure::Io(_) => Status::internal(failure.to_string()),
        }
    }
}

/// Aggregates mapper outputs `0..task.num_mappers` into the reducer output
/// artifact of `task`, replacing any earlier output for the same task id.
pub fn reduce_task(store: &ArtifactStore, task: &ReduceTask) -> Result<PathBuf, ReduceFailure> {
    let mut total = WordCounts::new();
    for chunk_id in 0..task.num_mappers {
        let input = store.map_output(chunk_id);
        if !input.exists() {
            return Err(ReduceFailure::MissingInput(input));
        }
        let counts = artifact::read_counts(&input).map_err(ReduceFailure::Io)?;
        debug!("Reduce task {} read {} words from {}", task.task_id, counts.len(), input.display());
        wc::reduce(&mut total, counts);
    }

    let output = store.reduce_output(task.task_id);
    artifact::write_counts(&output, &total).map_err(ReduceFailure::Io)?;
    Ok(output)
}

#[tonic::async_trait]
impl Reducer for ReducerService {
    async fn compute(&self, request: Request<ReduceTask>) -> Result<Response<Reply>, Status> {
        let _permit = self.limit.acquire().await?;
        let task = request.into_inner();
        let task_id = task.task_id;
        info!("Reducer received task: task_id={}, num_mappers={}", task_id, task.num_mappers);

        if task.num_mappers < 0 {
            return Err(Status::invalid_argument(format!(
                "num_mappers must not be negative, got {}",
                task.num_mappers
            )));
        }

        let store = self.store.clone();
        let output = tokio::task::spawn_blocking(move || reduce_task(&store, &task))
            .await
            .map_err(|e| Status::internal(format!("reduce task {task_id} did not finish: {e}")))?
            .map_err(|failure| {
                error!("Reduce task {} failed: {}", task_id, failure);
                Status::from(failure)
            })?;

        info!("Reducer finished processing task_id={}, output={}", task_id, output.display());
        Ok(Response::new(Reply {
            status: STATUS_COMPLETED.into(),
        }))
    }
}

/// Serves the reducer on `listener` until the process is killed.
pub async fn serve(listener: TcpListener, store: ArtifactStore, max_concurrent: usize) -> Result<()> {
    info!("Reducer service registered, artifacts in {}", store.dir().display());
    server::builder(max_concurrent)
        .add_service(
            ReducerServer::new(ReducerService::new(store, max_concurrent))
                .max_decoding_message_size(usize::MAX)
                .max_encoding_message_size(usize::MAX),
        )
        .serve_with_incoming(TcpListenerStream::new(listener))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn setup(mapper_outputs: &[&str]) -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        for (i, content) in mapper_outputs.iter().enumerate() {
            fs::write(store.map_output(i as i64), content).unwrap();
        }
        (dir, store)
    }

    #[tokio::test]
    async fn every_task_aggregates_all_mapper_outputs() {
        let (_dir, store) = setup(&["the 2\ncat 1\n", "the 1\nmat 1\n", "cat 4\n"]);
        let service = ReducerService::new(store.clone(), 4);

        for task_id in 0..3 {
            let task = ReduceTask { task_id, num_mappers: 3 };
            let reply = service.compute(Request::new(task)).await.unwrap().into_inner();
            assert_eq!(reply.status, STATUS_COMPLETED);
        }

        let expected: WordCounts = [("the", 3), ("cat", 5), ("mat", 1)]
            .into_iter()
            .map(|(w, c)| (w.to_string(), c))
            .collect();
        for task_id in 0..3 {
            assert_eq!(artifact::read_counts(&store.reduce_output(task_id)).unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn malformed_lines_do_not_fail_the_task() {
        let (_dir, store) = setup(&["word\ncat 2\ndog many\n"]);
        let service = ReducerService::new(store.clone(), 1);

        let task = ReduceTask { task_id: 0, num_mappers: 1 };
        service.compute(Request::new(task)).await.unwrap();

        let counts = artifact::read_counts(&store.reduce_output(0)).unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts["cat"], 2);
    }

    #[tokio::test]
    async fn missing_mapper_output_fails_the_task() {
        let (_dir, store) = setup(&["cat 1\n"]);
        let service = ReducerService::new(store.clone(), 1);

        let task = ReduceTask { task_id: 0, num_mappers: 2 };
        let status = service.compute(Request::new(task)).await.unwrap_err();
        assert_eq!(status.code(), tonic::Code::NotFound);
        assert!(status.message().contains("map_output_1.txt"));
        assert!(!store.reduce_output(0).exists());
    }

    #[test]
    fn failures_describe_themselves() {
        let missing = ReduceFailure::MissingInput(PathBuf::from("/work/map_output_3.txt"));
        assert_eq!(missing.to_string(), "mapper output /work/map_output_3.txt does not exist");

        let io = ReduceFailure::Io(anyhow::anyhow!("disk gone").context("Failed to read file x"));
        assert_eq!(io.to_string(), "Failed to read file x: disk gone");
        assert_eq!(Status::from(io).code(), tonic::Code::Internal);
    }

    #[tokio::test]
    async fn zero_mappers_writes_empty_output() {
        let (_dir, store) = setup(&[]);
        let service = ReducerService::new(store.clone(), 1);

        let task = ReduceTask { task_id: 1, num_mappers: 0 };
        service.compute(Request::new(task)).await.unwrap();
        assert!(artifact::read_counts(&store.reduce_output(1)).unwrap().is_empty());
    }

    #[tokio::test]
    async fn negative_mapper_count_is_rejected() {
        let (_dir, store) = setup(&[]);
        let service = ReducerService::new(store, 1);

        let task = ReduceTask { task_id: 0, num_mappers: -1 };
        let status = service.compute(Request::new(task)).await.unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }
}
