//! The mapper service.
//!
//! Answers `Mapper.ServeRequest`: counts the words of one chunk and writes them
//! to the chunk's mapper output artifact.

use std::path::PathBuf;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request, Response, Status};
use tracing::{error, info};

use crate::artifact::{self, ArtifactStore};
use crate::rpc::mapper_server::{Mapper, MapperServer};
use crate::rpc::{MapTask, Reply};
use crate::server::{self, CallLimit};
use crate::workload::wc;
use crate::STATUS_COMPLETED;

pub struct MapperService {
    store: ArtifactStore,
    limit: CallLimit,
}

impl MapperService {
    pub fn new(store: ArtifactStore, max_concurrent: usize) -> Self {
        Self {
            store,
            limit: CallLimit::new(max_concurrent),
        }
    }
}

/// Counts the words of `task` and writes them to its mapper output artifact,
/// replacing any earlier output for the same chunk.
pub fn map_chunk(store: &ArtifactStore, task: &MapTask) -> Result<PathBuf> {
    let counts = wc::map(&task.chunk_data);
    let output = store.map_output(task.chunk_id);
    artifact::write_counts(&output, &counts)?;
    Ok(output)
}

#[tonic::async_trait]
impl Mapper for MapperService {
    async fn serve_request(&self, request: Request<MapTask>) -> Result<Response<Reply>, Status> {
        let _permit = self.limit.acquire().await?;
        let task = request.into_inner();
        let chunk_id = task.chunk_id;
        info!("Mapper received task: chunk_id={}", chunk_id);

        let store = self.store.clone();
        let output = tokio::task::spawn_blocking(move || map_chunk(&store, &task))
            .await
            .map_err(|e| Status::internal(format!("map task {chunk_id} did not finish: {e}")))?
            .map_err(|e| {
                error!("Map task {} failed: {:#}", chunk_id, e);
                Status::internal(format!("{e:#}"))
            })?;

        info!("Mapper finished processing chunk_id={}, output={}", chunk_id, output.display());
        Ok(Response::new(Reply {
            status: STATUS_COMPLETED.into(),
        }))
    }
}

/// Serves the mapper on `listener` until the process is killed.
pub async fn serve(listener: TcpListener, store: ArtifactStore, max_concurrent: usize) -> Result<()> {
    info!("Mapper service registered, artifacts in {}", store.dir().display());
    server::builder(max_concurrent)
        .add_service(
            MapperServer::new(MapperService::new(store, max_concurrent))
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

    #[tokio::test]
    async fn serve_request_writes_chunk_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let service = MapperService::new(store.clone(), 4);

        let task = MapTask {
            chunk_id: 7,
            chunk_data: "Cat, cat\nCAT! --".into(),
        };
        let reply = service.serve_request(Request::new(task)).await.unwrap().into_inner();
        assert_eq!(reply.status, STATUS_COMPLETED);

        let counts = artifact::read_counts(&store.map_output(7)).unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts["cat"], 3);
    }

    #[tokio::test]
    async fn empty_chunk_writes_empty_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let service = MapperService::new(store.clone(), 1);

        let task = MapTask {
            chunk_id: 0,
            chunk_data: String::new(),
        };
        service.serve_request(Request::new(task)).await.unwrap();
        assert!(artifact::read_counts(&store.map_output(0)).unwrap().is_empty());
    }

    #[tokio::test]
    async fn unwritable_work_dir_is_an_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("missing"));
        let service = MapperService::new(store, 1);

        let task = MapTask {
            chunk_id: 0,
            chunk_data: "a b".into(),
        };
        let status = service.serve_request(Request::new(task)).await.unwrap_err();
        assert_eq!(status.code(), tonic::Code::Internal);
    }
}
