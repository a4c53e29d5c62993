//! Serving plumbing shared by the mapper and reducer services.
//!
//! Both services accept calls forever on a single listening endpoint. Each
//! inbound call runs on its own task; the number of calls doing work at the
//! same time is capped by a [`CallLimit`].

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::{Semaphore, SemaphorePermit};
use tonic::transport::Server;
use tonic::Status;
use tracing::info;

/// Caps how many calls a service handles at once.
#[derive(Clone, Debug)]
pub struct CallLimit {
    permits: Arc<Semaphore>,
}

impl CallLimit {
    /// Creates a limit of `max_concurrent` calls, at least one.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Waits for a free slot. The slot is released when the permit is dropped.
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>, Status> {
        self.permits
            .acquire()
            .await
            .map_err(|_| Status::unavailable("service is shutting down"))
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

/// Binds the listening endpoint `host:port`.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Listen error on {addr}"))?;
    info!("Serving RPC on {}", listener.local_addr()?);
    Ok(listener)
}

/// A tonic server builder with the per-connection limit set to `max_concurrent`.
pub fn builder(max_concurrent: usize) -> Server {
    Server::builder().concurrency_limit_per_connection(max_concurrent.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn permits_are_returned_on_drop() {
        let limit = CallLimit::new(2);
        let first = limit.acquire().await.unwrap();
        let _second = limit.acquire().await.unwrap();
        assert_eq!(limit.available(), 0);
        drop(first);
        assert_eq!(limit.available(), 1);
    }

    #[test]
    fn zero_is_raised_to_one() {
        assert_eq!(CallLimit::new(0).available(), 1);
    }
}
