//! Errors that abort a MapReduce run.

use std::fmt;

use thiserror::Error;

/// The phase a failed task call belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Map,
    Reduce,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Map => write!(f, "map"),
            Phase::Reduce => write!(f, "reduce"),
        }
    }
}

/// Every way a run can fail. None of them is retried: the master stops at the
/// first one and leaves already written artifacts where they are.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid worker topology: {0}")]
    Topology(String),

    #[error("invalid input: {0}")]
    Input(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to connect to {phase} endpoint {endpoint} for task {task_id}")]
    Connect {
        phase: Phase,
        endpoint: String,
        task_id: i64,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("{phase} task {task_id} failed on {endpoint}: {status}")]
    Remote {
        phase: Phase,
        endpoint: String,
        task_id: i64,
        status: tonic::Status,
    },

    #[error("{phase} task {task_id} on {endpoint} answered {status:?}")]
    UnexpectedReply {
        phase: Phase,
        endpoint: String,
        task_id: i64,
        status: String,
    },

    #[error("failed to merge reducer outputs: {0:#}")]
    Artifact(anyhow::Error),
}

impl RunError {
    /// The phase in which a task call failed, if this is a task failure.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            RunError::Connect { phase, .. }
            | RunError::Remote { phase, .. }
            | RunError::UnexpectedReply { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}
