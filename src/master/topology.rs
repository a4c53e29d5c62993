//! The worker topology: which endpoints host mappers and which host reducers.
//!
//! The topology file lists workers by address together with the ports of the
//! mapper and reducer services each of them runs:
//!
//! ```json
//! {
//!   "Workers": [
//!     { "IP": "127.0.0.1", "Mappers": ["8001", "8002"], "Reducers": ["9001"] }
//!   ]
//! }
//! ```
//!
//! Endpoints are collected in file order, worker by worker, which fixes the
//! round-robin order the master assigns tasks in.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::RunError;

fn default_ip() -> String {
    "127.0.0.1".into()
}

/// A service port, written either as a number or as a string.
///
/// A string that already contains a `:` is taken as a full `host:port`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Port {
    Number(u16),
    Text(String),
}

impl Port {
    fn endpoint(&self, ip: &str) -> String {
        match self {
            Port::Number(port) => format!("{ip}:{port}"),
            Port::Text(text) if text.contains(':') => text.trim().to_string(),
            Port::Text(port) => format!("{ip}:{}", port.trim()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSpec {
    #[serde(rename = "IP", default = "default_ip")]
    pub ip: String,
    #[serde(rename = "Mappers", default)]
    pub mappers: Vec<Port>,
    #[serde(rename = "Reducers", default)]
    pub reducers: Vec<Port>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopologyFile {
    #[serde(rename = "Workers")]
    pub workers: Vec<WorkerSpec>,
}

/// Ordered, non-empty lists of mapper and reducer endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    mappers: Vec<String>,
    reducers: Vec<String>,
}

impl Topology {
    /// Builds a topology from explicit endpoint lists. Both must be non-empty.
    pub fn new(mappers: Vec<String>, reducers: Vec<String>) -> Result<Self, RunError> {
        if mappers.is_empty() {
            return Err(RunError::Topology("no mapper endpoints".into()));
        }
        if reducers.is_empty() {
            return Err(RunError::Topology("no reducer endpoints".into()));
        }
        Ok(Self { mappers, reducers })
    }

    /// Reads and parses the topology file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RunError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| RunError::Topology(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, RunError> {
        let file: TopologyFile =
            serde_json::from_str(content).map_err(|e| RunError::Topology(format!("malformed topology: {e}")))?;
        Self::from_file(&file)
    }

    pub fn from_file(file: &TopologyFile) -> Result<Self, RunError> {
        let mut mappers = Vec::new();
        let mut reducers = Vec::new();
        for worker in &file.workers {
            mappers.extend(worker.mappers.iter().map(|p| p.endpoint(&worker.ip)));
            reducers.extend(worker.reducers.iter().map(|p| p.endpoint(&worker.ip)));
        }
        Self::new(mappers, reducers)
    }

    pub fn mappers(&self) -> &[String] {
        &self.mappers
    }

    pub fn reducers(&self) -> &[String] {
        &self.reducers
    }

    /// The mapper endpoint chunk `chunk_id` is assigned to.
    pub fn mapper_for(&self, chunk_id: usize) -> &str {
        round_robin(&self.mappers, chunk_id)
    }

    /// The reducer endpoint reduce task `task_id` is assigned to.
    pub fn reducer_for(&self, task_id: usize) -> &str {
        round_robin(&self.reducers, task_id)
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mappers {:?}, reducers {:?}", self.mappers, self.reducers)
    }
}

/// Picks `endpoints[index mod len]`. `endpoints` must not be empty.
pub fn round_robin(endpoints: &[String], index: usize) -> &str {
    &endpoints[index % endpoints.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_workers_in_file_order() {
        let json = r#"{
            "Workers": [
                { "IP": "10.0.0.1", "Mappers": ["8001", "8002"], "Reducers": ["9001"] },
                { "IP": "10.0.0.2", "Mappers": [8003], "Reducers": ["10.0.0.9:9002"] }
            ]
        }"#;
        let topology = Topology::from_json(json).unwrap();
        assert_eq!(topology.mappers(), endpoints(&["10.0.0.1:8001", "10.0.0.1:8002", "10.0.0.2:8003"]));
        assert_eq!(topology.reducers(), endpoints(&["10.0.0.1:9001", "10.0.0.9:9002"]));
    }

    #[test]
    fn missing_ip_defaults_to_localhost() {
        let topology = Topology::from_json(r#"{"Workers":[{"Mappers":["8001"],"Reducers":["9001"]}]}"#).unwrap();
        assert_eq!(topology.mappers(), endpoints(&["127.0.0.1:8001"]));
    }

    #[test]
    fn empty_endpoint_lists_are_rejected() {
        let no_reducers = r#"{"Workers":[{"IP":"127.0.0.1","Mappers":["8001"],"Reducers":[]}]}"#;
        assert!(matches!(Topology::from_json(no_reducers), Err(RunError::Topology(_))));
        assert!(matches!(Topology::from_json(r#"{"Workers":[]}"#), Err(RunError::Topology(_))));
        assert!(matches!(Topology::new(vec![], endpoints(&["a:1"])), Err(RunError::Topology(_))));
    }

    #[test]
    fn malformed_or_missing_file_is_a_topology_error() {
        assert!(matches!(Topology::from_json("{ not json"), Err(RunError::Topology(_))));
        assert!(matches!(Topology::load("/definitely/not/here.json"), Err(RunError::Topology(_))));
    }

    #[test]
    fn assignment_is_round_robin() {
        let topology = Topology::new(endpoints(&["m0", "m1", "m2"]), endpoints(&["r0", "r1"])).unwrap();
        let chunks: Vec<&str> = (0..7).map(|i| topology.mapper_for(i)).collect();
        assert_eq!(chunks, ["m0", "m1", "m2", "m0", "m1", "m2", "m0"]);
        let tasks: Vec<&str> = (0..3).map(|t| topology.reducer_for(t)).collect();
        assert_eq!(tasks, ["r0", "r1", "r0"]);
    }
}
