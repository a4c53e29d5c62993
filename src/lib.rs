//! A distributed word count built as a minimal MapReduce.
//!
//! A master splits its input into chunks of lines and hands each chunk to a
//! mapper service over gRPC. Once every mapper has answered, it asks a fixed
//! number of reducer services to aggregate the mapper outputs, and finally
//! merges the reducer outputs into a single result file. All intermediate data
//! lives as plain text artifacts in a shared work directory.

use std::collections::HashMap;

pub mod artifact;
pub mod cmd;
pub mod error;
pub mod mapper;
pub mod master;
pub mod reducer;
pub mod server;
pub mod utils;
pub mod workload;

/// Task contracts and service stubs generated from `proto/mapreduce.proto`.
pub mod rpc {
    tonic::include_proto!("mapreduce");
}

/////////////////////////////////////////////////////////////////////////////
// Shared constants
/////////////////////////////////////////////////////////////////////////////

/// Number of input lines grouped into one map task unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 5;

/// Number of reduce tasks dispatched unless configured otherwise.
pub const DEFAULT_REDUCE_TASKS: usize = 3;

/// Upper bound on calls a single service handles at the same time.
pub const DEFAULT_MAX_CONCURRENT: usize = 64;

/// Status string every successful task reply carries.
pub const STATUS_COMPLETED: &str = "completed";

/// A `word -> count` mapping, the payload of every artifact.
pub type WordCounts = HashMap<String, u64>;
