//! Command line arguments of the `mr-*` binaries.

pub mod mapper;
pub mod master;
pub mod reducer;
