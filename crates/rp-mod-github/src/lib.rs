//! GitHub repository operations: the remote-service boundary ([`RepoHost`]),
//! its REST and in-memory implementations, and the batch routines built on it.

mod api;
pub mod batch;
pub mod client;
pub mod host;
pub mod memory;
pub mod planner;
pub mod walker;

pub use client::GithubClient;
pub use host::RepoHost;
pub use memory::MemoryHost;
