//! I/O collaborators for the pipeline: backends, persistence, feeds, scanning.

pub mod backend;
pub mod codebase;
pub mod config;
pub mod feeds;
pub mod process;
pub mod prompt;
pub mod store;
