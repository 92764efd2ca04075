//! Blog content pipeline: plan, write, edit, save, promote.
//!
//! Each generative stage runs under a bounded retry loop with pluggable
//! acceptance checkers. The loop never fails: when no attempt is accepted it
//! keeps the last one. The crate is split the usual way:
//!
//! - **[`core`]**: Pure, deterministic logic (checkers, retry loop, synthesis).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting collaborators (backends, filesystem, feeds).
//!   Isolated behind traits to enable scripted doubles in tests.
//! - **[`agents`]**: The planner, writer, editor and promotion stages.
//!
//! [`pipeline`] wires the stages together for the CLI.

pub mod agents;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pipeline;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
