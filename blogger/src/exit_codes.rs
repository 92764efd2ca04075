//! Stable exit codes for blogger CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed due to invalid config or arguments, or an unrecoverable
/// error such as a post that could not be saved.
pub const INVALID: i32 = 1;
