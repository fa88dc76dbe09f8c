//! warchest-exec — external command execution.
//!
//! Every external effect of the controller (seat-price and balance
//! queries, stake calls, liveness pings) is a shell command rendered from a
//! configured template and run with a hard timeout.
//!
//! ```text
//! template ──render()──▶ command ──CommandRunner::run()──▶ Ok(stdout)
//!                                                          Err(Timeout | NonZeroExit | Spawn)
//! ```
//!
//! The executor never retries. Retry policy, if any, belongs to the caller.

pub mod runner;
pub mod template;

pub use runner::{CommandError, CommandFuture, CommandRunner, ShellRunner, DEFAULT_TIMEOUT};
pub use template::{render, strip_wrapping_quotes};
