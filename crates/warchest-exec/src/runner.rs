//! Shell command runner with a hard timeout.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::template::strip_wrapping_quotes;

/// Default per-command timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Why a command produced no usable output.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    #[error("command exited with status {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("failed to spawn command: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Boxed future returned by [`CommandRunner::run`].
pub type CommandFuture<'a> = Pin<Box<dyn Future<Output = Result<String, CommandError>> + Send + 'a>>;

/// Runs one external command and returns its stdout.
///
/// Injected into the engine so tests can script command output.
pub trait CommandRunner: Send + Sync {
    fn run<'a>(&'a self, command: &'a str) -> CommandFuture<'a>;
}

/// Runs commands through `<shell> -c`.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
    timeout: Duration,
}

impl ShellRunner {
    /// Create a runner using `bash` with the given timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            shell: "bash".to_string(),
            timeout,
        }
    }

    /// Use a different shell binary.
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Run `command` once. The child is killed when the timeout fires.
    pub async fn execute(&self, command: &str) -> Result<String, CommandError> {
        let script = strip_wrapping_quotes(command);

        let mut cmd = tokio::process::Command::new(&self.shell);
        cmd.arg("-c")
            .arg(script)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(command = %script, timeout = ?self.timeout, "command timed out");
                return Err(CommandError::Timeout(self.timeout));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!(command = %script, code = ?output.status.code(), %stderr, "command failed");
            return Err(CommandError::NonZeroExit {
                code: output.status.code(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl CommandRunner for ShellRunner {
    fn run<'a>(&'a self, command: &'a str) -> CommandFuture<'a> {
        Box::pin(self.execute(command))
    }
}
