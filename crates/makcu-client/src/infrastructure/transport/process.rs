//! [`CommandTransport`] backed by one `makcu-cpp` process per command.
//!
//! Each command becomes `<executable> --command <token>`:
//!
//! - **Sync** commands capture stdout and are bounded by a timeout.  When the
//!   timeout expires the child is killed and the call fails with
//!   [`TransportError::Timeout`].
//! - **Detached** commands run with all standard streams set to null and are
//!   never waited on.  The tokio runtime reaps them in the background.
//!
//! A single async mutex serialises process creation so that a tight movement
//! loop cannot flood the process table.  Detached calls release it as soon as
//! the spawn returns; sync calls hold it until the reply is read, which keeps
//! at most one synchronous command in flight.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use makcu_core::DeviceCommand;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time;
use tracing::{debug, trace};

use crate::application::transport::{CommandTransport, InvocationMode, TransportError};
use crate::infrastructure::locator::ExecutablePath;

/// Default bound on a synchronous command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(1);

/// Spawns the backend executable for each command.
pub struct ProcessTransport {
    executable: ExecutablePath,
    timeout: Duration,
    spawn_lock: Mutex<()>,
}

impl ProcessTransport {
    /// Creates a transport for `executable` with the given sync timeout.
    pub fn new(executable: ExecutablePath, timeout: Duration) -> Self {
        Self {
            executable,
            timeout,
            spawn_lock: Mutex::new(()),
        }
    }

    pub fn executable(&self) -> &ExecutablePath {
        &self.executable
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn command_line(&self, command: &DeviceCommand) -> Command {
        let mut cmd = Command::new(self.executable.as_path());
        cmd.arg("--command")
            .arg(command.to_string())
            .stdin(Stdio::null());
        cmd
    }

    fn spawn_error(&self, command: &DeviceCommand, source: io::Error) -> TransportError {
        if source.kind() == io::ErrorKind::NotFound {
            TransportError::ExecutableNotFound {
                path: self.executable.as_path().to_path_buf(),
            }
        } else {
            TransportError::SpawnFailed {
                command: command.to_string(),
                source,
            }
        }
    }

    async fn run_sync(&self, command: &DeviceCommand) -> Result<Option<String>, TransportError> {
        let _guard = self.spawn_lock.lock().await;

        let mut cmd = self.command_line(command);
        cmd.stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        let child = cmd.spawn().map_err(|e| self.spawn_error(command, e))?;
        trace!("spawned sync `{command}`");

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| TransportError::SpawnFailed {
                command: command.to_string(),
                source,
            })?,
            Err(_) => {
                return Err(TransportError::Timeout {
                    command: command.to_string(),
                    timeout: self.timeout,
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !output.status.success() {
            return Err(TransportError::NonZeroExit {
                command: command.to_string(),
                code: output.status.code(),
                output: stdout,
            });
        }
        debug!("`{command}` replied {stdout:?}");
        Ok(Some(stdout))
    }

    async fn run_detached(&self, command: &DeviceCommand) -> Result<Option<String>, TransportError> {
        let child = {
            let _guard = self.spawn_lock.lock().await;
            let mut cmd = self.command_line(command);
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
            cmd.spawn().map_err(|e| self.spawn_error(command, e))?
        };
        trace!("dispatched `{command}` (pid {:?})", child.id());
        Ok(None)
    }
}

#[async_trait]
impl CommandTransport for ProcessTransport {
    async fn invoke(
        &self,
        command: &DeviceCommand,
        mode: InvocationMode,
    ) -> Result<Option<String>, TransportError> {
        match mode {
            InvocationMode::Sync => self.run_sync(command).await,
            InvocationMode::Detached => self.run_detached(command).await,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
