//! The transport seam between the device facade and the backend process.
//!
//! The facade only knows the [`CommandTransport`] trait.  The production
//! implementation (`ProcessTransport`) spawns the backend executable; tests
//! inject a recording or mock transport instead.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use makcu_core::DeviceCommand;
use thiserror::Error;

/// How a command is handed to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    /// Spawn, wait (bounded by a timeout) and return the trimmed stdout.
    Sync,
    /// Spawn and return immediately.  Output and exit status are discarded,
    /// and nothing guarantees that the command ever takes effect.
    Detached,
}

/// Failures surfaced by a transport invocation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The backend binary disappeared after discovery.
    #[error("backend executable not found at {}", .path.display())]
    ExecutableNotFound { path: PathBuf },

    /// The OS refused to create the process.
    #[error("failed to spawn backend for `{command}`: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A synchronous command did not finish in time; the process was killed.
    #[error("backend did not finish `{command}` within {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// A synchronous command exited unsuccessfully.
    #[error("backend exited with status {code:?} for `{command}`: {output}")]
    NonZeroExit {
        command: String,
        code: Option<i32>,
        output: String,
    },
}

/// Delivers commands to the backend.
///
/// Implementations must serialise process creation: at most one spawn at a
/// time per transport, and at most one synchronous call in flight.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Sends `command` to the backend.
    ///
    /// Returns `Ok(Some(stdout))` for [`InvocationMode::Sync`] and `Ok(None)`
    /// for [`InvocationMode::Detached`].
    async fn invoke(
        &self,
        command: &DeviceCommand,
        mode: InvocationMode,
    ) -> Result<Option<String>, TransportError>;
}
