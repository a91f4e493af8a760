//! Recording transport for tests.
//!
//! `RecordingTransport` never starts a process.  Every invocation is pushed
//! into a `Mutex<Vec<...>>` so that tests can assert exactly which tokens were
//! dispatched, in which mode, and in what order.  An empty record after a
//! disconnected operation proves the transport was never reached.
//!
//! Replies to synchronous commands are scripted with [`RecordingTransport::push_reply`]
//! and consumed in FIFO order.  A sync call with no scripted reply fails with
//! [`TransportError::NonZeroExit`], which is what a real backend does when it
//! cannot reach the device.
//!
//! # `fail_detached` flag
//!
//! Set `fail_detached = true` to make every detached call fail as if the OS
//! refused to spawn the process.

use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;

use async_trait::async_trait;
use makcu_core::DeviceCommand;

use crate::application::transport::{CommandTransport, InvocationMode, TransportError};

/// A transport that records all calls without spawning anything.
#[derive(Default)]
pub struct RecordingTransport {
    /// Every invocation, in call order.
    pub invocations: Mutex<Vec<(DeviceCommand, InvocationMode)>>,
    /// Scripted results for sync invocations, consumed front to back.
    pub sync_replies: Mutex<VecDeque<Result<Option<String>, TransportError>>>,
    /// When `true`, detached invocations return `TransportError::SpawnFailed`.
    pub fail_detached: bool,
}

impl RecordingTransport {
    /// Creates a transport with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport whose first sync call replies with `reply`.
    pub fn replying(reply: &str) -> Self {
        let transport = Self::default();
        transport.push_reply(Ok(Some(reply.to_string())));
        transport
    }

    /// Queues the result of the next unanswered sync call.
    pub fn push_reply(&self, reply: Result<Option<String>, TransportError>) {
        self.sync_replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
    }

    /// Returns the rendered tokens of every invocation, in order.
    pub fn tokens(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(cmd, _)| cmd.to_string())
            .collect()
    }

    /// Returns the number of invocations so far.
    pub fn count(&self) -> usize {
        self.invocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Returns the mode used for the invocation at `index`.
    pub fn mode_at(&self, index: usize) -> Option<InvocationMode> {
        self.invocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(index)
            .map(|(_, mode)| *mode)
    }
}

#[async_trait]
impl CommandTransport for RecordingTransport {
    async fn invoke(
        &self,
        command: &DeviceCommand,
        mode: InvocationMode,
    ) -> Result<Option<String>, TransportError> {
        self.invocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((command.clone(), mode));

        match mode {
            InvocationMode::Sync => self
                .sync_replies
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front()
                .unwrap_or_else(|| {
                    Err(TransportError::NonZeroExit {
                        command: command.to_string(),
                        code: Some(1),
                        output: "device_not_connected".to_string(),
                    })
                }),
            InvocationMode::Detached if self.fail_detached => Err(TransportError::SpawnFailed {
                command: command.to_string(),
                source: io::Error::new(io::ErrorKind::Other, "mock spawn failure"),
            }),
            InvocationMode::Detached => Ok(None),
        }
    }
}
