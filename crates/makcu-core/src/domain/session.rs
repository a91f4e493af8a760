//! Client-side session state machine.
//!
//! ```text
//!                begin_connect            complete_connect
//! Disconnected ───────────────> Connecting ─────────────────> Connected
//!      ^                            │                             │
//!      │        abort_connect       │                             │
//!      ├────────────────────────────┘                             │
//!      │                         disconnect                       │
//!      └──────────────────────────────────────────────────────────┘
//! ```
//!
//! `Connecting` only lives for the duration of one synchronous handshake.
//! There is no reconnection, polling, or idle timeout: the only way out of
//! `Connected` is an explicit [`Session::disconnect`].

use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

/// Lifecycle states of a device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
        };
        f.write_str(s)
    }
}

/// Errors raised by illegal transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {event} while {from}")]
    InvalidTransition {
        from: SessionState,
        event: &'static str,
    },
}

/// Connection record for one client instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    state: SessionState,
    /// Serial port the link was opened on; empty when auto-detected and
    /// the backend did not name it.
    port: String,
    high_performance: bool,
}

impl Session {
    /// Creates a session in the `Disconnected` state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns `true` only in the `Connected` state.
    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn high_performance(&self) -> bool {
        self.high_performance
    }

    /// Human-readable status line, e.g. `Connected to COM3`.
    pub fn status_text(&self) -> String {
        match self.state {
            SessionState::Connected if self.port.is_empty() => {
                "Connected to auto-detected port".to_string()
            }
            SessionState::Connected => format!("Connected to {}", self.port),
            SessionState::Connecting => "Connecting".to_string(),
            SessionState::Disconnected => "Disconnected".to_string(),
        }
    }

    /// `Disconnected -> Connecting`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTransition`] from any other state.
    pub fn begin_connect(&mut self) -> Result<(), SessionError> {
        self.expect(SessionState::Disconnected, "begin connect")?;
        self.state = SessionState::Connecting;
        debug!("session connecting");
        Ok(())
    }

    /// `Connecting -> Connected`, recording the port in use.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTransition`] unless the session is `Connecting`.
    pub fn complete_connect(&mut self, port: impl Into<String>) -> Result<(), SessionError> {
        self.expect(SessionState::Connecting, "complete connect")?;
        self.state = SessionState::Connected;
        self.port = port.into();
        self.high_performance = false;
        info!("session connected ({})", self.status_text());
        Ok(())
    }

    /// `Connecting -> Disconnected` after a failed handshake.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTransition`] unless the session is `Connecting`.
    pub fn abort_connect(&mut self) -> Result<(), SessionError> {
        self.expect(SessionState::Connecting, "abort connect")?;
        self.reset();
        debug!("session handshake aborted");
        Ok(())
    }

    /// Records the high-performance flag.  Only meaningful while `Connected`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTransition`] unless the session is `Connected`.
    pub fn set_high_performance(&mut self, enabled: bool) -> Result<(), SessionError> {
        self.expect(SessionState::Connected, "change performance mode")?;
        self.high_performance = enabled;
        Ok(())
    }

    /// Returns to `Disconnected` from any state.
    ///
    /// Returns `true` if the session was `Connected` beforehand.
    pub fn disconnect(&mut self) -> bool {
        let was_connected = self.is_connected();
        self.reset();
        if was_connected {
            info!("session disconnected");
        }
        was_connected
    }

    fn reset(&mut self) {
        self.state = SessionState::Disconnected;
        self.port.clear();
        self.high_performance = false;
    }

    fn expect(&self, required: SessionState, event: &'static str) -> Result<(), SessionError> {
        if self.state == required {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                from: self.state,
                event,
            })
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
