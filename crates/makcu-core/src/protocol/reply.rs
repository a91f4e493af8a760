//! Classification of the backend's reply to `connect` and `status`.
//!
//! The backend has always signalled a successful handshake by printing a line
//! that contains the word `connected` (for example `connected:COM3` or
//! `connected to COM3`).  A bare substring test also accepts replies such as
//! `not connected` or `disconnected`, so classification runs in three steps:
//!
//! 1. A reply carrying a known failure marker is rejected, wherever the marker
//!    appears (`connected: error opening port` is a failure).
//! 2. A reply that *starts* with `connected` is accepted, and any port that
//!    follows `:` or ` to ` is captured.
//! 3. Any remaining reply that still contains `connected` is accepted through
//!    the legacy substring rule, flagged by [`AcceptedBy::SubstringFallback`].

use tracing::warn;

const CONNECTED: &str = "connected";

/// Markers that identify a negative reply even though it contains `connected`.
const FAILURE_MARKERS: [&str; 6] = [
    "not connected",
    "disconnected",
    "connection_failed",
    "device_not_connected",
    "error",
    "failed",
];

/// Which rule accepted a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptedBy {
    /// The reply begins with `connected`.
    Prefix,
    /// The reply merely contains `connected` somewhere.
    SubstringFallback,
}

/// Outcome of classifying a `connect` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectReply {
    /// The backend reports an open link.
    Accepted {
        /// Port named by the backend, if any (`COM3`, `/dev/ttyACM0`, ...).
        port: Option<String>,
        rule: AcceptedBy,
    },
    /// The backend reports a failed or missing link.  Holds the raw reply.
    Rejected(String),
}

impl ConnectReply {
    /// Classifies trimmed backend output.
    pub fn classify(reply: &str) -> Self {
        let trimmed = reply.trim();
        let lower = trimmed.to_ascii_lowercase();

        if FAILURE_MARKERS.iter().any(|m| lower.contains(m)) {
            return ConnectReply::Rejected(trimmed.to_string());
        }

        if let Some(rest) = lower.strip_prefix(CONNECTED) {
            // Slice the original text so the port keeps its casing.
            let tail = &trimmed[trimmed.len() - rest.len()..];
            return ConnectReply::Accepted {
                port: port_after_keyword(tail),
                rule: AcceptedBy::Prefix,
            };
        }

        if lower.contains(CONNECTED) {
            warn!("accepting backend reply {trimmed:?} through the legacy substring rule");
            return ConnectReply::Accepted {
                port: None,
                rule: AcceptedBy::SubstringFallback,
            };
        }

        ConnectReply::Rejected(trimmed.to_string())
    }

    /// Returns `true` for [`ConnectReply::Accepted`].
    pub fn is_accepted(&self) -> bool {
        matches!(self, ConnectReply::Accepted { .. })
    }
}

/// Extracts the port from the text following the `connected` keyword.
fn port_after_keyword(tail: &str) -> Option<String> {
    let tail = tail.trim_start();
    let port = if let Some(p) = tail.strip_prefix(':') {
        p
    } else if tail.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("to ")) {
        &tail[3..]
    } else {
        return None;
    };
    let port = port.trim();
    if port.is_empty() {
        None
    } else {
        Some(port.to_string())
    }
}

/// Interprets the reply to a `status` query.
///
/// Returns `Some(true)` for an open link, `Some(false)` for a closed one, and
/// `None` when the reply does not follow the status vocabulary.
pub fn parse_status_reply(reply: &str) -> Option<bool> {
    match reply.trim().to_ascii_lowercase().as_str() {
        "connected" => Some(true),
        "disconnected" | "device_not_connected" => Some(false),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
