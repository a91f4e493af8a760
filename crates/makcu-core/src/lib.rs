//! # makcu-core
//!
//! Shared library for the MAKCU device client containing the backend command
//! grammar, the connect-reply classifier, and the session state machine.
//!
//! It has no dependencies on processes, the file system, or an async runtime;
//! the `makcu-client` crate supplies those.
//!
//! # How the pieces fit
//!
//! The MAKCU is a USB device that injects mouse input.  A native helper
//! executable (`makcu-cpp`) owns the serial link to the device and accepts one
//! command per invocation (`makcu-cpp --command move:10,-5`).  This crate
//! defines:
//!
//! - **`protocol`** – the command tokens ([`DeviceCommand`], [`MouseButton`])
//!   and the rules for reading the backend's replies ([`ConnectReply`]).
//!
//! - **`domain`** – the client-side [`Session`] record and its
//!   Disconnected → Connecting → Connected lifecycle.

pub mod domain;
pub mod protocol;

pub use domain::session::{Session, SessionError, SessionState};
pub use protocol::command::{CommandError, DeviceCommand, MouseButton};
pub use protocol::reply::{parse_status_reply, AcceptedBy, ConnectReply};
