//! Command transport implementations.
//!
//! `process` spawns the real backend; `mock` records calls for tests.

pub mod mock;
pub mod process;

pub use mock::RecordingTransport;
pub use process::{ProcessTransport, DEFAULT_COMMAND_TIMEOUT};
