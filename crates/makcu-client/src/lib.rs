//! makcu-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does makcu-client do?
//!
//! The MAKCU device is driven by a separate native program, `makcu-cpp`.
//! This crate never talks to the hardware itself.  Each operation is turned
//! into a command token (see [`makcu_core::DeviceCommand`]) and handed to a
//! fresh backend process as `makcu-cpp --command <token>`.
//!
//! 1. The backend executable is located once, when the client is built.
//! 2. `connect` runs synchronously and waits (bounded) for the reply.
//! 3. Movement, clicks and scrolling are fire-and-forget: the process is
//!    spawned and never waited on.
//! 4. `disconnect` always leaves the local session disconnected.

/// Application layer: the device facade and the transport seam.
pub mod application;

/// Infrastructure layer: discovery, process transport and configuration.
pub mod infrastructure;

/// Four-operation adapter over the device facade.
pub mod compat;

pub use application::device::{ConnectionError, DeviceClient, DeviceError, DeviceSettings};
pub use application::transport::{CommandTransport, InvocationMode, TransportError};
pub use compat::{ButtonName, CompatController};
