//! Application layer: what the client can do with a backend.
//!
//! - **`transport`** – the [`transport::CommandTransport`] seam and its error
//!   type.  Implementations live in `infrastructure::transport`.
//! - **`device`** – [`device::DeviceClient`], the typed facade.  Every
//!   operation except `connect` requires a connected session.

pub mod device;
pub mod transport;
