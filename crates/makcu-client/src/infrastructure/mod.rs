//! Infrastructure layer for the client.
//!
//! Contains the OS-facing adapters: backend discovery, process spawning and
//! config file persistence.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `makcu_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`locator`** – probes the ordered candidate list for the `makcu-cpp`
//!   executable and records the result as `BackendAvailability`.
//! - **`transport`** – `ProcessTransport`, which runs one backend process per
//!   command, and a `RecordingTransport` for tests.
//! - **`storage`** – TOML configuration in the platform config directory.
//! - **`launcher`** – builds a `DeviceClient` from a `ClientConfig`.

pub mod launcher;
pub mod locator;
pub mod storage;
pub mod transport;
