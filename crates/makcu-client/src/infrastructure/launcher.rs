//! Wiring from [`ClientConfig`] to a ready [`DeviceClient`].
//!
//! Discovery runs here, once, before any command is sent.  The result is
//! either a client bound to a [`ProcessTransport`] or a [`DiscoveryError`].

use std::sync::Arc;

use crate::application::device::{DeviceClient, DeviceSettings};
use crate::infrastructure::locator::{
    BackendAvailability, DiscoveryError, ExecutableLocator, ExecutablePath,
};
use crate::infrastructure::storage::config::{BackendConfig, ClientConfig, DeviceConfig};
use crate::infrastructure::transport::ProcessTransport;

impl From<&DeviceConfig> for DeviceSettings {
    fn from(device: &DeviceConfig) -> Self {
        Self {
            port: device.port().map(str::to_string),
            high_performance: device.high_performance,
            smooth_segments: device.smooth_segments,
        }
    }
}

/// Builds the locator for `backend`: the configured search root, or the
/// current directory.
///
/// # Errors
///
/// Returns [`DiscoveryError::CurrentDir`] when no search root is configured and
/// the working directory is unavailable.
pub fn locator_for(backend: &BackendConfig) -> Result<ExecutableLocator, DiscoveryError> {
    match backend.search_root.as_deref() {
        Some(root) => Ok(ExecutableLocator::with_default_candidates(root)),
        None => ExecutableLocator::from_current_dir(),
    }
}

/// Runs discovery for `backend`.
///
/// # Errors
///
/// Returns [`DiscoveryError`] when no candidate exists.
pub fn locate_backend(backend: &BackendConfig) -> Result<ExecutablePath, DiscoveryError> {
    locator_for(backend)?.resolve(backend.executable.as_deref())
}

/// Runs discovery once and records the outcome as data.
pub fn probe_backend(backend: &BackendConfig) -> BackendAvailability {
    match locator_for(backend) {
        Ok(locator) => BackendAvailability::probe(&locator, backend.executable.as_deref()),
        Err(e) => BackendAvailability::Missing(e),
    }
}

impl DeviceClient {
    /// Locates the backend and returns a disconnected client bound to it.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError`] if no backend executable can be found.
    pub fn launch(config: &ClientConfig) -> Result<Self, DiscoveryError> {
        let executable = locate_backend(&config.backend)?;
        Ok(Self::with_executable(executable, config))
    }

    /// Returns a disconnected client that spawns `executable` for each command.
    pub fn with_executable(executable: ExecutablePath, config: &ClientConfig) -> Self {
        let transport = ProcessTransport::new(executable, config.backend.command_timeout());
        Self::new(Arc::new(transport), DeviceSettings::from(&config.device))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
