//! Four-operation adapter for callers that only need
//! `{connect, move, click, disconnect}`.
//!
//! The adapter keeps no session state of its own.  Backend discovery runs once
//! in [`CompatController::new`]; when it fails every operation returns `false`
//! and nothing is ever spawned.

use makcu_core::MouseButton;
use tracing::warn;

use crate::application::device::DeviceClient;
use crate::infrastructure::launcher::probe_backend;
use crate::infrastructure::locator::BackendAvailability;
use crate::infrastructure::storage::config::ClientConfig;

/// Button names accepted by [`CompatController::click`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonName {
    Left,
    Right,
    Middle,
    Unrecognized,
}

impl From<&str> for ButtonName {
    fn from(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "left" => ButtonName::Left,
            "right" => ButtonName::Right,
            "middle" => ButtonName::Middle,
            _ => ButtonName::Unrecognized,
        }
    }
}

impl ButtonName {
    /// Unrecognised names fall back to the left button.
    pub fn to_mouse_button(self) -> MouseButton {
        match self {
            ButtonName::Left | ButtonName::Unrecognized => MouseButton::Left,
            ButtonName::Right => MouseButton::Right,
            ButtonName::Middle => MouseButton::Middle,
        }
    }
}

/// Minimal facade over an optional [`DeviceClient`].
pub struct CompatController {
    client: Option<DeviceClient>,
}

impl CompatController {
    /// Probes for the backend once and builds the client if one was found.
    pub fn new(config: &ClientConfig) -> Self {
        Self::from_availability(probe_backend(&config.backend), config)
    }

    /// Builds the controller from an already computed discovery outcome.
    pub fn from_availability(availability: BackendAvailability, config: &ClientConfig) -> Self {
        match availability {
            BackendAvailability::Available(exe) => {
                Self::with_client(DeviceClient::with_executable(exe, config))
            }
            BackendAvailability::Missing(e) => {
                warn!("device control disabled: {e}");
                Self::unavailable()
            }
        }
    }

    /// Wraps an existing client.
    pub fn with_client(client: DeviceClient) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// A controller whose operations all return `false`.
    pub fn unavailable() -> Self {
        Self { client: None }
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.client.as_ref().is_some_and(DeviceClient::is_connected)
    }

    pub async fn connect(&self) -> bool {
        match &self.client {
            Some(client) => client.connect().await,
            None => false,
        }
    }

    /// Relative movement.  Fire-and-forget.
    pub async fn move_by(&self, dx: i32, dy: i32) -> bool {
        match &self.client {
            Some(client) => client.move_by(dx, dy).await,
            None => false,
        }
    }

    /// Clicks the button called `name` (`left`, `right`, `middle`).
    pub async fn click(&self, name: &str) -> bool {
        let button = ButtonName::from(name);
        if button == ButtonName::Unrecognized {
            warn!("unknown button {name:?}, clicking left");
        }
        match &self.client {
            Some(client) => client.click(button.to_mouse_button()).await,
            None => false,
        }
    }

    pub async fn disconnect(&self) {
        if let Some(client) = &self.client {
            client.disconnect().await;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::device::DeviceSettings;
    use crate::application::transport::CommandTransport;
    use crate::infrastructure::locator::ExecutableLocator;
    use crate::infrastructure::transport::mock::RecordingTransport;
    use std::sync::Arc;

    fn controller(transport: &Arc<RecordingTransport>) -> CompatController {
        CompatController::with_client(DeviceClient::new(
            Arc::clone(transport) as Arc<dyn CommandTransport>,
            DeviceSettings {
                high_performance: false,
                ..DeviceSettings::default()
            },
        ))
    }

    // ── ButtonName ────────────────────────────────────────────────────────────

    #[test]
    fn test_button_names_match_case_insensitively() {
        assert_eq!(ButtonName::from("LEFT"), ButtonName::Left);
        assert_eq!(ButtonName::from(" Right "), ButtonName::Right);
        assert_eq!(ButtonName::from("middle"), ButtonName::Middle);
    }

    #[test]
    fn test_unknown_button_maps_to_left() {
        let name = ButtonName::from("side");

        assert_eq!(name, ButtonName::Unrecognized);
        assert_eq!(name.to_mouse_button(), MouseButton::Left);
    }

    #[test]
    fn test_right_and_middle_map_to_their_buttons() {
        assert_eq!(ButtonName::Right.to_mouse_button(), MouseButton::Right);
        assert_eq!(ButtonName::Middle.to_mouse_button(), MouseButton::Middle);
    }

    // ── Controller ────────────────────────────────────────────────────────────

    #[test]
    fn test_unavailable_controller_rejects_everything() {
        let controller = CompatController::unavailable();

        tokio_test::block_on(async {
            assert!(!controller.connect().await);
            assert!(!controller.move_by(1, 1).await);
            assert!(!controller.click("left").await);
            controller.disconnect().await;
        });

        assert!(!controller.is_available());
        assert!(!controller.is_connected());
    }

    #[test]
    fn test_missing_backend_disables_every_operation() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let locator = ExecutableLocator::new(vec![dir.path().join("absent")]);
        let availability = BackendAvailability::probe(&locator, None);

        // Act
        let controller = CompatController::from_availability(availability, &ClientConfig::default());

        // Assert
        assert!(!controller.is_available());
        assert!(!tokio_test::block_on(controller.connect()));
        assert!(!tokio_test::block_on(controller.move_by(1, 1)));
    }

    #[test]
    fn test_found_backend_builds_a_disconnected_client() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("makcu-cpp");
        std::fs::write(&exe, b"").unwrap();
        let locator = ExecutableLocator::new(vec![dir.path().join("absent"), exe]);

        let controller = CompatController::from_availability(
            BackendAvailability::probe(&locator, None),
            &ClientConfig::default(),
        );

        assert!(controller.is_available());
        assert!(!controller.is_connected());
    }

    #[tokio::test]
    async fn test_click_maps_names_to_codes() {
        // Arrange
        let transport = Arc::new(RecordingTransport::replying("connected"));
        let controller = controller(&transport);
        assert!(controller.connect().await);

        // Act
        controller.click("Right").await;
        controller.click("wheel").await;

        // Assert
        assert_eq!(transport.tokens()[1..], ["click:1", "click:0"]);
    }

    #[tokio::test]
    async fn test_move_and_disconnect_delegate_to_client() {
        let transport = Arc::new(RecordingTransport::replying("connected to COM3"));
        let controller = controller(&transport);

        assert!(controller.connect().await);
        assert!(controller.move_by(10, -5).await);
        controller.disconnect().await;

        assert!(!controller.is_connected());
        assert!(!controller.move_by(1, 1).await);
        assert_eq!(transport.tokens(), vec!["connect", "move:10,-5", "disconnect"]);
    }
}
