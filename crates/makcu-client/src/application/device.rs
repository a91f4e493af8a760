//! DeviceClient: typed device operations on top of a [`CommandTransport`].
//!
//! `connect` is the only operation allowed while the session is not
//! `Connected`.  Every other operation checks the session first and returns
//! `false` without touching the transport when the device is not connected.
//!
//! # Fire-and-forget
//!
//! Movement, button, scroll and axis-lock operations are dispatched in
//! [`InvocationMode::Detached`].  Their `true` result means "dispatched while
//! connected" and nothing more: the backend process may fail, finish late, or
//! run out of order relative to other detached commands.  A failed spawn on
//! these paths is logged and still reported as `true`.
//!
//! # Concurrency
//!
//! `connect` and `disconnect` are serialised by an async transition lock.  The
//! session record sits behind a short `std::sync::Mutex` that is never held
//! across an await, so hot-path operations never wait for a handshake; they
//! observe `Connecting` and fail fast.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use makcu_core::{
    parse_status_reply, ConnectReply, DeviceCommand, MouseButton, Session, SessionState,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::transport::{CommandTransport, InvocationMode, TransportError};

/// Segment count used by [`DeviceClient::move_smooth`] when none is given.
pub const DEFAULT_SMOOTH_SEGMENTS: u32 = 10;

/// Failure of the connect handshake.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("handshake failed: {0}")]
    Transport(#[from] TransportError),
    #[error("backend rejected the connection: {0:?}")]
    Rejected(String),
    #[error("backend returned no reply")]
    NoReply,
}

/// Failure of a single device operation.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The operation needs a connected session.
    #[error("device is not connected")]
    NotConnected,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("unexpected backend reply: {0:?}")]
    UnexpectedReply(String),
}

/// Session settings applied by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSettings {
    /// Port used by [`DeviceClient::connect`]; `None` means auto-detect.
    pub port: Option<String>,
    /// Request high-performance mode right after connecting.
    pub high_performance: bool,
    /// Default interpolation segment count for smooth moves.
    pub smooth_segments: u32,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            port: None,
            high_performance: true,
            smooth_segments: DEFAULT_SMOOTH_SEGMENTS,
        }
    }
}

/// Aborts an in-flight handshake when dropped before [`PendingHandshake::disarm`].
struct PendingHandshake<'a> {
    session: &'a Mutex<Session>,
    armed: bool,
}

impl<'a> PendingHandshake<'a> {
    fn new(session: &'a Mutex<Session>) -> Self {
        Self {
            session,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingHandshake<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if session.state() == SessionState::Connecting {
            if let Err(e) = session.abort_connect() {
                warn!("cannot abort handshake: {e}");
            }
            debug!("handshake did not complete, session reset");
        }
    }
}

/// Thread-shareable client for one backend.
pub struct DeviceClient {
    transport: Arc<dyn CommandTransport>,
    settings: DeviceSettings,
    session: Mutex<Session>,
    transitions: tokio::sync::Mutex<()>,
}

impl DeviceClient {
    /// Creates a disconnected client that talks through `transport`.
    pub fn new(transport: Arc<dyn CommandTransport>, settings: DeviceSettings) -> Self {
        Self {
            transport,
            settings,
            session: Mutex::new(Session::new()),
            transitions: tokio::sync::Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of the current session record.
    pub fn session_snapshot(&self) -> Session {
        self.session().clone()
    }

    pub fn state(&self) -> SessionState {
        self.session().state()
    }

    pub fn is_connected(&self) -> bool {
        self.session().is_connected()
    }

    /// Human-readable status, e.g. `Connected to COM3` or `Disconnected`.
    pub fn status_text(&self) -> String {
        self.session().status_text()
    }

    // ── Session transitions ───────────────────────────────────────────────────

    /// Connects on the configured port (auto-detect when none is configured).
    pub async fn connect(&self) -> bool {
        let port = self.settings.port.clone();
        self.connect_to(port.as_deref()).await
    }

    /// Performs the synchronous handshake on `port`.
    ///
    /// Returns `true` once the session is `Connected`.  An already connected
    /// client returns `true` without a new handshake.  Handshake failures,
    /// rejections and timeouts return `false` and leave the session
    /// `Disconnected`, as does dropping the future before it completes.
    pub async fn connect_to(&self, port: Option<&str>) -> bool {
        let _transition = self.transitions.lock().await;
        let port = port.map(str::trim).filter(|p| !p.is_empty());

        {
            let mut session = self.session();
            if session.is_connected() {
                debug!("connect requested while already connected");
                return true;
            }
            if let Err(e) = session.begin_connect() {
                warn!("cannot start handshake: {e}");
                return false;
            }
        }
        // Dropping this future mid-handshake must not strand the session in `Connecting`.
        let pending = PendingHandshake::new(&self.session);

        match self.handshake(port).await {
            Ok(reported_port) => {
                let port = port.map(str::to_string).or(reported_port).unwrap_or_default();
                let completed = self.session().complete_connect(port);
                if let Err(e) = completed {
                    warn!("cannot complete handshake: {e}");
                    return false;
                }
                pending.disarm();
            }
            Err(e) => {
                warn!("connect failed: {e}");
                return false;
            }
        }

        if self.settings.high_performance {
            self.enable_high_performance().await;
        }
        info!("{}", self.status_text());
        true
    }

    async fn handshake(&self, port: Option<&str>) -> Result<Option<String>, ConnectionError> {
        let command = DeviceCommand::Connect {
            port: port.map(str::to_string),
        };
        let reply = self
            .transport
            .invoke(&command, InvocationMode::Sync)
            .await?
            .ok_or(ConnectionError::NoReply)?;

        match ConnectReply::classify(&reply) {
            ConnectReply::Accepted { port, .. } => Ok(port),
            ConnectReply::Rejected(reply) => Err(ConnectionError::Rejected(reply)),
        }
    }

    /// Best effort: a failed dispatch leaves `high_performance` false.
    async fn enable_high_performance(&self) {
        let command = DeviceCommand::EnableHighPerformance(true);
        match self
            .transport
            .invoke(&command, InvocationMode::Detached)
            .await
        {
            Ok(_) => {
                if let Err(e) = self.session().set_high_performance(true) {
                    warn!("cannot record high-performance mode: {e}");
                }
            }
            Err(e) => warn!("high-performance mode not enabled: {e}"),
        }
    }

    /// Closes the session.
    ///
    /// The session becomes `Disconnected` before the detached `disconnect`
    /// command is dispatched, so the local state is updated even if the
    /// backend never runs.  Does nothing when already disconnected.
    pub async fn disconnect(&self) {
        let _transition = self.transitions.lock().await;
        if !self.session().disconnect() {
            return;
        }
        if let Err(e) = self
            .transport
            .invoke(&DeviceCommand::Disconnect, InvocationMode::Detached)
            .await
        {
            warn!("disconnect command not delivered: {e}");
        }
    }

    // ── Fire-and-forget operations ────────────────────────────────────────────

    /// Relative pointer movement.  Fire-and-forget.
    pub async fn move_by(&self, dx: i32, dy: i32) -> bool {
        self.fire(DeviceCommand::Move { dx, dy }).await
    }

    /// Relative movement interpolated by the backend over `segments` steps
    /// (the configured default when `None`).  Fire-and-forget.
    pub async fn move_smooth(&self, dx: i32, dy: i32, segments: Option<u32>) -> bool {
        let segments = segments.unwrap_or(self.settings.smooth_segments);
        self.fire(DeviceCommand::MoveSmooth { dx, dy, segments })
            .await
    }

    /// Press-and-release of `button`.  Fire-and-forget.
    pub async fn click(&self, button: MouseButton) -> bool {
        self.fire(DeviceCommand::Click(button)).await
    }

    /// Holds `button` down.  Fire-and-forget.
    pub async fn press(&self, button: MouseButton) -> bool {
        self.fire(DeviceCommand::Press(button)).await
    }

    /// Releases `button`.  Fire-and-forget.
    pub async fn release(&self, button: MouseButton) -> bool {
        self.fire(DeviceCommand::Release(button)).await
    }

    /// Wheel movement; positive scrolls up.  Fire-and-forget.
    pub async fn scroll(&self, delta: i32) -> bool {
        self.fire(DeviceCommand::Scroll(delta)).await
    }

    /// Locks or unlocks horizontal movement.  Fire-and-forget.
    pub async fn lock_axis_x(&self, enabled: bool) -> bool {
        self.fire(DeviceCommand::LockX(enabled)).await
    }

    /// Locks or unlocks vertical movement.  Fire-and-forget.
    pub async fn lock_axis_y(&self, enabled: bool) -> bool {
        self.fire(DeviceCommand::LockY(enabled)).await
    }

    /// Dispatches `command` detached, returning whether it was sent while connected.
    async fn fire(&self, command: DeviceCommand) -> bool {
        match self.dispatch(&command).await {
            Ok(()) => true,
            Err(DeviceError::NotConnected) => false,
            Err(e) => {
                warn!("`{command}` dropped: {e}");
                true
            }
        }
    }

    /// Dispatches `command` detached once the connected precondition holds.
    ///
    /// # Errors
    ///
    /// [`DeviceError::NotConnected`] without touching the transport, or
    /// [`DeviceError::Transport`] if the spawn fails.
    pub async fn dispatch(&self, command: &DeviceCommand) -> Result<(), DeviceError> {
        if !self.is_connected() {
            return Err(DeviceError::NotConnected);
        }
        debug!("dispatch `{command}`");
        self.transport
            .invoke(command, InvocationMode::Detached)
            .await?;
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Runs a synchronous query once the connected precondition holds.
    ///
    /// # Errors
    ///
    /// [`DeviceError::NotConnected`], [`DeviceError::Transport`], or
    /// [`DeviceError::UnexpectedReply`] when the backend printed nothing.
    pub async fn query(&self, command: &DeviceCommand) -> Result<String, DeviceError> {
        if !self.is_connected() {
            return Err(DeviceError::NotConnected);
        }
        match self.transport.invoke(command, InvocationMode::Sync).await? {
            Some(reply) if !reply.is_empty() => Ok(reply),
            other => Err(DeviceError::UnexpectedReply(other.unwrap_or_default())),
        }
    }

    /// Asks the backend whether the device link is up.
    ///
    /// Returns `None` when disconnected or when the query fails.
    pub async fn query_status(&self) -> Option<bool> {
        match self.query(&DeviceCommand::Status).await {
            Ok(reply) => {
                let status = parse_status_reply(&reply);
                if status.is_none() {
                    warn!("unrecognised status reply {reply:?}");
                }
                status
            }
            Err(DeviceError::NotConnected) => None,
            Err(e) => {
                warn!("status query failed: {e}");
                None
            }
        }
    }

    /// Returns the firmware version reported by the backend.
    pub async fn firmware_version(&self) -> Option<String> {
        match self.query(&DeviceCommand::Version).await {
            Ok(version) => Some(version),
            Err(DeviceError::NotConnected) => None,
            Err(e) => {
                warn!("version query failed: {e}");
                None
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::transport::MockCommandTransport;
    use crate::infrastructure::transport::mock::RecordingTransport;
    use std::time::Duration;

    fn client_with(transport: &Arc<RecordingTransport>) -> DeviceClient {
        DeviceClient::new(
            Arc::clone(transport) as Arc<dyn CommandTransport>,
            DeviceSettings::default(),
        )
    }

    async fn connected_client() -> (DeviceClient, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::replying("connected:COM3"));
        let client = client_with(&transport);
        assert!(client.connect().await);
        (client, transport)
    }

    // ── Precondition ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_operations_while_disconnected_never_reach_transport() {
        // Arrange
        let mut mock = MockCommandTransport::new();
        mock.expect_invoke().never();
        let client = DeviceClient::new(Arc::new(mock), DeviceSettings::default());

        // Act
        let results = [
            client.move_by(10, -5).await,
            client.move_smooth(1, 1, None).await,
            client.click(MouseButton::Left).await,
            client.press(MouseButton::Right).await,
            client.release(MouseButton::Right).await,
            client.scroll(-3).await,
            client.lock_axis_x(true).await,
            client.lock_axis_y(false).await,
        ];

        // Assert
        assert!(results.iter().all(|ok| !ok));
        assert_eq!(client.query_status().await, None);
        assert_eq!(client.firmware_version().await, None);
    }

    #[tokio::test]
    async fn test_dispatch_while_disconnected_reports_precondition() {
        let transport = Arc::new(RecordingTransport::new());
        let client = client_with(&transport);

        let err = client
            .dispatch(&DeviceCommand::Scroll(1))
            .await
            .unwrap_err();

        assert!(matches!(err, DeviceError::NotConnected));
        assert_eq!(transport.count(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_while_disconnected_is_a_no_op() {
        let mut mock = MockCommandTransport::new();
        mock.expect_invoke().never();
        let client = DeviceClient::new(Arc::new(mock), DeviceSettings::default());

        client.disconnect().await;

        assert_eq!(client.state(), SessionState::Disconnected);
    }

    // ── Connect ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_connect_uses_sync_then_enables_high_performance() {
        // Arrange / Act
        let (client, transport) = connected_client().await;

        // Assert
        assert_eq!(transport.tokens(), vec!["connect", "enable_high_performance:true"]);
        assert_eq!(transport.mode_at(0), Some(InvocationMode::Sync));
        assert_eq!(transport.mode_at(1), Some(InvocationMode::Detached));
        let session = client.session_snapshot();
        assert!(session.is_connected());
        assert!(session.high_performance());
        assert_eq!(session.port(), "COM3");
    }

    #[tokio::test]
    async fn test_connect_to_explicit_port_sends_port_and_keeps_it() {
        let transport = Arc::new(RecordingTransport::replying("connected"));
        let client = client_with(&transport);

        assert!(client.connect_to(Some("COM9")).await);

        assert_eq!(transport.tokens()[0], "connect:COM9");
        assert_eq!(client.status_text(), "Connected to COM9");
    }

    #[tokio::test]
    async fn test_connect_without_port_reports_auto_detect() {
        let transport = Arc::new(RecordingTransport::replying("Connected"));
        let client = client_with(&transport);

        assert!(client.connect().await);

        assert_eq!(client.status_text(), "Connected to auto-detected port");
    }

    #[tokio::test]
    async fn test_connect_rejected_reply_leaves_disconnected() {
        let transport = Arc::new(RecordingTransport::replying("device not connected"));
        let client = client_with(&transport);

        assert!(!client.connect().await);

        assert_eq!(client.state(), SessionState::Disconnected);
        assert_eq!(transport.tokens(), vec!["connect"]);
    }

    #[tokio::test]
    async fn test_connect_timeout_leaves_disconnected() {
        // Arrange
        let transport = Arc::new(RecordingTransport::new());
        transport.push_reply(Err(TransportError::Timeout {
            command: "connect".to_string(),
            timeout: Duration::from_secs(1),
        }));
        let client = client_with(&transport);

        // Act
        let connected = client.connect().await;

        // Assert
        assert!(!connected);
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_connect_with_empty_reply_fails() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push_reply(Ok(None));
        let client = client_with(&transport);

        assert!(!client.connect().await);
    }

    #[tokio::test]
    async fn test_high_performance_failure_does_not_revert_connect() {
        // Arrange
        let transport = Arc::new(RecordingTransport {
            fail_detached: true,
            ..RecordingTransport::default()
        });
        transport.push_reply(Ok(Some("connected:COM3".to_string())));
        let client = client_with(&transport);

        // Act
        let connected = client.connect().await;

        // Assert
        assert!(connected);
        assert!(client.is_connected());
        assert!(!client.session_snapshot().high_performance());
    }

    #[tokio::test]
    async fn test_high_performance_disabled_in_settings_is_not_requested() {
        let transport = Arc::new(RecordingTransport::replying("connected"));
        let client = DeviceClient::new(
            Arc::clone(&transport) as Arc<dyn CommandTransport>,
            DeviceSettings {
                high_performance: false,
                ..DeviceSettings::default()
            },
        );

        assert!(client.connect().await);

        assert_eq!(transport.tokens(), vec!["connect"]);
    }

    #[tokio::test]
    async fn test_connect_when_connected_skips_handshake() {
        let (client, transport) = connected_client().await;
        let before = transport.count();

        assert!(client.connect().await);

        assert_eq!(transport.count(), before);
    }

    #[tokio::test]
    async fn test_concurrent_connects_run_one_handshake() {
        // Arrange
        let transport = Arc::new(RecordingTransport::replying("connected"));
        let client = client_with(&transport);

        // Act
        let (a, b) = tokio::join!(client.connect(), client.connect());

        // Assert
        assert!(a && b);
        let handshakes = transport
            .tokens()
            .iter()
            .filter(|t| t.starts_with("connect"))
            .count();
        assert_eq!(handshakes, 1);
    }

    /// Never answers the first sync call; replies `connected:COM3` afterwards.
    #[derive(Default)]
    struct StallingTransport {
        sync_calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl CommandTransport for StallingTransport {
        async fn invoke(
            &self,
            _command: &DeviceCommand,
            mode: InvocationMode,
        ) -> Result<Option<String>, TransportError> {
            if mode == InvocationMode::Detached {
                return Ok(None);
            }
            let call = self
                .sync_calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if call == 0 {
                std::future::pending::<()>().await;
            }
            Ok(Some("connected:COM3".to_string()))
        }
    }

    #[tokio::test]
    async fn test_cancelled_connect_resets_session_and_allows_retry() {
        // Arrange
        let client = DeviceClient::new(
            Arc::new(StallingTransport::default()),
            DeviceSettings::default(),
        );

        // Act
        let first = tokio::time::timeout(Duration::from_millis(50), client.connect()).await;
        let state_after_cancel = client.state();
        let second = client.connect().await;

        // Assert
        assert!(first.is_err());
        assert_eq!(state_after_cancel, SessionState::Disconnected);
        assert!(second);
        assert_eq!(client.status_text(), "Connected to COM3");
    }

    // ── Fire-and-forget ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_move_dispatches_detached_token() {
        let (client, transport) = connected_client().await;

        assert!(client.move_by(10, -5).await);

        let last = transport.count() - 1;
        assert_eq!(transport.tokens()[last], "move:10,-5");
        assert_eq!(transport.mode_at(last), Some(InvocationMode::Detached));
    }

    #[tokio::test]
    async fn test_move_returns_true_even_when_spawn_fails() {
        // Arrange
        let failing = Arc::new(RecordingTransport {
            fail_detached: true,
            ..RecordingTransport::default()
        });
        failing.push_reply(Ok(Some("connected".to_string())));
        let client = client_with(&failing);
        assert!(client.connect().await);

        // Act / Assert
        assert!(client.move_by(1, 2).await);
        assert!(matches!(
            client.dispatch(&DeviceCommand::Move { dx: 1, dy: 2 }).await,
            Err(DeviceError::Transport(TransportError::SpawnFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_every_operation_renders_its_token() {
        // Arrange
        let (client, transport) = connected_client().await;
        let start = transport.count();

        // Act
        client.move_smooth(5, 6, None).await;
        client.move_smooth(5, 6, Some(3)).await;
        client.click(MouseButton::Middle).await;
        client.press(MouseButton::Side1).await;
        client.release(MouseButton::Side2).await;
        client.scroll(-3).await;
        client.lock_axis_x(true).await;
        client.lock_axis_y(false).await;

        // Assert
        assert_eq!(
            transport.tokens()[start..],
            [
                "move_smooth:5,6,10",
                "move_smooth:5,6,3",
                "click:2",
                "press:3",
                "release:4",
                "scroll:-3",
                "lock_x:1",
                "lock_y:0",
            ]
        );
    }

    // ── Disconnect ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_disconnect_survives_failed_spawn() {
        // Arrange
        let transport = Arc::new(RecordingTransport {
            fail_detached: true,
            ..RecordingTransport::default()
        });
        transport.push_reply(Ok(Some("connected".to_string())));
        let client = client_with(&transport);
        assert!(client.connect().await);

        // Act
        client.disconnect().await;

        // Assert
        assert_eq!(client.state(), SessionState::Disconnected);
        assert_eq!(transport.tokens().last().map(String::as_str), Some("disconnect"));
    }

    #[tokio::test]
    async fn test_move_after_disconnect_is_rejected_without_spawn() {
        let (client, transport) = connected_client().await;
        client.disconnect().await;
        let before = transport.count();

        assert!(!client.move_by(1, 1).await);

        assert_eq!(transport.count(), before);
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_status_and_version_queries_use_sync_mode() {
        // Arrange
        let (client, transport) = connected_client().await;
        transport.push_reply(Ok(Some("connected".to_string())));
        transport.push_reply(Ok(Some("km.MAKCU v3.2".to_string())));

        // Act
        let status = client.query_status().await;
        let version = client.firmware_version().await;

        // Assert
        assert_eq!(status, Some(true));
        assert_eq!(version.as_deref(), Some("km.MAKCU v3.2"));
        let n = transport.count();
        assert_eq!(transport.mode_at(n - 1), Some(InvocationMode::Sync));
        assert_eq!(transport.mode_at(n - 2), Some(InvocationMode::Sync));
    }

    #[tokio::test]
    async fn test_failed_query_degrades_to_none() {
        let (client, _transport) = connected_client().await;

        // No scripted reply: the recording transport answers with a non-zero exit.
        assert_eq!(client.firmware_version().await, None);
        assert!(client.is_connected());
    }
}
