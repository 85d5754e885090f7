//! Application context
//!
//! Everything a session needs is passed in explicitly through [`AppContext`]:
//! configuration, the backend client, where failure notices go, and the
//! request event stream. There is no process-wide state.

use crate::config::ReportConfig;
use crate::error::ConfigError;
use crate::events::RequestEvent;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use ulid::Ulid;
use wr_client::ReportClient;

/// Unique session identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Ulid);

impl SessionId {
    /// Generate new session ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User-visible failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureNotice {
    /// Session the failure happened in
    pub session: SessionId,
    /// Operation that failed, e.g. `open_tag`
    pub operation: &'static str,
    /// Rendered error
    pub message: String,
}

/// Receives failure notices
pub trait Notifier: Send + Sync {
    /// Deliver one notice; must not block
    fn notify(&self, notice: FailureNotice);
}

/// Logs notices at `error`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: FailureNotice) {
        tracing::error!(
            session = %notice.session,
            operation = notice.operation,
            "{}",
            notice.message
        );
    }
}

/// Forwards notices over a bounded channel
///
/// Notices are dropped with a warning when the channel is full or closed.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::Sender<FailureNotice>,
}

impl ChannelNotifier {
    /// Create notifier and its receiving end
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<FailureNotice>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: FailureNotice) {
        if let Err(e) = self.sender.try_send(notice) {
            tracing::warn!(error = %e, "failure notice dropped");
        }
    }
}

/// Shared collaborators of every session
#[derive(Clone)]
pub struct AppContext {
    config: Arc<ReportConfig>,
    client: ReportClient,
    notifier: Arc<dyn Notifier>,
    events: broadcast::Sender<RequestEvent>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Capacity of the request event stream
    pub const EVENT_CAPACITY: usize = 64;

    /// Create context with an explicit client
    #[must_use]
    pub fn new(config: ReportConfig, client: ReportClient) -> Self {
        let (events, _) = broadcast::channel(Self::EVENT_CAPACITY);
        Self {
            config: Arc::new(config),
            client,
            notifier: Arc::new(TracingNotifier),
            events,
        }
    }

    /// Create context talking HTTP to `config.backend_url`
    ///
    /// # Errors
    /// `ConfigError::Invalid` if the backend URL is unusable
    pub fn connect(config: ReportConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = ReportClient::http(&config.backend_url, config.request_timeout())
            .map_err(|e| ConfigError::invalid("backend_url", e.to_string()))?;
        Ok(Self::new(config, client))
    }

    /// With notifier
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Backend client
    #[inline]
    #[must_use]
    pub fn client(&self) -> &ReportClient {
        &self.client
    }

    /// Failure notice sink
    #[inline]
    #[must_use]
    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Publish a request event to every subscriber
    ///
    /// Returns the number of subscribers reached.
    pub fn publish(&self, event: RequestEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }

    /// Subscribe to request events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RequestEvent> {
        self.events.subscribe()
    }
}
