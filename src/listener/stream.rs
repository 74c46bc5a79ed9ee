//! Shared notification stream
//!
//! The public facade: a validated, side-effect-free stream definition that
//! activates its producer on the first subscription and tears it down when
//! the last subscriber detaches.

use std::sync::Arc;

use crate::config::ListenConfig;
use crate::driver::{Driver, PgDriver};
use crate::error::Result;

use super::channels::ChannelSet;
use super::hub::Hub;
use super::producer;
use super::subscription::Subscription;

/// Point-in-time view of a stream definition
#[derive(Debug, Clone)]
pub struct ListenerStats {
    /// Number of currently attached subscribers
    pub subscriber_count: u32,
    /// Whether a producer (connection + poll loop) is currently active
    pub active: bool,
    /// Number of re-activations scheduled after failures
    pub reconnects: u64,
}

/// A shareable stream of server notifications
///
/// Building one is pure: no connection is opened until the first
/// [`subscribe`](Self::subscribe). All subscribers share a single dedicated
/// connection and poll loop; failures are retried indefinitely with a fixed
/// delay and are never surfaced to subscribers.
///
/// # Example
/// ```no_run
/// use pgnotify_rs::NotificationStream;
///
/// # async fn example() -> pgnotify_rs::Result<()> {
/// let stream = NotificationStream::for_channels(
///     "host=localhost dbname=app",
///     "app",
///     "secret",
///     ["orders", "payments"],
/// )?;
///
/// let mut events = stream.subscribe();
/// while let Ok(event) = events.recv().await {
///     println!("{} -> {}", event.channel, event.payload);
/// }
/// # Ok(())
/// # }
/// ```
pub struct NotificationStream<D: Driver = PgDriver> {
    driver: Arc<D>,
    hub: Arc<Hub>,
}

impl NotificationStream<PgDriver> {
    /// Build a stream definition with default configuration
    ///
    /// Fails synchronously on an invalid channel list; no connection is
    /// attempted.
    pub fn for_channels<I, S>(url: &str, user: &str, password: &str, channels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_config(url, user, password, channels, ListenConfig::default())
    }

    /// Build a stream definition with custom configuration
    pub fn with_config<I, S>(
        url: &str,
        user: &str,
        password: &str,
        channels: I,
        config: ListenConfig,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        // Validation comes first so a bad channel list fails before any
        // connection parameter is even parsed.
        let channels = ChannelSet::new(channels)?;
        let driver = PgDriver::new(url, user, password)?;
        Ok(Self::assemble(driver, channels, config))
    }
}

impl<D: Driver> NotificationStream<D> {
    /// Build a stream definition on top of a custom driver
    pub fn with_driver<I, S>(driver: D, channels: I, config: ListenConfig) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let channels = ChannelSet::new(channels)?;
        Ok(Self::assemble(driver, channels, config))
    }

    fn assemble(driver: D, channels: ChannelSet, config: ListenConfig) -> Self {
        Self {
            driver: Arc::new(driver),
            hub: Arc::new(Hub::new(channels, config)),
        }
    }

    /// Attach a new subscriber
    ///
    /// The first subscription activates the producer; later ones attach to
    /// the same event flow with no side effects. Dropping the returned
    /// handle detaches it; dropping the last one tears the producer down.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(&self) -> Subscription {
        let (id, rx) = self.hub.attach(|shutdown, predecessor| {
            let driver = Arc::clone(&self.driver);
            let hub = Arc::clone(&self.hub);
            tokio::spawn(producer::run(driver, hub, shutdown, predecessor))
        });

        Subscription::new(Arc::clone(&self.hub), id, rx)
    }

    /// Channel names this stream listens on, in registration order
    pub fn channels(&self) -> &[String] {
        self.hub.channels.names()
    }

    /// Configuration this stream was built with
    pub fn config(&self) -> &ListenConfig {
        &self.hub.config
    }

    /// Current stream statistics
    pub fn stats(&self) -> ListenerStats {
        ListenerStats {
            subscriber_count: self.hub.subscriber_count(),
            active: self.hub.is_active(),
            reconnects: self.hub.reconnects(),
        }
    }
}

impl<D: Driver> Clone for NotificationStream<D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            hub: Arc::clone(&self.hub),
        }
    }
}
