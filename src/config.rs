//! Stream configuration

use std::time::Duration;

/// Default delay between poll cycles
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Default delay before reconnecting after a failure
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5000);

/// Policy applied when subscribers consume slower than events are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backpressure {
    /// Queue events without a fixed bound; unbounded memory growth under
    /// sustained overload
    #[default]
    Buffer,
    /// Discard newly produced events while the subscriber is not ready
    Drop,
    /// Retain only the most recently produced pending event
    Latest,
    /// Overflow terminates the subscription with an error; never retried
    Error,
}

/// Listener configuration options
///
/// Chosen once when the stream definition is built; immutable afterwards.
#[derive(Debug, Clone)]
pub struct ListenConfig {
    /// Delay between poll cycles
    pub poll_interval: Duration,

    /// Fixed delay before re-activating the pipeline after a failure
    pub reconnect_delay: Duration,

    /// Backpressure policy applied to every subscriber
    pub backpressure: Backpressure,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            backpressure: Backpressure::default(),
        }
    }
}

impl ListenConfig {
    /// Set the poll interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the reconnect delay
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the backpressure policy
    pub fn backpressure(mut self, policy: Backpressure) -> Self {
        self.backpressure = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ListenConfig::default();

        assert_eq!(config.poll_interval, Duration::from_millis(1000));
        assert_eq!(config.reconnect_delay, Duration::from_millis(5000));
        assert_eq!(config.backpressure, Backpressure::Buffer);
    }

    #[test]
    fn test_builder_poll_interval() {
        let config = ListenConfig::default().poll_interval(Duration::from_millis(250));

        assert_eq!(config.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_builder_reconnect_delay() {
        let config = ListenConfig::default().reconnect_delay(Duration::from_secs(1));

        assert_eq!(config.reconnect_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_builder_backpressure() {
        let config = ListenConfig::default().backpressure(Backpressure::Latest);

        assert_eq!(config.backpressure, Backpressure::Latest);
    }

    #[test]
    fn test_builder_chaining() {
        let config = ListenConfig::default()
            .poll_interval(Duration::from_millis(100))
            .reconnect_delay(Duration::from_millis(500))
            .backpressure(Backpressure::Drop);

        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.reconnect_delay, Duration::from_millis(500));
        assert_eq!(config.backpressure, Backpressure::Drop);
    }
}
