//! Testing utilities
//!
//! A scripted in-memory driver implementing the same surface as the
//! production one. Tests use it to count connections, inject notifications,
//! and force connect/registration/poll failures without a server.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::event::Notification;

use super::{Connection, Driver};

/// Backend process ID reported for injected notifications
pub const MOCK_BACKEND_PID: i32 = 4242;

/// Scripted driver for exercising the producer pipeline without a server
///
/// Clones share state, so a test can keep one handle for scripting while
/// the stream owns another.
#[derive(Clone, Default)]
pub struct MockDriver {
    state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    connects: AtomicU32,
    closes: AtomicU32,
    keepalives: AtomicU32,
    fail_connects: AtomicU32,
    invalidated: AtomicBool,
    fail_listen: Mutex<Option<String>>,
    pending: Mutex<VecDeque<Notification>>,
    registered: Mutex<Vec<String>>,
    statements: Mutex<Vec<String>>,
}

impl MockDriver {
    /// Create a new mock driver
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notification for delivery on the next poll cycle
    ///
    /// Only delivered if `channel` has been registered by the current
    /// connection, mirroring server-side LISTEN semantics.
    pub fn notify(&self, channel: impl Into<String>, payload: impl Into<String>) {
        let event = Notification::new(channel, payload, MOCK_BACKEND_PID);
        self.state.pending.lock().push_back(event);
    }

    /// Make the next `count` connection attempts fail
    pub fn fail_next_connects(&self, count: u32) {
        self.state.fail_connects.store(count, Ordering::SeqCst);
    }

    /// Make registration of the given channel fail
    pub fn fail_listen_on(&self, channel: impl Into<String>) {
        *self.state.fail_listen.lock() = Some(channel.into());
    }

    /// Invalidate the connection: the next liveness probe fails
    pub fn invalidate(&self) {
        self.state.invalidated.store(true, Ordering::SeqCst);
    }

    /// Number of successful connection opens
    pub fn connects(&self) -> u32 {
        self.state.connects.load(Ordering::SeqCst)
    }

    /// Number of connection closes
    pub fn closes(&self) -> u32 {
        self.state.closes.load(Ordering::SeqCst)
    }

    /// Number of liveness probes issued
    pub fn keepalives(&self) -> u32 {
        self.state.keepalives.load(Ordering::SeqCst)
    }

    /// Channels registered by the most recent connection, in order
    pub fn registered(&self) -> Vec<String> {
        self.state.registered.lock().clone()
    }

    /// Statements executed through [`Connection::execute`]
    pub fn statements(&self) -> Vec<String> {
        self.state.statements.lock().clone()
    }
}

#[async_trait]
impl Driver for MockDriver {
    type Conn = MockConnection;

    async fn connect(&self) -> Result<MockConnection> {
        let remaining = self.state.fail_connects.load(Ordering::SeqCst);
        if remaining > 0 {
            self.state.fail_connects.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::Connection("scripted connect failure".to_string()));
        }

        self.state.connects.fetch_add(1, Ordering::SeqCst);
        self.state.registered.lock().clear();

        Ok(MockConnection {
            state: Arc::clone(&self.state),
            listening: Vec::new(),
            closed: false,
        })
    }
}

/// Connection handle produced by [`MockDriver`]
pub struct MockConnection {
    state: Arc<MockState>,
    listening: Vec<String>,
    closed: bool,
}

#[async_trait]
impl Connection for MockConnection {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.state.statements.lock().push(sql.to_string());
        Ok(())
    }

    async fn listen(&mut self, channel: &str) -> Result<()> {
        let failing = self.state.fail_listen.lock().clone();
        if failing.as_deref() == Some(channel) {
            return Err(Error::Registration {
                channel: channel.to_string(),
                reason: "scripted registration failure".to_string(),
            });
        }

        self.listening.push(channel.to_string());
        self.state.registered.lock().push(channel.to_string());
        Ok(())
    }

    async fn notifications(&mut self) -> Result<Vec<Notification>> {
        let mut pending = self.state.pending.lock();
        let mut drained = Vec::with_capacity(pending.len());
        while let Some(event) = pending.pop_front() {
            // Unregistered channels are silently discarded, as the server
            // would never have queued them for this connection.
            if self.listening.contains(&event.channel) {
                drained.push(event);
            }
        }
        Ok(drained)
    }

    async fn keepalive(&mut self) -> Result<()> {
        self.state.keepalives.fetch_add(1, Ordering::SeqCst);
        if self.state.invalidated.swap(false, Ordering::SeqCst) {
            return Err(Error::Poll("connection invalidated".to_string()));
        }
        Ok(())
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.state.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_only_registered_channels_delivered() {
        let driver = MockDriver::new();
        let mut conn = driver.connect().await.unwrap();
        conn.listen("a").await.unwrap();

        driver.notify("a", "one");
        driver.notify("b", "two");

        let events = conn.notifications().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload, "one");
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let driver = MockDriver::new();
        let mut conn = driver.connect().await.unwrap();

        conn.close().await;
        conn.close().await;

        assert_eq!(driver.closes(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_fails_one_probe() {
        let driver = MockDriver::new();
        let mut conn = driver.connect().await.unwrap();

        driver.invalidate();
        assert!(conn.keepalive().await.is_err());
        assert!(conn.keepalive().await.is_ok());
    }
}
