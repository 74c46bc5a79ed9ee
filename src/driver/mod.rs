//! Database driver boundary
//!
//! The producer pipeline talks to the database exclusively through the
//! [`Driver`]/[`Connection`] trait pair: open an authenticated connection,
//! execute statement text, register channel interest, drain accumulated
//! notifications, and issue a trivial keep-alive query. The production
//! implementation lives in [`pg`]; tests script the same surface through
//! [`testing::MockDriver`].

pub mod pg;
pub mod testing;

pub use pg::{PgConnection, PgDriver};

use async_trait::async_trait;

use crate::error::Result;
use crate::event::Notification;

/// Factory for dedicated notification connections
///
/// One driver backs one stream definition; every producer activation asks it
/// for a fresh connection.
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    /// Connection type produced by this driver
    type Conn: Connection;

    /// Open a new authenticated connection
    async fn connect(&self) -> Result<Self::Conn>;
}

/// A dedicated connection capable of receiving notifications
///
/// Owned exclusively by one producer activation. All methods may be called
/// after a failure; only [`close`](Connection::close) is required to succeed
/// then.
#[async_trait]
pub trait Connection: Send {
    /// Execute arbitrary statement text, discarding any result rows
    async fn execute(&mut self, sql: &str) -> Result<()>;

    /// Register interest in a notification channel
    async fn listen(&mut self, channel: &str) -> Result<()>;

    /// Drain the notifications accumulated since the last call
    ///
    /// Returns an empty vector when nothing is pending; an error only when
    /// the connection itself is no longer usable.
    async fn notifications(&mut self) -> Result<Vec<Notification>>;

    /// Issue a trivial keep-alive query, verifying the connection is live
    async fn keepalive(&mut self) -> Result<()> {
        self.execute("SELECT 1").await
    }

    /// Close the connection
    ///
    /// Idempotent; safe to call repeatedly or on an already-failed handle.
    async fn close(&mut self);
}
