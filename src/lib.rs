//! Shared PostgreSQL `LISTEN`/`NOTIFY` event streams
//!
//! Turns the server's poll-based notification mechanism into a push-style,
//! shareable stream: register interest in a set of channels once, then any
//! number of subscribers receive the events over a single dedicated
//! connection and a single poll loop, no matter how many attach.
//!
//! - The producer activates lazily on the first subscription and is torn
//!   down when the last subscriber detaches; a later subscription cold-starts
//!   it again.
//! - Any connection, registration, or poll failure is logged and converted
//!   into a full re-activation after a fixed delay, indefinitely; subscribers
//!   never see those failures.
//! - A [`Backpressure`] policy chosen at construction governs what happens
//!   to events a subscriber cannot keep up with.
//!
//! # Example
//! ```no_run
//! use pgnotify_rs::NotificationStream;
//!
//! # async fn example() -> pgnotify_rs::Result<()> {
//! let stream = NotificationStream::for_channels(
//!     "host=localhost dbname=app",
//!     "app",
//!     "secret",
//!     ["orders"],
//! )?;
//!
//! let mut events = stream.subscribe().channel("orders");
//! while let Ok(event) = events.recv().await {
//!     println!("order update: {}", event.payload);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod event;
pub mod listener;

pub use config::{Backpressure, ListenConfig};
pub use driver::{Connection, Driver, PgDriver};
pub use error::{Error, Result};
pub use event::Notification;
pub use listener::{ChannelSet, ListenerStats, NotificationStream, RecvError, Subscription};
