//! Subscription handle
//!
//! The receiving end of one attachment to a shared stream. Dropping the
//! handle detaches it; when the last one detaches, the producer is torn
//! down.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::event::Notification;

use super::hub::Hub;
use super::sink::SinkReceiver;

/// Error returned by [`Subscription::recv`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvError {
    /// The subscription overflowed under the `Error` backpressure policy
    /// and was terminated; never retried
    Overflowed,
    /// No further events can arrive on this subscription
    Closed,
}

impl std::fmt::Display for RecvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecvError::Overflowed => write!(f, "Subscription overflowed"),
            RecvError::Closed => write!(f, "Subscription closed"),
        }
    }
}

impl std::error::Error for RecvError {}

/// One subscriber's attachment to a shared notification stream
///
/// Events arrive in production order, shaped by the stream's backpressure
/// policy. An optional downstream filter is applied locally and never
/// affects other subscribers.
pub struct Subscription {
    hub: Arc<Hub>,
    id: u64,
    rx: SinkReceiver,
    filter: Option<Box<dyn Fn(&Notification) -> bool + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(hub: Arc<Hub>, id: u64, rx: SinkReceiver) -> Self {
        Self {
            hub,
            id,
            rx,
            filter: None,
        }
    }

    /// Keep only events matching the predicate
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Notification) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Keep only events sent on a single channel
    pub fn channel(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.filter(move |event| event.channel == name)
    }

    /// Receive the next notification
    ///
    /// Waits until an event matching the filter (if any) is available.
    pub async fn recv(&mut self) -> Result<Notification, RecvError> {
        loop {
            let event = self.recv_unfiltered().await?;
            match &self.filter {
                Some(keep) if !keep(&event) => continue,
                _ => return Ok(event),
            }
        }
    }

    async fn recv_unfiltered(&mut self) -> Result<Notification, RecvError> {
        match &mut self.rx {
            SinkReceiver::Buffer(rx) => rx.recv().await.ok_or(RecvError::Closed),
            SinkReceiver::Drop(rx) => rx.recv().await.ok_or(RecvError::Closed),
            SinkReceiver::Latest(rx) => loop {
                if rx.changed().await.is_err() {
                    return Err(RecvError::Closed);
                }
                if let Some(event) = rx.borrow_and_update().clone() {
                    return Ok(event);
                }
            },
            SinkReceiver::Error { rx, overflowed } => match rx.recv().await {
                Some(event) => Ok(event),
                None if overflowed.load(Ordering::SeqCst) => Err(RecvError::Overflowed),
                None => Err(RecvError::Closed),
            },
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.detach(self.id);
    }
}
