//! Per-subscriber delivery sinks
//!
//! Each subscription owns the receiving half of one sink; the producer
//! offers every event to every sink, and the sink applies the configured
//! backpressure policy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::config::Backpressure;
use crate::event::Notification;

/// Queue depth for the `Drop` and `Error` policies
///
/// One pending event at most: anything produced beyond what the subscriber
/// has not yet collected is dropped, or counted as overflow.
pub(crate) const READY_CAPACITY: usize = 1;

/// Producer-side half of a subscription
pub(crate) struct Sink {
    pub(crate) id: u64,
    kind: SinkKind,
}

enum SinkKind {
    Buffer(mpsc::UnboundedSender<Notification>),
    Drop(mpsc::Sender<Notification>),
    Latest(watch::Sender<Option<Notification>>),
    Error {
        tx: Option<mpsc::Sender<Notification>>,
        overflowed: Arc<AtomicBool>,
    },
}

/// Subscriber-side half of a subscription
pub(crate) enum SinkReceiver {
    Buffer(mpsc::UnboundedReceiver<Notification>),
    Drop(mpsc::Receiver<Notification>),
    Latest(watch::Receiver<Option<Notification>>),
    Error {
        rx: mpsc::Receiver<Notification>,
        overflowed: Arc<AtomicBool>,
    },
}

impl Sink {
    /// Create a connected sink/receiver pair for the given policy
    pub(crate) fn pair(id: u64, policy: Backpressure) -> (Sink, SinkReceiver) {
        match policy {
            Backpressure::Buffer => {
                let (tx, rx) = mpsc::unbounded_channel();
                (
                    Sink {
                        id,
                        kind: SinkKind::Buffer(tx),
                    },
                    SinkReceiver::Buffer(rx),
                )
            }
            Backpressure::Drop => {
                let (tx, rx) = mpsc::channel(READY_CAPACITY);
                (
                    Sink {
                        id,
                        kind: SinkKind::Drop(tx),
                    },
                    SinkReceiver::Drop(rx),
                )
            }
            Backpressure::Latest => {
                let (tx, rx) = watch::channel(None);
                (
                    Sink {
                        id,
                        kind: SinkKind::Latest(tx),
                    },
                    SinkReceiver::Latest(rx),
                )
            }
            Backpressure::Error => {
                let overflowed = Arc::new(AtomicBool::new(false));
                let (tx, rx) = mpsc::channel(READY_CAPACITY);
                (
                    Sink {
                        id,
                        kind: SinkKind::Error {
                            tx: Some(tx),
                            overflowed: Arc::clone(&overflowed),
                        },
                    },
                    SinkReceiver::Error { rx, overflowed },
                )
            }
        }
    }

    /// Offer an event to this subscriber
    ///
    /// Returns `false` once the subscriber can no longer receive anything:
    /// its receiver was dropped, or it overflowed under the `Error` policy.
    pub(crate) fn offer(&mut self, event: &Notification) -> bool {
        match &mut self.kind {
            SinkKind::Buffer(tx) => tx.send(event.clone()).is_ok(),
            SinkKind::Drop(tx) => match tx.try_send(event.clone()) {
                Ok(()) => true,
                // Subscriber not ready; the event is discarded.
                Err(mpsc::error::TrySendError::Full(_)) => true,
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            },
            SinkKind::Latest(tx) => tx.send(Some(event.clone())).is_ok(),
            SinkKind::Error { tx, overflowed } => {
                let Some(sender) = tx else { return false };
                match sender.try_send(event.clone()) {
                    Ok(()) => true,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        // Closing the channel lets the subscriber drain what
                        // it already holds before seeing the overflow.
                        overflowed.store(true, Ordering::SeqCst);
                        *tx = None;
                        false
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(payload: &str) -> Notification {
        Notification::new("test", payload, 1)
    }

    #[tokio::test]
    async fn test_buffer_holds_backlog() {
        let (mut sink, rx) = Sink::pair(1, Backpressure::Buffer);

        for i in 0..100 {
            assert!(sink.offer(&event(&i.to_string())));
        }

        let SinkReceiver::Buffer(mut rx) = rx else {
            panic!("expected buffer receiver");
        };
        for i in 0..100 {
            assert_eq!(rx.recv().await.unwrap().payload, i.to_string());
        }
    }

    #[tokio::test]
    async fn test_drop_discards_while_full() {
        let (mut sink, rx) = Sink::pair(1, Backpressure::Drop);

        assert!(sink.offer(&event("kept")));
        assert!(sink.offer(&event("dropped")));

        let SinkReceiver::Drop(mut rx) = rx else {
            panic!("expected drop receiver");
        };
        assert_eq!(rx.recv().await.unwrap().payload, "kept");

        // Capacity freed; delivery resumes.
        assert!(sink.offer(&event("next")));
        assert_eq!(rx.recv().await.unwrap().payload, "next");
    }

    #[tokio::test]
    async fn test_latest_keeps_newest() {
        let (mut sink, rx) = Sink::pair(1, Backpressure::Latest);

        sink.offer(&event("stale"));
        sink.offer(&event("fresh"));

        let SinkReceiver::Latest(mut rx) = rx else {
            panic!("expected latest receiver");
        };
        rx.changed().await.unwrap();
        let held = rx.borrow_and_update().clone().unwrap();
        assert_eq!(held.payload, "fresh");
    }

    #[tokio::test]
    async fn test_error_overflows_once_full() {
        let (mut sink, rx) = Sink::pair(1, Backpressure::Error);

        assert!(sink.offer(&event("kept")));
        assert!(!sink.offer(&event("overflow")));
        // A dead sink accepts nothing further.
        assert!(!sink.offer(&event("late")));

        let SinkReceiver::Error { mut rx, overflowed } = rx else {
            panic!("expected error receiver");
        };
        assert_eq!(rx.recv().await.unwrap().payload, "kept");
        assert!(rx.recv().await.is_none());
        assert!(overflowed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_dead_receiver_detected() {
        let (mut sink, rx) = Sink::pair(1, Backpressure::Buffer);
        drop(rx);

        assert!(!sink.offer(&event("nobody home")));
    }
}
