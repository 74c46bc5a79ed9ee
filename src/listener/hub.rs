//! Multicast sharing state
//!
//! The hub owns everything shared between a stream definition, its
//! subscribers, and the producer task: the sink registry, the subscriber
//! refcount, and the handle controlling the currently active producer.
//! Refcount transitions drive the producer lifecycle: 0→1 spawns it,
//! 1→0 signals cooperative shutdown.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::ListenConfig;
use crate::event::Notification;

use super::channels::ChannelSet;
use super::sink::{Sink, SinkReceiver};

/// Shared state behind one stream definition
pub(crate) struct Hub {
    pub(crate) channels: ChannelSet,
    pub(crate) config: ListenConfig,
    state: Mutex<ShareState>,
    reconnects: AtomicU64,
}

struct ShareState {
    sinks: Vec<Sink>,
    next_sink_id: u64,
    subscriber_count: u32,
    producer: Option<ProducerControl>,
    /// Join handle of a producer that was told to shut down; the next
    /// activation awaits it so two producers never overlap.
    draining: Option<JoinHandle<()>>,
}

struct ProducerControl {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Hub {
    pub(crate) fn new(channels: ChannelSet, config: ListenConfig) -> Self {
        Self {
            channels,
            config,
            state: Mutex::new(ShareState {
                sinks: Vec::new(),
                next_sink_id: 0,
                subscriber_count: 0,
                producer: None,
                draining: None,
            }),
            reconnects: AtomicU64::new(0),
        }
    }

    /// Attach a subscriber, spawning the producer on the 0→1 transition
    ///
    /// `spawn_producer` is invoked under the state lock, so two racing
    /// first-subscribers cannot both activate.
    pub(crate) fn attach<F>(&self, spawn_producer: F) -> (u64, SinkReceiver)
    where
        F: FnOnce(watch::Receiver<bool>, Option<JoinHandle<()>>) -> JoinHandle<()>,
    {
        let mut state = self.state.lock();

        let id = state.next_sink_id;
        state.next_sink_id += 1;

        let (sink, rx) = Sink::pair(id, self.config.backpressure);
        state.sinks.push(sink);
        state.subscriber_count += 1;

        if state.producer.is_none() {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let predecessor = state.draining.take();
            let handle = spawn_producer(shutdown_rx, predecessor);
            state.producer = Some(ProducerControl {
                shutdown: shutdown_tx,
                handle,
            });

            tracing::debug!(channels = %self.channels, "producer activated");
        }

        (id, rx)
    }

    /// Detach a subscriber, tearing the producer down on the 1→0 transition
    pub(crate) fn detach(&self, id: u64) {
        let mut state = self.state.lock();

        state.sinks.retain(|sink| sink.id != id);
        state.subscriber_count = state.subscriber_count.saturating_sub(1);

        if state.subscriber_count == 0 {
            if let Some(producer) = state.producer.take() {
                // Cooperative: the loop notices the flag at its next check
                // or wakes out of whichever timed wait it is in.
                let _ = producer.shutdown.send(true);
                state.draining = Some(producer.handle);

                tracing::debug!(channels = %self.channels, "producer torn down");
            }
        }
    }

    /// Fan an event out to every attached sink
    ///
    /// Sinks that can no longer accept anything are discarded.
    pub(crate) fn fanout(&self, event: &Notification) {
        let mut state = self.state.lock();
        state.sinks.retain_mut(|sink| sink.offer(event));
    }

    /// Number of currently attached subscribers
    pub(crate) fn subscriber_count(&self) -> u32 {
        self.state.lock().subscriber_count
    }

    /// Whether a producer is currently active
    pub(crate) fn is_active(&self) -> bool {
        self.state.lock().producer.is_some()
    }

    /// Record one scheduled re-activation
    pub(crate) fn record_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of re-activations scheduled so far
    pub(crate) fn reconnects(&self) -> u64 {
        self.reconnects.load(Ordering::Relaxed)
    }
}
