//! Producer pipeline
//!
//! One spawned task per activation: open a dedicated connection, register
//! every channel, then poll (probe, drain, fan out, sleep) until either
//! cancelled (teardown; never retried) or failed (logged, then retried
//! after a fixed, cancellable delay, indefinitely).

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::driver::{Connection, Driver};
use crate::error::Error;

use super::hub::Hub;

/// How one activation ended
enum Termination {
    /// Cooperative shutdown; no error, no retry
    Cancelled,
    /// Terminal failure; the supervisor schedules a re-activation
    Failed(Error),
}

/// Supervising loop for one producer lifetime
///
/// Runs activations back to back, sleeping `reconnect_delay` between a
/// failure and the next attempt. The delay is cancellable: teardown during
/// the wait guarantees no further connection attempt.
pub(crate) async fn run<D: Driver>(
    driver: Arc<D>,
    hub: Arc<Hub>,
    mut shutdown: watch::Receiver<bool>,
    predecessor: Option<JoinHandle<()>>,
) {
    // A replacement producer must not overlap the one it replaces.
    if let Some(previous) = predecessor {
        let _ = previous.await;
    }

    loop {
        match activation(driver.as_ref(), &hub, &mut shutdown).await {
            Termination::Cancelled => return,
            Termination::Failed(error) => {
                let delay = hub.config.reconnect_delay;
                tracing::error!(
                    error = %error,
                    delay_ms = delay.as_millis() as u64,
                    "notification pipeline failed, reconnecting after delay"
                );
                hub.record_reconnect();

                tokio::select! {
                    _ = sleep(delay) => {}
                    _ = wait_for_shutdown(&mut shutdown) => return,
                }
            }
        }
    }
}

/// One full activation: connect, register, poll until cancelled or failed
async fn activation<D: Driver>(
    driver: &D,
    hub: &Hub,
    shutdown: &mut watch::Receiver<bool>,
) -> Termination {
    let mut conn = match driver.connect().await {
        Ok(conn) => conn,
        Err(error) => return Termination::Failed(error),
    };

    // Register every channel in list order. A failure discards the whole
    // connection; there is no partial-registration recovery.
    for name in hub.channels.names() {
        if let Err(error) = conn.listen(name).await {
            conn.close().await;
            return Termination::Failed(error);
        }
    }
    tracing::info!(channels = %hub.channels, "listening for notifications");

    loop {
        if *shutdown.borrow_and_update() {
            conn.close().await;
            return Termination::Cancelled;
        }

        // Probe first so the server has flushed anything pending, then
        // drain whatever accumulated since the previous cycle.
        if let Err(error) = conn.keepalive().await {
            conn.close().await;
            return Termination::Failed(error);
        }
        match conn.notifications().await {
            Ok(events) => {
                for event in &events {
                    hub.fanout(event);
                }
            }
            Err(error) => {
                conn.close().await;
                return Termination::Failed(error);
            }
        }

        tokio::select! {
            _ = sleep(hub.config.poll_interval) => {}
            _ = wait_for_shutdown(shutdown) => {
                conn.close().await;
                return Termination::Cancelled;
            }
        }
    }
}

/// Resolve once the shutdown flag is set
///
/// Also resolves if every sender is gone, which only happens when the hub
/// itself is dropped.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
