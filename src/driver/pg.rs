//! PostgreSQL driver implementation
//!
//! Each connection is a dedicated `tokio-postgres` session. The connection
//! future is driven on a spawned task, which routes asynchronous
//! notification messages into an internal queue; the poll loop drains that
//! queue after every keep-alive round trip.

use std::future::poll_fn;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_postgres::{AsyncMessage, NoTls};

use crate::error::{Error, Result};
use crate::event::Notification;

use super::{Connection, Driver};

/// Driver opening one dedicated `tokio-postgres` connection per activation
#[derive(Clone)]
pub struct PgDriver {
    config: tokio_postgres::Config,
}

impl PgDriver {
    /// Build a driver from a connection string plus credentials
    ///
    /// `url` accepts both the key-value (`host=… dbname=…`) and the
    /// `postgres://` connection string forms; `user` and `password`
    /// override anything embedded in it.
    pub fn new(url: &str, user: &str, password: &str) -> Result<Self> {
        let mut config: tokio_postgres::Config = url
            .parse()
            .map_err(|e: tokio_postgres::Error| Error::Connection(e.to_string()))?;
        config.user(user);
        config.password(password);

        Ok(Self { config })
    }
}

#[async_trait]
impl Driver for PgDriver {
    type Conn = PgConnection;

    async fn connect(&self) -> Result<PgConnection> {
        let (client, mut connection) = self
            .config
            .connect(NoTls)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        // The connection future must be driven for the client to make any
        // progress; notifications arrive here as async messages.
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let driver_task = tokio::spawn(async move {
            loop {
                match poll_fn(|cx| connection.poll_message(cx)).await {
                    Some(Ok(AsyncMessage::Notification(n))) => {
                        let event = Notification::new(
                            n.channel().to_string(),
                            n.payload().to_string(),
                            n.process_id(),
                        );
                        if queue_tx.send(event).is_err() {
                            break;
                        }
                    }
                    // Notices and other async messages are not part of the
                    // notification contract.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "connection task ended");
                        break;
                    }
                    None => break,
                }
            }
        });

        Ok(PgConnection {
            client: Some(client),
            queue: queue_rx,
            driver_task: Some(driver_task),
        })
    }
}

/// A dedicated notification connection
pub struct PgConnection {
    client: Option<tokio_postgres::Client>,
    queue: mpsc::UnboundedReceiver<Notification>,
    driver_task: Option<JoinHandle<()>>,
}

impl PgConnection {
    fn client(&self) -> Result<&tokio_postgres::Client> {
        self.client
            .as_ref()
            .ok_or_else(|| Error::Poll("connection closed".to_string()))
    }
}

#[async_trait]
impl Connection for PgConnection {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.client()?
            .batch_execute(sql)
            .await
            .map_err(|e| Error::Poll(e.to_string()))
    }

    async fn listen(&mut self, channel: &str) -> Result<()> {
        // Channel names are identifiers, so they are quoted rather than
        // bound as parameters.
        let stmt = format!(r#"LISTEN "{}""#, channel.replace('"', r#""""#));
        let client = self.client().map_err(|_| Error::Registration {
            channel: channel.to_string(),
            reason: "connection closed".to_string(),
        })?;

        client
            .batch_execute(&stmt)
            .await
            .map_err(|e| Error::Registration {
                channel: channel.to_string(),
                reason: e.to_string(),
            })
    }

    async fn notifications(&mut self) -> Result<Vec<Notification>> {
        let mut drained = Vec::new();
        loop {
            match self.queue.try_recv() {
                Ok(event) => drained.push(event),
                Err(mpsc::error::TryRecvError::Empty) => return Ok(drained),
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    // Connection task is gone; hand over what was already
                    // queued and report the breakage on the next empty drain.
                    if drained.is_empty() {
                        return Err(Error::Poll("connection task terminated".to_string()));
                    }
                    return Ok(drained);
                }
            }
        }
    }

    async fn close(&mut self) {
        // Dropping the client terminates the session; aborting the driver
        // task stops message routing. Both are no-ops on a repeat call.
        self.client = None;
        if let Some(task) = self.driver_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_from_key_value_url() {
        let driver = PgDriver::new("host=localhost port=5432 dbname=app", "app", "secret");

        assert!(driver.is_ok());
    }

    #[test]
    fn test_driver_from_uri() {
        let driver = PgDriver::new("postgres://localhost:5432/app", "app", "secret");

        assert!(driver.is_ok());
    }

    #[test]
    fn test_driver_rejects_garbage_url() {
        let driver = PgDriver::new("host=localhost port=not-a-port", "app", "secret");

        assert!(matches!(driver, Err(Error::Connection(_))));
    }
}
