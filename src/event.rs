//! Notification event type
//!
//! The single payload type fanned out to subscribers.

/// A notification received from the server
///
/// Cheap to clone; one copy is delivered to every attached subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Channel the notification was sent on
    pub channel: String,
    /// Payload string (may be empty)
    pub payload: String,
    /// Server process ID of the backend that sent the notification
    pub backend_pid: i32,
}

impl Notification {
    /// Create a new notification
    pub fn new(channel: impl Into<String>, payload: impl Into<String>, backend_pid: i32) -> Self {
        Self {
            channel: channel.into(),
            payload: payload.into(),
            backend_pid,
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.channel, self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let event = Notification::new("orders", "created", 42);

        assert_eq!(event.channel, "orders");
        assert_eq!(event.payload, "created");
        assert_eq!(event.backend_pid, 42);
    }

    #[test]
    fn test_display() {
        let event = Notification::new("orders", "created", 42);

        assert_eq!(event.to_string(), "orders: created");
    }
}
