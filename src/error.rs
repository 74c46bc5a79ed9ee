//! Crate error types
//!
//! Errors produced while building a stream definition or running its
//! producer pipeline.

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for notification stream operations
#[derive(Debug, Clone)]
pub enum Error {
    /// A channel name was blank or whitespace-only
    BlankChannel,
    /// The channel list was empty
    NoChannels,
    /// Opening or authenticating the connection failed
    Connection(String),
    /// A LISTEN registration failed; the whole connection is discarded
    Registration {
        /// Channel whose registration failed
        channel: String,
        /// Failure reported by the driver
        reason: String,
    },
    /// A liveness probe or notification fetch failed mid-loop
    Poll(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::BlankChannel => write!(f, "Channel names must not be blank"),
            Error::NoChannels => write!(f, "At least one channel is required"),
            Error::Connection(reason) => write!(f, "Connection failed: {}", reason),
            Error::Registration { channel, reason } => {
                write!(f, "LISTEN failed for channel {}: {}", channel, reason)
            }
            Error::Poll(reason) => write!(f, "Poll failed: {}", reason),
        }
    }
}

impl std::error::Error for Error {}
