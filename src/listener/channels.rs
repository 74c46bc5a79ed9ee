//! Channel set validation

use crate::error::{Error, Result};

/// Ordered set of notification channel names
///
/// Validated once when the stream definition is built; registration later
/// replays the names in exactly this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSet {
    names: Vec<String>,
}

impl ChannelSet {
    /// Validate a channel list
    ///
    /// Fails with [`Error::NoChannels`] on an empty list and
    /// [`Error::BlankChannel`] if any name is blank or whitespace-only.
    pub fn new<I, S>(channels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = channels.into_iter().map(Into::into).collect();

        if names.is_empty() {
            return Err(Error::NoChannels);
        }
        if names.iter().any(|name| name.trim().is_empty()) {
            return Err(Error::BlankChannel);
        }

        Ok(Self { names })
    }

    /// Channel names in registration order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false for a validated set
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl std::fmt::Display for ChannelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_channels() {
        let set = ChannelSet::new(["orders", "payments"]).unwrap();

        assert_eq!(set.names(), ["orders", "payments"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_order_preserved() {
        let set = ChannelSet::new(["c", "a", "b"]).unwrap();

        assert_eq!(set.names(), ["c", "a", "b"]);
    }

    #[test]
    fn test_blank_channel_rejected() {
        assert!(matches!(
            ChannelSet::new(["orders", ""]),
            Err(Error::BlankChannel)
        ));
        assert!(matches!(
            ChannelSet::new(["orders", "   "]),
            Err(Error::BlankChannel)
        ));
    }

    #[test]
    fn test_empty_list_rejected() {
        assert!(matches!(
            ChannelSet::new(Vec::<String>::new()),
            Err(Error::NoChannels)
        ));
    }

    #[test]
    fn test_display() {
        let set = ChannelSet::new(["a", "b"]).unwrap();

        assert_eq!(set.to_string(), "a, b");
    }
}
