use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Direction of event flow. Each channel owns an independent chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    /// Events arriving from the outside world.
    Incoming,
    /// Events heading out to the outside world.
    Outgoing,
}

impl ChannelType {
    /// All variants, for iteration.
    pub const ALL: &'static [ChannelType] = &[Self::Incoming, Self::Outgoing];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incoming" => Ok(Self::Incoming),
            "outgoing" => Ok(Self::Outgoing),
            other => Err(Error::UnknownChannel(other.to_string())),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_channels() {
        assert_eq!(
            "incoming".parse::<ChannelType>().unwrap(),
            ChannelType::Incoming
        );
        assert_eq!(
            "outgoing".parse::<ChannelType>().unwrap(),
            ChannelType::Outgoing
        );
    }

    #[test]
    fn rejects_other_strings() {
        for raw in ["Incoming", "inbound", ""] {
            let err = raw.parse::<ChannelType>().unwrap_err();
            assert!(matches!(err, Error::UnknownChannel(ref s) if s == raw));
        }
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ChannelType::Outgoing).unwrap(),
            "\"outgoing\""
        );
    }
}
