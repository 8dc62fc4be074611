/// Crate-wide result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Shape every dispatched record must satisfy.
pub const EXPECTED_EVENT_SHAPE: &str =
    "{ type: string, platform: string, text: string, raw?: any }";

/// Typed pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Registration without a usable name.
    #[error("middleware name is required")]
    MissingName,

    /// Registration without a handler.
    #[error("middleware '{name}' has no handler")]
    MissingHandler { name: String },

    /// Registration with a channel type other than `incoming`/`outgoing`.
    #[error("middleware '{name}' has invalid type '{channel}', expected 'incoming' or 'outgoing'")]
    InvalidChannel { name: String, channel: String },

    /// Registration under a name that already exists.
    #[error("middleware '{name}' is already registered")]
    DuplicateName { name: String },

    /// A string that names no channel.
    #[error("unknown channel type '{0}', expected 'incoming' or 'outgoing'")]
    UnknownChannel(String),

    /// A dispatched record failed shape validation.
    #[error("invalid event: {reason}; expected {}", EXPECTED_EVENT_SHAPE)]
    InvalidEvent { reason: String },

    /// A batch dispatch was called without any records.
    #[error("dispatch requires at least one event")]
    EmptyDispatch,

    /// The platform gate refused an event.
    #[error("platform '{platform}' is not allowed on the {channel} channel")]
    PlatformNotAllowed { platform: String, channel: String },

    /// Reading or writing persisted state failed.
    #[error(transparent)]
    Persistence(#[from] switchyard_common::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_event(reason: impl std::fmt::Display) -> Self {
        Self::InvalidEvent {
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_channel(name: impl Into<String>, channel: impl Into<String>) -> Self {
        Self::InvalidChannel {
            name: name.into(),
            channel: channel.into(),
        }
    }

    /// True for errors raised by a caller passing the wrong shape of input.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidEvent { .. } | Self::EmptyDispatch | Self::UnknownChannel(_)
        )
    }
}
