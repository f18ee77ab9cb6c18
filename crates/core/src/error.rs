/// Result alias that carries the custom [`BeatLaneError`] type.
pub type Result<T> = std::result::Result<T, BeatLaneError>;

/// Common error type for the core crate.
///
/// Only session setup can fail. Once a note set exists, matching, scoring and
/// expiry are infallible.
#[derive(Debug, thiserror::Error)]
pub enum BeatLaneError {
    /// Rejected session configuration: unknown difficulty tier, invalid
    /// generation rules or an inconsistent judgment table.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Free-form message surfaced to the command line.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Malformed beat track, config or input script.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl BeatLaneError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Creates a configuration error.
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Configuration(msg.into())
    }
}

impl From<&str> for BeatLaneError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for BeatLaneError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
