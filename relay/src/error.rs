//! Error types for the console relay

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the console relay
#[derive(Debug, Error)]
pub enum Error {
    // Host registration errors (1000-1999)
    #[error("Invalid native messaging host name specified: {0}")]
    InvalidHostName(String),

    #[error("Specified native messaging host not found: {0}")]
    HostNotFound(String),

    #[error("Invalid native messaging host manifest {path}: {message}")]
    InvalidManifest { path: String, message: String },

    #[error("Access to the specified native messaging host is forbidden: {0}")]
    AccessForbidden(String),

    #[error("Failed to start native messaging host: {0}")]
    SpawnFailed(String),

    // Channel errors (2000-2999)
    #[error("Failed to connect to native host: {reason}")]
    ConnectFailed { reason: String },

    #[error("Native host is not connected")]
    NotConnected,

    #[error("Error when communicating with the native messaging host: {0}")]
    Codec(String),

    #[error("Message too large: {len} bytes (max {max})")]
    MessageTooLarge { len: usize, max: usize },

    #[error("Transport error: {0}")]
    Transport(String),

    // Relay errors (3000-3999)
    #[error("Relay router is not running")]
    RouterUnavailable,

    #[error("Unexpected relay message: {0}")]
    UnexpectedMessage(String),
}

impl Error {
    /// Get the error code
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidHostName(_) => 1001,
            Error::HostNotFound(_) => 1002,
            Error::InvalidManifest { .. } => 1003,
            Error::AccessForbidden(_) => 1004,
            Error::SpawnFailed(_) => 1005,

            Error::ConnectFailed { .. } => 2001,
            Error::NotConnected => 2002,
            Error::Codec(_) => 2003,
            Error::MessageTooLarge { .. } => 2004,
            Error::Transport(_) => 2005,

            Error::RouterUnavailable => 3001,
            Error::UnexpectedMessage(_) => 3002,
        }
    }

    /// Whether the failure has already been broadcast as a channel event.
    ///
    /// Connect failures reach the UI twice: once as a `ConnectionFailed`
    /// event and once as the error returned to the dispatching caller. The
    /// caller uses this to avoid printing the same failure again.
    pub fn is_reported_as_event(&self) -> bool {
        matches!(self, Error::ConnectFailed { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Codec(err.to_string())
    }
}
