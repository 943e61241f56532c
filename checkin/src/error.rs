//! Error types for the check-in workflow.

use thiserror::Error;

/// Errors returned by every data-fetching operation of the check-in flow.
///
/// Values are `Clone` so they can travel inside actions and be kept in state
/// for rendering.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckInError {
    /// No session token or tenant is available; nothing was sent.
    #[error("Not signed in")]
    MissingSession,

    /// The request never produced an HTTP response.
    #[error("Network error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("HTTP {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Http {
        /// HTTP status code
        status: u16,
        /// Message from the response body, if any
        message: Option<String>,
    },

    /// The service answered `success: false`.
    #[error("Request rejected{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Rejected {
        /// Message from the response body, if any
        message: Option<String>,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Invalid local configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of a [`CheckInError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Credentials missing
    Session,
    /// Transport failure
    Network,
    /// Non-2xx status
    Http,
    /// `success: false` in an otherwise valid response
    Application,
    /// Malformed body
    Decode,
    /// Local configuration
    Config,
}

impl CheckInError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingSession => ErrorKind::Session,
            Self::Transport(_) => ErrorKind::Network,
            Self::Http { .. } => ErrorKind::Http,
            Self::Rejected { .. } => ErrorKind::Application,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Message supplied by the server, if the server answered with one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Http { message, .. } | Self::Rejected { message } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CheckInError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else if error.is_builder() {
            Self::Config(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// Result type alias for check-in operations.
pub type Result<T> = std::result::Result<T, CheckInError>;
