//! Domain-level error types for votecard-burner.
//!
//! All errors are typed with `thiserror` and carry the operator-facing
//! message text; the binary prefixes each with `Error: ` on stdout.

use thiserror::Error;

/// Application-level errors, one variant per failure family.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing command-line arguments.
    #[error("{message}")]
    Argument { message: String },

    /// No card reader attached to the system.
    #[error("No Card Reader Found")]
    NoReader,

    /// A reader exists but no card is inserted.
    #[error("No Card Present")]
    NoCard,

    /// The requested operation is not permitted for the inserted card type.
    #[error("{message}")]
    CardType { message: String },

    /// A base64 field could not be decoded.
    #[error("{message}")]
    Decode {
        message: String,
        #[source]
        source: Option<base64::DecodeError>,
    },

    /// The Card Access Service reported a failure (transport, record-level
    /// error code, or a non-Ok write outcome).
    #[error("{message}")]
    Service {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Anything that escaped the taxonomy above; caught at the top level.
    #[error("{message}")]
    Unexpected { message: String },
}

impl AppError {
    /// Create an argument error.
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument {
            message: message.into(),
        }
    }

    /// Create a card-type error.
    pub fn card_type(message: impl Into<String>) -> Self {
        Self::CardType {
            message: message.into(),
        }
    }

    /// Create a decode error from a base64 failure.
    pub fn decode(message: impl Into<String>, err: base64::DecodeError) -> Self {
        Self::Decode {
            message: message.into(),
            source: Some(err),
        }
    }

    /// Create a service error with only a message.
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
            source: None,
        }
    }

    /// Create an unexpected-failure error for the top-level funnel.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Create a service error from a PC/SC failure.
    pub fn pcsc(message: impl Into<String>, err: pcsc::Error) -> Self {
        Self::Service {
            message: message.into(),
            source: Some(Box::new(err)),
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
