//! Error types for the roster client.
//!
//! # Design
//! Every fallible operation in the crate returns [`Result`]. Validation
//! failures are raised before any request is built, so a rejected create never
//! reaches the network. All non-2xx responses land in `Http` with the raw
//! status code and body; a 404 is not special-cased.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RosterError>;

#[derive(Debug, Error)]
pub enum RosterError {
    /// Input rejected locally, e.g. a blank name on create.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// The server answered with a status outside 200..=299.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request could not be executed at all (connection refused, DNS, ...).
    #[error("transport failed: {0}")]
    Transport(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    InvalidAcademicYear(#[from] InvalidAcademicYear),
}

impl RosterError {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, if it came from a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// An academic year outside the supported range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("academic year {0} is not offered")]
pub struct InvalidAcademicYear(pub u16);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_displays_status_and_body() {
        let err = RosterError::Http {
            status: 503,
            body: "down".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 503: down");
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn validation_error_has_no_status() {
        let err = RosterError::validation("School name is required");
        assert_eq!(err.to_string(), "validation failed: School name is required");
        assert_eq!(err.status(), None);
    }
}
