//! Error handling for the moodjournal client

use std::fmt;
use thiserror::Error;

use crate::entries::EntryId;

/// Where the front end should go after an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The login entry point
    Login,
}

/// Unified error type for the moodjournal client
#[derive(Error, Debug)]
pub enum Error {
    /// A required field was empty or malformed. Never reaches the network.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backend rejected the bearer token (HTTP 401)
    #[error("Session expired")]
    AuthExpired,

    /// HTTP 404, or an entry missing from the fetched collection
    #[error("Not found: {0}")]
    NotFound(String),

    /// The mood analysis was looked up for an entry the backend did not return
    #[error("Entry {0} not found")]
    EntryNotFound(EntryId),

    /// Any other non-2xx response
    #[error("Request failed with status {status}: {message}")]
    Server { status: u16, message: String },

    /// The request could not complete
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Mood polling ran out of attempts
    #[error("Mood analysis still processing after {attempts} attempts")]
    StillProcessing { attempts: u32 },

    /// A workflow was cancelled by its caller
    #[error("Cancelled")]
    Cancelled,

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Session store errors
    #[error("Session error: {0}")]
    Session(#[from] moodjournal_session::SessionError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Build the error for a non-2xx, non-401 response
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 404 {
            Error::NotFound(body)
        } else {
            Error::Server {
                status,
                message: body,
            }
        }
    }

    /// The route the caller must navigate to, if any
    pub fn route(&self) -> Option<Route> {
        match self {
            Error::AuthExpired => Some(Route::Login),
            _ => None,
        }
    }

    /// Text suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(msg) => msg.clone(),
            Error::AuthExpired => "Session expired. Please login again.".to_string(),
            Error::NotFound(_) => "The requested resource was not found.".to_string(),
            Error::EntryNotFound(_) => "Entry not found.".to_string(),
            Error::Server { status, message } => {
                if !message.trim().is_empty() {
                    message.trim().to_string()
                } else if *status == 403 {
                    "You are not authorized to perform this action.".to_string()
                } else if *status >= 500 {
                    "Server error. Please try again later.".to_string()
                } else {
                    format!("HTTP error! status: {}", status)
                }
            }
            Error::Network(_) => {
                "Failed to connect to server. Please check your connection.".to_string()
            }
            Error::StillProcessing { .. } => {
                "Mood analysis is still processing. Please try again later.".to_string()
            }
            Error::Cancelled => "Cancelled.".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_auth_expired_routes_to_login() {
        assert_eq!(Error::AuthExpired.route(), Some(Route::Login));
        assert_eq!(Error::validation("empty").route(), None);
        assert_eq!(Error::from_status(500, String::new()).route(), None);
    }

    #[test]
    fn test_from_status_classifies_not_found() {
        assert!(matches!(Error::from_status(404, "gone".into()), Error::NotFound(_)));
        assert!(matches!(
            Error::from_status(409, "conflict".into()),
            Error::Server { status: 409, .. }
        ));
    }

    #[test]
    fn test_server_message_prefers_raw_text() {
        let err = Error::from_status(400, "Title is required\n".into());
        assert_eq!(err.user_message(), "Title is required");

        let err = Error::from_status(503, String::new());
        assert_eq!(err.user_message(), "Server error. Please try again later.");
    }

    #[test]
    fn test_still_processing_is_distinct() {
        let msg = Error::StillProcessing { attempts: 10 }.user_message();
        assert!(msg.contains("still processing"));
        assert_ne!(msg, Error::Cancelled.user_message());
    }
}
