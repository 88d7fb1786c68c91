//! Configuration options for the moodjournal client

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::mood::RetryPolicy;

/// Base URL used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Environment variable holding the API base URL
pub const API_URL_ENV: &str = "MOODJOURNAL_API_URL";

/// Environment variable holding the session file location
pub const SESSION_FILE_ENV: &str = "MOODJOURNAL_SESSION_FILE";

/// Where the client talks to and where it keeps its session
#[derive(Debug, Clone)]
pub struct JournalConfig {
    /// Base URL of the API, including the `/api` prefix
    pub api_url: Url,

    /// Session file. `None` keeps the session in memory only.
    pub session_file: Option<PathBuf>,
}

impl JournalConfig {
    /// Creates a new configuration, validating the URL.
    pub fn new(api_url: &str) -> Result<Self> {
        let mut api_url = Url::parse(api_url)?;
        if api_url.cannot_be_a_base() {
            return Err(Error::config(format!("{} cannot be used as a base URL", api_url)));
        }
        // Joining relative paths needs a trailing slash
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }
        Ok(Self {
            api_url,
            session_file: None,
        })
    }

    /// Reads `MOODJOURNAL_API_URL` and `MOODJOURNAL_SESSION_FILE`, falling back
    /// to the local development server and the per-user config directory.
    pub fn from_env() -> Result<Self> {
        let api_url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let session_file = match std::env::var(SESSION_FILE_ENV) {
            Ok(path) => Some(PathBuf::from(path)),
            Err(_) => default_session_file(),
        };
        Ok(Self::new(&api_url)?.with_session_file(session_file))
    }

    /// Set the session file
    pub fn with_session_file(mut self, path: Option<PathBuf>) -> Self {
        self.session_file = path;
        self
    }
}

/// `<config dir>/moodjournal/session.json`, if the platform has a config dir
pub fn default_session_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("moodjournal").join("session.json"))
}

/// Configuration options for the moodjournal client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Retry policy used while waiting for mood analysis
    pub mood_retry: RetryPolicy,

    /// Value of the `X-Client-Info` header
    pub client_info: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            mood_retry: RetryPolicy::default(),
            client_info: format!("moodjournal-rust/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the mood polling retry policy
    pub fn with_mood_retry(mut self, value: RetryPolicy) -> Self {
        self.mood_retry = value;
        self
    }

    /// Set the client info header
    pub fn with_client_info(mut self, value: &str) -> Self {
        self.client_info = value.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_appends_trailing_slash() {
        let config = JournalConfig::new("http://localhost:8080/api").unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:8080/api/");
        assert_eq!(
            config.api_url.join("entries/3/mood").unwrap().as_str(),
            "http://localhost:8080/api/entries/3/mood"
        );
    }

    #[test]
    fn test_new_rejects_non_base_url() {
        assert!(matches!(JournalConfig::new("mailto:me@example.com"), Err(Error::Config(_))));
        assert!(matches!(JournalConfig::new("not a url"), Err(Error::Url(_))));
    }

    #[test]
    fn test_default_options() {
        let options = ClientOptions::default();
        assert_eq!(options.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(options.mood_retry.max_attempts, 10);
    }
}
