//! Session and preference storage for the moodjournal client
//!
//! This crate holds the authentication token, the cached user profile and a
//! couple of UI preferences in a persistent key/value store. All reads and
//! writes go through [`SessionStore`], which also broadcasts every change so
//! other parts of a program can react to a login, a logout or an expired
//! session.

mod store;

use std::path::Path;
use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

pub use store::{FileStore, KeyValueStore, MemoryStore};

/// Storage key of the bearer token
pub const TOKEN_KEY: &str = "token";
/// Storage key of the cached user profile (JSON)
pub const USER_KEY: &str = "user";
/// Storage key of the dark mode flag ("true" / "false")
pub const DARK_MODE_KEY: &str = "darkMode";
/// Storage key of the preferred font name
pub const FONT_PREFERENCE_KEY: &str = "userFontPreference";

/// Error type
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session storage JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// The user profile returned by login and signup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// An authenticated session.
///
/// Holding a token only means the client believes it is valid; the next API
/// response is what confirms it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: Option<User>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: Option<User>) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }
}

/// Notification emitted for every change to the store.
///
/// `new_value` is `None` when the key was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
}

/// Shared handle to the session and preference store.
///
/// Cloning is cheap; clones observe and mutate the same underlying store and
/// share one change channel.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<StorageEvent>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}

impl SessionStore {
    /// Wrap an arbitrary key/value backend
    pub fn new<S: KeyValueStore + 'static>(store: S) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            store: Arc::new(store),
            events,
        }
    }

    /// A store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// A store persisted as JSON at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(FileStore::open(path)?))
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }

    /// The current bearer token. An empty stored token counts as absent.
    pub fn token(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get(TOKEN_KEY)?
            .filter(|token| !token.is_empty()))
    }

    /// The cached user profile. A cached value that no longer parses is
    /// treated as absent.
    pub fn user(&self) -> Result<Option<User>> {
        match self.store.get(USER_KEY)? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(user) => Ok(Some(user)),
                Err(e) => {
                    warn!("Ignoring unreadable cached user: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// The full session, if a token is present
    pub fn session(&self) -> Result<Option<Session>> {
        match self.token()? {
            Some(token) => Ok(Some(Session::new(token, self.user()?))),
            None => Ok(None),
        }
    }

    /// Whether a token is present. Storage errors count as logged out.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.token(), Ok(Some(_)))
    }

    /// Persist a freshly issued session
    pub fn set_session(&self, session: &Session) -> Result<()> {
        self.write(TOKEN_KEY, Some(&session.token))?;
        match &session.user {
            Some(user) => {
                let raw = serde_json::to_string(user)?;
                self.write(USER_KEY, Some(&raw))
            }
            None => self.write(USER_KEY, None),
        }
    }

    /// Forget the token and cached user. Preferences are kept.
    pub fn clear(&self) -> Result<()> {
        debug!("Clearing session");
        self.write(TOKEN_KEY, None)?;
        self.write(USER_KEY, None)
    }

    pub fn dark_mode(&self) -> Result<bool> {
        Ok(self.store.get(DARK_MODE_KEY)?.as_deref() == Some("true"))
    }

    pub fn set_dark_mode(&self, enabled: bool) -> Result<()> {
        self.write(DARK_MODE_KEY, Some(if enabled { "true" } else { "false" }))
    }

    pub fn font_preference(&self) -> Result<Option<String>> {
        self.store.get(FONT_PREFERENCE_KEY)
    }

    pub fn set_font_preference(&self, font: &str) -> Result<()> {
        self.write(FONT_PREFERENCE_KEY, Some(font))
    }

    fn write(&self, key: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => self.store.set(key, value)?,
            None => self.store.remove(key)?,
        }

        let event = StorageEvent {
            key: key.to_string(),
            new_value: value.map(str::to_string),
        };
        // No subscribers is the common case
        if self.events.send(event).is_err() {
            debug!("No subscribers for change to {}", key);
        }
        Ok(())
    }
}
