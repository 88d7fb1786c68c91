//! moodjournal Rust Client Library
//!
//! A Rust client for the moodjournal API: authentication, journal entries and
//! the per-entry mood analysis the backend computes.

pub mod auth;
pub mod config;
pub mod entries;
pub mod error;
pub mod fetch;
pub mod mood;

use std::sync::Arc;

use reqwest::Client;
use tokio_util::sync::CancellationToken;

pub use moodjournal_session as session;
use moodjournal_session::SessionStore;

use crate::auth::Auth;
use crate::config::{ClientOptions, JournalConfig};
use crate::entries::{EntryId, EntryMutations, EntryRepository};
use crate::error::Result;
use crate::fetch::ApiGateway;
use crate::mood::{MoodReport, MoodRetrieval};

/// The main entry point for the moodjournal client
pub struct MoodJournal {
    /// Client configuration
    pub config: JournalConfig,
    /// Client options
    pub options: ClientOptions,
    gateway: ApiGateway,
    auth: Auth,
    repository: Arc<EntryRepository>,
    mutations: EntryMutations,
}

impl MoodJournal {
    /// Create a new client with an in-memory session
    ///
    /// # Example
    ///
    /// ```
    /// use moodjournal::MoodJournal;
    ///
    /// let journal = MoodJournal::new("http://localhost:8080/api").unwrap();
    /// assert!(!journal.auth().is_authenticated());
    /// ```
    pub fn new(api_url: &str) -> Result<Self> {
        Self::with_session(
            JournalConfig::new(api_url)?,
            SessionStore::in_memory(),
            ClientOptions::default(),
        )
    }

    /// Create a client from `config`, opening the configured session file
    pub fn from_config(config: JournalConfig, options: ClientOptions) -> Result<Self> {
        let session = match &config.session_file {
            Some(path) => SessionStore::open(path)?,
            None => SessionStore::in_memory(),
        };
        Self::with_session(config, session, options)
    }

    /// Create a client around an existing session store
    pub fn with_session(config: JournalConfig, session: SessionStore, options: ClientOptions) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let gateway = ApiGateway::new(config.api_url.clone(), http_client, session, &options);
        let repository = Arc::new(EntryRepository::new(gateway.clone()));
        let mutations = EntryMutations::new(gateway.clone(), repository.clone());

        Ok(Self {
            config,
            options,
            auth: Auth::new(gateway.clone()),
            gateway,
            repository,
            mutations,
        })
    }

    /// The session and preference store
    pub fn session(&self) -> &SessionStore {
        self.gateway.session()
    }

    /// The request layer, for calls not covered by the typed clients
    pub fn gateway(&self) -> &ApiGateway {
        &self.gateway
    }

    /// Login, signup, logout and the user profile
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// The read path over the user's entries
    pub fn entries(&self) -> &EntryRepository {
        &self.repository
    }

    /// Create, edit and delete entries
    pub fn mutations(&self) -> &EntryMutations {
        &self.mutations
    }

    /// A mood retrieval workflow using the configured retry policy
    pub fn mood(&self) -> MoodRetrieval<ApiGateway> {
        MoodRetrieval::new(self.gateway.clone(), self.options.mood_retry.clone())
    }

    /// Fetch entry `id` and wait for its mood analysis
    pub async fn analyze(&self, id: &EntryId, cancel: &CancellationToken) -> Result<MoodReport> {
        self.mood().run(id, cancel).await
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::{ClientOptions, JournalConfig};
    pub use crate::entries::{DeleteOutcome, Entry, EntryForm, EntryId};
    pub use crate::error::{Error, Route};
    pub use crate::mood::{MoodAnalysis, MoodPhase, MoodReport, RetryPolicy};
    pub use crate::MoodJournal;
    pub use tokio_util::sync::CancellationToken;
}
