//! Journal entries: the read path and the mutation workflow

mod filter;
mod mutation;

use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::fetch::ApiGateway;
use crate::mood::MoodAnalysis;

pub use filter::{dedup_by_id, filter_entries, matches_query, sort_newest_first};
pub use mutation::*;

/// Backend-assigned entry identifier.
///
/// The backend sends numbers; ids are compared as strings so a value typed
/// by a user matches the one the backend returned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id percent-encoded for use inside a URL path
    pub fn path_segment(&self) -> String {
        urlencoding::encode(&self.0).into_owned()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<i64> for EntryId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(id) => EntryId::from(id),
            RawId::Text(id) => EntryId::from(id),
        })
    }
}

/// A journal entry as the backend returns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub text: String,

    /// Calendar date chosen by the user, `YYYY-MM-DD`
    #[serde(default)]
    pub date: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Present when the backend embeds a finished analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_analysis: Option<MoodAnalysis>,
}

/// Fetch and deduplicate the current user's entries.
///
/// The backend encodes an empty collection as `null`.
pub(crate) async fn fetch_entries(gateway: &ApiGateway) -> Result<Vec<Entry>> {
    let entries = gateway
        .get("entries")
        .execute_optional::<Vec<Entry>>()
        .await?
        .unwrap_or_default();
    Ok(dedup_by_id(entries))
}

/// Client-side view of the entry collection.
///
/// Holds a disposable copy of what the backend last returned. Nothing is
/// ever merged locally; [`EntryRepository::reload`] replaces the whole copy.
#[derive(Debug)]
pub struct EntryRepository {
    gateway: ApiGateway,
    entries: RwLock<Vec<Entry>>,
}

impl EntryRepository {
    pub fn new(gateway: ApiGateway) -> Self {
        Self {
            gateway,
            entries: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Entry>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Entry>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the held collection with a fresh fetch.
    ///
    /// On 401 the session is cleared and the held collection emptied. Any
    /// other failure keeps the previous collection.
    pub async fn reload(&self) -> Result<Vec<Entry>> {
        match fetch_entries(&self.gateway).await {
            Ok(entries) => {
                debug!("Loaded {} entries", entries.len());
                *self.write() = entries.clone();
                Ok(entries)
            }
            Err(Error::AuthExpired) => {
                self.write().clear();
                Err(Error::AuthExpired)
            }
            Err(e) => {
                warn!("Failed to load entries, keeping {} cached: {}", self.read().len(), e);
                Err(e)
            }
        }
    }

    /// The held collection, in backend order
    pub fn entries(&self) -> Vec<Entry> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Entries whose title, text or date contain `query`, ignoring case
    pub fn filtered(&self, query: &str) -> Vec<Entry> {
        filter_entries(&self.read(), query)
    }

    /// Entries newest first
    pub fn sorted(&self) -> Vec<Entry> {
        let mut entries = self.entries();
        sort_newest_first(&mut entries);
        entries
    }

    /// Look up a held entry
    pub fn get(&self, id: &EntryId) -> Option<Entry> {
        self.read().iter().find(|entry| entry.id == *id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_id_accepts_numbers_and_strings() {
        let numeric: Entry = serde_json::from_str(r#"{"id": 42, "title": "t", "text": "x", "date": "2025-01-01"}"#).unwrap();
        let text: Entry = serde_json::from_str(r#"{"id": "42", "title": "t", "text": "x", "date": "2025-01-01"}"#).unwrap();
        assert_eq!(numeric.id, text.id);
        assert_eq!(numeric.id, EntryId::from(" 42 "));
        assert_eq!(numeric.created_at, None);
    }

    #[test]
    fn test_entry_parses_backend_shape() {
        let entry: Entry = serde_json::from_value(serde_json::json!({
            "id": 3,
            "user_id": 1,
            "title": "Morning",
            "text": "Went for a run",
            "date": "2025-02-14",
            "created_at": "2025-02-14T08:30:00.123456+01:00"
        }))
        .unwrap();
        assert_eq!(entry.id.as_str(), "3");
        assert_eq!(entry.created_at.unwrap().to_rfc3339(), "2025-02-14T07:30:00.123456+00:00");
        assert!(entry.mood_analysis.is_none());
    }

    #[test]
    fn test_path_segment_is_encoded() {
        assert_eq!(EntryId::from("a/b c").path_segment(), "a%2Fb%20c");
        assert_eq!(EntryId::from(17).path_segment(), "17");
    }
}
