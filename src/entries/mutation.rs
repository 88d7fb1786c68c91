//! Create, edit and delete entries

use std::sync::{Arc, RwLock};

use log::{info, warn};
use serde::Serialize;

use super::{Entry, EntryId, EntryRepository};
use crate::error::{Error, Result};
use crate::fetch::ApiGateway;

/// Yes/no decision point before a destructive action
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Local form state for a new or edited entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryForm {
    pub title: String,
    pub text: String,
    /// Only used on create; the backend defaults to today
    pub date: Option<String>,
}

impl EntryForm {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            date: None,
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Title and text must both have non-whitespace content
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() || self.text.trim().is_empty() {
            return Err(Error::validation("Title and text cannot be empty"));
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Serialize)]
struct CreateEntryRequest<'a> {
    title: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<&'a str>,
}

#[derive(Serialize)]
struct UpdateEntryRequest<'a> {
    title: &'a str,
    text: &'a str,
}

/// Where the last mutation got to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MutationState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed(String),
}

/// Result of a delete request
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    /// Deleted; carries the reloaded collection
    Deleted(Vec<Entry>),
    /// The user said no. Nothing was sent.
    Declined,
}

/// Mutations go to the backend first and are followed by a full reload, so
/// the displayed collection always equals server state.
#[derive(Debug)]
pub struct EntryMutations {
    gateway: ApiGateway,
    repository: Arc<EntryRepository>,
    state: RwLock<MutationState>,
}

impl EntryMutations {
    pub fn new(gateway: ApiGateway, repository: Arc<EntryRepository>) -> Self {
        Self {
            gateway,
            repository,
            state: RwLock::new(MutationState::Idle),
        }
    }

    pub fn state(&self) -> MutationState {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_state(&self, state: MutationState) {
        *self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }

    /// Create an entry from `form`. On success the form is cleared and the
    /// reloaded collection returned; on failure the form is left as it was.
    pub async fn create(&self, form: &mut EntryForm) -> Result<Vec<Entry>> {
        form.validate()?;
        let body = CreateEntryRequest {
            title: &form.title,
            text: &form.text,
            date: form.date.as_deref(),
        };

        let request = self.gateway.post("entries").json(&body)?;
        match self.submit(request.execute_optional::<Entry>()).await? {
            Some(created) => info!("Created entry {}", created.id),
            None => info!("Created entry"),
        }

        form.clear();
        self.repository.reload().await
    }

    /// Replace title and text of entry `id`
    pub async fn update(&self, id: &EntryId, form: &mut EntryForm) -> Result<Vec<Entry>> {
        form.validate()?;
        let body = UpdateEntryRequest {
            title: &form.title,
            text: &form.text,
        };

        let path = format!("entries/{}", id.path_segment());
        let request = self.gateway.put(&path).json(&body)?;
        self.submit(request.execute_empty()).await?;
        info!("Updated entry {}", id);

        form.clear();
        self.repository.reload().await
    }

    /// Delete entry `id` once `confirm` agrees
    pub async fn delete(&self, id: &EntryId, confirm: &dyn Confirm) -> Result<DeleteOutcome> {
        if !confirm.confirm("Are you sure you want to delete this entry?") {
            return Ok(DeleteOutcome::Declined);
        }

        let path = format!("entries/{}", id.path_segment());
        self.submit(self.gateway.delete(&path).execute_empty()).await?;
        info!("Deleted entry {}", id);

        Ok(DeleteOutcome::Deleted(self.repository.reload().await?))
    }

    async fn submit<T, F>(&self, request: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        self.set_state(MutationState::Submitting);
        match request.await {
            Ok(value) => {
                self.set_state(MutationState::Succeeded);
                Ok(value)
            }
            Err(e) => {
                warn!("Entry mutation failed: {}", e);
                self.set_state(MutationState::Failed(e.user_message()));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_blank_fields() {
        assert!(EntryForm::new("Title", "Body").validate().is_ok());
        assert!(matches!(EntryForm::new("   ", "Body").validate(), Err(Error::Validation(_))));
        assert!(matches!(EntryForm::new("Title", "\n\t").validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_create_body_omits_missing_date() {
        let body = CreateEntryRequest {
            title: "t",
            text: "x",
            date: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"title": "t", "text": "x"})
        );
    }

    #[test]
    fn test_closures_confirm() {
        let yes = |_: &str| true;
        let no = |_: &str| false;
        assert!(yes.confirm("?"));
        assert!(!no.confirm("?"));
    }
}
