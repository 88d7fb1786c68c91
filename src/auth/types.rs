//! Types for authentication and the user profile

use serde::{Deserialize, Serialize};

pub use moodjournal_session::{Session, User};

/// Body of POST /login
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of POST /signup
#[derive(Debug, Serialize)]
pub(crate) struct SignupRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Authentication response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The bearer token
    pub token: String,

    /// The user data
    pub user: Option<User>,
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Session::new(response.token, response.user)
    }
}

/// The profile returned by GET /user/profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: i64,

    pub name: String,

    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Body of PUT /user/profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub name: String,

    #[serde(rename = "currentPassword", skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,

    #[serde(rename = "newPassword", skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}

/// Local form state of the settings page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub name: String,
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Shortest password the backend accepts on change
pub const MIN_PASSWORD_LEN: usize = 6;

impl ProfileForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_password_change(
        mut self,
        current: impl Into<String>,
        new: impl Into<String>,
        confirm: impl Into<String>,
    ) -> Self {
        self.current_password = current.into();
        self.new_password = new.into();
        self.confirm_password = confirm.into();
        self
    }

    /// Check the form and build the request body. Password fields are only
    /// sent when a new password was entered.
    pub fn to_update(&self) -> Result<ProfileUpdate, String> {
        if self.name.trim().is_empty() {
            return Err("Name is required".to_string());
        }

        if !self.new_password.is_empty() || !self.confirm_password.is_empty() {
            if self.current_password.is_empty() {
                return Err("Current password is required to change password".to_string());
            }
            if self.new_password != self.confirm_password {
                return Err("New passwords do not match".to_string());
            }
            if self.new_password.chars().count() < MIN_PASSWORD_LEN {
                return Err(format!(
                    "New password must be at least {} characters long",
                    MIN_PASSWORD_LEN
                ));
            }
        }

        let changing_password = !self.new_password.is_empty();
        Ok(ProfileUpdate {
            name: self.name.trim().to_string(),
            current_password: changing_password.then(|| self.current_password.clone()),
            new_password: changing_password.then(|| self.new_password.clone()),
        })
    }

    /// Forget the password inputs
    pub fn clear_passwords(&mut self) {
        self.current_password.clear();
        self.new_password.clear();
        self.confirm_password.clear();
    }
}
