//! Authentication and user profile management

mod types;

use log::info;

use crate::error::{Error, Result};
use crate::fetch::ApiGateway;

pub use types::*;

/// Client for login, signup and the user profile
#[derive(Debug, Clone)]
pub struct Auth {
    gateway: ApiGateway,
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{} is required", field)));
    }
    Ok(())
}

impl Auth {
    pub(crate) fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    /// Sign in with email and password and persist the session
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        require(email, "Email")?;
        require(password, "Password")?;

        let response = self
            .gateway
            .post("login")
            .without_auth()
            .json(&LoginRequest { email, password })?
            .execute::<AuthResponse>()
            .await?;

        self.store(response)
    }

    /// Create an account and persist the session
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        require(name, "Name")?;
        require(email, "Email")?;
        require(password, "Password")?;

        let response = self
            .gateway
            .post("signup")
            .without_auth()
            .json(&SignupRequest {
                name,
                email,
                password,
            })?
            .execute::<AuthResponse>()
            .await?;

        self.store(response)
    }

    fn store(&self, response: AuthResponse) -> Result<Session> {
        if response.token.is_empty() {
            return Err(Error::Server {
                status: 200,
                message: "no token in authentication response".to_string(),
            });
        }

        let session = Session::from(response);
        self.gateway.session().set_session(&session)?;
        info!(
            "Signed in as {}",
            session.user.as_ref().map(|u| u.email.as_str()).unwrap_or("<unknown>")
        );
        Ok(session)
    }

    /// Forget the session locally. The backend keeps no server-side session.
    pub fn logout(&self) -> Result<()> {
        self.gateway.session().clear()?;
        info!("Logged out");
        Ok(())
    }

    /// The cached user, if logged in
    pub fn current_user(&self) -> Result<Option<User>> {
        Ok(self.gateway.session().user()?)
    }

    pub fn is_authenticated(&self) -> bool {
        self.gateway.session().is_authenticated()
    }

    /// Fetch the profile of the current user
    pub async fn profile(&self) -> Result<Profile> {
        self.gateway.get("user/profile").execute::<Profile>().await
    }

    /// Validate `form` and save it. Password inputs are cleared on success
    /// and kept on failure.
    ///
    /// With a password change the backend answers a wrong current password
    /// with 401; that is reported as a server error and the session is kept.
    pub async fn update_profile(&self, form: &mut ProfileForm) -> Result<Option<Profile>> {
        let update = form.to_update().map_err(Error::Validation)?;

        let mut request = self.gateway.put("user/profile").json(&update)?;
        if update.current_password.is_some() {
            request = request.unauthorized_is_failure();
        }
        let profile = request.execute_optional::<Profile>().await?;

        form.clear_passwords();
        info!("Profile updated");
        Ok(profile)
    }
}
