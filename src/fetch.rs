//! Request layer shared by every part of the client
//!
//! [`ApiGateway`] owns the HTTP client, the API base URL and the session
//! store. Requests are built with [`FetchBuilder`], which attaches the bearer
//! token and classifies the reply into an [`ApiResponse`].

use log::{debug, info, warn};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use url::Url;

use moodjournal_session::SessionStore;

use crate::config::ClientOptions;
use crate::error::{Error, Result};

/// Outcome of one request, as seen by a caller
#[derive(Debug)]
pub enum ApiResponse {
    /// 2xx. `None` for 204 and empty bodies.
    Success(Option<Value>),
    /// 401. The caller must clear the session and go to login.
    AuthExpired,
    /// Any other non-2xx status with the raw response text
    Failure { status: u16, body: String },
    /// The request could not complete
    NetworkFailure(reqwest::Error),
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Success(_))
    }
}

/// Thin request layer over the journal API
#[derive(Debug, Clone)]
pub struct ApiGateway {
    base_url: Url,
    client: Client,
    session: SessionStore,
    client_info: String,
}

impl ApiGateway {
    /// Create a gateway. `base_url` must end with a slash so relative paths
    /// join under it (see [`crate::config::JournalConfig::new`]).
    pub fn new(base_url: Url, client: Client, session: SessionStore, options: &ClientOptions) -> Self {
        Self {
            base_url,
            client,
            session,
            client_info: options.client_info.clone(),
        }
    }

    /// The session store the gateway reads tokens from
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Resolve a path such as `entries/3/mood` against the base URL
    pub fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    pub fn get(&self, path: &str) -> FetchBuilder<'_> {
        FetchBuilder::new(self, Method::GET, path)
    }

    pub fn post(&self, path: &str) -> FetchBuilder<'_> {
        FetchBuilder::new(self, Method::POST, path)
    }

    pub fn put(&self, path: &str) -> FetchBuilder<'_> {
        FetchBuilder::new(self, Method::PUT, path)
    }

    pub fn delete(&self, path: &str) -> FetchBuilder<'_> {
        FetchBuilder::new(self, Method::DELETE, path)
    }

    /// Drop the stored session after the backend rejected the token
    pub fn expire_session(&self) -> Result<()> {
        info!("Backend rejected the session token, logging out");
        self.session.clear()?;
        Ok(())
    }

    /// Turn a classified response into a typed result. A 401 clears the
    /// session here so every caller handles it the same way.
    pub fn into_result<T: DeserializeOwned>(&self, response: ApiResponse) -> Result<Option<T>> {
        match response {
            ApiResponse::Success(None) => Ok(None),
            ApiResponse::Success(Some(body)) => Ok(Some(serde_json::from_value(body)?)),
            ApiResponse::AuthExpired => {
                self.expire_session()?;
                Err(Error::AuthExpired)
            }
            ApiResponse::Failure { status, body } => Err(Error::from_status(status, body)),
            ApiResponse::NetworkFailure(e) => Err(Error::Network(e)),
        }
    }
}

/// Helper for building and executing one request
pub struct FetchBuilder<'a> {
    gateway: &'a ApiGateway,
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    authenticated: bool,
    expire_on_unauthorized: bool,
}

impl<'a> FetchBuilder<'a> {
    fn new(gateway: &'a ApiGateway, method: Method, path: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&gateway.client_info) {
            headers.insert("X-Client-Info", value);
        }

        Self {
            gateway,
            method,
            path: path.to_string(),
            headers,
            body: None,
            authenticated: true,
            expire_on_unauthorized: true,
        }
    }

    /// Do not attach the bearer token, even if one is stored
    pub fn without_auth(mut self) -> Self {
        self.authenticated = false;
        self
    }

    /// Report a 401 as an ordinary [`ApiResponse::Failure`] instead of
    /// expiring the session. For endpoints that use 401 to reject a password.
    pub fn unauthorized_is_failure(mut self) -> Self {
        self.expire_on_unauthorized = false;
        self
    }

    /// Add a header to the request
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    /// Perform the request and classify the reply.
    ///
    /// `Err` is reserved for local problems (bad path, unreadable session
    /// store, undecodable 2xx body); everything the server or the network
    /// does is reported through [`ApiResponse`].
    pub async fn send(self) -> Result<ApiResponse> {
        let url = self.gateway.url(&self.path)?;
        let mut headers = self.headers;

        if self.authenticated {
            if let Some(token) = self.gateway.session.token()? {
                let value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|_| Error::config("stored token is not a valid header value"))?;
                headers.insert(AUTHORIZATION, value);
            }
        }

        debug!("{} {}", self.method, url);

        let mut request = self.gateway.client.request(self.method.clone(), url).headers(headers);
        if let Some(body) = self.body {
            request = request.body(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("{} {} failed: {}", self.method, self.path, e);
                return Ok(ApiResponse::NetworkFailure(e));
            }
        };

        // Login answers 401 for bad credentials; only a rejected token expires
        // the session.
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED && self.authenticated && self.expire_on_unauthorized {
            return Ok(ApiResponse::AuthExpired);
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return Ok(ApiResponse::NetworkFailure(e)),
        };

        if !status.is_success() {
            debug!("{} {} returned {}", self.method, self.path, status);
            return Ok(ApiResponse::Failure {
                status: status.as_u16(),
                body: text,
            });
        }

        if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
            return Ok(ApiResponse::Success(None));
        }

        let body: Value = serde_json::from_str(&text)?;
        Ok(ApiResponse::Success((!body.is_null()).then_some(body)))
    }

    /// Execute the request and parse the response as JSON, allowing an
    /// empty body
    pub async fn execute_optional<T: DeserializeOwned>(self) -> Result<Option<T>> {
        let gateway = self.gateway;
        let response = self.send().await?;
        gateway.into_result(response)
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(self) -> Result<T> {
        let path = self.path.clone();
        self.execute_optional::<T>().await?.ok_or_else(|| Error::Server {
            status: 200,
            message: format!("empty response body from {}", path),
        })
    }

    /// Execute the request and ignore any response body
    pub async fn execute_empty(self) -> Result<()> {
        self.execute_optional::<Value>().await.map(|_| ())
    }
}
