use crate::config::DEFAULT_LOGIN_TIMEOUT;
use crate::error::AuthError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

const DEFAULT_REJECTION: &str = "An error occurred during login.";

/// Login form contents, posted as `{"username": ..., "password": ...}`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Whether the login form may submit these credentials.
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.trim().is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Error body returned by the login endpoint.
#[derive(Debug, Deserialize)]
struct RejectionBody {
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<(), AuthError>;
}

/// Client for the external login endpoint.
pub struct LoginClient {
    http: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl LoginClient {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }

    /// Gives up on an endpoint that accepts the connection but never answers.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Authenticator for LoginClient {
    async fn login(&self, credentials: &Credentials) -> Result<(), AuthError> {
        log::info!("Logging in as {} via {}", credentials.username, self.endpoint);

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(credentials)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                log::warn!("Login request failed: {}", e);
                AuthError::Connection(e)
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response
            .json::<RejectionBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REJECTION.to_string());
        log::warn!("Login rejected with status {}: {}", status, message);

        Err(AuthError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}
