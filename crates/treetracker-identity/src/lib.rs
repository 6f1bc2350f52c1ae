//! HTTP client for the identity provider and the registration service.
//!
//! Sign-in uses the OpenID Connect password grant against the realm's token
//! endpoint. Sign-up posts the registration form to the registration service,
//! which creates the account on the user's behalf.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use treetracker_core::{IdentityConfig, IdentityError, IdentityProvider, RegistrationForm, TokenSet};

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";

/// Error body returned by the token endpoint
#[derive(Debug, Default, Deserialize)]
struct TokenErrorBody {
    error_description: Option<String>,
}

/// Error body returned by the registration service
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationErrorBody {
    error: Option<String>,
    error_message: Option<String>,
}

/// Successful registration reply
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug)]
pub struct IdentityClient {
    client: Client,
    token_endpoint: String,
    client_id: String,
    registration_endpoint: String,
}

impl IdentityClient {
    pub fn new(
        token_endpoint: String,
        client_id: String,
        registration_endpoint: String,
    ) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| IdentityError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            token_endpoint,
            client_id,
            registration_endpoint,
        })
    }

    pub fn from_config(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let token_endpoint = config.token_endpoint().ok_or_else(|| {
            IdentityError::Configuration(
                "KEYCLOAK_BASE_URL and KEYCLOAK_REALM must be set".to_string(),
            )
        })?;
        let client_id = config.keycloak_client_id.clone().ok_or_else(|| {
            IdentityError::Configuration("KEYCLOAK_CLIENT_ID must be set".to_string())
        })?;

        Self::new(token_endpoint, client_id, config.registration_endpoint())
    }

    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }

    /// Exchange username and password for tokens (OpenID password grant).
    pub async fn login_with_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenSet, IdentityError> {
        let params = [
            ("grant_type", "password"),
            ("client_id", self.client_id.as_str()),
            ("username", username),
            ("password", password),
        ];

        let response = self
            .client
            .post(&self.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body: TokenErrorBody = response.json().await.unwrap_or_default();
            tracing::warn!(status = %status, username, "Login rejected");
            return Err(IdentityError::LoginFailed(
                body.error_description
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| LOGIN_FAILED.to_string()),
            ));
        }

        let tokens: TokenSet = response
            .json()
            .await
            .map_err(|e| IdentityError::LoginFailed(format!("Malformed token response: {}", e)))?;

        tracing::info!(username, expires_in = tokens.expires_in, "Login succeeded");
        Ok(tokens)
    }

    /// Validate the form and submit it to the registration service.
    pub async fn register_user(
        &self,
        form: &RegistrationForm,
    ) -> Result<RegistrationResponse, IdentityError> {
        form.check()
            .map_err(|e| IdentityError::RegistrationFailed(e.to_string()))?;

        let response = self
            .client
            .post(&self.registration_endpoint)
            .json(form)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body: RegistrationErrorBody = response.json().await.unwrap_or_default();
            tracing::warn!(status = %status, email = %form.email, "Registration rejected");
            let message = body
                .error
                .or(body.error_message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| REGISTRATION_FAILED.to_string());
            return Err(IdentityError::RegistrationFailed(message));
        }

        let reply: RegistrationResponse = response.json().await.unwrap_or_default();
        tracing::info!(email = %form.email, "Registration succeeded");
        Ok(reply)
    }
}

#[async_trait]
impl IdentityProvider for IdentityClient {
    async fn authenticate(&self, username: &str, password: &str) -> Result<TokenSet, IdentityError> {
        self.login_with_password(username, password).await
    }
}
