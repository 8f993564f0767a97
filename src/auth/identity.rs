//! Client credentials exchange against the identity endpoint.

use crate::config::Credentials;
use crate::error::ApiError;
use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

/// Response from the identity endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Token type (usually "Bearer")
    pub token_type: String,
    /// Opaque access token
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

impl TokenResponse {
    /// Value sent in the `x-token` header.
    pub fn header_value(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Performs the authentication exchange.
pub trait IdentityProvider: Send {
    fn exchange(&self, credentials: &Credentials) -> Result<TokenResponse>;
}

/// Identity provider speaking OAuth2 client credentials over HTTP.
pub struct HttpIdentityProvider {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpIdentityProvider {
    pub fn new(client: reqwest::blocking::Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

impl IdentityProvider for HttpIdentityProvider {
    fn exchange(&self, credentials: &Credentials) -> Result<TokenResponse> {
        debug!(client_id = %credentials.client_id, "requesting access token");

        let response = self
            .client
            .post(&self.url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .map_err(ApiError::from)
            .context("Cannot reach identity endpoint")?;

        if !response.status().is_success() {
            return Err(ApiError::from_response("identity endpoint", response).into());
        }

        let token: TokenResponse = response
            .json()
            .map_err(ApiError::from)
            .context("Cannot parse access token response")?;

        Ok(token)
    }
}
