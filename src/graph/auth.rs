//! Token sources
//!
//! Sign-in itself is delegated to the identity platform; these types only
//! obtain a bearer token and hand it to `Session::from_token`.

use reqwest::blocking::Client;
use serde::Deserialize;
use zeroize::Zeroizing;

use super::session::Session;
use crate::config::Settings;
use crate::error::{BackupError, BackupResult};

/// Produces sessions on demand
pub trait Authenticator {
    /// Obtain a new session asking for `scopes`
    fn acquire(&self, scopes: &[&str]) -> BackupResult<Session>;
}

impl<T: Authenticator + ?Sized> Authenticator for Box<T> {
    fn acquire(&self, scopes: &[&str]) -> BackupResult<Session> {
        (**self).acquire(scopes)
    }
}

/// Uses a token issued out of band (e.g. `INTUNE_BACKUP_ACCESS_TOKEN`)
///
/// Re-acquiring returns the same token, so a token missing scopes stays
/// missing them and the session manager reports it.
pub struct StaticTokenAuthenticator {
    token: Zeroizing<String>,
}

impl StaticTokenAuthenticator {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Zeroizing::new(token.into()),
        }
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn acquire(&self, _scopes: &[&str]) -> BackupResult<Session> {
        Session::from_token(self.token.as_str())
    }
}

/// OAuth2 client-credentials grant against the identity platform
pub struct ClientCredentialsAuthenticator {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: Zeroizing<String>,
    scope: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct TokenError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl ClientCredentialsAuthenticator {
    /// Build from settings plus a client secret
    pub fn from_settings(settings: &Settings, client_secret: Zeroizing<String>) -> BackupResult<Self> {
        let client_id = settings.client_id.clone().ok_or_else(|| {
            BackupError::Config("A client ID is required for client-credentials sign-in".into())
        })?;

        Ok(Self {
            http: Client::new(),
            token_url: settings.token_url()?,
            client_id,
            client_secret,
            scope: settings.default_scope(),
        })
    }
}

impl Authenticator for ClientCredentialsAuthenticator {
    fn acquire(&self, scopes: &[&str]) -> BackupResult<Session> {
        // Application permissions are granted up front; `.default` requests all of them.
        tracing::debug!(requested = ?scopes, scope = %self.scope, "Requesting client-credentials token");

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .map_err(|e| BackupError::Auth(format!("Failed to reach token endpoint: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| BackupError::Auth(format!("Failed to read token response: {}", e)))?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<TokenError>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => body,
            };
            return Err(BackupError::Auth(format!("Token request failed ({}): {}", status, detail)));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| BackupError::Auth(format!("Failed to parse token response: {}", e)))?;

        Session::from_token(token.access_token)
    }
}
