//! Graph REST client
//!
//! A thin blocking wrapper over `reqwest` that resolves relative collection
//! paths against the versioned base URL and maps failures onto `BackupError`.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;

use super::session::Session;
use crate::config::Settings;
use crate::error::{BackupError, BackupResult};

/// Read access to the management API
pub trait GraphApi {
    /// GET a resource; `url` is absolute or relative to the versioned base URL
    fn get(&self, url: &str) -> BackupResult<Value>;

    /// Fetch the plaintext of an encrypted OMA setting
    ///
    /// Fails with `BackupError::Permission` when the caller may not read secrets.
    fn reveal_secret(&self, configuration_id: &str, secret_reference_id: &str) -> BackupResult<String> {
        let response = self.get(&reveal_path(configuration_id, secret_reference_id))?;
        match response.get("value") {
            Some(Value::String(plaintext)) => Ok(plaintext.clone()),
            Some(Value::Null) | None => Err(BackupError::Transport(format!(
                "Reveal call for secret {} returned no value",
                secret_reference_id
            ))),
            Some(other) => Ok(other.to_string()),
        }
    }
}

/// Relative path of the reveal action for a device configuration secret
pub fn reveal_path(configuration_id: &str, secret_reference_id: &str) -> String {
    format!(
        "deviceManagement/deviceConfigurations/{}/getOmaSettingPlainTextValue(secretReferenceValueId='{}')",
        configuration_id, secret_reference_id
    )
}

/// Blocking Graph client bound to an authenticated session
pub struct GraphClient<'s> {
    http: Client,
    base_url: String,
    session: &'s Session,
}

impl<'s> GraphClient<'s> {
    /// Create a client for the configured endpoint and API version
    pub fn new(settings: &Settings, session: &'s Session) -> BackupResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("intune-backup/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: settings.graph_base_url(),
            session,
        })
    }

    /// Resolve a relative path against the base URL; absolute URLs pass through
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("https://") || url.starts_with("http://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        }
    }
}

impl GraphApi for GraphClient<'_> {
    fn get(&self, url: &str) -> BackupResult<Value> {
        let url = self.resolve_url(url);
        tracing::debug!(%url, "GET");

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.session.access_token())
            .header("Accept", "application/json")
            .send()
            .map_err(|e| BackupError::Transport(format!("Failed to send request to {}: {}", url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| BackupError::Transport(format!("Failed to read response from {}: {}", url, e)))?;

        if !status.is_success() {
            return Err(status_error(status, &url, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| BackupError::Transport(format!("Failed to parse response from {}: {}", url, e)))
    }
}

/// Map a non-success response onto the error taxonomy
fn status_error(status: StatusCode, url: &str, body: &str) -> BackupError {
    let message = graph_error_message(body).unwrap_or_else(|| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            BackupError::Permission(format!("{} ({}): {}", url, status, message))
        }
        _ => BackupError::Transport(format!("Request to {} failed with status {}: {}", url, status, message)),
    }
}

/// Extract `error.message` (and code) from a Graph error body
fn graph_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    let message = error.get("message")?.as_str()?;
    match error.get("code").and_then(Value::as_str) {
        Some(code) => Some(format!("{} ({})", message, code)),
        None => Some(message.to_string()),
    }
}
