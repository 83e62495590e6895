//! Authenticated session handle and the sign-in state machine
//!
//! The session is created once per run and then only read: every exporter
//! receives it through the `GraphClient` it is handed.

use std::collections::BTreeSet;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use zeroize::Zeroizing;

use super::auth::Authenticator;
use crate::error::{BackupError, BackupResult};

/// Read-only permission scopes needed by every category
pub const REQUIRED_SCOPES: &[&str] = &[
    "DeviceManagementApps.Read.All",
    "DeviceManagementConfiguration.Read.All",
    "DeviceManagementManagedDevices.Read.All",
    "DeviceManagementServiceConfig.Read.All",
    "DeviceManagementScripts.Read.All",
    "Group.Read.All",
];

/// Tokens this close to expiry are treated as expired
const EXPIRY_SKEW_SECONDS: i64 = 60;

/// An access token plus the permission scopes it carries
#[derive(Clone)]
pub struct Session {
    token: Zeroizing<String>,
    scopes: BTreeSet<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("scopes", &self.scopes)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session from already-known parts
    pub fn new<I, S>(token: impl Into<String>, scopes: I, expires_at: Option<DateTime<Utc>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            token: Zeroizing::new(token.into()),
            scopes: scopes.into_iter().map(Into::into).collect(),
            expires_at,
        }
    }

    /// Build a session by introspecting a JWT access token
    ///
    /// Delegated tokens list scopes in `scp` (space separated), application
    /// tokens list them in `roles`. Both are merged.
    pub fn from_token(token: impl Into<String>) -> BackupResult<Self> {
        let token = token.into();
        let claims = decode_claims(&token)?;

        let mut scopes = BTreeSet::new();
        if let Some(scp) = claims.get("scp").and_then(Value::as_str) {
            scopes.extend(scp.split_whitespace().map(str::to_string));
        }
        if let Some(roles) = claims.get("roles").and_then(Value::as_array) {
            scopes.extend(roles.iter().filter_map(Value::as_str).map(str::to_string));
        }

        let expires_at = claims
            .get("exp")
            .and_then(Value::as_i64)
            .and_then(|exp| DateTime::from_timestamp(exp, 0));

        Ok(Self {
            token: Zeroizing::new(token),
            scopes,
            expires_at,
        })
    }

    /// The bearer token
    pub fn access_token(&self) -> &str {
        &self.token
    }

    /// Scopes granted to this session
    pub fn granted_scopes(&self) -> &BTreeSet<String> {
        &self.scopes
    }

    /// When the token expires, if known
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the token is expired (or about to be)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => at - Duration::seconds(EXPIRY_SKEW_SECONDS) <= Utc::now(),
            None => false,
        }
    }

    /// Required scopes this session does not hold (case-insensitive)
    pub fn missing_scopes<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|needed| !self.scopes.iter().any(|have| have.eq_ignore_ascii_case(needed)))
            .collect()
    }
}

/// Decode the payload segment of a JWT
fn decode_claims(token: &str) -> BackupResult<Value> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| BackupError::Auth("Access token is not a JWT".into()))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| BackupError::Auth(format!("Failed to decode access token claims: {}", e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| BackupError::Auth(format!("Failed to parse access token claims: {}", e)))
}

/// Sign-in state
#[derive(Debug)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(Session),
}

/// Owns the sign-in state machine for one run
pub struct SessionManager<A> {
    authenticator: A,
    state: SessionState,
}

impl<A: Authenticator> SessionManager<A> {
    /// Start unauthenticated
    pub fn new(authenticator: A) -> Self {
        Self {
            authenticator,
            state: SessionState::Unauthenticated,
        }
    }

    /// Start from an existing session, which is still verified on use
    #[cfg(test)]
    pub(crate) fn with_session(authenticator: A, session: Session) -> Self {
        Self {
            authenticator,
            state: SessionState::Authenticated(session),
        }
    }

    /// Current state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Make sure a live session holding every `required` scope exists
    ///
    /// An existing session missing scopes (or expired) is re-established once
    /// with the full set. If the new session still lacks scopes the manager
    /// stays unauthenticated and an `Auth` error names what is missing.
    pub fn ensure_authenticated(&mut self, required: &[&str]) -> BackupResult<&Session> {
        let needs_sign_in = match &self.state {
            SessionState::Unauthenticated => {
                tracing::info!("No session; signing in");
                true
            }
            SessionState::Authenticated(session) if session.is_expired() => {
                tracing::info!("Session expired; signing in again");
                true
            }
            SessionState::Authenticated(session) => {
                let missing = session.missing_scopes(required);
                if !missing.is_empty() {
                    tracing::warn!(missing = ?missing, "Session lacks required scopes; signing in again");
                }
                !missing.is_empty()
            }
        };

        if needs_sign_in {
            self.state = SessionState::Unauthenticated;
            let session = self.authenticator.acquire(required)?;

            let missing = session.missing_scopes(required);
            if !missing.is_empty() {
                return Err(BackupError::Auth(format!(
                    "Session is missing required scopes: {}",
                    missing.join(", ")
                )));
            }

            tracing::info!(
                scopes = session.granted_scopes().len(),
                expires_at = ?session.expires_at(),
                "Signed in"
            );
            self.state = SessionState::Authenticated(session);
        }

        match &self.state {
            SessionState::Authenticated(session) => Ok(session),
            SessionState::Unauthenticated => Err(BackupError::Auth("No session available".into())),
        }
    }
}
