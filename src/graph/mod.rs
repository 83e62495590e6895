//! Management API access
//!
//! - `GraphApi`: the read-only collaborator every exporter talks to
//! - `GraphClient`: blocking HTTP implementation bound to a `Session`
//! - `SessionManager`: the `Unauthenticated -> Authenticated` state machine
//! - `auth`: token sources feeding the session manager

pub mod auth;
pub mod client;
pub mod session;

pub use auth::{Authenticator, ClientCredentialsAuthenticator, StaticTokenAuthenticator};
pub use client::{reveal_path, GraphApi, GraphClient};
pub use session::{Session, SessionManager, SessionState, REQUIRED_SCOPES};

#[cfg(test)]
pub(crate) mod fake;
