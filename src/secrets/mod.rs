//! Encrypted OMA setting resolution
//!
//! Custom device configurations may hold OMA-URI settings whose values are
//! encrypted at rest. Before such a profile is written, every setting is
//! rebuilt in decrypted form so the backup can be imported again later.
//!
//! - `OmaSetting`: one OMA-URI setting as returned by the API
//! - `SecretResolver`: rebuilds a profile's settings list via the reveal call
//! - `WarningLog`: append-only text log of values that could not be read

mod oma;
mod resolver;
mod warnings;

pub use oma::{needs_resolution, OmaSetting, CUSTOM_CONFIGURATION_TYPE};
pub use resolver::{ResolutionReport, SecretResolver, UnreadableSecret, UNREADABLE_SENTINEL};
pub use warnings::WarningLog;
