//! Secret resolution for custom configuration profiles

use serde_json::Value;

use super::oma::{needs_resolution, OmaSetting};
use super::warnings::WarningLog;
use crate::error::{BackupError, BackupResult};
use crate::export::sanitize::display_name;
use crate::graph::GraphApi;

/// Written in place of a value the reveal call would not return
pub const UNREADABLE_SENTINEL: &str = "[[ENCRYPTED VALUE UNREADABLE: missing permission]]";

/// A setting exported with the sentinel instead of its plaintext
///
/// The exported setting is marked unencrypted, so this is the only record
/// that its value is not real.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableSecret {
    pub object_name: String,
    pub oma_uri: String,
    pub secret_reference_id: String,
}

/// Outcome of resolving one profile
#[derive(Debug, Default, Clone)]
pub struct ResolutionReport {
    /// Encrypted settings whose plaintext was retrieved
    pub resolved: usize,
    /// Encrypted settings replaced by the sentinel
    pub unreadable: Vec<UnreadableSecret>,
}

/// Rebuilds encrypted OMA settings in decrypted form
pub struct SecretResolver<'a> {
    warnings: &'a WarningLog,
}

impl<'a> SecretResolver<'a> {
    pub fn new(warnings: &'a WarningLog) -> Self {
        Self { warnings }
    }

    /// Replace `omaSettings` of a custom configuration with a decrypted list
    ///
    /// Objects that are not custom configurations, or hold no encrypted
    /// settings, are left untouched. A reveal call denied for lack of
    /// permission is not an error: the sentinel is written instead and a
    /// warning is logged. Any other reveal failure is returned and the object
    /// is left as it was.
    pub fn resolve<A>(&self, api: &A, object: &mut Value) -> BackupResult<ResolutionReport>
    where
        A: GraphApi + ?Sized,
    {
        let mut report = ResolutionReport::default();
        if !needs_resolution(object) {
            return Ok(report);
        }

        let name = display_name(object);
        let configuration_id = object
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| BackupError::Json(format!("Configuration '{}' has no id", name)))?
            .to_string();

        let settings: Vec<OmaSetting> =
            serde_json::from_value(object["omaSettings"].clone()).map_err(|e| {
                BackupError::Json(format!("Failed to parse OMA settings of '{}': {}", name, e))
            })?;

        let mut rebuilt = Vec::with_capacity(settings.len());
        for setting in &settings {
            if !setting.is_encrypted {
                rebuilt.push(setting.decrypted(setting.value.clone()));
                continue;
            }

            let reference = setting.secret_reference_value_id.clone().unwrap_or_default();
            let value = match api.reveal_secret(&configuration_id, &reference) {
                Ok(plaintext) => {
                    report.resolved += 1;
                    Value::String(plaintext)
                }
                Err(err) if err.is_permission() => {
                    let message = format!(
                        "Failed to retrieve encrypted value for setting with SecretReferenceValueId '{}' in profile '{}': {}",
                        reference, name, err
                    );
                    tracing::warn!("{}", message);
                    self.warnings.append(&message)?;

                    report.unreadable.push(UnreadableSecret {
                        object_name: name.clone(),
                        oma_uri: setting.oma_uri.clone(),
                        secret_reference_id: reference,
                    });
                    Value::String(UNREADABLE_SENTINEL.to_string())
                }
                Err(err) => return Err(err),
            };

            rebuilt.push(setting.decrypted(value));
        }

        object["omaSettings"] = serde_json::to_value(&rebuilt)?;

        tracing::debug!(
            profile = %name,
            resolved = report.resolved,
            unreadable = report.unreadable.len(),
            "Resolved encrypted OMA settings"
        );
        Ok(report)
    }
}
