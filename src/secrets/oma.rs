//! OMA-URI setting model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Type discriminator of custom (OMA-URI) Windows configuration profiles
pub const CUSTOM_CONFIGURATION_TYPE: &str = "#microsoft.graph.windows10CustomConfiguration";

/// A single OMA-URI setting of a custom configuration profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OmaSetting {
    /// Setting kind, e.g. `#microsoft.graph.omaSettingString`
    #[serde(rename = "@odata.type")]
    pub odata_type: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub oma_uri: String,

    /// Setting value; its JSON type depends on `odata_type`
    #[serde(default)]
    pub value: Value,

    #[serde(default)]
    pub is_encrypted: bool,

    #[serde(default)]
    pub secret_reference_value_id: Option<String>,

    /// Type-specific fields such as `fileName` on XML settings
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OmaSetting {
    /// Rebuild this setting in decrypted form with the given value
    ///
    /// The encrypted-state fields are always cleared.
    pub fn decrypted(&self, value: Value) -> Self {
        Self {
            odata_type: self.odata_type.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            oma_uri: self.oma_uri.clone(),
            value,
            is_encrypted: false,
            secret_reference_value_id: None,
            extra: self.extra.clone(),
        }
    }
}

/// Whether a device configuration needs its settings resolved
///
/// True only for custom configuration profiles with at least one encrypted setting.
pub fn needs_resolution(object: &Value) -> bool {
    let is_custom = object
        .get("@odata.type")
        .and_then(Value::as_str)
        .is_some_and(|t| t == CUSTOM_CONFIGURATION_TYPE);

    is_custom
        && object
            .get("omaSettings")
            .and_then(Value::as_array)
            .is_some_and(|settings| {
                settings
                    .iter()
                    .any(|s| s.get("isEncrypted").and_then(Value::as_bool) == Some(true))
            })
}
