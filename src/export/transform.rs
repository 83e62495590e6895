//! Per-object rewrites applied before an object is written

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

use super::pagination::fetch_all;
use super::sanitize::sanitize_file_name;
use crate::error::{BackupError, BackupResult};
use crate::graph::GraphApi;
use crate::secrets::{SecretResolver, UnreadableSecret};

/// Which script fields an object carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// `scriptContent`, saved under the object's `fileName`
    Management,
    /// `detectionScriptContent` and `remediationScriptContent`
    Health,
}

/// Rewrite applied to every object of a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Write the object as listed
    None,
    /// Replace encrypted OMA settings with their plaintext
    ResolveSecrets,
    /// Read the `<collection>/<id>/<relation>` collection into `field`
    Embed {
        field: &'static str,
        relation: &'static str,
    },
    /// Re-read the full object (lists omit script bodies) and save decoded scripts
    FetchScript(ScriptKind),
}

/// An extra file produced alongside an object's JSON
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub contents: Vec<u8>,
}

/// Side results of a transform
#[derive(Debug, Default)]
pub struct TransformOutput {
    pub unreadable: Vec<UnreadableSecret>,
    pub attachments: Vec<Attachment>,
}

impl Transform {
    /// Apply the transform to `object`
    ///
    /// `collection` is the category's collection path without its query string
    /// and `file_stem` the sanitized name the object is filed under.
    pub fn apply<A>(
        &self,
        api: &A,
        resolver: &SecretResolver<'_>,
        collection: &str,
        file_stem: &str,
        object: &mut Value,
    ) -> BackupResult<TransformOutput>
    where
        A: GraphApi + ?Sized,
    {
        let mut output = TransformOutput::default();

        match *self {
            Transform::None => {}
            Transform::ResolveSecrets => {
                output.unreadable = resolver.resolve(api, object)?.unreadable;
            }
            Transform::Embed { field, relation } => {
                let id = object_id(object)?;
                let items = fetch_all(api, &format!("{}/{}/{}", collection, id, relation), None)?;
                if let Some(map) = object.as_object_mut() {
                    map.insert(field.to_string(), Value::Array(items));
                }
            }
            Transform::FetchScript(kind) => {
                let id = object_id(object)?;
                let mut full = api.get(&format!("{}/{}", collection, id))?;
                if let Some(map) = full.as_object_mut() {
                    map.remove("@odata.context");
                }
                *object = full;
                output.attachments = script_attachments(kind, file_stem, object)?;
            }
        }

        Ok(output)
    }
}

fn object_id(object: &Value) -> BackupResult<String> {
    object
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BackupError::Json("Object has no id".into()))
}

fn script_attachments(kind: ScriptKind, file_stem: &str, object: &Value) -> BackupResult<Vec<Attachment>> {
    let sources: Vec<(&str, String)> = match kind {
        ScriptKind::Management => {
            let file_name = object
                .get("fileName")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .map(sanitize_file_name)
                .unwrap_or_else(|| format!("{}.ps1", file_stem));
            vec![("scriptContent", file_name)]
        }
        ScriptKind::Health => vec![
            ("detectionScriptContent", format!("{}_detection.ps1", file_stem)),
            ("remediationScriptContent", format!("{}_remediation.ps1", file_stem)),
        ],
    };

    let mut attachments = Vec::new();
    for (field, file_name) in sources {
        let Some(encoded) = object.get(field).and_then(Value::as_str) else {
            continue;
        };
        if encoded.is_empty() {
            continue;
        }

        let contents = STANDARD.decode(encoded).map_err(|e| {
            BackupError::Json(format!("Failed to decode {} of '{}': {}", field, file_stem, e))
        })?;
        attachments.push(Attachment { file_name, contents });
    }

    Ok(attachments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fake::FakeGraph;
    use crate::secrets::WarningLog;
    use serde_json::json;
    use tempfile::TempDir;

    fn with_resolver<F: FnOnce(&SecretResolver<'_>)>(f: F) {
        let temp = TempDir::new().unwrap();
        let log = WarningLog::new(temp.path().join("w.txt"));
        f(&SecretResolver::new(&log));
    }

    #[test]
    fn test_none_leaves_object() {
        with_resolver(|resolver| {
            let api = FakeGraph::new();
            let mut object = json!({"id": "1", "displayName": "A"});
            let out = Transform::None
                .apply(&api, resolver, "c", "A", &mut object)
                .unwrap();
            assert!(out.attachments.is_empty());
            assert_eq!(object, json!({"id": "1", "displayName": "A"}));
        });
    }

    #[test]
    fn test_embed_collection() {
        with_resolver(|resolver| {
            let api = FakeGraph::new().with_collection(
                "deviceManagement/configurationPolicies/p1/settings",
                vec![json!({"id": "s1"}), json!({"id": "s2"})],
            );
            let mut object = json!({"id": "p1", "name": "Catalog"});

            Transform::Embed { field: "settings", relation: "settings" }
                .apply(&api, resolver, "deviceManagement/configurationPolicies", "Catalog", &mut object)
                .unwrap();

            assert_eq!(object["settings"].as_array().unwrap().len(), 2);
            assert_eq!(object["name"], "Catalog");
        });
    }

    #[test]
    fn test_fetch_management_script() {
        with_resolver(|resolver| {
            let api = FakeGraph::new().with_json(
                "deviceManagement/deviceManagementScripts/s1",
                json!({
                    "@odata.context": "https://graph/$metadata#x",
                    "id": "s1",
                    "displayName": "Set Wallpaper",
                    "fileName": "wallpaper.ps1",
                    "scriptContent": STANDARD.encode("Write-Host 'hello'")
                }),
            );
            let mut object = json!({"id": "s1", "displayName": "Set Wallpaper"});

            let out = Transform::FetchScript(ScriptKind::Management)
                .apply(&api, resolver, "deviceManagement/deviceManagementScripts", "Set Wallpaper", &mut object)
                .unwrap();

            assert!(object.get("@odata.context").is_none());
            assert!(object.get("scriptContent").is_some());
            assert_eq!(
                out.attachments,
                vec![Attachment {
                    file_name: "wallpaper.ps1".into(),
                    contents: b"Write-Host 'hello'".to_vec(),
                }]
            );
        });
    }

    #[test]
    fn test_health_script_attachments() {
        let object = json!({
            "detectionScriptContent": STANDARD.encode("detect"),
            "remediationScriptContent": ""
        });

        let attachments = script_attachments(ScriptKind::Health, "Fix Spooler", &object).unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].file_name, "Fix Spooler_detection.ps1");
        assert_eq!(attachments[0].contents, b"detect");
    }

    #[test]
    fn test_invalid_script_encoding() {
        let object = json!({"scriptContent": "!!not base64!!"});
        assert!(script_attachments(ScriptKind::Management, "x", &object).is_err());
    }

    #[test]
    fn test_missing_id() {
        with_resolver(|resolver| {
            let api = FakeGraph::new();
            let mut object = json!({"displayName": "No id"});
            let result = Transform::Embed { field: "settings", relation: "settings" }
                .apply(&api, resolver, "c", "No id", &mut object);
            assert!(matches!(result, Err(BackupError::Json(_))));
        });
    }
}
