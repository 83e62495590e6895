//! The fixed set of exported categories
//!
//! Each entry maps a collection path to an output folder. Adding a category
//! means adding a row here; the orchestrator and exporter are shared.

use serde_json::Value;

use crate::config::ApiVersion;
use crate::export::exporter::collection_base;
use crate::export::{ScriptKind, Transform};

/// Where an object's assignments are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentSource {
    /// The category has no assignments
    None,
    /// `<collection>/<id>/assignments`
    Nested,
    /// App protection policies: the typed collection named by `@odata.type`
    ByAppProtectionType,
}

/// One exported category
#[derive(Debug, Clone, Copy)]
pub struct Category {
    /// Record type, e.g. `"Device Configuration"`
    pub label: &'static str,
    /// Collection path relative to the versioned base URL, query included
    pub collection: &'static str,
    /// Output folder under the backup root
    pub folder: &'static str,
    pub assignments: AssignmentSource,
    pub transform: Transform,
    /// Only served by the beta endpoint
    pub beta_only: bool,
}

/// Typed collections of the app protection policy subtypes
const APP_PROTECTION_COLLECTIONS: &[(&str, &str)] = &[
    ("#microsoft.graph.iosManagedAppProtection", "deviceAppManagement/iosManagedAppProtections"),
    ("#microsoft.graph.androidManagedAppProtection", "deviceAppManagement/androidManagedAppProtections"),
    ("#microsoft.graph.windowsInformationProtectionPolicy", "deviceAppManagement/windowsInformationProtectionPolicies"),
    ("#microsoft.graph.mdmWindowsInformationProtectionPolicy", "deviceAppManagement/mdmWindowsInformationProtectionPolicies"),
    ("#microsoft.graph.targetedManagedAppConfiguration", "deviceAppManagement/targetedManagedAppConfigurations"),
];

/// Every category, in export order
pub const CATEGORIES: &[Category] = &[
    Category {
        label: "Autopilot Deployment Profile",
        collection: "deviceManagement/windowsAutopilotDeploymentProfiles",
        folder: "Autopilot Deployment Profiles",
        assignments: AssignmentSource::Nested,
        transform: Transform::None,
        beta_only: true,
    },
    Category {
        label: "Client App",
        collection: "deviceAppManagement/mobileApps?$filter=(microsoft.graph.managedApp/appAvailability eq null or microsoft.graph.managedApp/appAvailability eq 'lineOfBusiness' or isAssigned eq true)",
        folder: "Client Apps",
        assignments: AssignmentSource::Nested,
        transform: Transform::None,
        beta_only: false,
    },
    Category {
        label: "Settings Catalog",
        collection: "deviceManagement/configurationPolicies",
        folder: "Settings Catalog",
        assignments: AssignmentSource::Nested,
        transform: Transform::Embed {
            field: "settings",
            relation: "settings",
        },
        beta_only: true,
    },
    Category {
        label: "Device Compliance Policy",
        collection: "deviceManagement/deviceCompliancePolicies",
        folder: "Device Compliance Policies",
        assignments: AssignmentSource::Nested,
        transform: Transform::None,
        beta_only: false,
    },
    Category {
        label: "Device Configuration",
        collection: "deviceManagement/deviceConfigurations",
        folder: "Device Configurations",
        assignments: AssignmentSource::Nested,
        transform: Transform::ResolveSecrets,
        beta_only: false,
    },
    Category {
        label: "Device Health Script",
        collection: "deviceManagement/deviceHealthScripts",
        folder: "Device Health Scripts",
        assignments: AssignmentSource::Nested,
        transform: Transform::FetchScript(ScriptKind::Health),
        beta_only: true,
    },
    Category {
        label: "Device Management Script",
        collection: "deviceManagement/deviceManagementScripts",
        folder: "Device Management Scripts",
        assignments: AssignmentSource::Nested,
        transform: Transform::FetchScript(ScriptKind::Management),
        beta_only: true,
    },
    Category {
        label: "Administrative Template",
        collection: "deviceManagement/groupPolicyConfigurations",
        folder: "Administrative Templates",
        assignments: AssignmentSource::Nested,
        transform: Transform::Embed {
            field: "definitionValues",
            relation: "definitionValues?$expand=definition",
        },
        beta_only: true,
    },
    Category {
        label: "Device Management Intent",
        collection: "deviceManagement/intents",
        folder: "Device Management Intents",
        assignments: AssignmentSource::Nested,
        transform: Transform::Embed {
            field: "settings",
            relation: "settings",
        },
        beta_only: true,
    },
    Category {
        label: "App Protection Policy",
        collection: "deviceAppManagement/managedAppPolicies",
        folder: "App Protection Policies",
        assignments: AssignmentSource::ByAppProtectionType,
        transform: Transform::None,
        beta_only: false,
    },
];

impl Category {
    /// Whether the category can be read through the given API version
    pub fn available_in(&self, version: ApiVersion) -> bool {
        !(self.beta_only && version == ApiVersion::V1)
    }

    /// Record type for this category's assignment files
    pub fn assignments_label(&self) -> String {
        format!("{} Assignments", self.label)
    }

    /// Assignments URL of one object, if it has one
    pub fn assignments_url(&self, object: &Value) -> Option<String> {
        let id = object.get("id").and_then(Value::as_str)?;

        match self.assignments {
            AssignmentSource::None => None,
            AssignmentSource::Nested => Some(format!(
                "{}/{}/assignments",
                collection_base(self.collection),
                id
            )),
            AssignmentSource::ByAppProtectionType => {
                let odata_type = object.get("@odata.type").and_then(Value::as_str)?;
                APP_PROTECTION_COLLECTIONS
                    .iter()
                    .find(|(t, _)| *t == odata_type)
                    .map(|(_, collection)| format!("{}/{}/assignments", collection, id))
            }
        }
    }

    /// Whether `name` selects this category (label or folder, case-insensitive)
    pub fn matches(&self, name: &str) -> bool {
        self.label.eq_ignore_ascii_case(name) || self.folder.eq_ignore_ascii_case(name)
    }
}

/// Look up a category by label or folder name
pub fn find_category(name: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.matches(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_table_is_unique() {
        let labels: HashSet<_> = CATEGORIES.iter().map(|c| c.label).collect();
        let folders: HashSet<_> = CATEGORIES.iter().map(|c| c.folder).collect();
        assert_eq!(labels.len(), CATEGORIES.len());
        assert_eq!(folders.len(), CATEGORIES.len());
    }

    #[test]
    fn test_only_device_configurations_resolve_secrets() {
        let resolving: Vec<_> = CATEGORIES
            .iter()
            .filter(|c| c.transform == Transform::ResolveSecrets)
            .map(|c| c.folder)
            .collect();
        assert_eq!(resolving, vec!["Device Configurations"]);
    }

    #[test]
    fn test_nested_assignments_url_strips_query() {
        let apps = find_category("Client Apps").unwrap();
        assert_eq!(
            apps.assignments_url(&json!({"id": "app-1"})).as_deref(),
            Some("deviceAppManagement/mobileApps/app-1/assignments")
        );
    }

    #[test]
    fn test_app_protection_assignments_by_type() {
        let policies = find_category("App Protection Policy").unwrap();

        let ios = json!({"id": "p1", "@odata.type": "#microsoft.graph.iosManagedAppProtection"});
        assert_eq!(
            policies.assignments_url(&ios).as_deref(),
            Some("deviceAppManagement/iosManagedAppProtections/p1/assignments")
        );

        let unknown = json!({"id": "p2", "@odata.type": "#microsoft.graph.defaultManagedAppProtection"});
        assert!(policies.assignments_url(&unknown).is_none());
    }

    #[test]
    fn test_available_in_v1() {
        let intents = find_category("deviceManagement intents");
        assert!(intents.is_none());

        let intents = find_category("Device Management Intents").unwrap();
        assert!(!intents.available_in(ApiVersion::V1));
        assert!(intents.available_in(ApiVersion::Beta));
        assert!(find_category("Device Configuration")
            .unwrap()
            .available_in(ApiVersion::V1));
    }
}
