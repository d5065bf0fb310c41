//! Built-in export profiles.
//!
//! Each supported object type is one [`ExportProfile`] value: a listing
//! endpoint, an optional assignment source, and the declarative
//! normalization spec. Adding a type means adding data here, not a new code
//! path.

use crate::assignments::ResolveOptions;
use crate::export::ExportSpec;
use crate::fetch::ConfigObject;

const APP_PROTECTION_EXCLUDED: &[&str] = &["#microsoft.graph.targetedManagedAppConfiguration"];

/// Where a profile's assignment data comes from, if anywhere.
pub struct AssignmentSource {
    /// Resource path prefix for per-object sub-requests.
    pub path_prefix: &'static str,
    /// Drop all-licensed/all-unlicensed placeholder targets.
    pub drop_license_targets: bool,
}

impl AssignmentSource {
    pub fn options(&self, spec: &ExportSpec, batch_size: usize) -> ResolveOptions {
        let mut options = ResolveOptions::new(self.path_prefix)
            .with_batch_size(batch_size)
            .with_drop_license_targets(self.drop_license_targets);
        if let Some(field) = spec.discriminator_field {
            options =
                options.with_excluded_discriminators(field, spec.excluded_discriminators.iter().copied());
        }
        options
    }
}

/// One exportable object type.
pub struct ExportProfile {
    /// Human-readable type name, used in logs and the run summary.
    pub name: &'static str,
    /// Listing endpoint path, relative to the API base URL.
    pub endpoint: &'static str,
    /// Assignment resolution, for types that carry assignments.
    pub assignments: Option<AssignmentSource>,
    pub spec: ExportSpec,
}

/// All profiles exported by a default run.
pub fn default_profiles() -> Vec<ExportProfile> {
    vec![app_protection(), windows_enrollment()]
}

/// App Protection policies (managed app policies).
pub fn app_protection() -> ExportProfile {
    ExportProfile {
        name: "App Protection",
        endpoint: "deviceAppManagement/managedAppPolicies",
        assignments: Some(AssignmentSource {
            path_prefix: "deviceAppManagement/managedAppPolicies/",
            drop_license_targets: true,
        }),
        spec: ExportSpec {
            subdirectory: "App Protection",
            discriminator_field: Some("@odata.type"),
            excluded_discriminators: APP_PROTECTION_EXCLUDED,
            stripped_fields: &[
                "id",
                "createdDateTime",
                "version",
                "lastModifiedDateTime",
                "deployedAppCount",
                "isAssigned",
            ],
            name: app_protection_name,
        },
    }
}

/// Windows Autopilot enrollment profiles. No assignment sub-resource is
/// exported for these.
pub fn windows_enrollment() -> ExportProfile {
    ExportProfile {
        name: "Windows Enrollment Profiles",
        endpoint: "deviceManagement/windowsAutopilotDeploymentProfiles",
        assignments: None,
        spec: ExportSpec {
            subdirectory: "Enrollment Profiles/Windows",
            discriminator_field: None,
            excluded_discriminators: &[],
            stripped_fields: &["id", "createdDateTime", "version", "lastModifiedDateTime"],
            name: display_name,
        },
    }
}

/// `{displayName}_{targetedAppManagementLevels}` when the levels field is
/// present, otherwise `{displayName}_{platform tail of @odata.type}` - the
/// suffix disambiguates policies sharing a display name across platforms.
fn app_protection_name(object: &ConfigObject) -> Option<String> {
    let display = object.display_name()?;
    if let Some(levels) = object.get_str("targetedAppManagementLevels") {
        return Some(format!("{}_{}", display, levels));
    }
    let tail = object.get_str("@odata.type")?.split('.').nth(2)?;
    Some(format!("{}_{}", display, tail))
}

fn display_name(object: &ConfigObject) -> Option<String> {
    object.display_name().map(str::to_string)
}
