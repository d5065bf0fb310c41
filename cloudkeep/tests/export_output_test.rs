//! Integration tests for the generic normalizer/exporter.
//!
//! Verifies:
//! - stripped fields never reach the output
//! - `assignments` attached exactly as resolved, order preserved
//! - JSON round-trip and YAML key-order preservation
//! - discriminator exclusion and duplicate-name overwrite behavior

use cloudkeep::profiles::{app_protection, windows_enrollment};
use cloudkeep::{ConfigObject, ExportSpec, Exporter, OutputFormat};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn policy_a() -> ConfigObject {
    ConfigObject::from_value(json!({
        "id": "1",
        "displayName": "Policy A",
        "@odata.type": "#microsoft.graph.androidManagedAppProtection",
        "createdDateTime": "2024-01-01T00:00:00Z",
        "lastModifiedDateTime": "2024-06-01T00:00:00Z",
        "version": "3",
        "deployedAppCount": 12,
        "isAssigned": true,
        "periodOfflineBeforeAccessCheck": "PT12H"
    }))
    .unwrap()
}

fn name_from_display(object: &ConfigObject) -> Option<String> {
    object.display_name().map(str::to_string)
}

/// Minimal spec for tests that don't care about type-specific naming.
fn plain_spec() -> ExportSpec {
    ExportSpec {
        subdirectory: "Plain",
        discriminator_field: None,
        excluded_discriminators: &[],
        stripped_fields: &["id"],
        name: name_from_display,
    }
}

// =========================================================================
// Normalization: stripped fields and assignments
// =========================================================================

#[test]
fn test_stripped_fields_never_in_output() {
    let temp = TempDir::new().unwrap();
    let exporter = Exporter::new(temp.path(), OutputFormat::Json);
    let spec = app_protection().spec;

    let path = exporter.export_object(&spec, policy_a(), None).unwrap().unwrap();

    let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let map = written.as_object().unwrap();

    for field in spec.stripped_fields {
        assert!(!map.contains_key(*field), "stripped field `{}` leaked into output", field);
    }
    assert_eq!(map.get("displayName").unwrap(), "Policy A");
    assert_eq!(map.get("periodOfflineBeforeAccessCheck").unwrap(), "PT12H");
}

#[test]
fn test_zero_assignment_object_has_no_assignments_key() {
    let temp = TempDir::new().unwrap();
    let exporter = Exporter::new(temp.path(), OutputFormat::Yaml);
    let spec = app_protection().spec;

    let path = exporter.export_object(&spec, policy_a(), None).unwrap().unwrap();

    assert_eq!(
        path,
        temp.path()
            .join("App Protection")
            .join("Policy A_androidManagedAppProtection.yaml")
    );

    let written: Value = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let map = written.as_object().unwrap();

    assert!(!map.contains_key("id"), "id must be stripped");
    assert!(!map.contains_key("assignments"), "no assignments key without resolved assignments");
}

#[test]
fn test_assignments_attached_exactly_in_order() {
    let temp = TempDir::new().unwrap();
    let exporter = Exporter::new(temp.path(), OutputFormat::Json);

    let assignments = vec![
        json!({ "target": { "@odata.type": "#microsoft.graph.groupAssignmentTarget", "groupId": "g-1" } }),
        json!({ "target": { "@odata.type": "#microsoft.graph.exclusionGroupAssignmentTarget", "groupId": "g-2" } }),
    ];

    let path = exporter
        .export_object(&plain_spec(), policy_a(), Some(&assignments))
        .unwrap()
        .unwrap();

    let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        written.get("assignments").unwrap(),
        &Value::Array(assignments),
        "assignments must equal the resolved sequence, order preserved"
    );
}

#[test]
fn test_empty_assignment_slice_adds_no_key() {
    let temp = TempDir::new().unwrap();
    let exporter = Exporter::new(temp.path(), OutputFormat::Json);

    let path = exporter
        .export_object(&plain_spec(), policy_a(), Some(&[]))
        .unwrap()
        .unwrap();

    let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(written.get("assignments").is_none());
}

// =========================================================================
// Discriminator exclusion
// =========================================================================

#[test]
fn test_excluded_discriminator_produces_no_file() {
    let temp = TempDir::new().unwrap();
    let exporter = Exporter::new(temp.path(), OutputFormat::Yaml);
    let spec = app_protection().spec;

    let object = ConfigObject::from_value(json!({
        "id": "2",
        "displayName": "App Config",
        "@odata.type": "#microsoft.graph.targetedManagedAppConfiguration"
    }))
    .unwrap();

    let result = exporter.export_object(&spec, object, None).unwrap();

    assert!(result.is_none(), "excluded subtype must be skipped");
    assert!(
        !temp.path().join("App Protection").exists(),
        "skipping must not even create the subdirectory"
    );
}

// =========================================================================
// Naming and duplicate handling
// =========================================================================

#[test]
fn test_duplicate_sanitized_names_overwrite_last_wins() {
    let temp = TempDir::new().unwrap();
    let exporter = Exporter::new(temp.path(), OutputFormat::Json);
    let spec = plain_spec();

    let first = ConfigObject::from_value(json!({
        "id": "1",
        "displayName": "Te:st",
        "marker": "first"
    }))
    .unwrap();
    let second = ConfigObject::from_value(json!({
        "id": "2",
        "displayName": "Test",
        "marker": "second"
    }))
    .unwrap();

    exporter.export_object(&spec, first, None).unwrap().unwrap();
    exporter.export_object(&spec, second, None).unwrap().unwrap();

    let dir = temp.path().join("Plain");
    let entries: Vec<_> = fs::read_dir(&dir).unwrap().collect::<Result<_, _>>().unwrap();
    assert_eq!(entries.len(), 1, "colliding names must produce exactly one file");

    let written: Value =
        serde_json::from_str(&fs::read_to_string(dir.join("Test.json")).unwrap()).unwrap();
    assert_eq!(written.get("marker").unwrap(), "second", "last writer wins");
}

#[test]
fn test_object_without_display_name_is_dropped_without_error() {
    let temp = TempDir::new().unwrap();
    let exporter = Exporter::new(temp.path(), OutputFormat::Json);

    let object = ConfigObject::from_value(json!({ "id": "1" })).unwrap();
    let result = exporter.export_object(&plain_spec(), object, None).unwrap();

    assert!(result.is_none());
}

#[test]
fn test_nested_subdirectory_created_recursively() {
    let temp = TempDir::new().unwrap();
    let exporter = Exporter::new(temp.path(), OutputFormat::Yaml);
    let spec = windows_enrollment().spec;

    let object = ConfigObject::from_value(json!({
        "id": "w-1",
        "displayName": "Autopilot Default",
        "createdDateTime": "2024-01-01T00:00:00Z"
    }))
    .unwrap();

    let path = exporter.export_object(&spec, object, None).unwrap().unwrap();

    assert_eq!(
        path,
        temp.path()
            .join("Enrollment Profiles")
            .join("Windows")
            .join("Autopilot Default.yaml")
    );
    assert!(path.exists());
}

// =========================================================================
// Serialization round-trips
// =========================================================================

#[test]
fn test_json_round_trip_deep_equal() {
    let temp = TempDir::new().unwrap();
    let exporter = Exporter::new(temp.path(), OutputFormat::Json);

    let path = exporter.export_object(&plain_spec(), policy_a(), None).unwrap().unwrap();

    let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

    let mut expected = policy_a();
    expected.remove("id");
    assert_eq!(written, Value::Object(expected.as_map().clone()));
}

#[test]
fn test_json_uses_indent_width_10() {
    let temp = TempDir::new().unwrap();
    let exporter = Exporter::new(temp.path(), OutputFormat::Json);

    let path = exporter.export_object(&plain_spec(), policy_a(), None).unwrap().unwrap();
    let text = fs::read_to_string(&path).unwrap();

    assert!(
        text.lines().any(|l| l.starts_with("          \"") && !l.starts_with("           ")),
        "top-level keys must be indented by exactly 10 spaces:\n{}",
        text
    );
}

#[test]
fn test_yaml_preserves_key_insertion_order() {
    let temp = TempDir::new().unwrap();
    let exporter = Exporter::new(temp.path(), OutputFormat::Yaml);

    let object = ConfigObject::from_value(json!({
        "id": "1",
        "zebra": "z",
        "displayName": "Ordered",
        "alpha": "a",
        "midpoint": "m"
    }))
    .unwrap();

    let path = exporter.export_object(&plain_spec(), object, None).unwrap().unwrap();
    let text = fs::read_to_string(&path).unwrap();

    let pos = |key: &str| text.find(&format!("{}:", key)).unwrap_or_else(|| panic!("{} missing", key));
    assert!(pos("zebra") < pos("displayName"), "insertion order must be kept:\n{}", text);
    assert!(pos("displayName") < pos("alpha"), "insertion order must be kept:\n{}", text);
    assert!(pos("alpha") < pos("midpoint"), "insertion order must be kept:\n{}", text);
}

#[test]
fn test_yaml_uses_block_style() {
    let temp = TempDir::new().unwrap();
    let exporter = Exporter::new(temp.path(), OutputFormat::Yaml);

    let object = ConfigObject::from_value(json!({
        "id": "1",
        "displayName": "Blocky",
        "apps": [ { "bundleId": "com.example.app" } ]
    }))
    .unwrap();

    let path = exporter.export_object(&plain_spec(), object, None).unwrap().unwrap();
    let text = fs::read_to_string(&path).unwrap();

    assert!(!text.contains('{'), "flow style must not be used:\n{}", text);
    assert!(text.contains("- bundleId: com.example.app"), "sequences in block style:\n{}", text);
}
