//! Batched resolution of per-object assignment data.
//!
//! Assignments are per-object sub-resources. Instead of one round-trip per
//! object, the resolver packs the sub-requests into `$batch` calls,
//! `batch_size` at a time, and correlates the sub-responses back to their
//! objects by id echo.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::fetch::ConfigObject;
use crate::transport::{SubRequest, Transport};

/// Graph caps a single batch at 20 sub-requests.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Placeholder targets that carry no real scoping information.
const LICENSE_PLACEHOLDER_TARGETS: &[&str] = &[
    "#microsoft.graph.allLicensedUsersAssignmentTarget",
    "#microsoft.graph.allUnlicensedUsersAssignmentTarget",
];

/// Options for one resolution pass.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Resource path prepended to each object id.
    pub path_prefix: String,
    /// Sub-resource suffix appended after the id, e.g. `/assignments`.
    pub suffix: String,
    /// Maximum sub-requests per batched call.
    pub batch_size: usize,
    /// Field holding the type discriminator, when the caller filters types.
    pub discriminator_field: Option<String>,
    /// Discriminator values whose objects are skipped entirely.
    pub exclude_discriminators: Vec<String>,
    /// Drop all-licensed/all-unlicensed placeholder targets from results.
    pub drop_license_targets: bool,
}

impl ResolveOptions {
    pub fn new(path_prefix: impl Into<String>) -> Self {
        Self {
            path_prefix: path_prefix.into(),
            suffix: "/assignments".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            discriminator_field: None,
            exclude_discriminators: Vec::new(),
            drop_license_targets: false,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_excluded_discriminators(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.discriminator_field = Some(field.into());
        self.exclude_discriminators = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_drop_license_targets(mut self, drop: bool) -> Self {
        self.drop_license_targets = drop;
        self
    }

    fn is_excluded(&self, object: &ConfigObject) -> bool {
        match &self.discriminator_field {
            Some(field) => object
                .get_str(field)
                .is_some_and(|d| self.exclude_discriminators.iter().any(|e| e == d)),
            None => false,
        }
    }
}

/// Object id -> resolved assignment records, in sub-response order.
///
/// Objects with zero assignments are absent rather than mapped to an empty
/// vec: presence implies non-empty. Built once per run, read-only after.
#[derive(Debug, Default)]
pub struct AssignmentMap(HashMap<String, Vec<Value>>);

impl AssignmentMap {
    pub fn get(&self, id: &str) -> Option<&[Value]> {
        self.0.get(id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolve assignments for every non-excluded object in `objects`.
///
/// A sub-response with a non-success status degrades that one object to "no
/// assignments resolved" (logged); a failed batch call fails the whole pass.
pub async fn resolve_assignments(
    transport: &dyn Transport,
    objects: &[ConfigObject],
    options: &ResolveOptions,
) -> Result<AssignmentMap> {
    let requests: Vec<SubRequest> = objects
        .iter()
        .filter(|o| !options.is_excluded(o))
        .filter_map(|o| o.id())
        .map(|id| {
            SubRequest::get(
                id,
                format!("/{}{}{}", options.path_prefix.trim_start_matches('/'), id, options.suffix),
            )
        })
        .collect();

    let mut resolved = HashMap::new();

    for chunk in requests.chunks(options.batch_size) {
        let responses = transport.batch(chunk).await?;

        for response in responses {
            if !response.is_success() {
                warn!(
                    object_id = %response.id,
                    status = response.status,
                    "assignment lookup failed, exporting object without assignments"
                );
                continue;
            }

            let Some(entries) = response.body.get("value").and_then(Value::as_array) else {
                warn!(
                    object_id = %response.id,
                    "assignment response missing `value` array, exporting object without assignments"
                );
                continue;
            };

            let assignments: Vec<Value> = entries
                .iter()
                .filter(|entry| !(options.drop_license_targets && is_license_placeholder(entry)))
                .cloned()
                .collect();

            if !assignments.is_empty() {
                resolved.insert(response.id, assignments);
            }
        }
    }

    debug!(
        objects = objects.len(),
        resolved = resolved.len(),
        "assignment resolution complete"
    );

    Ok(AssignmentMap(resolved))
}

fn is_license_placeholder(assignment: &Value) -> bool {
    assignment
        .pointer("/target/@odata.type")
        .and_then(Value::as_str)
        .is_some_and(|t| LICENSE_PLACEHOLDER_TARGETS.contains(&t))
}
