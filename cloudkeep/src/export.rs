//! Generic normalization and export of configuration objects.
//!
//! Every object type goes through the same path, driven by a declarative
//! [`ExportSpec`]: skip excluded discriminators, attach resolved
//! assignments, strip server-assigned fields, derive and sanitize a
//! filename, serialize.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::fetch::ConfigObject;

/// Output serialization format for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl OutputFormat {
    /// `"json"` selects JSON; anything else means YAML.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "json" {
            Self::Json
        } else {
            Self::Yaml
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

/// Declarative export configuration for one object type.
pub struct ExportSpec {
    /// Subdirectory under the run's base directory, e.g. `App Protection`.
    pub subdirectory: &'static str,
    /// Field holding the type discriminator, if this type has excluded subtypes.
    pub discriminator_field: Option<&'static str>,
    /// Discriminator values that produce no exported file.
    pub excluded_discriminators: &'static [&'static str],
    /// Server-assigned fields removed before serialization.
    pub stripped_fields: &'static [&'static str],
    /// Derives the (unsanitized) output filename, without extension.
    pub name: fn(&ConfigObject) -> Option<String>,
}

impl ExportSpec {
    fn is_excluded(&self, object: &ConfigObject) -> bool {
        match self.discriminator_field {
            Some(field) => object
                .get_str(field)
                .is_some_and(|d| self.excluded_discriminators.contains(&d)),
            None => false,
        }
    }
}

/// Writes normalized configuration objects under a base directory.
pub struct Exporter {
    base_dir: PathBuf,
    format: OutputFormat,
}

impl Exporter {
    pub fn new(base_dir: impl AsRef<Path>, format: OutputFormat) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            format,
        }
    }

    /// Normalize and write one object; returns the written path, or `None`
    /// when the object was skipped.
    ///
    /// Two objects deriving the same sanitized name within a run overwrite
    /// each other; the last write wins.
    pub fn export_object(
        &self,
        spec: &ExportSpec,
        mut object: ConfigObject,
        assignments: Option<&[Value]>,
    ) -> Result<Option<PathBuf>> {
        if spec.is_excluded(&object) {
            debug!(subdirectory = spec.subdirectory, "skipping excluded subtype");
            return Ok(None);
        }

        if let Some(assignments) = assignments {
            if !assignments.is_empty() {
                object.insert("assignments", Value::Array(assignments.to_vec()));
            }
        }

        for field in spec.stripped_fields {
            object.remove(field);
        }

        let Some(raw_name) = (spec.name)(&object) else {
            warn!(
                subdirectory = spec.subdirectory,
                "cannot derive a filename (missing displayName?), object not exported"
            );
            return Ok(None);
        };
        let file_name = sanitize_filename(&raw_name);

        let dir = self.base_dir.join(spec.subdirectory);
        fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{}.{}", file_name, self.format.extension()));
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);

        match self.format {
            OutputFormat::Json => {
                // Width-10 indentation, matching the established backup layout.
                let formatter = serde_json::ser::PrettyFormatter::with_indent(b"          ");
                let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
                object.as_map().serialize(&mut serializer)?;
            }
            OutputFormat::Yaml => {
                serde_yaml::to_writer(&mut writer, object.as_map())?;
            }
        }
        writer.flush()?;

        Ok(Some(path))
    }
}

/// Strip characters that are invalid in file names and trim trailing
/// whitespace.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect::<String>()
        .trim_end()
        .to_string()
}
