//! Run orchestration: fetch, resolve assignments, export - per profile.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{error, info};

use crate::assignments::{resolve_assignments, AssignmentMap, DEFAULT_BATCH_SIZE};
use crate::error::{Error, Result};
use crate::export::{Exporter, OutputFormat};
use crate::fetch::fetch_objects;
use crate::profiles::ExportProfile;
use crate::progress::ExportProgress;
use crate::transport::{GraphTransport, Transport};

pub const DEFAULT_API_BASE_URL: &str = "https://graph.microsoft.com/beta";

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Everything a backup run needs from its caller.
///
/// Token acquisition, CLI parsing and logging setup are the caller's
/// business; the core only wants an already-valid bearer token.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Base directory for exported files.
    pub output_dir: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
    /// Opaque bearer token, shared read-only across the run.
    pub token: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl RunConfig {
    pub fn new(output_dir: impl AsRef<Path>, format: OutputFormat, token: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            format,
            token: token.into(),
            api_base_url: default_api_base_url(),
            batch_size: default_batch_size(),
        }
    }

    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Outcome of a backup run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub exported: u64,
    pub skipped: u64,
    /// Profiles that failed and were abandoned while siblings continued.
    pub failed_profiles: Vec<String>,
}

/// Export every profile against the real Graph transport.
pub async fn run_backup(config: &RunConfig, profiles: &[ExportProfile]) -> Result<RunSummary> {
    let transport = GraphTransport::new(&config.api_base_url, &config.token)?;
    run_backup_with(&transport, config, profiles).await
}

/// Export every profile through the given transport.
///
/// A failing profile is logged and recorded in the summary; remaining
/// profiles still run. Authentication and filesystem errors abort the whole
/// run - the token is shared by every profile, and a backup with write
/// failures cannot be trusted.
pub async fn run_backup_with(
    transport: &dyn Transport,
    config: &RunConfig,
    profiles: &[ExportProfile],
) -> Result<RunSummary> {
    let exporter = Exporter::new(&config.output_dir, config.format);
    let mut summary = RunSummary::default();

    for profile in profiles {
        match export_profile(transport, &exporter, config, profile).await {
            Ok((exported, skipped)) => {
                summary.exported += exported;
                summary.skipped += skipped;
            }
            Err(e @ (Error::Io(_) | Error::Auth { .. })) => return Err(e),
            Err(e) => {
                error!("Export of {} failed: {}", profile.name, e);
                summary.failed_profiles.push(profile.name.to_string());
            }
        }
    }

    Ok(summary)
}

async fn export_profile(
    transport: &dyn Transport,
    exporter: &Exporter,
    config: &RunConfig,
    profile: &ExportProfile,
) -> Result<(u64, u64)> {
    let objects = fetch_objects(transport, profile.endpoint).await?;
    info!("Fetched {} {} objects", objects.len(), profile.name);

    let assignments = match &profile.assignments {
        Some(source) => {
            let options = source.options(&profile.spec, config.batch_size);
            resolve_assignments(transport, &objects, &options).await?
        }
        None => AssignmentMap::default(),
    };

    let progress = ExportProgress::new(objects.len() as u64);

    for object in objects {
        let id = object.id().map(str::to_string);
        let display_name = object.display_name().unwrap_or("<unnamed>").to_string();
        let resolved = id.as_deref().and_then(|id| assignments.get(id));

        match exporter.export_object(&profile.spec, object, resolved) {
            Ok(Some(_path)) => {
                info!("Backing up {}: {}", profile.name, display_name);
                progress.inc(1);
            }
            Ok(None) => progress.inc_skipped(1),
            Err(e) => {
                progress.inc_failed(1);
                progress.finish();
                return Err(e);
            }
        }
    }

    progress.finish();
    Ok((progress.exported(), progress.skipped()))
}
