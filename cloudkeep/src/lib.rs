//! cloudkeep: export tenant configuration objects to local JSON/YAML files
//!
//! Pipeline per object type:
//! 1. Fetch the listing endpoint
//! 2. Resolve per-object assignments in batched calls
//! 3. Normalize (strip server fields, attach assignments) and write one
//!    file per object

pub mod assignments;
pub mod error;
pub mod export;
pub mod fetch;
pub mod profiles;
pub mod progress;
pub mod run;
pub mod transport;

pub use assignments::{resolve_assignments, AssignmentMap, ResolveOptions, DEFAULT_BATCH_SIZE};
pub use error::{Error, Result};
pub use export::{sanitize_filename, ExportSpec, Exporter, OutputFormat};
pub use fetch::{fetch_objects, ConfigObject};
pub use profiles::{default_profiles, ExportProfile};
pub use progress::ExportProgress;
pub use run::{run_backup, run_backup_with, RunConfig, RunSummary, DEFAULT_API_BASE_URL};
pub use transport::{GraphTransport, SubRequest, SubResponse, Transport};
