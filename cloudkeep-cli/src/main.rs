use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cloudkeep::{default_profiles, run_backup, OutputFormat, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "cloudkeep")]
#[command(about = "cloudkeep - back up tenant configuration to JSON or YAML")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export all configuration profiles to local files
    Backup {
        /// Output directory for the backup
        #[arg(short, long, default_value = "backup")]
        path: PathBuf,

        /// Output format: "json", anything else means YAML
        #[arg(short, long, default_value = "yaml")]
        output: String,

        /// Bearer token for the management API
        #[arg(short, long, env = "CLOUDKEEP_TOKEN", hide_env_values = true)]
        token: String,

        /// Management API base URL
        #[arg(long, default_value = cloudkeep::DEFAULT_API_BASE_URL)]
        api_url: String,

        /// Maximum sub-requests per batched assignment call
        #[arg(long, default_value_t = cloudkeep::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Backup {
            path,
            output,
            token,
            api_url,
            batch_size,
        } => {
            tracing::info!("Backing up tenant configuration -> {}", path.display());

            let config = RunConfig::new(&path, OutputFormat::from_arg(&output), token)
                .with_api_base_url(api_url)
                .with_batch_size(batch_size);

            let summary = run_backup(&config, &default_profiles()).await?;

            println!();
            println!(
                "Backup complete: {} exported, {} skipped -> {}",
                summary.exported,
                summary.skipped,
                path.display()
            );
            if !summary.failed_profiles.is_empty() {
                eprintln!("Failed profiles: {}", summary.failed_profiles.join(", "));
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
