use anyhow::{bail, ensure, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use anonsend::batch::collect_dir;
use anonsend::config::Settings;
use anonsend::session::{self, save_artifact, Credentials};

#[derive(Parser)]
#[command(name = "anonsend")]
#[command(about = "Upload a folder to the anonymization service and fetch the result")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload every file under a folder and save the returned archive
    Send {
        #[arg(help = "Folder of files to anonymize")]
        folder: PathBuf,

        #[arg(long, help = "WebSocket endpoint, e.g. ws://host:8080/upload")]
        url: Option<String>,

        #[arg(long)]
        password: String,

        #[arg(long, help = "Defaults to --password when omitted")]
        confirm_password: Option<String>,

        #[arg(long, help = "Max files per uploaded batch")]
        batch_limit: Option<usize>,

        #[arg(long, help = "Directory for the returned archive")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("anonsend=info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load()?;

    match cli.command {
        Commands::Send {
            folder,
            url,
            password,
            confirm_password,
            batch_limit,
            output,
        } => {
            if !folder.is_dir() {
                bail!("Not a directory: {}", folder.display());
            }

            let confirmation = confirm_password.unwrap_or_else(|| password.clone());
            let credentials = Credentials::new(password, confirmation);
            ensure!(credentials.matches(), "Passwords do not match");

            let url = url.unwrap_or(settings.server_url);
            let batch_limit = batch_limit.unwrap_or(settings.batch_limit);
            ensure!(batch_limit >= 1, "Batch limit must be at least 1");
            let output_dir = output.unwrap_or(settings.output_dir);

            let files = collect_dir(&folder)
                .with_context(|| format!("Failed to collect {}", folder.display()))?;
            ensure!(!files.is_empty(), "No files found in {}", folder.display());

            println!(
                "Uploading {} file(s) from {}",
                files.len(),
                folder.display()
            );

            let outcome = session::upload(&url, credentials, files, batch_limit).await?;
            let path = save_artifact(&output_dir, &outcome.artifact).await?;

            println!(
                "Received {} ({} bytes) after {} batch(es)",
                path.display(),
                outcome.artifact.len(),
                outcome.batches_sent
            );
            Ok(())
        }
    }
}
