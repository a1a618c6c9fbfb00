mod report;
mod server;
mod settings;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use orderscope_core::{build_dashboard, load_dataset, DashboardConfig, StatusSelection};
use tracing::info;
use tracing_subscriber::EnvFilter;

use settings::Settings;

#[derive(Parser, Debug)]
#[command(author, version, about = "Olist order delivery dashboard", long_about = None)]
struct Cli {
    /// TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the orders, reviews and order items CSV files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the dashboard views over HTTP
    Serve(ServeArgs),
    /// Run the pipeline once and print every view
    Report(ReportArgs),
    /// List the distinct order statuses
    Statuses,
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Address to listen on, e.g. 127.0.0.1:8501
    #[arg(long)]
    bind: Option<String>,
}

#[derive(Args, Debug, Default)]
struct ReportArgs {
    /// Keep only these statuses (repeatable); all statuses when omitted
    #[arg(long = "status")]
    statuses: Vec<String>,
    /// Deselect every status
    #[arg(long, conflicts_with = "statuses")]
    no_status: bool,
    /// Include the filtered order rows
    #[arg(long)]
    show_raw: bool,
}

impl ReportArgs {
    fn config(&self) -> DashboardConfig {
        let selected_statuses = if self.no_status {
            StatusSelection::none()
        } else if self.statuses.is_empty() {
            StatusSelection::All
        } else {
            StatusSelection::only(self.statuses.iter().cloned())
        };
        DashboardConfig {
            selected_statuses,
            show_raw: self.show_raw,
        }
    }
}

/// Loads `.env` (or `env_file`) before `RUST_LOG` is read, so a filter set there applies.
fn env_filter(env_file: Option<&Path>) -> EnvFilter {
    let _ = match env_file {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };
    EnvFilter::from_default_env()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(None))
        .json()
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }

    match cli.command {
        Command::Serve(args) => {
            if let Some(bind) = args.bind {
                settings.bind = bind;
            }
            info!(data_dir = %settings.data_dir.display(), "starting dashboard server");
            server::serve(&settings).await
        }
        Command::Report(args) => {
            let dataset = load_dataset(&settings.dataset_paths())
                .context("failed to load the order dataset")?;
            let view = build_dashboard(&dataset, &args.config(), &settings.dashboard)?;
            println!("{}", report::render(&view));
            Ok(())
        }
        Command::Statuses => {
            let dataset = load_dataset(&settings.dataset_paths())
                .context("failed to load the order dataset")?;
            for status in dataset.distinct_statuses()? {
                println!("{status}");
            }
            Ok(())
        }
    }
}
