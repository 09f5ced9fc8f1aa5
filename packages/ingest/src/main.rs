#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the Madrid street furniture loader.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use madrid_map_cli_utils::{IndicatifProgress, MultiProgress};
use madrid_map_filter::{Facet, FacetToggle};
use madrid_map_ingest::config::{ConfigError, parse_chunk_size, split_ids};
use madrid_map_ingest::report::{format_datasets, format_snapshot, format_summary};
use madrid_map_ingest::{LoaderConfig, Session, enabled_datasets};

#[derive(Parser)]
#[command(
    name = "madrid_map_ingest",
    about = "Load and explore Madrid street furniture datasets"
)]
struct Cli {
    /// Base URL the dataset resources are fetched from (overrides `MADRID_MAP_BASE_URL`)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Read resources from this directory instead of HTTP (overrides `MADRID_MAP_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Features committed per chunk (overrides `MADRID_MAP_CHUNK_SIZE`)
    #[arg(long, global = true, value_parser = parse_chunk_size)]
    chunk_size: Option<usize>,
    /// Comma-separated list of dataset IDs to load (overrides `MADRID_MAP_DATASETS`)
    #[arg(long, global = true)]
    datasets: Option<String>,
    /// District boundary `GeoJSON` resource (overrides `MADRID_MAP_BOUNDARIES`)
    #[arg(long, global = true)]
    boundaries: Option<String>,
    /// Boundary property holding the district name (overrides `MADRID_MAP_BOUNDARY_PROPERTY`)
    #[arg(long, global = true)]
    boundary_property: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the configured datasets
    Datasets,
    /// Load every dataset and print the statistics
    Load {
        /// Hide a facet value, e.g. `category=STREETLIGHT` or `district=Centro`.
        /// May be repeated.
        #[arg(long)]
        exclude: Vec<Facet>,
        /// Print the load summary and statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load every dataset and toggle facets interactively (default)
    Explore,
}

impl Cli {
    /// Environment-derived config with the command line flags applied on top.
    fn config(&self) -> Result<LoaderConfig, ConfigError> {
        let mut config = LoaderConfig::from_env()?;
        if let Some(url) = &self.base_url {
            config.base_url.clone_from(url);
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = Some(dir.clone());
        }
        if let Some(size) = self.chunk_size {
            config.chunk_size = size;
        }
        if let Some(ids) = &self.datasets {
            config.datasets = split_ids(ids);
        }
        if let Some(resource) = &self.boundaries {
            config.boundaries = Some(resource.clone());
        }
        if let Some(property) = &self.boundary_property {
            config.boundary_property.clone_from(property);
        }
        Ok(config)
    }
}

fn session(config: &LoaderConfig, multi: &MultiProgress) -> Session {
    Session::from_config(config)
        .with_progress(IndicatifProgress::rows_bar(multi, "Loading datasets"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = madrid_map_cli_utils::init_logger();
    let cli = Cli::parse();
    let config = cli.config()?;

    match cli.command.unwrap_or(Commands::Explore) {
        Commands::Datasets => {
            print!("{}", format_datasets(&enabled_datasets(&config.datasets)));
        }
        Commands::Load { exclude, json } => {
            let mut session = session(&config, &multi);
            session.load().await?;

            let toggles: Vec<FacetToggle> =
                exclude.into_iter().map(FacetToggle::deselect).collect();
            let known = session.apply_all(&toggles);
            if known < toggles.len() {
                log::warn!(
                    "{} excluded value(s) matched nothing that was loaded",
                    toggles.len() - known
                );
            }

            if json {
                let output = serde_json::json!({
                    "summary": session.summary(),
                    "statistics": session.snapshot(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                if let Some(summary) = session.summary() {
                    println!("{}", format_summary(summary));
                }
                print!("{}", format_snapshot(session.snapshot()));
            }
        }
        Commands::Explore => {
            let mut session = session(&config, &multi);
            session.load().await?;
            madrid_map_ingest::interactive::run(&mut session).await?;
        }
    }

    Ok(())
}
