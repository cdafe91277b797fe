use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use scout_common::observability::{init_logging, LogConfig, LogFormat};
use scout_config::{ScoutConfig, ScoutConfigLoader, DEFAULT_CONFIG_FILE};
use std::path::{Path, PathBuf};

mod flows;

/// Commerce scout: enrich a commercial registry or find sellers on Instagram.
#[derive(Debug, Parser)]
#[command(name = "scout", version)]
struct Cli {
    /// Configuration file; `scout.yaml` in the working directory is used when present.
    #[arg(long, global = true, env = "SCOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Log encoding for the file and stderr sinks.
    #[arg(long, global = true, default_value = "text")]
    log_format: LogFormat,

    /// Raise verbosity (-v debug, -vv trace) when RUST_LOG is unset.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify the businesses of a registry export.
    Registry(RegistryArgs),
    /// List Instagram authors whose top posts match the search terms.
    Discover(DiscoverArgs),
}

#[derive(Debug, Args)]
pub struct RegistryArgs {
    /// Registry export to read instead of `registry.input_path`.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Process at most N rows.
    #[arg(long, value_name = "N", conflicts_with = "all")]
    pub limit: Option<usize>,

    /// Process every row.
    #[arg(long)]
    pub all: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl RegistryArgs {
    /// Row cap after applying the CLI over the configured one.
    pub fn row_limit(&self, configured: Option<usize>) -> Option<usize> {
        if self.all {
            None
        } else {
            self.limit.or(configured)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    /// Hashtag whose top posts are scanned instead of `instagram.base_hashtag`.
    #[arg(long)]
    pub hashtag: Option<String>,

    /// Number of top posts to scan.
    #[arg(long, value_name = "N")]
    pub max_posts: Option<usize>,
}

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn load_config(path: Option<&Path>) -> Result<ScoutConfig> {
    let loader = match path {
        Some(path) => ScoutConfigLoader::new().with_file(path),
        None => ScoutConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    loader.load().context("loading configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_path = init_logging(LogConfig {
        format: cli.log_format,
        default_filter: default_filter(cli.verbose),
        ..LogConfig::default()
    })?;
    tracing::debug!(path = %log_path.display(), "logging to file");

    let cfg = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Registry(args) => flows::run_registry(&cfg, &args).await,
        Command::Discover(args) => flows::run_discover(&cfg, &args).await,
    }
}
