use anyhow::Result;
use clap::Parser;
use dishscout_common::observability::{LogConfig, init_logging};
use dishscout_config::{DishscoutConfig, DishscoutConfigLoader, SettingsError};
use dishscout_search::{Budget, Cuisine};
use dishscout_tui::Form;
use launch::Launch;
use std::path::{Path, PathBuf};
mod launch;

const DEFAULT_CONFIG_FILE: &str = "dishscout.yaml";

/// Find well-reviewed restaurants by cuisine, budget, and location.
#[derive(Parser, Debug)]
#[command(name = "dishscout", version, about)]
struct Args {
    /// YAML configuration file (default: ./dishscout.yaml when present)
    #[arg(long, value_name = "PATH", env = "DISHSCOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the rolling log file
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Cuisine selected at start, e.g. "Japanese"
    #[arg(long, value_name = "NAME")]
    cuisine: Option<Cuisine>,

    /// Budget selected at start: Any, $, $$, $$$ or $$$$
    #[arg(long, value_name = "TIER")]
    budget: Option<Budget>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1) Load config (env wins). A broken file disables search instead of
    //    aborting, so the reason can be shown in the UI.
    let (cfg, config_problem) = match load_config(args.config.as_deref()) {
        Ok(cfg) => (cfg, None),
        Err(e) => (DishscoutConfig::default(), Some(e.to_string())),
    };

    // 2) Logging: CLI dir, then config, then DISHSCOUT_LOG_DIR.
    let log_path = init_logging(LogConfig {
        log_dir: args.log_dir.or_else(|| cfg.logging.dir.clone()),
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
        ..LogConfig::default()
    })?;
    tracing::info!(log = %log_path.display(), llm = ?cfg.llm, search = ?cfg.search, "dishscout starting");
    if let Some(problem) = &config_problem {
        tracing::error!(%problem, "configuration could not be loaded");
    }

    let mut launch = Launch::new();
    launch.wire(&cfg, config_problem, Form::preset(args.cuisine, args.budget))?;
    launch.run().await
}

fn load_config(path: Option<&Path>) -> Result<DishscoutConfig, SettingsError> {
    let loader = DishscoutConfigLoader::new();
    let loader = match path {
        Some(path) => loader.with_file(path),
        None => loader.with_optional_file(DEFAULT_CONFIG_FILE),
    };
    loader.load()
}
