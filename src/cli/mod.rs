use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ConfigLoader;
use crate::notify::NotificationService;

pub mod commands;

use self::commands::ConfigArgs;

#[derive(Parser, Debug)]
#[command(
    name = "fleeting",
    version,
    about = "A deliberately unhelpful terminal scratchpad that never saves anything"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over FLEETING_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui,
    /// Print the effective configuration and where it lives
    Config(ConfigArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("FLEETING_CONFIG", path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    init_tracing(&cli.log_level, &paths.log_file())
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = Arc::new(loader.load_or_init()?);
    tracing::info!(config = %paths.config_file.display(), "configuration loaded");

    let command = cli.command.unwrap_or(Commands::Tui);
    match command {
        Commands::Tui => {
            let notifier = NotificationService::new(config.timings.notification_visible());
            let result = commands::run_tui(config, notifier.clone());
            notifier.shutdown();
            result
        }
        Commands::Config(args) => commands::show_config(&paths, &config, args),
    }
}

/// Logs go to a file; the terminal belongs to the TUI.
fn init_tracing(level: &str, log_file: &Path) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .with_context(|| format!("opening log file {}", log_file.display()))?;
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
        Ok(())
    })
    .map(|_| ())
}
