use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::config::themes::{BackgroundPalette, BackgroundToken};

pub mod themes;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "FleetingNotes";
const APP_NAME: &str = "fleeting";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load();
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load();
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var("FLEETING_CONFIG").ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let state_dir = project_dirs
            .state_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| project_dirs.data_local_dir().join("state"));
        let log_dir = state_dir.join("logs");

        Ok(Self {
            config_dir,
            config_file,
            state_dir,
            log_dir,
        })
    }

    /// Lays every directory out under `root`; used by tests and portable runs.
    pub fn rooted_at(root: &Path) -> Self {
        let config_dir = root.join("config");
        let state_dir = root.join("state");
        Self {
            config_file: config_dir.join("config.toml"),
            config_dir,
            log_dir: state_dir.join("logs"),
            state_dir,
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.state_dir, &self.log_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("fleeting.log")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub timings: TimingConfig,
    pub palette: Vec<BackgroundToken>,
    pub preview_chars: usize,
    pub audible_cues: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timings: TimingConfig::default(),
            palette: BackgroundPalette::default().all().copied().collect(),
            preview_chars: 20,
            audible_cues: true,
        }
    }
}

impl AppConfig {
    fn post_load(&mut self) {
        if self.palette.is_empty() {
            tracing::warn!("empty background palette in config, using the built-in one");
            self.palette = BackgroundPalette::default().all().copied().collect();
        }
        self.timings.clamp();
    }

    pub fn background_palette(&self) -> BackgroundPalette {
        BackgroundPalette::new(self.palette.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// How long each notification stays on screen before the oldest is evicted.
    pub notification_visible_ms: u64,
    /// Idle time after the last keystroke before the input is wiped.
    pub idle_clear_ms: u64,
    pub progress_interval_ms: u64,
    pub progress_step: u16,
    pub tick_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            notification_visible_ms: 2500,
            idle_clear_ms: 5000,
            progress_interval_ms: 150,
            progress_step: 10,
            tick_ms: 100,
        }
    }
}

impl TimingConfig {
    fn clamp(&mut self) {
        if self.progress_step == 0 {
            tracing::warn!("progress_step of 0 would never finish, using 1");
            self.progress_step = 1;
        }
        if self.tick_ms == 0 {
            self.tick_ms = 1;
        }
    }

    pub fn notification_visible(&self) -> Duration {
        Duration::from_millis(self.notification_visible_ms)
    }

    pub fn idle_clear(&self) -> Duration {
        Duration::from_millis(self.idle_clear_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}
