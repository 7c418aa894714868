use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::json;
use strum::IntoEnumIterator;

use crate::app::App;
use crate::config::themes::BackgroundToken;
use crate::config::{AppConfig, ConfigPaths};
use crate::notify::NotificationService;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Emit JSON instead of annotated TOML
    #[arg(long)]
    pub json: bool,
}

pub fn run_tui(config: Arc<AppConfig>, notifier: NotificationService) -> Result<()> {
    if !atty::is(atty::Stream::Stdout) {
        bail!("fleeting needs an interactive terminal; stdout is not a tty");
    }
    let mut app = App::new(config, notifier);
    if let Err(err) = app.run() {
        tracing::error!(?err, "terminal session failed");
        return Err(err);
    }
    tracing::info!(notes_discarded = app.state().len(), "session ended");
    Ok(())
}

pub fn show_config(paths: &ConfigPaths, config: &AppConfig, args: ConfigArgs) -> Result<()> {
    let output = render_config(paths, config, args.json)?;
    print!("{output}");
    Ok(())
}

fn render_config(paths: &ConfigPaths, config: &AppConfig, as_json: bool) -> Result<String> {
    if as_json {
        let value = json!({
            "paths": {
                "config_file": paths.config_file.display().to_string(),
                "state_dir": paths.state_dir.display().to_string(),
                "log_file": paths.log_file().display().to_string(),
            },
            "config": config,
        });
        let mut out = serde_json::to_string_pretty(&value).context("serializing config as json")?;
        out.push('\n');
        return Ok(out);
    }

    let mut out = String::new();
    let _ = writeln!(&mut out, "# config file: {}", paths.config_file.display());
    let _ = writeln!(&mut out, "# log file:    {}", paths.log_file().display());
    let known: Vec<String> = BackgroundToken::iter().map(|token| token.to_string()).collect();
    let _ = writeln!(&mut out, "# backgrounds: {}", known.join(", "));
    out.push('\n');
    out.push_str(&toml::to_string_pretty(config).context("serializing config as toml")?);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    type TestResult<T = ()> = Result<T>;

    #[test]
    fn toml_output_lists_paths_and_settings() -> TestResult {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted_at(temp.path());
        let output = render_config(&paths, &AppConfig::default(), false)?;
        assert!(output.contains("config.toml"));
        assert!(output.contains("fleeting.log"));
        assert!(output.contains("hot-pink"));
        assert!(output.contains("idle_clear_ms = 5000"));
        Ok(())
    }

    #[test]
    fn json_output_round_trips_through_serde() -> TestResult {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted_at(temp.path());
        let output = render_config(&paths, &AppConfig::default(), true)?;
        let value: serde_json::Value = serde_json::from_str(&output)?;
        assert_eq!(value["config"]["preview_chars"], 20);
        assert_eq!(value["config"]["timings"]["notification_visible_ms"], 2500);
        assert!(value["paths"]["log_file"]
            .as_str()
            .is_some_and(|path| path.ends_with("fleeting.log")));
        Ok(())
    }
}
