use std::{env, path::PathBuf};

use super::schema::Settings;
use crate::playback::{MAX_RATE, MIN_RATE};

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `NCEPLAY__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("NCEPLAY")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        let rate = self.playback.default_rate;
        if !(MIN_RATE..=MAX_RATE).contains(&rate) {
            return Err(format!(
                "playback.default_rate must be between {MIN_RATE} and {MAX_RATE}, got {rate}"
            ));
        }
        let step = self.playback.rate_step;
        if step.is_nan() || step <= 0.0 {
            return Err("playback.rate_step must be > 0".to_string());
        }
        if !(1..=4).contains(&self.ui.initial_book) {
            return Err(format!(
                "ui.initial_book must be 1-4, got {}",
                self.ui.initial_book
            ));
        }
        if self.audio.tick_ms == 0 {
            return Err("audio.tick_ms must be >= 1".to_string());
        }
        if self.catalog.base_url.trim().is_empty() {
            return Err("catalog.base_url must not be empty".to_string());
        }
        Ok(())
    }

    /// Load and validate, falling back to defaults on any problem. The
    /// returned message, if any, explains why the defaults were used.
    pub fn load_or_default() -> (Self, Option<String>) {
        match Self::load() {
            Ok(s) => match s.validate() {
                Ok(()) => (s, None),
                Err(e) => (Self::default(), Some(format!("invalid configuration: {e}"))),
            },
            Err(e) => (Self::default(), Some(format!("cannot load configuration: {e}"))),
        }
    }
}

/// Resolve the config path from `NCEPLAY_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("NCEPLAY_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/nceplay/config.toml`
/// or `~/.config/nceplay/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config").map(|d| d.join("nceplay").join("config.toml"))
}

/// Default log file under `$XDG_STATE_HOME/nceplay/` or `~/.local/state/nceplay/`.
pub fn default_log_path() -> Option<PathBuf> {
    xdg_dir("XDG_STATE_HOME", ".local/state").map(|d| d.join("nceplay").join("nceplay.log"))
}

fn xdg_dir(var: &str, home_fallback: &str) -> Option<PathBuf> {
    if let Some(xdg) = env::var_os(var) {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(home_fallback))
    }
}
