use std::{env, path::PathBuf};

use super::schema::Settings;

const APP_DIR: &str = "tandem";

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `TANDEM__`), then an
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
            ::config::Environment::with_prefix("TANDEM")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.catalogs.primary.trim().is_empty() || self.catalogs.alternate.trim().is_empty() {
            return Err("catalogs.primary and catalogs.alternate must not be empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.playback.initial_volume) {
            return Err("playback.initial_volume must be within [0, 1]".to_string());
        }
        if !(self.playback.volume_step > 0.0 && self.playback.volume_step <= 1.0) {
            return Err("playback.volume_step must be within (0, 1]".to_string());
        }
        if self.audio.position_interval_ms == 0 {
            return Err("audio.position_interval_ms must be >= 1".to_string());
        }
        if let Some(o) = self.overrides.iter().find(|o| o.track_id.trim().is_empty()) {
            return Err(format!("override '{}' has an empty track_id", o.title));
        }
        Ok(())
    }
}

/// Resolve the config path from `TANDEM_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("TANDEM_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/tandem/config.toml`
/// or `~/.config/tandem/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_app_dir("XDG_CONFIG_HOME", ".config").map(|d| d.join("config.toml"))
}

/// `$XDG_CACHE_HOME/tandem` or `~/.cache/tandem`.
pub fn default_cache_dir() -> Option<PathBuf> {
    xdg_app_dir("XDG_CACHE_HOME", ".cache")
}

/// `$XDG_STATE_HOME/tandem` or `~/.local/state/tandem`.
pub fn default_state_dir() -> Option<PathBuf> {
    xdg_app_dir("XDG_STATE_HOME", ".local/state")
}

fn xdg_app_dir(xdg_var: &str, home_fallback: &str) -> Option<PathBuf> {
    let base = if let Some(xdg) = env::var_os(xdg_var) {
        Some(PathBuf::from(xdg))
    } else if let Some(home) = env::var_os("HOME") {
        Some(PathBuf::from(home).join(home_fallback))
    } else {
        None
    };

    base.map(|d| d.join(APP_DIR))
}
