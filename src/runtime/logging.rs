use std::fs;
use std::path::PathBuf;

use anyhow::{Context, anyhow};

use crate::config::{LogLevelSetting, LoggingSettings, default_state_dir};

const LOG_FILE: &str = "tandem.log";

/// Route `log` records to a file; the terminal belongs to the TUI.
///
/// Returns the log path, or `None` when logging is switched off.
pub fn setup_logging(settings: &LoggingSettings) -> anyhow::Result<Option<PathBuf>> {
    if settings.level == LogLevelSetting::Off {
        return Ok(None);
    }

    let log_path = match &settings.file {
        Some(p) => p.clone(),
        None => default_state_dir()
            .ok_or_else(|| anyhow!("no state directory for the log file"))?
            .join(LOG_FILE),
    };

    if let Some(dir) = log_path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    }

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(settings.level.into())
        .level_for("zbus", log::LevelFilter::Warn)
        .chain(fern::log_file(&log_path)?)
        .apply()
        .map_err(|e| anyhow!("failed to initialize logger: {e}"))?;

    Ok(Some(log_path))
}
