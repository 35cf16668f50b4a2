use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/tandem/config.toml` or `~/.config/tandem/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `TANDEM__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub catalogs: CatalogSettings,
    pub network: NetworkSettings,
    pub playback: PlaybackSettings,
    pub audio: AudioSettings,
    pub controls: ControlsSettings,
    pub ui: UiSettings,
    pub profile: ProfileSettings,
    pub logging: LoggingSettings,
    /// Content overrides keyed by track id. Setting this list in the config
    /// file replaces the built-in entries.
    pub overrides: Vec<OverrideSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalogs: CatalogSettings::default(),
            network: NetworkSettings::default(),
            playback: PlaybackSettings::default(),
            audio: AudioSettings::default(),
            controls: ControlsSettings::default(),
            ui: UiSettings::default(),
            profile: ProfileSettings::default(),
            logging: LoggingSettings::default(),
            overrides: default_overrides(),
        }
    }
}

const CATALOG_BASE: &str =
    "https://gist.githubusercontent.com/RimunAce/68b608362e6ec1efd00a65057d1e172c/raw";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Locator of the primary catalog: an http(s) URL or a local JSON file.
    pub primary: String,
    /// Locator of the alternate catalog.
    pub alternate: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            primary: format!("{CATALOG_BASE}/music.json"),
            alternate: format!("{CATALOG_BASE}/music-miku.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Connect/read timeout for every HTTP request. Unset means no timeout.
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            user_agent: concat!("tandem/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Volume at startup, in `[0, 1]`. Not persisted.
    pub initial_volume: f32,
    /// Volume change per `+` / `-` press.
    pub volume_step: f32,
    /// Delay between rebinding to the new catalog and resuming playback
    /// after a mode switch (milliseconds). A readiness report from the
    /// output ends the wait early.
    pub switch_settle_ms: u64,
    /// Delay before restoring position after toggling an override (milliseconds).
    pub override_settle_ms: u64,
    /// Whether choosing a track from the list starts playing it.
    pub play_on_select: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            initial_volume: 1.0,
            volume_step: 0.05,
            switch_settle_ms: 100,
            override_settle_ms: 50,
            play_on_select: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
    /// How often the output reports the elapsed position (milliseconds).
    pub position_interval_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            quit_fade_out_ms: 500,
            position_interval_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self { scrub_seconds: 5 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Whether the list cursor starts in "follow playback" mode.
    pub follow_playback: bool,

    /// The text rendered inside the top header box.
    pub header_text: String,

    /// Which track fields to show in the now-playing line, and in what order.
    ///
    /// Example: ["author", "title"]
    pub now_playing_track_fields: Vec<TrackDisplayField>,

    /// Separator used to join `now_playing_track_fields`.
    pub now_playing_track_separator: String,

    /// Which time fields to show next to the progress bar, and in what order.
    ///
    /// Example: ["elapsed", "total", "remaining"]
    pub now_playing_time_fields: Vec<TimeField>,

    /// Separator used to join `now_playing_time_fields`.
    pub now_playing_time_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            follow_playback: true,
            header_text: " ~ now playing ~ ".to_string(),
            now_playing_track_fields: vec![TrackDisplayField::Title, TrackDisplayField::Author],
            now_playing_track_separator: " - ".to_string(),
            now_playing_time_fields: vec![TimeField::Elapsed, TimeField::Total],
            now_playing_time_separator: " / ".to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeField {
    Elapsed,
    Total,
    Remaining,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    Title,
    #[serde(alias = "artist")]
    Author,
    Id,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    /// GraphQL endpoint queried by the profile viewer.
    pub endpoint: String,
    pub user_name: String,
    /// Freshness window of the cached profile (seconds).
    pub cache_ttl_secs: u64,
    /// Cache file location. Defaults to `$XDG_CACHE_HOME/tandem/anilist_data_cache.json`.
    pub cache_path: Option<PathBuf>,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://graphql.anilist.co".to_string(),
            user_name: "Reuzin".to_string(),
            cache_ttl_secs: 5 * 60,
            cache_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: LogLevelSetting,
    /// Log file location. Defaults to `$XDG_STATE_HOME/tandem/tandem.log`.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevelSetting::Info,
            file: None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogLevelSetting {
    Off,
    Error,
    #[serde(alias = "warning")]
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelSetting> for log::LevelFilter {
    fn from(level: LogLevelSetting) -> Self {
        match level {
            LogLevelSetting::Off => Self::Off,
            LogLevelSetting::Error => Self::Error,
            LogLevelSetting::Warn => Self::Warn,
            LogLevelSetting::Info => Self::Info,
            LogLevelSetting::Debug => Self::Debug,
            LogLevelSetting::Trace => Self::Trace,
        }
    }
}

/// Substitute content shown and played for `track_id` while its override is active.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OverrideSettings {
    pub track_id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub author_url: String,
    #[serde(default)]
    pub thumbnail: String,
    pub audio: String,
}

fn default_overrides() -> Vec<OverrideSettings> {
    const STORAGE: &str = "https://cdn.apis.rocks/music-storage";
    const NAME: &str = "Minecraft%E3%81%AE%E5%8A%B9%E6%9E%9C%E9%9F%B3%E3%81%A7%E3%82%B5%E3%82%A4%E3%82%A8%E3%83%B3%E3%82%B9";

    vec![OverrideSettings {
        track_id: "science".to_string(),
        title: "Science but Minecraft (Minecraftの効果音でサイエンス)".to_string(),
        author: "gmailアカウント".to_string(),
        author_url: "https://www.youtube.com/@gmail3885".to_string(),
        thumbnail: format!("{STORAGE}/{NAME}.png"),
        audio: format!("{STORAGE}/{NAME}.mp3"),
    }]
}
