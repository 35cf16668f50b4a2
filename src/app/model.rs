//! Application model types: `App`, `PlaybackState` and `ProfilePanel`.

use crate::profile::ProfileData;

/// The playback state as shown to the user and to MPRIS.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    /// Nothing bound reads as stopped; otherwise the session's intent decides.
    pub fn from_session(has_track: bool, playing: bool) -> Self {
        match (has_track, playing) {
            (false, _) => Self::Stopped,
            (true, true) => Self::Playing,
            (true, false) => Self::Paused,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::Paused => "paused",
        }
    }
}

/// Content of the profile popup.
#[derive(Debug, Clone, Default)]
pub enum ProfilePanel {
    #[default]
    NotLoaded,
    Loading,
    Loaded(Box<ProfileData>),
    Failed(String),
}

/// The main application model.
#[derive(Debug, Default)]
pub struct App {
    /// Highlighted row of the track list (not necessarily the current track).
    pub cursor: usize,
    /// Move the cursor onto the current track whenever it changes.
    pub follow_playback: bool,
    pub details_window: bool,
    pub profile_window: bool,
    pub profile: ProfilePanel,
    /// One-line message shown in the footer until replaced.
    pub status: Option<String>,
}

impl App {
    pub fn new(follow_playback: bool) -> Self {
        Self {
            follow_playback,
            ..Self::default()
        }
    }

    pub fn toggle_details_window(&mut self) {
        self.details_window = !self.details_window;
    }

    /// Toggle the profile popup. Returns true when it was opened and nothing
    /// has been loaded yet, i.e. the caller should start a load.
    pub fn toggle_profile_window(&mut self) -> bool {
        self.profile_window = !self.profile_window;
        self.profile_window && matches!(self.profile, ProfilePanel::NotLoaded)
    }

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// Move the cursor down, wrapping to the top.
    pub fn next(&mut self, len: usize) {
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = (self.cursor + 1) % len;
    }

    /// Move the cursor up, wrapping to the bottom.
    pub fn prev(&mut self, len: usize) {
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = if self.cursor == 0 { len - 1 } else { self.cursor - 1 };
    }

    pub fn first(&mut self) {
        self.cursor = 0;
    }

    pub fn last(&mut self, len: usize) {
        self.cursor = len.saturating_sub(1);
    }

    /// Keep the cursor inside a list of `len` rows.
    pub fn clamp_cursor(&mut self, len: usize) {
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }

    /// Follow the current track if following is enabled.
    pub fn follow(&mut self, current: usize) {
        if self.follow_playback {
            self.cursor = current;
        }
    }
}
