use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("track index {index} is out of range for a catalog of {len} tracks")]
    OutOfRange { index: usize, len: usize },
}

/// Mutable runtime state of playback within the active catalog.
///
/// Every operation takes the active catalog's length so that `index`
/// always stays valid for it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub index: usize,
    /// User/system intent; may briefly disagree with the output while it rebinds.
    pub playing: bool,
    pub position: Duration,
    /// Known only once the output has reported it for the current source.
    pub duration: Option<Duration>,
    pub volume: f32,
    pub override_active: bool,
}

impl PlaybackSession {
    pub fn new(volume: f32) -> Self {
        Self {
            index: 0,
            playing: false,
            position: Duration::ZERO,
            duration: None,
            volume: clamp_volume(volume),
            override_active: false,
        }
    }

    /// Explicit selection. Never auto-plays; selecting the current index
    /// still rewinds and clears the override.
    pub fn select_track(&mut self, index: usize, len: usize) -> Result<(), SelectionError> {
        if index >= len {
            return Err(SelectionError::OutOfRange { index, len });
        }
        self.move_to(index);
        self.playing = false;
        Ok(())
    }

    /// Manual advance: stops at the last track and leaves playback paused.
    pub fn next(&mut self, len: usize) -> bool {
        if self.index + 1 >= len {
            return false;
        }
        self.move_to(self.index + 1);
        self.playing = false;
        true
    }

    /// Manual step back: stops at the first track and leaves playback paused.
    pub fn previous(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.move_to(self.index - 1);
        self.playing = false;
        true
    }

    /// Natural end of the current track: advance (wrapping to the start of
    /// the catalog) and keep playing.
    pub fn on_track_ended(&mut self, len: usize) -> bool {
        if len == 0 {
            return false;
        }
        let next = if self.index + 1 < len { self.index + 1 } else { 0 };
        self.move_to(next);
        self.playing = true;
        true
    }

    /// State right after a different catalog became active.
    pub fn reset_for_catalog(&mut self) {
        self.move_to(0);
        self.playing = false;
    }

    /// Record the elapsed position, bounded by the duration once known.
    pub fn set_position(&mut self, position: Duration) {
        self.position = match self.duration {
            Some(d) => position.min(d),
            None => position,
        };
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = Some(duration);
        self.position = self.position.min(duration);
    }

    fn move_to(&mut self, index: usize) {
        self.index = index;
        self.position = Duration::ZERO;
        self.duration = None;
        self.override_active = false;
    }
}

/// Clamp a requested volume into `[0, 1]`; NaN is treated as silence.
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}
