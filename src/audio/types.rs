//! Audio-related small types.
//!
//! This module defines the commands understood by the audio thread, the
//! events it reports back, and the `AudioOutput` seam the playback engine
//! drives.

use std::sync::Arc;
use std::time::Duration;

use super::AudioError;

/// Transport operations on the single audio output.
///
/// `load` binds a new source identified by `generation`; the output is
/// paused at position zero afterwards and every event it emits for that
/// source carries the same generation.
pub trait AudioOutput {
    fn load(&mut self, locator: &str, generation: u64);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, position: Duration);
    fn set_volume(&mut self, volume: f32);
}

#[derive(Debug)]
pub enum AudioCmd {
    /// Fetch and bind the source at `locator`.
    Load { locator: String, generation: u64 },
    /// Result of a background fetch started by `Load`.
    Fetched {
        generation: u64,
        result: Result<Arc<[u8]>, AudioError>,
    },
    /// Start or resume playback (deferred until the source is bound).
    Play,
    /// Pause playback.
    Pause,
    /// Move to an absolute position in the current source.
    Seek(Duration),
    /// Set the output volume, already clamped to `[0, 1]`.
    SetVolume(f32),
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

/// Asynchronous reports from the audio thread.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    /// The source is decoded and bound; play commands now take effect immediately.
    Ready { generation: u64 },
    /// The source's total length became known.
    Duration { generation: u64, duration: Duration },
    /// Elapsed position while playing.
    Position { generation: u64, position: Duration },
    /// The source played to its end.
    Ended { generation: u64 },
    /// The source could not be fetched or decoded.
    Failed { generation: u64, message: String },
}

impl OutputEvent {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Ready { generation }
            | Self::Duration { generation, .. }
            | Self::Position { generation, .. }
            | Self::Ended { generation }
            | Self::Failed { generation, .. } => *generation,
        }
    }
}
