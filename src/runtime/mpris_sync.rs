use std::time::Duration;

use crate::app::PlaybackState;
use crate::audio::AudioOutput;
use crate::catalog::Mode;
use crate::mpris::{MprisHandle, TrackMetadata};
use crate::session::Player;

/// What MPRIS last saw; pushing again is only needed when this changes.
#[derive(Debug, Clone, PartialEq)]
pub struct MprisSnapshot {
    track: Option<(Mode, usize, bool)>,
    length: Option<Duration>,
    playback: PlaybackState,
}

fn playback_state<O: AudioOutput>(player: &Player<O>) -> PlaybackState {
    PlaybackState::from_session(player.current_track().is_some(), player.session().playing)
}

pub fn snapshot<O: AudioOutput>(player: &Player<O>) -> MprisSnapshot {
    let session = player.session();
    MprisSnapshot {
        track: player
            .effective_track()
            .map(|t| (player.mode(), session.index, t.is_substituted())),
        length: session.duration,
        playback: playback_state(player),
    }
}

pub fn update_mpris<O: AudioOutput>(mpris: &MprisHandle, player: &Player<O>) {
    let session = player.session();
    let track = player.effective_track().map(|t| TrackMetadata {
        mode: player.mode(),
        index: session.index,
        title: t.title(),
        author: t.author(),
        audio: t.audio(),
        thumbnail: t.thumbnail(),
        length: session.duration,
    });
    mpris.set_track_metadata(track);
    mpris.set_playback(playback_state(player));
}
