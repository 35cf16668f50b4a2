//! Playback session: track selection, the catalog switch state machine,
//! content overrides and the engine that drives the audio output.
//!
//! Presentation code reads a `&Player` and routes every intent through the
//! `Player` operations; nothing else mutates the session.

mod engine;
mod overrides;
mod selection;
mod switch;

pub use engine::{LoadState, Player};
pub use overrides::{EffectiveTrack, OverrideRegistry, TrackContent};
pub use selection::{PlaybackSession, SelectionError, clamp_volume};
pub use switch::{SwitchEffect, SwitchEvent, SwitchState, transition};

#[cfg(test)]
mod tests;
