//! Audio output: a dedicated thread owning the rodio stream.
//!
//! The thread fetches source bytes in the background, decodes them into a
//! paused `Sink` and reports readiness, duration, position and end-of-track
//! back over a channel. Only the playback engine commands it, through the
//! `AudioOutput` trait.

mod player;
mod sink;
mod source;
mod thread;
mod types;

pub use player::AudioPlayer;
pub use types::{AudioOutput, OutputEvent};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("request for {locator} failed: {source}")]
    Request {
        locator: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("could not read {locator}: {source}")]
    Io {
        locator: String,
        #[source]
        source: std::io::Error,
    },
    #[error("fetch of {locator} abandoned, the source was replaced")]
    Superseded { locator: String },
    #[error("could not decode audio: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
}

#[cfg(test)]
mod tests;
