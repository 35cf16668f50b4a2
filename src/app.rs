//! Application module: presentation state shared by the TUI and runtime.
//!
//! `App` only holds view concerns (list cursor, popups, status line).
//! Playback state lives in `session::Player`.

mod model;

pub use model::*;
