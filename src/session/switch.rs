//! Catalog mode switching as an explicit state machine.
//!
//! `transition` is the only place the switch state changes. It is pure:
//! the engine feeds it events and carries out the returned effects in
//! order.

use crate::catalog::Mode;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SwitchState {
    Stable(Mode),
    /// The new catalog is already active; waiting for the output to settle
    /// before resuming playback.
    Switching {
        from: Mode,
        to: Mode,
        was_playing: bool,
    },
}

impl Default for SwitchState {
    fn default() -> Self {
        Self::Stable(Mode::default())
    }
}

impl SwitchState {
    /// The catalog that selection and playback operate on.
    pub fn active_mode(self) -> Mode {
        match self {
            Self::Stable(mode) => mode,
            Self::Switching { to, .. } => to,
        }
    }

    pub fn is_switching(self) -> bool {
        matches!(self, Self::Switching { .. })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SwitchEvent {
    /// The user asked for the other catalog.
    Toggle { target_loaded: bool, playing: bool },
    /// The output is ready (or the settle delay elapsed).
    Settled,
    /// The source was rebound again before settling; do not resume.
    Abandoned,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SwitchEffect {
    /// Pause the output, whether or not it is playing.
    PauseOutput,
    /// Make `Mode` the active catalog: index 0, position 0, paused, rebind.
    Activate(Mode),
    /// Arm the settle timer.
    ScheduleResume,
    /// Set playing, which issues a play command.
    Resume,
}

pub fn transition(state: SwitchState, event: SwitchEvent) -> (SwitchState, Vec<SwitchEffect>) {
    use SwitchEffect::*;

    match (state, event) {
        (SwitchState::Stable(from), SwitchEvent::Toggle { target_loaded, playing }) => {
            if !target_loaded {
                return (state, Vec::new());
            }
            let to = from.other();
            let mut effects = vec![PauseOutput, Activate(to)];
            if playing {
                effects.push(ScheduleResume);
                let next = SwitchState::Switching {
                    from,
                    to,
                    was_playing: true,
                };
                (next, effects)
            } else {
                (SwitchState::Stable(to), effects)
            }
        }
        // Re-entrant toggles are dropped, not queued.
        (SwitchState::Switching { .. }, SwitchEvent::Toggle { .. }) => (state, Vec::new()),
        (SwitchState::Switching { to, was_playing, .. }, SwitchEvent::Settled) => {
            let effects = if was_playing { vec![Resume] } else { Vec::new() };
            (SwitchState::Stable(to), effects)
        }
        (SwitchState::Switching { to, .. }, SwitchEvent::Abandoned) => {
            (SwitchState::Stable(to), Vec::new())
        }
        (SwitchState::Stable(_), SwitchEvent::Settled | SwitchEvent::Abandoned) => {
            (state, Vec::new())
        }
    }
}
