use std::time::{Duration, Instant};

use crate::audio::{AudioOutput, OutputEvent};
use crate::catalog::{Catalog, CatalogResult, Catalogs, Mode, Track};
use crate::config::PlaybackSettings;

use super::overrides::{EffectiveTrack, OverrideRegistry};
use super::selection::{PlaybackSession, SelectionError, clamp_volume};
use super::switch::{SwitchEffect, SwitchEvent, SwitchState, transition};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SettleAction {
    ResumeAfterSwitch,
    RestoreAfterOverride {
        position: Duration,
        was_playing: bool,
    },
}

/// Work deferred until the output has settled on the source it was bound
/// to when the action was armed.
#[derive(Debug, Clone, Copy)]
struct PendingSettle {
    action: SettleAction,
    generation: u64,
    deadline: Instant,
}

/// The playback engine: the only owner of the audio output and the only
/// place the playback session is mutated.
///
/// Every rebind of the output bumps `generation`. Output events and settle
/// actions carry the generation they belong to, so anything addressed to a
/// source that has since been replaced is dropped.
pub struct Player<O: AudioOutput> {
    output: O,
    catalogs: Option<Catalogs>,
    load_state: LoadState,
    session: PlaybackSession,
    switch: SwitchState,
    overrides: OverrideRegistry,
    generation: u64,
    pending: Option<PendingSettle>,
    switch_settle: Duration,
    override_settle: Duration,
    last_error: Option<String>,
}

impl<O: AudioOutput> Player<O> {
    pub fn new(mut output: O, overrides: OverrideRegistry, settings: &PlaybackSettings) -> Self {
        let session = PlaybackSession::new(settings.initial_volume);
        output.set_volume(session.volume);

        Self {
            output,
            catalogs: None,
            load_state: LoadState::Loading,
            session,
            switch: SwitchState::default(),
            overrides,
            generation: 0,
            pending: None,
            switch_settle: Duration::from_millis(settings.switch_settle_ms),
            override_settle: Duration::from_millis(settings.override_settle_ms),
            last_error: None,
        }
    }

    // ----- catalogs -----

    /// Mark a (re)load as in flight. Already loaded catalogs stay playable
    /// until the new ones arrive.
    pub fn begin_loading(&mut self) {
        self.load_state = LoadState::Loading;
    }

    /// Install freshly loaded catalogs, or record why loading failed.
    pub fn catalogs_loaded(&mut self, result: CatalogResult) {
        match result {
            Ok(catalogs) => {
                log::info!(
                    "catalogs loaded: {} primary, {} alternate tracks",
                    catalogs.get(Mode::Primary).len(),
                    catalogs.get(Mode::Alternate).len()
                );
                self.catalogs = Some(catalogs);
                self.load_state = LoadState::Ready;
                self.last_error = None;

                self.cancel_pending();
                self.switch = SwitchState::Stable(Mode::Primary);
                self.session.reset_for_catalog();
                self.output.pause();
                self.load_current();
            }
            Err(e) => {
                log::error!("catalog load failed: {e}");
                self.load_state = LoadState::Failed(e.to_string());
            }
        }
    }

    // ----- selection -----

    /// Explicit selection; never starts playback by itself.
    pub fn select_track(&mut self, index: usize) -> Result<(), SelectionError> {
        let len = self.active_len();
        self.session.select_track(index, len)?;
        self.load_current();
        Ok(())
    }

    pub fn next(&mut self) -> bool {
        let moved = self.session.next(self.active_len());
        if moved {
            self.load_current();
        }
        moved
    }

    pub fn previous(&mut self) -> bool {
        let moved = self.session.previous();
        if moved {
            self.load_current();
        }
        moved
    }

    // ----- transport -----

    pub fn toggle_play_pause(&mut self) {
        let playing = self.session.playing;
        self.set_playing(!playing);
    }

    /// Explicit play/pause intent. It replaces whatever a pending settle
    /// would have resumed.
    pub fn set_playing(&mut self, playing: bool) {
        if self.current_track().is_none() {
            return;
        }
        match self.pending.as_mut().map(|p| &mut p.action) {
            Some(SettleAction::RestoreAfterOverride { was_playing, .. }) => *was_playing = playing,
            Some(SettleAction::ResumeAfterSwitch) => self.cancel_pending(),
            None => {}
        }
        self.apply_playing(playing);
    }

    /// Seek to `seconds`, clamped into `[0, duration]`. While the duration is
    /// unknown the only valid target is the start.
    pub fn seek(&mut self, seconds: f64) {
        if self.current_track().is_none() {
            return;
        }
        let max = self.session.duration.unwrap_or(Duration::ZERO);
        let target = if seconds.is_finite() && seconds > 0.0 {
            Duration::from_secs_f64(seconds).min(max)
        } else {
            Duration::ZERO
        };
        self.session.position = target;
        self.output.seek(target);
    }

    pub fn seek_by(&mut self, delta_seconds: f64) {
        let target = self.session.position.as_secs_f64() + delta_seconds;
        self.seek(target);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.session.volume = clamp_volume(volume);
        self.output.set_volume(self.session.volume);
    }

    pub fn adjust_volume(&mut self, delta: f32) {
        self.set_volume(self.session.volume + delta);
    }

    // ----- mode switch -----

    /// Ask for the other catalog. Returns whether the request was accepted:
    /// it is refused while the target is not loaded (or empty) and while a
    /// previous switch is still settling.
    pub fn toggle_mode(&mut self) -> bool {
        let target = self.switch.active_mode().other();
        let target_loaded = self
            .catalogs
            .as_ref()
            .is_some_and(|c| !c.get(target).is_empty());

        let before = self.switch;
        let (next, effects) = transition(
            before,
            SwitchEvent::Toggle {
                target_loaded,
                playing: self.session.playing,
            },
        );
        self.switch = next;
        self.apply_switch_effects(effects);

        if next == before {
            log::debug!("mode toggle ignored in {before:?}");
            false
        } else {
            log::info!("switched to {} catalog", target.label());
            true
        }
    }

    fn apply_switch_effects(&mut self, effects: Vec<SwitchEffect>) {
        for effect in effects {
            match effect {
                SwitchEffect::PauseOutput => self.output.pause(),
                SwitchEffect::Activate(_) => {
                    self.session.reset_for_catalog();
                    self.load_current();
                }
                SwitchEffect::ScheduleResume => {
                    self.arm(SettleAction::ResumeAfterSwitch, self.switch_settle)
                }
                SwitchEffect::Resume => self.apply_playing(true),
            }
        }
    }

    // ----- overrides -----

    /// Flip the content override of the current track, if it has one.
    ///
    /// The output is rebound to the new effective audio while paused; once it
    /// settles the captured position is restored and playback resumes if it
    /// was running.
    pub fn toggle_override(&mut self) -> bool {
        if !self.has_override() {
            return false;
        }

        // A switch still settling was paused only to let the new source
        // settle; the swap takes over its pending resume.
        let was_playing = self.session.playing
            || self
                .pending
                .is_some_and(|p| p.action == SettleAction::ResumeAfterSwitch);
        let position = self.session.position;
        self.session.override_active = !self.session.override_active;

        self.rebind(false);
        self.session.position = position;
        self.arm(
            SettleAction::RestoreAfterOverride {
                position,
                was_playing,
            },
            self.override_settle,
        );
        true
    }

    // ----- output events and timers -----

    pub fn handle_output_event(&mut self, event: OutputEvent) {
        if event.generation() != self.generation {
            log::trace!("dropping stale output event {event:?}");
            return;
        }

        match event {
            OutputEvent::Ready { .. } => self.settle(),
            OutputEvent::Duration { duration, .. } => self.session.set_duration(duration),
            OutputEvent::Position { position, .. } => {
                if self.pending.is_none() {
                    self.session.set_position(position);
                }
            }
            OutputEvent::Ended { .. } => {
                if self.session.on_track_ended(self.active_len()) {
                    self.load_current();
                }
            }
            OutputEvent::Failed { message, .. } => {
                log::warn!("playback failed: {message}");
                self.last_error = Some(message);
            }
        }
    }

    /// Fire a pending settle whose deadline has passed.
    pub fn tick(&mut self, now: Instant) {
        if self.pending.is_some_and(|p| now >= p.deadline) {
            self.settle();
        }
    }

    fn settle(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if pending.generation != self.generation {
            return;
        }

        match pending.action {
            SettleAction::ResumeAfterSwitch => {
                let (next, effects) = transition(self.switch, SwitchEvent::Settled);
                self.switch = next;
                self.apply_switch_effects(effects);
            }
            SettleAction::RestoreAfterOverride {
                position,
                was_playing,
            } => {
                let target = match self.session.duration {
                    Some(d) => position.min(d),
                    None => position,
                };
                self.session.position = target;
                self.output.seek(target);
                if was_playing {
                    self.apply_playing(true);
                }
            }
        }
    }

    fn arm(&mut self, action: SettleAction, delay: Duration) {
        self.pending = Some(PendingSettle {
            action,
            generation: self.generation,
            deadline: Instant::now() + delay,
        });
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            if pending.action == SettleAction::ResumeAfterSwitch {
                let (next, _) = transition(self.switch, SwitchEvent::Abandoned);
                self.switch = next;
            }
        }
    }

    fn apply_playing(&mut self, playing: bool) {
        self.session.playing = playing;
        if playing {
            self.output.play();
        } else {
            self.output.pause();
        }
    }

    /// Bind the output to the effective audio of the current track and keep
    /// playing if that is the current intent.
    fn load_current(&mut self) {
        let autoplay = self.session.playing;
        self.rebind(autoplay);
    }

    fn rebind(&mut self, autoplay: bool) {
        self.cancel_pending();
        self.generation += 1;
        self.session.duration = None;

        let locator = self.effective_track().map(|t| t.audio().to_string());
        match locator {
            Some(locator) => {
                log::debug!("binding output to {locator} (generation {})", self.generation);
                self.output.load(&locator, self.generation);
                if autoplay {
                    self.output.play();
                }
            }
            None => self.output.pause(),
        }
    }

    // ----- read access -----

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn mode(&self) -> Mode {
        self.switch.active_mode()
    }

    pub fn switch_state(&self) -> SwitchState {
        self.switch
    }

    pub fn is_settling(&self) -> bool {
        self.pending.is_some()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn is_ready(&self) -> bool {
        self.catalogs.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn active_catalog(&self) -> Option<&Catalog> {
        self.catalogs.as_ref().map(|c| c.get(self.mode()))
    }

    fn active_len(&self) -> usize {
        self.active_catalog().map_or(0, Catalog::len)
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.active_catalog()?.get(self.session.index)
    }

    pub fn effective_track(&self) -> Option<EffectiveTrack<'_>> {
        let track = self.current_track()?;
        Some(EffectiveTrack::resolve(
            track,
            &self.overrides,
            self.session.override_active,
        ))
    }

    /// Whether the current track has a registered override.
    pub fn has_override(&self) -> bool {
        self.current_track()
            .is_some_and(|t| self.overrides.contains(&t.id))
    }

    pub fn output(&self) -> &O {
        &self.output
    }
}
