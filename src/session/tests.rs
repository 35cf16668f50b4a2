use super::*;
use crate::audio::{AudioOutput, OutputEvent};
use crate::catalog::{Catalog, CatalogError, Catalogs, Mode, Track};
use crate::config::{PlaybackSettings, Settings};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Load(String, u64),
    Play,
    Pause,
    Seek(Duration),
    Volume(f32),
}

#[derive(Default)]
struct FakeOutput {
    calls: Vec<Call>,
}

impl FakeOutput {
    fn last_load(&self) -> Option<(&str, u64)> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::Load(locator, generation) => Some((locator.as_str(), *generation)),
            _ => None,
        })
    }

    fn generation(&self) -> u64 {
        self.last_load().map_or(0, |(_, g)| g)
    }

    /// Whether the output would be audible right now.
    fn is_playing(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                Call::Play => Some(true),
                Call::Pause | Call::Load(..) => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    fn last_volume(&self) -> Option<f32> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::Volume(v) => Some(*v),
            _ => None,
        })
    }
}

impl AudioOutput for FakeOutput {
    fn load(&mut self, locator: &str, generation: u64) {
        self.calls.push(Call::Load(locator.to_string(), generation));
    }

    fn play(&mut self) {
        self.calls.push(Call::Play);
    }

    fn pause(&mut self) {
        self.calls.push(Call::Pause);
    }

    fn seek(&mut self, position: Duration) {
        self.calls.push(Call::Seek(position));
    }

    fn set_volume(&mut self, volume: f32) {
        self.calls.push(Call::Volume(volume));
    }
}

fn track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        title: format!("{id} title"),
        thumbnail: format!("https://cdn.example/{id}.png"),
        audio: format!("https://cdn.example/{id}.mp3"),
        author: format!("{id} author"),
        author_url: format!("https://example.com/@{id}"),
    }
}

fn catalog(ids: &[&str]) -> Catalog {
    Catalog::new(ids.iter().map(|id| track(id)).collect())
}

fn substitute() -> TrackContent {
    TrackContent {
        title: "Science but Minecraft".to_string(),
        author: "gmail".to_string(),
        author_url: "https://example.com/@gmail".to_string(),
        thumbnail: "https://cdn.example/minecraft.png".to_string(),
        audio: "https://cdn.example/minecraft.mp3".to_string(),
    }
}

fn registry() -> OverrideRegistry {
    let mut registry = OverrideRegistry::new();
    registry.insert("science", substitute());
    registry
}

fn player_with(settings: &PlaybackSettings, primary: &[&str], alternate: &[&str]) -> Player<FakeOutput> {
    let mut player = Player::new(FakeOutput::default(), registry(), settings);
    player.catalogs_loaded(Ok(Catalogs::new(catalog(primary), catalog(alternate))));
    player
}

fn player(primary: &[&str], alternate: &[&str]) -> Player<FakeOutput> {
    player_with(&PlaybackSettings::default(), primary, alternate)
}

fn generation(player: &Player<FakeOutput>) -> u64 {
    player.output().generation()
}

fn later() -> Instant {
    Instant::now() + Duration::from_secs(5)
}

// ----- selection -----

#[test]
fn next_and_previous_stay_in_range_and_pause() {
    let mut s = PlaybackSession::new(1.0);
    s.playing = true;

    assert!(s.next(3));
    assert_eq!(s.index, 1);
    assert!(!s.playing);

    assert!(s.next(3));
    s.playing = true;
    assert!(!s.next(3));
    assert_eq!(s.index, 2);
    assert!(s.playing, "no-op next leaves the session untouched");

    assert!(s.previous());
    assert!(s.previous());
    assert!(!s.previous());
    assert_eq!(s.index, 0);
    assert!(!s.playing);
}

#[test]
fn next_on_empty_catalog_is_a_no_op() {
    let mut s = PlaybackSession::new(1.0);
    assert!(!s.next(0));
    assert_eq!(s.index, 0);
}

#[test]
fn track_end_advances_by_one_and_keeps_playing() {
    let mut s = PlaybackSession::new(1.0);
    s.playing = true;
    s.position = Duration::from_secs(30);

    assert!(s.on_track_ended(3));
    assert_eq!(s.index, 1);
    assert!(s.playing);
    assert_eq!(s.position, Duration::ZERO);
}

#[test]
fn track_end_on_last_track_wraps_to_first() {
    let mut s = PlaybackSession::new(1.0);
    s.index = 2;
    s.playing = true;

    assert!(s.on_track_ended(3));
    assert_eq!(s.index, 0);
    assert!(s.playing);
}

#[test]
fn selecting_the_current_index_still_resets_position_and_override() {
    let mut s = PlaybackSession::new(1.0);
    s.index = 1;
    s.position = Duration::from_secs(12);
    s.override_active = true;
    s.playing = true;

    s.select_track(1, 2).unwrap();
    assert_eq!(s.index, 1);
    assert_eq!(s.position, Duration::ZERO);
    assert!(!s.override_active);
    assert!(!s.playing);
}

#[test]
fn select_track_rejects_out_of_range_indices() {
    let mut s = PlaybackSession::new(1.0);
    let err = s.select_track(2, 2).unwrap_err();
    assert_eq!(err, SelectionError::OutOfRange { index: 2, len: 2 });
    assert_eq!(s.index, 0);
}

#[test]
fn position_is_bounded_by_known_duration() {
    let mut s = PlaybackSession::new(1.0);
    s.set_position(Duration::from_secs(500));
    assert_eq!(s.position, Duration::from_secs(500));

    s.set_duration(Duration::from_secs(200));
    assert_eq!(s.position, Duration::from_secs(200));

    s.set_position(Duration::from_secs(250));
    assert_eq!(s.position, Duration::from_secs(200));
}

#[test]
fn clamp_volume_handles_out_of_range_and_nan() {
    assert_eq!(clamp_volume(-0.5), 0.0);
    assert_eq!(clamp_volume(1.7), 1.0);
    assert_eq!(clamp_volume(0.3), 0.3);
    assert_eq!(clamp_volume(f32::NAN), 0.0);
}

// ----- switch state machine -----

#[test]
fn toggle_into_unloaded_catalog_is_refused() {
    let state = SwitchState::Stable(Mode::Primary);
    let (next, effects) = transition(
        state,
        SwitchEvent::Toggle {
            target_loaded: false,
            playing: true,
        },
    );
    assert_eq!(next, state);
    assert!(effects.is_empty());
}

#[test]
fn toggle_while_paused_switches_immediately() {
    let (next, effects) = transition(
        SwitchState::Stable(Mode::Primary),
        SwitchEvent::Toggle {
            target_loaded: true,
            playing: false,
        },
    );
    assert_eq!(next, SwitchState::Stable(Mode::Alternate));
    assert_eq!(
        effects,
        vec![SwitchEffect::PauseOutput, SwitchEffect::Activate(Mode::Alternate)]
    );
}

#[test]
fn toggle_while_playing_waits_for_settle_then_resumes() {
    let (switching, effects) = transition(
        SwitchState::Stable(Mode::Alternate),
        SwitchEvent::Toggle {
            target_loaded: true,
            playing: true,
        },
    );
    assert_eq!(
        switching,
        SwitchState::Switching {
            from: Mode::Alternate,
            to: Mode::Primary,
            was_playing: true,
        }
    );
    assert_eq!(
        effects,
        vec![
            SwitchEffect::PauseOutput,
            SwitchEffect::Activate(Mode::Primary),
            SwitchEffect::ScheduleResume,
        ]
    );
    assert_eq!(switching.active_mode(), Mode::Primary);

    let (stable, effects) = transition(switching, SwitchEvent::Settled);
    assert_eq!(stable, SwitchState::Stable(Mode::Primary));
    assert_eq!(effects, vec![SwitchEffect::Resume]);
}

#[test]
fn toggle_while_switching_is_dropped() {
    let switching = SwitchState::Switching {
        from: Mode::Primary,
        to: Mode::Alternate,
        was_playing: true,
    };
    let (next, effects) = transition(
        switching,
        SwitchEvent::Toggle {
            target_loaded: true,
            playing: false,
        },
    );
    assert_eq!(next, switching);
    assert!(effects.is_empty());
}

#[test]
fn abandoned_switch_settles_without_resuming() {
    let switching = SwitchState::Switching {
        from: Mode::Primary,
        to: Mode::Alternate,
        was_playing: true,
    };
    let (next, effects) = transition(switching, SwitchEvent::Abandoned);
    assert_eq!(next, SwitchState::Stable(Mode::Alternate));
    assert!(effects.is_empty());

    let (again, effects) = transition(next, SwitchEvent::Settled);
    assert_eq!(again, next);
    assert!(effects.is_empty());
}

// ----- overrides -----

#[test]
fn effective_track_projects_substitute_only_when_active() {
    let registry = registry();
    let science = track("science");

    let plain = EffectiveTrack::resolve(&science, &registry, false);
    assert_eq!(plain.title(), "science title");
    assert!(!plain.is_substituted());

    let swapped = EffectiveTrack::resolve(&science, &registry, true);
    assert!(swapped.is_substituted());
    assert_eq!(swapped.id(), "science");
    assert_eq!(swapped.title(), "Science but Minecraft");
    assert_eq!(swapped.author(), "gmail");
    assert_eq!(swapped.author_url(), "https://example.com/@gmail");
    assert_eq!(swapped.thumbnail(), "https://cdn.example/minecraft.png");
    assert_eq!(swapped.audio(), "https://cdn.example/minecraft.mp3");
    assert_eq!(science.title, "science title");

    let other = track("other");
    assert!(!EffectiveTrack::resolve(&other, &registry, true).is_substituted());
}

#[test]
fn registry_from_default_settings_holds_the_builtin_entry() {
    let registry = OverrideRegistry::from_settings(&Settings::default().overrides);
    assert_eq!(registry.len(), 1);
    let science = registry.get("science").unwrap();
    assert!(science.title.starts_with("Science but Minecraft"));
    assert!(science.audio.ends_with(".mp3"));
}

// ----- engine -----

#[test]
fn new_player_applies_clamped_initial_volume() {
    let settings = PlaybackSettings {
        initial_volume: 3.0,
        ..PlaybackSettings::default()
    };
    let player = Player::new(FakeOutput::default(), registry(), &settings);
    assert_eq!(player.session().volume, 1.0);
    assert_eq!(player.output().last_volume(), Some(1.0));
    assert!(!player.is_ready());
    assert_eq!(player.load_state(), &LoadState::Loading);
}

#[test]
fn loaded_catalogs_bind_first_primary_track_paused() {
    let player = player(&["t1", "t2"], &["m1"]);
    assert!(player.is_ready());
    assert_eq!(player.mode(), Mode::Primary);
    assert_eq!(
        player.output().last_load(),
        Some(("https://cdn.example/t1.mp3", 1))
    );
    assert!(!player.output().is_playing());
}

#[test]
fn failed_load_keeps_the_session_unplayable() {
    let mut player = Player::new(FakeOutput::default(), registry(), &PlaybackSettings::default());
    player.catalogs_loaded(Err(CatalogError::Panicked(Mode::Alternate)));

    assert!(!player.is_ready());
    assert!(matches!(player.load_state(), LoadState::Failed(m) if m.contains("alternate")));

    player.toggle_play_pause();
    assert!(!player.toggle_mode());
    assert!(player.select_track(0).is_err());
    assert!(!player.session().playing);
    assert!(player.output().last_load().is_none());
}

#[test]
fn volume_is_clamped_before_reaching_the_output() {
    let mut player = player(&["t1"], &["m1"]);
    player.set_volume(1.5);
    assert_eq!(player.output().last_volume(), Some(1.0));
    player.adjust_volume(-4.0);
    assert_eq!(player.output().last_volume(), Some(0.0));
    assert_eq!(player.session().volume, 0.0);
}

#[test]
fn seek_clamps_to_duration_and_waits_for_it() {
    let mut player = player(&["t1"], &["m1"]);
    let g = generation(&player);

    player.seek(30.0);
    assert_eq!(player.session().position, Duration::ZERO);

    player.handle_output_event(OutputEvent::Duration {
        generation: g,
        duration: Duration::from_secs(180),
    });
    player.seek(500.0);
    assert_eq!(player.session().position, Duration::from_secs(180));
    player.seek(-3.0);
    assert_eq!(player.session().position, Duration::ZERO);
    player.seek_by(15.0);
    assert_eq!(player.session().position, Duration::from_secs(15));
    assert_eq!(
        player.output().calls.last(),
        Some(&Call::Seek(Duration::from_secs(15)))
    );
}

#[test]
fn playing_track_change_rebinds_and_plays() {
    let mut player = player(&["t1", "t2"], &["m1"]);
    player.set_playing(true);
    let g = generation(&player);

    player.handle_output_event(OutputEvent::Ended { generation: g });
    assert_eq!(player.session().index, 1);
    assert!(player.session().playing);
    assert_eq!(
        player.output().last_load(),
        Some(("https://cdn.example/t2.mp3", g + 1))
    );
    assert!(player.output().is_playing());
}

#[test]
fn stale_output_events_are_dropped() {
    let mut player = player(&["t1", "t2"], &["m1"]);
    let old = generation(&player);
    player.next();

    player.handle_output_event(OutputEvent::Position {
        generation: old,
        position: Duration::from_secs(10),
    });
    player.handle_output_event(OutputEvent::Ended { generation: old });
    player.handle_output_event(OutputEvent::Failed {
        generation: old,
        message: "gone".into(),
    });

    assert_eq!(player.session().index, 1);
    assert_eq!(player.session().position, Duration::ZERO);
    assert!(player.last_error().is_none());
}

#[test]
fn failure_of_current_source_is_surfaced() {
    let mut player = player(&["t1"], &["m1"]);
    player.set_playing(true);
    let g = generation(&player);
    player.handle_output_event(OutputEvent::Failed {
        generation: g,
        message: "decode error".into(),
    });
    assert_eq!(player.last_error(), Some("decode error"));
    assert!(player.session().playing);
}

#[test]
fn override_is_cleared_by_select_next_and_previous() {
    let mut player = player(&["science", "t2"], &["m1"]);

    assert!(player.toggle_override());
    assert!(player.session().override_active);
    player.select_track(0).unwrap();
    assert!(!player.session().override_active);

    player.toggle_override();
    player.next();
    assert!(!player.session().override_active);

    player.previous();
    player.toggle_override();
    assert!(player.session().override_active);
    player.previous();
    assert!(player.session().override_active, "no-op previous keeps override");
    player.select_track(1).unwrap();
    assert!(!player.session().override_active);
}

#[test]
fn override_toggle_without_registered_entry_is_refused() {
    let mut player = player(&["t1"], &["m1"]);
    assert!(!player.has_override());
    assert!(!player.toggle_override());
    assert!(!player.session().override_active);
}

#[test]
fn mode_switch_resets_index_and_position() {
    let mut player = player(&["t1", "t2", "t3"], &["m1", "m2"]);
    player.select_track(2).unwrap();
    let g = generation(&player);
    player.handle_output_event(OutputEvent::Duration {
        generation: g,
        duration: Duration::from_secs(100),
    });
    player.seek(40.0);

    assert!(player.toggle_mode());
    assert_eq!(player.mode(), Mode::Alternate);
    assert_eq!(player.switch_state(), SwitchState::Stable(Mode::Alternate));
    assert_eq!(player.session().index, 0);
    assert_eq!(player.session().position, Duration::ZERO);
    assert!(!player.session().playing);
    assert_eq!(
        player.output().last_load().map(|(l, _)| l),
        Some("https://cdn.example/m1.mp3")
    );
}

#[test]
fn mode_switch_into_empty_catalog_is_refused() {
    let mut player = player(&["t1"], &[]);
    player.set_playing(true);
    assert!(!player.toggle_mode());
    assert_eq!(player.mode(), Mode::Primary);
    assert!(player.session().playing);
}

#[test]
fn mode_switch_while_playing_resumes_once_ready() {
    let settings = PlaybackSettings {
        switch_settle_ms: 60_000,
        ..PlaybackSettings::default()
    };
    let mut player = player_with(&settings, &["t1"], &["m1"]);
    player.set_playing(true);

    assert!(player.toggle_mode());
    assert!(player.switch_state().is_switching());
    assert!(!player.session().playing);
    assert!(!player.output().is_playing());

    player.tick(Instant::now());
    assert!(player.switch_state().is_switching());

    let g = generation(&player);
    player.handle_output_event(OutputEvent::Ready { generation: g });
    assert_eq!(player.switch_state(), SwitchState::Stable(Mode::Alternate));
    assert!(player.session().playing);
    assert!(player.output().is_playing());
}

#[test]
fn toggle_during_switch_is_ignored() {
    let mut player = player(&["t1"], &["m1"]);
    player.set_playing(true);
    assert!(player.toggle_mode());
    let calls = player.output().calls.len();

    assert!(!player.toggle_mode());
    assert_eq!(player.mode(), Mode::Alternate);
    assert_eq!(player.output().calls.len(), calls);

    player.tick(later());
    assert_eq!(player.switch_state(), SwitchState::Stable(Mode::Alternate));
    assert!(player.session().playing);
}

#[test]
fn rebinding_before_settle_abandons_the_resume() {
    let mut player = player(&["t1"], &["m1", "m2"]);
    player.set_playing(true);
    player.toggle_mode();

    player.select_track(1).unwrap();
    assert_eq!(player.switch_state(), SwitchState::Stable(Mode::Alternate));

    player.tick(later());
    assert!(!player.session().playing);
    assert!(!player.output().is_playing());
}

#[test]
fn explicit_pause_during_switch_wins_over_resume() {
    let mut player = player(&["t1"], &["m1"]);
    player.set_playing(true);
    player.toggle_mode();

    player.set_playing(false);
    assert!(!player.is_settling());
    player.tick(later());
    assert!(!player.session().playing);
}

#[test]
fn next_then_end_then_switch_lands_on_alternate_catalog_playing() {
    let mut player = player(&["t1", "t2"], &["m1"]);
    player.set_playing(true);
    assert_eq!(player.session().index, 0);

    assert!(player.next());
    assert_eq!(player.session().index, 1);
    assert!(!player.session().playing);
    assert_eq!(player.session().position, Duration::ZERO);

    let g = generation(&player);
    player.handle_output_event(OutputEvent::Ended { generation: g });
    assert_eq!(player.session().index, 0);
    assert!(player.session().playing);

    assert!(player.toggle_mode());
    player.tick(later());

    assert_eq!(player.mode(), Mode::Alternate);
    assert_eq!(player.session().index, 0);
    assert!(player.session().playing);
    assert_eq!(player.current_track().map(|t| t.id.as_str()), Some("m1"));
    assert_eq!(
        player.output().last_load().map(|(l, _)| l),
        Some("https://cdn.example/m1.mp3")
    );
    assert!(player.output().is_playing());
}

#[test]
fn override_toggle_keeps_position_and_playback() {
    let mut player = player(&["science", "t2"], &["m1"]);
    player.set_playing(true);
    let g = generation(&player);
    player.handle_output_event(OutputEvent::Duration {
        generation: g,
        duration: Duration::from_secs(200),
    });
    player.handle_output_event(OutputEvent::Position {
        generation: g,
        position: Duration::from_secs(42),
    });

    assert!(player.toggle_override());
    let effective = player.effective_track().unwrap();
    assert_eq!(effective.title(), "Science but Minecraft");
    assert_eq!(effective.audio(), "https://cdn.example/minecraft.mp3");
    assert_eq!(
        player.output().last_load().map(|(l, _)| l),
        Some("https://cdn.example/minecraft.mp3")
    );
    assert!(!player.output().is_playing());

    player.tick(later());
    assert!(player.session().playing);
    assert_eq!(player.session().position, Duration::from_secs(42));
    let calls = &player.output().calls;
    assert_eq!(
        &calls[calls.len() - 2..],
        &[Call::Seek(Duration::from_secs(42)), Call::Play]
    );

    assert!(player.toggle_override());
    player.tick(later());
    let effective = player.effective_track().unwrap();
    assert_eq!(effective.title(), "science title");
    assert_eq!(effective.audio(), "https://cdn.example/science.mp3");
    assert_eq!(player.session().position, Duration::from_secs(42));
    assert!(player.session().playing);
    assert!(player.output().is_playing());
}

#[test]
fn override_toggle_while_paused_restores_position_without_playing() {
    let mut player = player(&["science"], &["m1"]);
    let g = generation(&player);
    player.handle_output_event(OutputEvent::Duration {
        generation: g,
        duration: Duration::from_secs(200),
    });
    player.seek(10.0);

    player.toggle_override();
    let g = generation(&player);
    player.handle_output_event(OutputEvent::Ready { generation: g });

    assert!(!player.is_settling());
    assert!(!player.session().playing);
    assert_eq!(player.session().position, Duration::from_secs(10));
    assert_eq!(
        player.output().calls.last(),
        Some(&Call::Seek(Duration::from_secs(10)))
    );
}

#[test]
fn override_toggle_during_switch_settle_keeps_the_resume() {
    let mut player = player(&["t1"], &["science"]);
    player.set_playing(true);

    assert!(player.toggle_mode());
    assert!(!player.session().playing);
    assert!(player.toggle_override());
    player.tick(later());

    assert_eq!(player.switch_state(), SwitchState::Stable(Mode::Alternate));
    assert!(!player.is_settling());
    assert!(player.session().playing);
    assert!(player.output().is_playing());
    assert_eq!(
        player.output().last_load().map(|(locator, _)| locator),
        Some("https://cdn.example/minecraft.mp3")
    );
}
