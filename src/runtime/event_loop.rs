use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, ProfilePanel};
use crate::audio::{AudioPlayer, OutputEvent};
use crate::catalog::{CatalogResult, spawn_catalog_load};
use crate::config;
use crate::mpris::ControlCmd;
use crate::mpris::MprisHandle;
use crate::profile::{ProfileResult, spawn_profile_load};
use crate::runtime::mpris_sync::{MprisSnapshot, snapshot, update_mpris};
use crate::session::Player;
use crate::ui;

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    agent: ureq::Agent,
    /// In-flight catalog load, if any.
    catalog_rx: Option<Receiver<CatalogResult>>,
    /// In-flight profile load, if any.
    profile_rx: Option<Receiver<ProfileResult>>,
    output_rx: Receiver<OutputEvent>,
    /// Internal two-key prefix state used for `gg` handling.
    pending_gg: bool,
    /// Last state pushed to MPRIS.
    last_mpris: Option<MprisSnapshot>,
    /// Track index the cursor last followed.
    last_followed: Option<usize>,
}

impl EventLoopState {
    pub fn new(
        agent: ureq::Agent,
        catalog_rx: Receiver<CatalogResult>,
        output_rx: Receiver<OutputEvent>,
    ) -> Self {
        Self {
            agent,
            catalog_rx: Some(catalog_rx),
            profile_rx: None,
            output_rx,
            pending_gg: false,
            last_mpris: None,
            last_followed: None,
        }
    }

    fn start_catalog_load(&mut self, settings: &config::Settings, player: &mut Player<AudioPlayer>) {
        if self.catalog_rx.is_some() {
            return;
        }
        player.begin_loading();
        self.catalog_rx = Some(spawn_catalog_load(
            self.agent.clone(),
            settings.catalogs.clone(),
        ));
    }

    fn start_profile_load(&mut self, settings: &config::Settings, app: &mut App, force: bool) {
        if self.profile_rx.is_some() {
            return;
        }
        app.profile = ProfilePanel::Loading;
        self.profile_rx = Some(spawn_profile_load(
            self.agent.clone(),
            settings.profile.clone(),
            force,
        ));
    }
}

/// Main terminal event loop: handles input, UI drawing, output events,
/// background loads and MPRIS. Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    player: &mut Player<AudioPlayer>,
    mpris: &MprisHandle,
    control_tx: &mpsc::Sender<ControlCmd>,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> anyhow::Result<()> {
    loop {
        drain_background(app, player, state);

        // Settle deadlines fire here.
        player.tick(Instant::now());

        // Follow the current track only when it changes, so free-roaming
        // with j/k is not undone on the next frame.
        let len = player.active_catalog().map_or(0, |c| c.len());
        let current = player.current_track().map(|_| player.session().index);
        if current != state.last_followed {
            if let Some(idx) = current {
                app.follow(idx);
            }
            state.last_followed = current;
        }
        app.clamp_cursor(len);

        // Keep MPRIS in sync even when playback changes come from media keys or auto-advance.
        let snap = snapshot(player);
        if state.last_mpris.as_ref() != Some(&snap) {
            update_mpris(mpris, player);
            state.last_mpris = Some(snap);
        }

        terminal.draw(|f| ui::draw(f, app, player, &settings.ui, &settings.controls))?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, settings, app, player) {
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, player, control_tx, state) {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn drain_background(app: &mut App, player: &mut Player<AudioPlayer>, state: &mut EventLoopState) {
    match state.catalog_rx.as_ref().map(Receiver::try_recv) {
        Some(Ok(result)) => {
            state.catalog_rx = None;
            player.catalogs_loaded(result);
            state.last_followed = None;
        }
        Some(Err(TryRecvError::Disconnected)) => state.catalog_rx = None,
        Some(Err(TryRecvError::Empty)) | None => {}
    }

    match state.profile_rx.as_ref().map(Receiver::try_recv) {
        Some(Ok(result)) => {
            state.profile_rx = None;
            app.profile = match result {
                Ok(profile) => ProfilePanel::Loaded(Box::new(profile)),
                Err(e) => {
                    log::warn!("profile load failed: {e}");
                    ProfilePanel::Failed(e.to_string())
                }
            };
        }
        Some(Err(TryRecvError::Disconnected)) => {
            state.profile_rx = None;
            app.profile = ProfilePanel::Failed("profile loader stopped".to_string());
        }
        Some(Err(TryRecvError::Empty)) | None => {}
    }

    while let Ok(ev) = state.output_rx.try_recv() {
        player.handle_output_event(ev);
    }
}

fn quit(settings: &config::Settings, player: &Player<AudioPlayer>) {
    log::info!("shutting down");
    player
        .output()
        .quit_softly(Duration::from_millis(settings.audio.quit_fade_out_ms));
}

fn handle_control_cmd(
    cmd: ControlCmd,
    settings: &config::Settings,
    app: &mut App,
    player: &mut Player<AudioPlayer>,
) -> bool {
    match cmd {
        ControlCmd::Quit => {
            quit(settings, player);
            return true;
        }
        ControlCmd::Play => {
            app.follow_playback_on();
            player.set_playing(true);
        }
        ControlCmd::Pause => player.set_playing(false),
        ControlCmd::PlayPause => {
            app.follow_playback_on();
            player.toggle_play_pause();
        }
        ControlCmd::Stop => {
            player.set_playing(false);
            player.seek(0.0);
        }
        ControlCmd::Next => {
            app.follow_playback_on();
            player.next();
        }
        ControlCmd::Prev => {
            app.follow_playback_on();
            player.previous();
        }
    }

    false
}

fn refused_switch_reason(player: &Player<AudioPlayer>) -> &'static str {
    if !player.is_ready() {
        "catalogs are not loaded yet"
    } else if player.switch_state().is_switching() {
        "a catalog switch is already in progress"
    } else {
        "the other catalog is empty"
    }
}

fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    player: &mut Player<AudioPlayer>,
    control_tx: &mpsc::Sender<ControlCmd>,
    state: &mut EventLoopState,
) -> bool {
    let len = player.active_catalog().map_or(0, |c| c.len());
    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }
    app.clear_status();
    player.clear_error();

    match key.code {
        KeyCode::Char('q') => {
            quit(settings, player);
            return true;
        }
        KeyCode::Esc => {
            app.details_window = false;
            app.profile_window = false;
        }
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.follow_playback_off();
                app.first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            app.follow_playback_off();
            app.last(len);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.follow_playback_off();
            app.next(len);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.follow_playback_off();
            app.prev(len);
        }
        KeyCode::Enter => {
            if len > 0 {
                app.follow_playback_on();
                match player.select_track(app.cursor) {
                    Ok(()) => {
                        if settings.playback.play_on_select {
                            player.set_playing(true);
                        }
                    }
                    Err(e) => app.set_status(e.to_string()),
                }
            }
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            let _ = control_tx.send(ControlCmd::PlayPause);
        }
        KeyCode::Char('l') => {
            let _ = control_tx.send(ControlCmd::Next);
        }
        KeyCode::Char('h') => {
            let _ = control_tx.send(ControlCmd::Prev);
        }
        KeyCode::Char('L') => player.seek_by(settings.controls.scrub_seconds as f64),
        KeyCode::Char('H') => player.seek_by(-(settings.controls.scrub_seconds as f64)),
        KeyCode::Char('+') | KeyCode::Char('=') => player.adjust_volume(settings.playback.volume_step),
        KeyCode::Char('-') => player.adjust_volume(-settings.playback.volume_step),
        KeyCode::Char('m') => {
            if player.toggle_mode() {
                app.cursor = 0;
                state.last_followed = None;
            } else {
                app.set_status(format!("cannot switch: {}", refused_switch_reason(player)));
            }
        }
        KeyCode::Char('t') => {
            if !player.toggle_override() {
                app.set_status("this track has no alternate version");
            }
        }
        KeyCode::Char('K') => app.toggle_details_window(),
        KeyCode::Char('a') => {
            if app.toggle_profile_window() {
                state.start_profile_load(settings, app, false);
            }
        }
        KeyCode::Char('r') => {
            if app.profile_window {
                state.start_profile_load(settings, app, true);
            }
        }
        KeyCode::Char('R') => state.start_catalog_load(settings, player),
        _ => {}
    }

    false
}
