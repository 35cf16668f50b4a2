use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio::AudioPlayer;
use crate::catalog::spawn_catalog_load;
use crate::http;
use crate::mpris::ControlCmd;
use crate::session::{OverrideRegistry, Player};

mod event_loop;
mod logging;
mod mpris_sync;
mod settings;

pub fn run() -> anyhow::Result<()> {
    let (settings, settings_warning) = settings::load_settings();

    match logging::setup_logging(&settings.logging) {
        Ok(Some(path)) => log::info!("tandem {} logging to {}", env!("CARGO_PKG_VERSION"), path.display()),
        Ok(None) => {}
        // Logging is optional; the player still runs without it.
        Err(e) => eprintln!("tandem: logging disabled: {e:#}"),
    }
    if let Some(warning) = settings_warning {
        log::warn!("{warning}");
    }

    let agent = http::agent(&settings.network);
    let (audio_player, output_rx) = AudioPlayer::new(agent.clone(), settings.audio.clone());
    let overrides = OverrideRegistry::from_settings(&settings.overrides);
    log::debug!("{} content overrides registered", overrides.len());
    let mut player = Player::new(audio_player, overrides, &settings.playback);
    let mut app = App::new(settings.ui.follow_playback);

    let catalog_rx = spawn_catalog_load(agent.clone(), settings.catalogs.clone());

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx.clone());

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState::new(agent, catalog_rx, output_rx);
    let run_result = event_loop::run(
        &mut terminal,
        &settings,
        &mut app,
        &mut player,
        &mpris,
        &control_tx,
        &control_rx,
        &mut state,
    );

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &run_result {
        log::error!("event loop failed: {e:#}");
    }
    run_result
}
