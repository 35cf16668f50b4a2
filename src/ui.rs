//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.
//! Everything here reads the player; nothing mutates it.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::{App, PlaybackState, ProfilePanel};
use crate::audio::AudioOutput;
use crate::config::{ControlsSettings, TimeField, TrackDisplayField, UiSettings};
use crate::profile::{MediaListEntry, ProfileData, score_label, top_rated};
use crate::session::{EffectiveTrack, LoadState, Player, SwitchState};

static CONTROLS_MAP: LazyLock<BTreeMap<String, String>> = LazyLock::new(|| {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    map.insert("j/k".to_string(), "up/down".to_string());
    map.insert("gg/G".to_string(), "top/bottom".to_string());
    map.insert("enter".to_string(), "select song".to_string());
    map.insert("space/p".to_string(), "play/pause".to_string());
    map.insert("h/l".to_string(), "prev/next song".to_string());
    // H/L is filled dynamically from config.
    map.insert("+/-".to_string(), "volume".to_string());
    map.insert("m".to_string(), "switch catalog".to_string());
    map.insert("t".to_string(), "swap track".to_string());
    map.insert("K".to_string(), "details".to_string());
    map.insert("a".to_string(), "profile".to_string());
    map.insert("R".to_string(), "reload".to_string());
    map.insert("q".to_string(), "quit".to_string());
    map
});

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    // Keep the rendered order stable and human-friendly.
    let order = [
        "j/k", "h/l", "H/L", "enter", "space/p", "+/-", "m", "t", "gg/G", "K", "a", "R", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Build the "now playing" track text according to `ui` settings.
fn now_playing_track_text(track: &EffectiveTrack<'_>, ui: &UiSettings) -> String {
    let parts: Vec<&str> = ui
        .now_playing_track_fields
        .iter()
        .map(|f| match f {
            TrackDisplayField::Title => track.title(),
            TrackDisplayField::Author => track.author(),
            TrackDisplayField::Id => track.id(),
        })
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        track.title().to_string()
    } else {
        parts.join(&ui.now_playing_track_separator)
    }
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(
    elapsed: Duration,
    total: Option<Duration>,
    ui: &UiSettings,
) -> Option<String> {
    if ui.now_playing_time_fields.is_empty() {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    for f in &ui.now_playing_time_fields {
        match f {
            TimeField::Elapsed => parts.push(format_mmss(elapsed)),
            TimeField::Total => {
                if let Some(t) = total {
                    parts.push(format_mmss(t));
                }
            }
            TimeField::Remaining => {
                if let Some(t) = total {
                    let rem = t.saturating_sub(elapsed);
                    parts.push(format!("-{}", format_mmss(rem)));
                }
            }
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

/// Fraction of the track played, `0.0` while the duration is unknown.
fn progress_ratio(elapsed: Duration, total: Option<Duration>) -> f64 {
    match total {
        Some(t) if !t.is_zero() => (elapsed.as_secs_f64() / t.as_secs_f64()).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn dash_if_empty(s: &str) -> &str {
    if s.trim().is_empty() { "-" } else { s }
}

fn padded_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding {
            left: 1,
            right: 0,
            top: 0,
            bottom: 0,
        })
}

fn status_text<O: AudioOutput>(app: &App, player: &Player<O>, ui: &UiSettings) -> String {
    let mut parts: Vec<String> = Vec::new();

    let mode = match player.switch_state() {
        SwitchState::Stable(mode) => format!("CATALOG: {}", mode.label()),
        SwitchState::Switching { to, .. } => format!("CATALOG: switching to {}", to.label()),
    };
    parts.push(mode);

    if app.follow_playback {
        parts.push("CURSOR: Follow".to_string());
    } else {
        parts.push("CURSOR: Free-roam".to_string());
    }

    match player.load_state() {
        LoadState::Loading if !player.is_ready() => parts.push("Loading catalogs...".to_string()),
        LoadState::Loading => parts.push("Reloading catalogs...".to_string()),
        LoadState::Failed(msg) if !player.is_ready() => {
            parts.push(format!("Catalogs unavailable: {msg} ([R] to retry)"))
        }
        LoadState::Failed(msg) => parts.push(format!("Reload failed: {msg}")),
        LoadState::Ready => {}
    }

    let session = player.session();
    if let Some(track) = player.effective_track() {
        let song = now_playing_track_text(&track, ui);
        match now_playing_time_text(session.position, session.duration, ui) {
            Some(time) => parts.push(format!("Song: {} [{}]", song, time)),
            None => parts.push(format!("Song: {}", song)),
        }
        if track.is_substituted() {
            parts.push("SWAPPED".to_string());
        }
    }

    let state = PlaybackState::from_session(player.current_track().is_some(), session.playing);
    parts.push(state.label().to_string());
    parts.push(format!("Vol: {:.0}%", session.volume * 100.0));

    if let Some(msg) = app.status.as_deref().or(player.last_error()) {
        parts.push(msg.to_string());
    }

    parts.join(" • ")
}

fn details_text<O: AudioOutput>(player: &Player<O>) -> String {
    let Some(track) = player.effective_track() else {
        return "No track selected".to_string();
    };
    let session = player.session();
    let override_line = if track.is_substituted() {
        "active ([t] restores)"
    } else if player.has_override() {
        "available ([t] swaps)"
    } else {
        "-"
    };

    format!(
        "Id: {}\nTitle: {}\nAuthor: {}\nAuthor url: {}\nThumbnail: {}\nAudio: {}\nDuration: {}\nOverride: {}",
        track.id(),
        track.title(),
        dash_if_empty(track.author()),
        dash_if_empty(track.author_url()),
        dash_if_empty(track.thumbnail()),
        track.audio(),
        session
            .duration
            .map(format_mmss)
            .unwrap_or_else(|| "-".to_string()),
        override_line,
    )
}

const PROFILE_LIST_PREVIEW: usize = 5;

fn media_list_lines(label: &str, entries: &[MediaListEntry]) -> String {
    if entries.is_empty() {
        return format!("{label}: nothing to show");
    }
    let mut out = format!("{label} ({} entries), top rated:", entries.len());
    for entry in top_rated(entries, PROFILE_LIST_PREVIEW) {
        out.push_str(&format!(
            "\n  {} [{}] {}",
            entry.media.title.display(),
            entry.status.as_deref().unwrap_or("-"),
            score_label(entry.score),
        ));
    }
    out
}

fn profile_text(data: &ProfileData) -> String {
    let profile = &data.user;
    let stats = &profile.statistics;
    let about = profile
        .about_preview()
        .unwrap_or_else(|| "No bio".to_string());
    let banner = profile.banner_image.as_deref().unwrap_or("No banner");

    let mut text = format!(
        "{}\n{}\n\nAnime: {} titles, {} episodes, mean score {}\nManga: {} titles, {} chapters, mean score {}\n\nBanner: {}",
        profile.name,
        about,
        stats.anime.count,
        stats.anime.episodes_watched,
        score_label(stats.anime.mean_score),
        stats.manga.count,
        stats.manga.chapters_read,
        score_label(stats.manga.mean_score),
        banner,
    );

    text.push_str("\n\nRecent activity:");
    if data.activities.is_empty() {
        text.push_str(" nothing to show");
    }
    for activity in &data.activities {
        let title = activity
            .media
            .as_ref()
            .map_or("Untitled", |m| m.title.display());
        text.push_str(&format!(
            "\n  {} {} {}",
            activity.date_label(),
            activity.summary(),
            title
        ));
    }

    text.push_str("\n\n");
    text.push_str(&media_list_lines("Anime list", &data.anime_list));
    text.push_str("\n\n");
    text.push_str(&media_list_lines("Manga list", &data.manga_list));
    text
}

/// Render the entire UI into the provided `frame` using `app` and `player` state.
pub fn draw<O: AudioOutput>(
    frame: &mut Frame,
    app: &App,
    player: &Player<O>,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" tandem ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Status box
    let status_par = Paragraph::new(status_text(app, player, ui_settings))
        .block(padded_block(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    // Progress
    {
        let session = player.session();
        let label = now_playing_time_text(session.position, session.duration, ui_settings)
            .unwrap_or_default();
        let mut gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" progress "))
            .ratio(progress_ratio(session.position, session.duration))
            .label(label);
        if player.is_settling() {
            gauge = gauge.slow_blink();
        }
        frame.render_widget(gauge, chunks[2]);
    }

    // Main list
    {
        let tracks = player.active_catalog().map(|c| c.tracks()).unwrap_or(&[]);
        let current = player
            .current_track()
            .map(|_| player.session().index);

        // Center the cursor when possible by creating a visible window.
        let total = tracks.len();
        let list_height = chunks[3].height.saturating_sub(2) as usize;
        let sel_pos = app.cursor.min(total.saturating_sub(1));
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let visible_items: Vec<ListItem> = tracks[start..end]
            .iter()
            .enumerate()
            .map(|(offset, t)| {
                let i = start + offset;
                let text = if t.author.trim().is_empty() {
                    t.title.clone()
                } else {
                    format!("{} - {}", t.title, t.author)
                };
                if Some(i) == current {
                    ListItem::new(format!("♪ {text}")).bold()
                } else {
                    ListItem::new(format!("  {text}"))
                }
            })
            .collect();

        let title = format!(" {} tracks ", player.mode().label());
        let list = List::new(visible_items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[3], &mut state);
    }

    // Overlay popups (keep list visible under them)
    if app.details_window {
        let popup_area = centered_rect_sized(80, 10, chunks[3]);
        frame.render_widget(Clear, popup_area);
        let details = Paragraph::new(details_text(player))
            .block(padded_block(" details (K closes) "))
            .wrap(Wrap { trim: true });
        frame.render_widget(details, popup_area);
    }

    if app.profile_window {
        let popup_area = centered_rect_sized(90, 40, frame.area());
        frame.render_widget(Clear, popup_area);
        let text = match &app.profile {
            ProfilePanel::NotLoaded | ProfilePanel::Loading => "Loading profile...".to_string(),
            ProfilePanel::Loaded(profile) => profile_text(profile),
            ProfilePanel::Failed(e) => format!("Failed to load profile: {e}\n\n[r] retry"),
        };
        let profile = Paragraph::new(text)
            .block(padded_block(" profile (a closes, r refreshes) "))
            .wrap(Wrap { trim: true });
        frame.render_widget(profile, popup_area);
    }

    let footer = Paragraph::new(controls_text(controls_settings.scrub_seconds))
        .block(padded_block(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}
