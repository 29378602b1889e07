use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::debug;

use crate::app::{App, Scope, View};
use crate::cache::{CacheClient, WorkerMessage};
use crate::config;
use crate::engine::{Direction, PlayerEvent};
use crate::player::{PlayerControls, PlayerHandle};
use crate::ui;

const VOLUME_STEP: f32 = 0.1;
/// Synthetic touch travel used when a key stands in for a swipe.
const KEY_SWIPE: f32 = 200.0;

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    pending_zz: bool,
    /// Cache service to message from key bindings, when one is running.
    pub cache: Option<CacheClient>,
}

/// Main terminal event loop: handles input, drawing and player notices.
/// Returns `Ok(())` when the user quits.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    player: &PlayerHandle,
    events: &Receiver<PlayerEvent>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let now = Instant::now();
        while let Ok(event) = events.try_recv() {
            if let PlayerEvent::Notice(text) = event {
                app.push_notice(text, now);
            }
        }
        app.sync(player.snapshot());
        app.expire_notice(now);

        let display = app.display_indices();
        terminal.draw(|f| ui::draw(f, app, &display, &settings.ui, &settings.player, now))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, player, state, Instant::now()) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Apply one key press. Returns true when the app should quit.
pub fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    player: &PlayerHandle,
    state: &mut EventLoopState,
    now: Instant,
) -> bool {
    if app.pledge_pending() {
        return handle_pledge_key(key, app, now);
    }
    if app.filter_mode {
        state.pending_gg = false;
        handle_filter_key(key, app, player, now);
        return false;
    }
    if app.view == View::Clips {
        return handle_clips_key(key, app);
    }

    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }
    if key.code != KeyCode::Char('z') {
        state.pending_zz = false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('/') => app.enter_filter_mode(),
        KeyCode::Char('s') => player.toggle_shuffle(),
        KeyCode::Char('S') => {
            app.follow_playback_on();
            player.shuffle_all_tracks();
        }
        KeyCode::Char('r') => player.toggle_repeat(),
        KeyCode::Char('m') => player.toggle_mute(),
        KeyCode::Char('+') | KeyCode::Char('=') => change_volume(app, player, VOLUME_STEP),
        KeyCode::Char('-') => change_volume(app, player, -VOLUME_STEP),
        KeyCode::Char('*') => match app.toggle_like_current() {
            Some(true) => app.push_notice("Added to liked", now),
            Some(false) => app.push_notice("Removed from liked", now),
            None => {}
        },
        KeyCode::Char('f') => app.toggle_view(View::FullPlayer),
        KeyCode::Char('Q') => app.toggle_view(View::Queue),
        KeyCode::Char('v') => app.toggle_view(View::Clips),
        KeyCode::Char('x') => app.dismiss_banner(),
        KeyCode::Char('U') => {
            if let Some(cache) = &state.cache {
                cache.post_message(WorkerMessage::SkipWaiting);
                app.push_notice("Activating offline cache update", now);
            }
        }
        KeyCode::Char('z') => {
            if state.pending_zz {
                state.pending_zz = false;
                if let Some(idx) = app.playing_index() {
                    app.follow_playback_on();
                    app.set_selected(idx);
                }
            } else {
                state.pending_zz = true;
            }
        }
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.follow_playback_off();
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            app.follow_playback_off();
            app.select_last();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Enter => play_selected(app, player),
        KeyCode::Char('a') => {
            if let Some(track) = app.selected_track() {
                player.add_to_queue(&track.id);
            }
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            app.follow_playback_on();
            player.toggle_play();
        }
        KeyCode::Char('l') => {
            app.follow_playback_on();
            player.change_track(Direction::Next);
        }
        KeyCode::Char('h') => {
            app.follow_playback_on();
            player.change_track(Direction::Prev);
        }
        KeyCode::Char('L') => player.seek_by(settings.player.scrub_seconds as f64),
        KeyCode::Char('H') => player.seek_by(-(settings.player.scrub_seconds as f64)),
        _ => {}
    }

    false
}

/// The pledge is modal: agree, try to close it, or quit.
fn handle_pledge_key(key: KeyEvent, app: &mut App, now: Instant) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('y') | KeyCode::Enter => app.agree_to_pledge(),
        KeyCode::Char('x') | KeyCode::Esc => app.refuse_pledge(now),
        _ => {}
    }
    false
}

fn handle_filter_key(key: KeyEvent, app: &mut App, player: &PlayerHandle, now: Instant) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => app.clear_filter(),
        KeyCode::Backspace => app.pop_filter_char(),
        KeyCode::Char('j') | KeyCode::Char('n') if ctrl => app.next(),
        KeyCode::Char('k') | KeyCode::Char('p') if ctrl => app.prev(),
        KeyCode::Down => app.next(),
        KeyCode::Up => app.prev(),
        KeyCode::Char(c) => {
            if !c.is_control() {
                app.push_filter_char(c);
            }
        }
        KeyCode::Enter => {
            if app.display_indices().is_empty() {
                if let Scope::NotFound(msg) = app.scope() {
                    app.push_notice(msg, now);
                }
                return;
            }
            app.exit_filter_mode();
            app.follow_playback_on();
            play_selected(app, player);
        }
        _ => {}
    }
}

fn handle_clips_key(key: KeyEvent, app: &mut App) -> bool {
    if key.code == KeyCode::Char('q') {
        return true;
    }
    if matches!(key.code, KeyCode::Char('v') | KeyCode::Esc) {
        app.toggle_view(View::Clips);
        return false;
    }
    let Some(feed) = app.feed_mut() else {
        return false;
    };
    // An upward drag (end above start) advances, like a touch swipe.
    let actions = match key.code {
        KeyCode::Char('j') | KeyCode::Down => feed.swipe(KEY_SWIPE, 0.0),
        KeyCode::Char('k') | KeyCode::Up => feed.swipe(0.0, KEY_SWIPE),
        KeyCode::Char(' ') | KeyCode::Char('p') => feed.toggle_pause(),
        _ => Vec::new(),
    };
    if !actions.is_empty() {
        debug!(?actions, "clip feed actions");
    }
    false
}

/// Play the selected track, or resume it when it is the paused current one.
fn play_selected(app: &mut App, player: &PlayerHandle) {
    let Some(id) = app.selected_track().map(|t| t.id.clone()) else {
        return;
    };
    let is_current = app.playing_index() == Some(app.selected);
    if is_current && app.is_playing() {
        return;
    }
    app.follow_playback_on();
    if is_current {
        player.play();
    } else {
        player.play_track_by_id(&id);
    }
}

fn change_volume(app: &App, player: &PlayerHandle, delta: f32) {
    let Some(snap) = &app.snapshot else {
        return;
    };
    let base = if snap.state.muted { 0.0 } else { snap.state.volume };
    player.set_volume((base + delta).clamp(0.0, 1.0));
}
