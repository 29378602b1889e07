//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Instant};

use crate::app::{App, Scope, View};
use crate::config::{PlayerSettings, UiSettings};
use crate::engine::{Phase, PlaybackSnapshot};
use crate::feed::ClipStatus;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("gg/G", "top/bottom");
    map.insert("enter", "play selected");
    map.insert("a", "add to queue");
    map.insert("space/p", "play/pause");
    map.insert("h/l", "prev/next");
    // H/L is filled dynamically from config.
    map.insert("s/S", "shuffle/shuffle all");
    map.insert("r", "repeat");
    map.insert("m", "mute");
    map.insert("+/-", "volume");
    map.insert("*", "like");
    map.insert("f", "player");
    map.insert("Q", "queue");
    map.insert("v", "clips");
    map.insert("/", "filter");
    map.insert("x", "hide controls");
    map.insert("q", "quit");
    map
});

const PLEDGE_TEXT: &str = "LeBron isn't just a man. He's a phenomenon. He's a celestial event, a \
once-in-a-lifetime alignment of the stars, a cosmic masterpiece sculpted by the basketball gods themselves.";
const LAKERS_PURPLE: Color = Color::Rgb(0x55, 0x25, 0x83);
const LAKERS_GOLD: Color = Color::Rgb(0xFD, 0xB9, 0x27);

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    let order = [
        "j/k", "h/l", "H/L", "enter", "a", "space/p", "gg/G", "s/S", "r", "m", "+/-", "*", "f", "Q",
        "v", "/", "x", "q",
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

/// Format seconds as `MM:SS`. Negative and non-finite values read as zero.
fn format_mmss(secs: f64) -> String {
    let secs = if secs.is_finite() { secs.max(0.0) as u64 } else { 0 };
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn progress_ratio(snap: &PlaybackSnapshot) -> f64 {
    if snap.state.duration > 0.0 {
        (snap.state.position / snap.state.duration).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn phase_label(snap: &PlaybackSnapshot) -> &'static str {
    match snap.phase {
        Phase::Idle => "Stopped",
        Phase::Loading => "Loading",
        Phase::Ready => "Ready",
        Phase::Playing if snap.state.buffering => "Buffering",
        Phase::Playing => "Playing",
        Phase::Paused => "Paused",
        Phase::Ended => "Ended",
        Phase::Errored => "Error",
    }
}

fn volume_label(snap: &PlaybackSnapshot) -> String {
    if snap.state.muted || snap.state.volume <= 0.0 {
        "Muted".to_string()
    } else {
        format!("{}%", (snap.state.volume * 100.0).round() as u32)
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(3);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn padded(title: &str) -> Block<'_> {
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

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    display: &[usize],
    ui_settings: &UiSettings,
    player_settings: &PlayerSettings,
    now: Instant,
) {
    let footer_height = if app.banner_visible() { 4 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(footer_height),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" lebronify ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    draw_status(frame, app, chunks[1]);

    match app.view {
        View::Library => draw_track_list(frame, app, display, chunks[2]),
        View::FullPlayer => draw_full_player(frame, app, chunks[2]),
        View::Queue => draw_queue(frame, app, chunks[2]),
        View::Clips => draw_clips(frame, app, chunks[2]),
    }

    draw_mini_player(frame, app, chunks[3]);

    if app.pledge_pending() {
        draw_pledge(frame, app, chunks[2]);
    }

    if let Some(text) = app.notice(now) {
        let width = (text.chars().count() as u16).saturating_add(4);
        let area = centered_rect_sized(width, 3, chunks[2]);
        frame.render_widget(Clear, area);
        let notice = Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::bordered())
            .wrap(Wrap { trim: true });
        frame.render_widget(notice, area);
    }

    if footer_height > 0 {
        let footer = Paragraph::new(controls_text(player_settings.scrub_seconds))
            .block(padded(" controls "))
            .wrap(Wrap { trim: true });
        frame.render_widget(footer, chunks[4]);
    }
}

fn draw_pledge(frame: &mut Frame, app: &App, area: Rect) {
    let popup = centered_rect_sized(70, 9, area);
    frame.render_widget(Clear, popup);

    let mut block = Block::bordered()
        .title(" The LeBron Pledge ")
        .title_alignment(Alignment::Center);
    let mut style = Style::default();
    if app.lakers_mode() {
        block = block.border_style(Style::default().fg(LAKERS_GOLD));
        style = style.fg(Color::White).bg(LAKERS_PURPLE);
    }
    let text = format!("{PLEDGE_TEXT}\n\n[y] I Solemnly Pledge My Allegiance to King James");
    let pledge = Paragraph::new(text)
        .style(style)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(pledge, popup);
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let mut parts: Vec<String> = Vec::new();

    if app.follow_playback {
        parts.push("CURSOR: Follow".to_string());
    } else {
        parts.push("CURSOR: Free-roam".to_string());
    }

    if let Some(snap) = &app.snapshot {
        parts.push(format!("SHUFFLE: {}", if snap.state.shuffle { "On" } else { "Off" }));
        parts.push(format!("REPEAT: {}", if snap.state.repeat { "One" } else { "Off" }));
        parts.push(format!("VOLUME: {}", volume_label(snap)));
    }

    let q = app.filter_query.trim();
    if app.filter_mode || !q.is_empty() {
        let mut filter_part = String::from("FILTER:");
        if !q.is_empty() {
            filter_part.push(' ');
            filter_part.push_str(q);
        }
        parts.push(filter_part);
    }

    let status = Paragraph::new(parts.join(" • "))
        .block(padded(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, area);
}

fn draw_track_list(frame: &mut Frame, app: &App, display: &[usize], area: Rect) {
    let title = match app.scope() {
        Scope::All => " tracks ".to_string(),
        Scope::Album(name) => format!(" album: {name} "),
        Scope::Artist(name) => format!(" artist: {name} "),
        Scope::NotFound(msg) => {
            let empty = Paragraph::new(msg).alignment(Alignment::Center).block(Block::bordered().title(" tracks "));
            frame.render_widget(empty, area);
            return;
        }
    };

    let q = app.fuzzy_query();
    let fuzzy = matches!(app.scope(), Scope::All) && !q.is_empty();
    let query_lower = (fuzzy && app.uses_lower_rows()).then(|| q.to_ascii_lowercase());
    let playing = app.playing_index();

    // Only build ListItems for the visible window, centred on the selection.
    let total = display.len();
    let list_height = area.height.saturating_sub(2) as usize;
    let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
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

    let visible_items: Vec<ListItem> = display[start..end]
        .iter()
        .map(|&i| {
            let row = app.row(i);
            let marker = if Some(i) == playing { "♪ " } else { "  " };
            let liked = if app.is_liked(&app.tracks()[i].id) { " ♥" } else { "" };
            if !fuzzy {
                return ListItem::new(format!("{marker}{row}{liked}"));
            }

            let positions = match query_lower.as_deref() {
                Some(ql) => app.fuzzy_match_positions_for_row_lower(i, ql),
                None => App::fuzzy_match_positions(row, q),
            };
            let Some(positions) = positions else {
                return ListItem::new(format!("{marker}{row}{liked}"));
            };

            let mut rendered = String::from(marker);
            let mut pos_iter = positions.into_iter();
            let mut next_pos = pos_iter.next();
            for (ci, ch) in row.chars().enumerate() {
                if next_pos == Some(ci) {
                    rendered.extend(ch.to_uppercase());
                    next_pos = pos_iter.next();
                } else {
                    rendered.push(ch);
                }
            }
            rendered.push_str(liked);
            ListItem::new(rendered)
        })
        .collect();

    let list = List::new(visible_items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if total > 0 {
        state.select(Some(selected_pos_in_visible));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_full_player(frame: &mut Frame, app: &App, area: Rect) {
    let Some(snap) = &app.snapshot else {
        let empty = Paragraph::new("Nothing selected").block(Block::bordered().title(" now playing "));
        frame.render_widget(empty, area);
        return;
    };
    let track = &snap.track;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(area);

    let liked = if app.is_liked(&track.id) { "♥ liked" } else { "♡" };
    let details = format!(
        "{}\n{}\n\nArtist: {}\nAlbum: {}\nArtwork: {}\n\n{}  {}",
        track.title,
        track.primary_artist(),
        track.artist,
        track.album,
        track.cover_or_placeholder(),
        phase_label(snap),
        liked,
    );
    let panel = Paragraph::new(details)
        .block(padded(" now playing "))
        .wrap(Wrap { trim: true });
    frame.render_widget(panel, rows[0]);

    let label = format!(
        "{} / {}",
        format_mmss(snap.state.position),
        format_mmss(snap.state.duration)
    );
    let gauge = Gauge::default()
        .block(Block::bordered())
        .ratio(progress_ratio(snap))
        .label(label);
    frame.render_widget(gauge, rows[1]);
}

fn draw_queue(frame: &mut Frame, app: &App, area: Rect) {
    let queue = app.snapshot.as_ref().map(|s| s.queue.as_slice()).unwrap_or_default();
    let items: Vec<ListItem> = if queue.is_empty() {
        vec![ListItem::new("Queue is empty")]
    } else {
        queue
            .iter()
            .enumerate()
            .map(|(n, t)| ListItem::new(format!("{:>2}. {} - {}", n + 1, t.title, t.artist)))
            .collect()
    };
    let list = List::new(items).block(Block::bordered().title(" up next "));
    frame.render_widget(list, area);
}

fn draw_clips(frame: &mut Frame, app: &App, area: Rect) {
    let Some(feed) = app.feed() else {
        let empty = Paragraph::new("No clips").block(Block::bordered().title(" clips "));
        frame.render_widget(empty, area);
        return;
    };

    let items: Vec<ListItem> = feed
        .clips()
        .iter()
        .enumerate()
        .map(|(i, clip)| {
            let status = match feed.status(i) {
                ClipStatus::Idle => "  ",
                ClipStatus::Preloaded => "··",
                ClipStatus::Playing => "▶ ",
                ClipStatus::Paused => "❚❚",
            };
            ListItem::new(format!("{status} {}", clip.title))
        })
        .collect();

    let list = List::new(items)
        .block(Block::bordered().title(" clips (j/k swipe, space pause) "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    if !feed.clips().is_empty() {
        state.select(Some(feed.current_index()));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_mini_player(frame: &mut Frame, app: &App, area: Rect) {
    let text = match &app.snapshot {
        Some(snap) => {
            let icon = if snap.state.playing { "▶" } else { "❚❚" };
            let liked = if app.is_liked(&snap.track.id) { " ♥" } else { "" };
            format!(
                "{icon} {} - {}{liked}  [{} / {}] {}",
                snap.track.title,
                snap.track.primary_artist(),
                format_mmss(snap.state.position),
                format_mmss(snap.state.duration),
                phase_label(snap),
            )
        }
        None => "Stopped".to_string(),
    };
    let bar = Paragraph::new(text).bold().block(padded(" playing "));
    frame.render_widget(bar, area);
}

#[cfg(test)]
mod tests;
