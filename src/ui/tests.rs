use super::*;
use crate::catalogue::Catalogue;
use crate::engine::PlaybackState;
use crate::prefs::PrefsStore;
use ratatui::{Terminal, backend::TestBackend};
use std::sync::Arc;

fn first_run_app() -> App {
    let catalogue = Arc::new(Catalogue::bundled().unwrap());
    App::new(catalogue, &UiSettings::default(), PrefsStore::in_memory())
}

fn bundled_app() -> App {
    let mut app = first_run_app();
    app.agree_to_pledge();
    app
}

fn snapshot(app: &App, index: usize, position: f64) -> PlaybackSnapshot {
    let track = app.tracks()[index].clone();
    PlaybackSnapshot {
        phase: Phase::Playing,
        state: PlaybackState {
            track_id: track.id.clone(),
            playing: true,
            position,
            duration: track.duration,
            volume: 0.7,
            muted: false,
            shuffle: true,
            repeat: false,
            buffering: false,
        },
        queue: vec![app.tracks()[3].clone()],
        track,
    }
}

fn render(app: &App) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
    let display = app.display_indices();
    terminal
        .draw(|f| {
            draw(
                f,
                app,
                &display,
                &UiSettings::default(),
                &PlayerSettings::default(),
                Instant::now(),
            )
        })
        .unwrap();
    terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|c| c.symbol())
        .collect()
}

#[test]
fn format_mmss_clamps_bad_input() {
    assert_eq!(format_mmss(0.0), "00:00");
    assert_eq!(format_mmss(182.9), "03:02");
    assert_eq!(format_mmss(-4.0), "00:00");
    assert_eq!(format_mmss(f64::NAN), "00:00");
}

#[test]
fn controls_text_includes_scrub_seconds() {
    let text = controls_text(5);
    assert!(text.contains("[H/L] scrub -/+5s"));
    assert!(text.contains("[a] add to queue"));
    assert!(text.starts_with("[j/k] up/down"));
}

#[test]
fn library_view_shows_rows_and_mini_player() {
    let mut app = bundled_app();
    app.sync(Some(snapshot(&app, 0, 62.0)));
    let screen = render(&app);

    assert!(screen.contains("LeBron James - Sunshine"));
    assert!(screen.contains("Sunshine - LeBron James"));
    assert!(screen.contains("[01:02 / 03:02]"));
    assert!(screen.contains("SHUFFLE: On"));
    assert!(screen.contains("[j/k] up/down"));
}

#[test]
fn not_found_scope_is_reported() {
    let mut app = bundled_app();
    app.filter_query = "artist:Kobe".into();
    let screen = render(&app);
    assert!(screen.contains("Artist \"Kobe\" not found"));
}

#[test]
fn queue_and_player_views_render_snapshot() {
    let mut app = bundled_app();
    app.sync(Some(snapshot(&app, 7, 0.0)));

    app.toggle_view(View::Queue);
    assert!(render(&app).contains("1. TV Off - LeBron James"));

    app.toggle_view(View::FullPlayer);
    let screen = render(&app);
    assert!(screen.contains("now playing"));
    assert!(screen.contains("Artwork: /placeholder.svg"));
}

#[test]
fn dismissed_banner_hides_controls() {
    let mut app = bundled_app();
    app.dismiss_banner();
    assert!(!render(&app).contains("[j/k] up/down"));
}

#[test]
fn pledge_popup_shows_until_agreed() {
    let mut app = first_run_app();
    let screen = render(&app);
    assert!(screen.contains("The LeBron Pledge"));
    assert!(screen.contains("[y] I Solemnly Pledge"));

    app.agree_to_pledge();
    assert!(!render(&app).contains("The LeBron Pledge"));
}
