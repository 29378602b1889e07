use std::env;
use std::mem;
use std::time::{Duration, Instant};

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::player::PlayerControls;

mod event_loop;
mod logging;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, problem) = settings::load_settings();

    if env::args().skip(1).any(|a| a == "--print-config") {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    match logging::init(&settings.log) {
        Ok(path) => info!(path = %path.display(), "lebronify starting"),
        Err(msg) => eprintln!("lebronify: logging disabled: {msg}"),
    }
    if let Some(problem) = problem {
        warn!("{problem}, using defaults");
    }

    let mut services = startup::start(&settings)?;
    let player = services.player.handle();
    let events = player.subscribe();
    let mut app = App::new(services.catalogue.clone(), &settings.ui, mem::take(&mut services.prefs))
        .with_notice_ttl(Duration::from_millis(settings.player.notice_ms));
    if !settings.cache.skip_waiting {
        app.push_notice("A new offline cache waits for activation: press U", Instant::now());
    }

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState::default();
    state.cache = Some(services.cache.clone());
    let run_result = event_loop::run(&mut terminal, &settings, &mut app, &player, &events, &mut state);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    services.shutdown();
    info!("lebronify stopped");
    run_result
}
