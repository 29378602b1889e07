use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{self, LogSettings};

const LOG_FILE: &str = "lebronify.log";

/// Route `tracing` output to the log file. The terminal belongs to the UI,
/// so nothing is ever written to stdout or stderr once it starts.
///
/// Returns the file in use, or an error message when logging stays off.
pub fn init(settings: &LogSettings) -> Result<PathBuf, String> {
    let filter = build_filter(settings)?;
    let path = log_path(settings).ok_or("no state directory for the log file")?;
    let file = open_log(&path)?;

    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(Mutex::new(file));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| format!("failed to initialize logging: {e}"))?;
    Ok(path)
}

/// `RUST_LOG` when set, otherwise the configured directive.
fn build_filter(settings: &LogSettings) -> Result<EnvFilter, String> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&settings.filter).map_err(|e| format!("invalid log filter {:?}: {e}", settings.filter))
}

fn log_path(settings: &LogSettings) -> Option<PathBuf> {
    match &settings.file {
        Some(file) => Some(PathBuf::from(file)),
        None => config::default_state_dir().map(|d| d.join(LOG_FILE)),
    }
}

fn open_log(path: &PathBuf) -> Result<File, String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("cannot create {}: {e}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| format!("cannot open {}: {e}", path.display()))
}
