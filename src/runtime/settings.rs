use crate::config;

/// Load settings, falling back to defaults on any problem. The problem is
/// returned so it can be logged once logging is up.
pub fn load_settings() -> (config::Settings, Option<String>) {
    match config::Settings::load() {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                eprintln!("lebronify: invalid config, using defaults: {msg}");
                (config::Settings::default(), Some(format!("invalid config: {msg}")))
            } else {
                (s, None)
            }
        }
        Err(e) => {
            // Config is optional; failures should not prevent the app from starting.
            eprintln!("lebronify: failed to load config, using defaults: {e}");
            (config::Settings::default(), Some(format!("failed to load config: {e}")))
        }
    }
}
