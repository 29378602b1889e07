use super::load::{default_config_path, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_lebronify_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("LEBRONIFY_CONFIG_PATH", "/tmp/lebronify-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/lebronify-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("lebronify")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("lebronify")
            .join("config.toml")
    );
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[player]
volume = 0.25
shuffle = true
repeat = true
default_track = "track-3"
retry_delay_ms = 250

[cache]
origin = "https://bron.example"
version = "v7"
precache = ["/", "/offline.html"]

[media_session]
enabled = false

[ui]
header_text = "hello"
track_fields = ["primary-artist", "title", "album"]
track_separator = " • "
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("LEBRONIFY_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("LEBRONIFY__PLAYER__VOLUME");

    let s = Settings::load().unwrap();
    assert_eq!(s.player.volume, 0.25);
    assert!(s.player.shuffle);
    assert!(s.player.repeat);
    assert_eq!(s.player.default_track.as_deref(), Some("track-3"));
    assert_eq!(s.player.retry_delay_ms, 250);
    // Untouched keys keep their defaults.
    assert_eq!(s.player.notice_ms, 2000);
    assert_eq!(s.cache.origin, "https://bron.example");
    assert_eq!(s.cache.version, "v7");
    assert_eq!(s.cache.precache, vec!["/".to_string(), "/offline.html".to_string()]);
    assert_eq!(s.cache.offline_page, "/offline.html");
    assert!(!s.media_session.enabled);
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(s.ui.track_fields.len(), 3);
    assert!(matches!(s.ui.track_fields[0], TrackField::PrimaryArtist));
    assert!(matches!(s.ui.track_fields[2], TrackField::Album));
    assert_eq!(s.ui.track_separator, " • ");
    assert!(s.validate().is_ok());
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[player]
retry_delay_ms = 1000
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("LEBRONIFY_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("LEBRONIFY__PLAYER__RETRY_DELAY_MS", "0");

    let s = Settings::load().unwrap();
    assert_eq!(s.player.retry_delay_ms, 0);
}

#[test]
fn validate_rejects_out_of_range_volume_and_bad_origin() {
    let mut s = Settings::default();
    assert!(s.validate().is_ok());

    s.player.volume = 1.5;
    assert!(s.validate().is_err());

    s.player.volume = 0.5;
    s.cache.origin = "not a url".to_string();
    assert!(s.validate().is_err());
}

#[test]
fn defaults_render_as_toml() {
    let text = Settings::default().to_toml().unwrap();
    assert!(text.contains("[player]"));
    assert!(text.contains("[cache]"));
    assert!(text.contains("skip_waiting = true"));
}
