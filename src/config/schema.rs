use serde::{Deserialize, Serialize};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/lebronify/config.toml` or `~/.config/lebronify/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `LEBRONIFY__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub player: PlayerSettings,
    pub cache: CacheSettings,
    pub catalogue: CatalogueSettings,
    pub media_session: MediaSessionSettings,
    pub storage: StorageSettings,
    pub ui: UiSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Initial output volume, 0.0 to 1.0.
    pub volume: f32,
    /// Whether shuffle starts enabled.
    pub shuffle: bool,
    /// Whether repeat-one starts enabled.
    pub repeat: bool,
    /// Track id selected at startup. Falls back to the first catalogue track.
    pub default_track: Option<String>,
    /// Delay before the single automatic reload after a playback error (milliseconds).
    pub retry_delay_ms: u64,
    /// How long transient notices stay visible (milliseconds).
    pub notice_ms: u64,
    /// Seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            volume: 0.7,
            shuffle: false,
            repeat: false,
            default_track: None,
            retry_delay_ms: 1000,
            notice_ms: 2000,
            scrub_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Origin every asset reference is resolved against. Requests to other
    /// origins bypass the cache.
    pub origin: String,
    /// Cache version tag. Bumping it evicts every bucket of older versions.
    pub version: String,
    /// Prefix used to build bucket names (`<prefix>-cache-<version>`, ...).
    pub bucket_prefix: String,
    /// Paths fetched into the general bucket on install.
    pub precache: Vec<String>,
    /// Page served for navigations when neither network nor cache can answer.
    pub offline_page: String,
    /// Directory where buckets are persisted. In-memory only when unset.
    pub dir: Option<String>,
    /// Network timeout for a single request (milliseconds).
    pub request_timeout_ms: u64,
    /// Activate a freshly installed cache version without waiting.
    pub skip_waiting: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            origin: "http://localhost:3000".to_string(),
            version: "v1".to_string(),
            bucket_prefix: "lebronify".to_string(),
            precache: vec![
                "/".into(),
                "/index.html".into(),
                "/offline.html".into(),
                "/manifest.json".into(),
                "/app.webmanifest".into(),
            ],
            offline_page: "/offline.html".to_string(),
            dir: None,
            request_timeout_ms: 15_000,
            skip_waiting: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogueSettings {
    /// JSON manifest to load instead of the bundled catalogue.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MediaSessionSettings {
    /// Publish now-playing metadata and accept OS media controls (MPRIS).
    pub enabled: bool,
    /// Suffix of the bus name (`org.mpris.MediaPlayer2.<suffix>`).
    pub bus_name: String,
}

impl Default for MediaSessionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            bus_name: "lebronify".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Preferences file (likes, dismissed banners). Defaults to the XDG data dir.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,

    /// Which track fields make up a row in the track list, and in what order.
    ///
    /// Example: ["artist", "title", "album"]
    pub track_fields: Vec<TrackField>,

    /// Separator used to join `track_fields`.
    pub track_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ Strive for greatness ~ ".to_string(),
            track_fields: vec![TrackField::Artist, TrackField::Title],
            track_separator: " - ".to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackField {
    Title,
    #[serde(alias = "artists")]
    Artist,
    #[serde(alias = "primary_artist")]
    PrimaryArtist,
    Album,
    Id,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogSettings {
    /// `tracing-subscriber` filter directive. `RUST_LOG` wins when set.
    pub filter: String,
    /// Log file. Defaults to `lebronify.log` in the XDG state dir.
    pub file: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "lebronify=info".to_string(),
            file: None,
        }
    }
}
