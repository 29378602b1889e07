use std::collections::HashMap;

use serde::Deserialize;

/// Artwork shown when a record carries no cover of its own.
pub const PLACEHOLDER_ART: &str = "/placeholder.svg";

/// A playable audio track. Never created or mutated at runtime.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    /// Comma-separated artist list; the first entry is the primary artist.
    pub artist: String,
    pub album: String,
    #[serde(default)]
    pub cover_url: String,
    pub audio_url: String,
    /// Nominal duration in seconds. The loaded media is authoritative.
    #[serde(default)]
    pub duration: f64,
}

impl Track {
    /// First name of the comma-separated artist list.
    pub fn primary_artist(&self) -> &str {
        self.artist.split(',').next().unwrap_or("").trim()
    }

    /// Every artist credited on the track, trimmed.
    pub fn artists(&self) -> impl Iterator<Item = &str> {
        self.artist.split(',').map(str::trim).filter(|a| !a.is_empty())
    }

    /// Cover reference, or the placeholder when the track has none.
    pub fn cover_or_placeholder(&self) -> &str {
        if self.cover_url.trim().is_empty() {
            PLACEHOLDER_ART
        } else {
            &self.cover_url
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub albums: Vec<String>,
}

/// A short video clip shown in the swipe feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub video_url: String,
    #[serde(default)]
    pub thumbnail_url: String,
}

/// On-disk shape of a catalogue manifest.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(super) struct Manifest {
    pub tracks: Vec<Track>,
    pub artists: Vec<Artist>,
    pub videos: Vec<Video>,
    /// Lowercased album name -> canonical album name.
    pub album_redirects: HashMap<String, String>,
    /// Nickname -> artist name.
    pub artist_aliases: HashMap<String, String>,
}
