use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use super::model::{Artist, Manifest, Track, Video};

const BUNDLED_MANIFEST: &str = include_str!("../../assets/catalogue.json");

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("failed to read catalogue {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed catalogue manifest: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalogue has no tracks")]
    Empty,
    #[error("duplicate track id {0:?}")]
    DuplicateId(String),
}

/// Read-only dataset of tracks, artists and clips, queried by id or name.
#[derive(Debug)]
pub struct Catalogue {
    tracks: Vec<Track>,
    index: HashMap<String, usize>,
    artists: Vec<Artist>,
    videos: Vec<Video>,
    album_redirects: HashMap<String, String>,
    artist_aliases: HashMap<String, String>,
}

/// Result of an album lookup: the canonical album name and its tracks in
/// catalogue order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumMatch<'a> {
    pub name: &'a str,
    pub tracks: Vec<&'a Track>,
}

/// Result of an artist lookup. Artists without a profile that still appear
/// on tracks resolve to `Featured`.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtistMatch<'a> {
    Profile(&'a Artist),
    Featured { name: String, albums: Vec<&'a str> },
}

impl ArtistMatch<'_> {
    pub fn name(&self) -> &str {
        match self {
            ArtistMatch::Profile(a) => &a.name,
            ArtistMatch::Featured { name, .. } => name,
        }
    }
}

impl Catalogue {
    /// The catalogue shipped inside the binary.
    pub fn bundled() -> Result<Self, CatalogueError> {
        Self::from_json(BUNDLED_MANIFEST)
    }

    /// Load a JSON manifest from disk.
    pub fn load(path: &Path) -> Result<Self, CatalogueError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogueError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, CatalogueError> {
        let manifest: Manifest = serde_json::from_str(text)?;
        let mut catalogue = Self::new(manifest.tracks)?;
        catalogue.artists = manifest.artists;
        catalogue.videos = manifest.videos;
        catalogue.album_redirects = manifest
            .album_redirects
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        catalogue.artist_aliases = manifest.artist_aliases;
        Ok(catalogue)
    }

    /// Build a catalogue from tracks alone, without artists, clips or aliases.
    pub fn new(tracks: Vec<Track>) -> Result<Self, CatalogueError> {
        if tracks.is_empty() {
            return Err(CatalogueError::Empty);
        }
        let mut index = HashMap::with_capacity(tracks.len());
        for (i, t) in tracks.iter().enumerate() {
            if index.insert(t.id.clone(), i).is_some() {
                return Err(CatalogueError::DuplicateId(t.id.clone()));
            }
        }
        Ok(Self {
            tracks,
            index,
            artists: Vec::new(),
            videos: Vec::new(),
            album_redirects: HashMap::new(),
            artist_aliases: HashMap::new(),
        })
    }

    pub fn with_artists(mut self, artists: Vec<Artist>, aliases: HashMap<String, String>) -> Self {
        self.artists = artists;
        self.artist_aliases = aliases;
        self
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn videos(&self) -> &[Video] {
        &self.videos
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn track(&self, id: &str) -> Option<&Track> {
        self.index.get(id).map(|&i| &self.tracks[i])
    }

    /// Position of `id` in catalogue order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn first(&self) -> &Track {
        &self.tracks[0]
    }

    /// Catalogue-order successor of `id`, wrapping at the end.
    pub fn successor(&self, id: &str) -> Option<&Track> {
        let pos = self.position(id)?;
        Some(&self.tracks[(pos + 1) % self.tracks.len()])
    }

    /// Catalogue-order predecessor of `id`, wrapping at the start.
    pub fn predecessor(&self, id: &str) -> Option<&Track> {
        let pos = self.position(id)?;
        let len = self.tracks.len();
        Some(&self.tracks[(pos + len - 1) % len])
    }

    /// Find an album by name.
    ///
    /// Tries, in order: case-insensitive exact name, the redirect table for
    /// renamed albums, whitespace-normalised containment either way, and
    /// finally a track whose title equals `name` (its album is returned).
    pub fn album(&self, name: &str) -> Option<AlbumMatch<'_>> {
        if name.trim().is_empty() {
            return None;
        }
        let lower = name.to_lowercase();

        if let Some(redirect) = self.album_redirects.get(&lower) {
            if let Some(found) = self.album_exact(redirect) {
                debug!(album = name, redirect = %redirect, "album redirect");
                return Some(found);
            }
        }
        if let Some(found) = self.album_exact(name) {
            return Some(found);
        }

        let wanted = normalize_spaces(&lower);
        let partial = self.album_names().into_iter().find(|album| {
            let have = normalize_spaces(&album.to_lowercase());
            have.contains(&wanted) || wanted.contains(&have)
        });
        if let Some(album) = partial {
            return self.album_exact(album);
        }

        self.tracks
            .iter()
            .find(|t| t.title.to_lowercase() == lower)
            .and_then(|t| self.album_exact(&t.album))
    }

    fn album_exact(&self, name: &str) -> Option<AlbumMatch<'_>> {
        let lower = name.to_lowercase();
        let tracks: Vec<&Track> = self
            .tracks
            .iter()
            .filter(|t| t.album.to_lowercase() == lower)
            .collect();
        let first = tracks.first()?;
        Some(AlbumMatch {
            name: &first.album,
            tracks,
        })
    }

    /// Distinct album names in catalogue order.
    pub fn album_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for t in &self.tracks {
            if !names.contains(&t.album.as_str()) {
                names.push(&t.album);
            }
        }
        names
    }

    /// Ids of the tracks on `album` (exact, case-sensitive), in catalogue order.
    pub fn album_track_ids(&self, album: &str) -> Vec<&str> {
        self.tracks
            .iter()
            .filter(|t| t.album == album)
            .map(|t| t.id.as_str())
            .collect()
    }

    /// Find an artist by name: exact, alias table, case-insensitive, then
    /// substring of name or full name. Names that only appear in track
    /// credits resolve to a featured-artist match.
    pub fn artist(&self, name: &str) -> Option<ArtistMatch<'_>> {
        if name.trim().is_empty() {
            return None;
        }
        let lower = name.to_lowercase();

        let profile = self
            .artists
            .iter()
            .find(|a| a.name == name)
            .or_else(|| {
                let alias = self.artist_aliases.get(name)?;
                debug!(alias = name, artist = %alias, "artist alias");
                self.artists.iter().find(|a| &a.name == alias)
            })
            .or_else(|| self.artists.iter().find(|a| a.name.to_lowercase() == lower))
            .or_else(|| {
                self.artists.iter().find(|a| {
                    a.name.to_lowercase().contains(&lower)
                        || a.full_name
                            .as_deref()
                            .is_some_and(|f| f.to_lowercase().contains(&lower))
                })
            });
        if let Some(artist) = profile {
            return Some(ArtistMatch::Profile(artist));
        }

        let credited = self.artist_tracks(name);
        if credited.is_empty() {
            return None;
        }
        let mut albums: Vec<&str> = Vec::new();
        for t in credited {
            if !albums.contains(&t.album.as_str()) {
                albums.push(&t.album);
            }
        }
        Some(ArtistMatch::Featured {
            name: name.to_string(),
            albums,
        })
    }

    /// Tracks crediting `name` anywhere in their artist list (case-insensitive).
    pub fn artist_tracks(&self, name: &str) -> Vec<&Track> {
        let lower = name.to_lowercase();
        self.tracks
            .iter()
            .filter(|t| t.artists().any(|a| a.to_lowercase() == lower))
            .collect()
    }
}

fn normalize_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
