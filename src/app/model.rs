//! Application model types: `App`, `View` and `Scope`.
//!
//! `App` never talks to the player directly. The runtime feeds it snapshots
//! and notices, and sends commands based on what it selects.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::catalogue::{Catalogue, Track};
use crate::config::{TrackField, UiSettings};
use crate::engine::PlaybackSnapshot;
use crate::feed::VideoFeed;
use crate::prefs::{Acknowledgement, PrefsStore};

/// Which panel fills the main area.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum View {
    /// Track list with the mini player bar.
    #[default]
    Library,
    FullPlayer,
    Queue,
    Clips,
}

/// What the filter query narrows the list to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    All,
    Album(String),
    Artist(String),
    /// An `album:` / `artist:` query that resolved to nothing.
    NotFound(String),
}

struct Notice {
    text: String,
    until: Instant,
}

/// The main application model.
pub struct App {
    catalogue: Arc<Catalogue>,
    /// Row text per catalogue track, built from the configured fields.
    rows: Vec<String>,
    lower_rows: Option<Vec<String>>,

    pub selected: usize,
    pub follow_playback: bool,
    pub filter_mode: bool,
    pub filter_query: String,
    pub view: View,
    pub snapshot: Option<PlaybackSnapshot>,

    notice: Option<Notice>,
    notice_ttl: Duration,
    prefs: PrefsStore,
    feed: Option<VideoFeed>,
    pledge_refusals: u8,
}

impl App {
    /// Create a new `App` over `catalogue`, rendering rows per `ui`.
    pub fn new(catalogue: Arc<Catalogue>, ui: &UiSettings, prefs: PrefsStore) -> Self {
        let rows: Vec<String> = catalogue
            .tracks()
            .iter()
            .map(|t| row_text(t, &ui.track_fields, &ui.track_separator))
            .collect();
        // Precompute lowercase rows for larger catalogues so filtering does not
        // lowercase every row on each keystroke.
        let lower_rows = if rows.len() > 100 {
            Some(rows.iter().map(|r| r.to_ascii_lowercase()).collect())
        } else {
            None
        };

        Self {
            catalogue,
            rows,
            lower_rows,
            selected: 0,
            follow_playback: true,
            filter_mode: false,
            filter_query: String::new(),
            view: View::Library,
            snapshot: None,
            notice: None,
            notice_ttl: Duration::from_millis(2000),
            prefs,
            feed: None,
            pledge_refusals: 0,
        }
    }

    pub fn with_notice_ttl(mut self, ttl: Duration) -> Self {
        self.notice_ttl = ttl;
        self
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn tracks(&self) -> &[Track] {
        self.catalogue.tracks()
    }

    pub fn row(&self, index: usize) -> &str {
        &self.rows[index]
    }

    /// Return true if the catalogue contains any tracks.
    pub fn has_tracks(&self) -> bool {
        !self.rows.is_empty()
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks().get(self.selected)
    }

    /// Catalogue index of the track the player is on.
    pub fn playing_index(&self) -> Option<usize> {
        let snap = self.snapshot.as_ref()?;
        self.catalogue.position(&snap.track.id)
    }

    pub fn is_playing(&self) -> bool {
        self.snapshot.as_ref().is_some_and(|s| s.state.playing)
    }

    /// Take a fresh snapshot; with follow-playback on, the cursor jumps to
    /// the playing track.
    pub fn sync(&mut self, snapshot: Option<PlaybackSnapshot>) {
        self.snapshot = snapshot;
        if !self.follow_playback || self.filter_mode {
            return;
        }
        if let Some(idx) = self.playing_index() {
            if self.display_indices().contains(&idx) {
                self.selected = idx;
            }
        }
    }

    /// Enable following playback (cursor follows currently playing track).
    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }

    /// Resolve an `album:` or `artist:` prefix in the filter query.
    pub fn scope(&self) -> Scope {
        let query = self.filter_query.trim();
        if let Some(name) = prefixed(query, "album:") {
            return match self.catalogue.album(name) {
                Some(m) => Scope::Album(m.name.to_string()),
                None => Scope::NotFound(format!("Album \"{name}\" not found")),
            };
        }
        if let Some(name) = prefixed(query, "artist:") {
            return match self.catalogue.artist(name) {
                Some(m) => Scope::Artist(m.name().to_string()),
                None => Scope::NotFound(format!("Artist \"{name}\" not found")),
            };
        }
        Scope::All
    }

    /// Return the display order of track indices, taking into account the
    /// album/artist scope or the fuzzy filter.
    pub fn display_indices(&self) -> Vec<usize> {
        match self.scope() {
            Scope::Album(name) => {
                return self
                    .tracks()
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.album == name)
                    .map(|(i, _)| i)
                    .collect();
            }
            Scope::Artist(name) => {
                let lower = name.to_lowercase();
                return self
                    .tracks()
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.artists().any(|a| a.to_lowercase() == lower))
                    .map(|(i, _)| i)
                    .collect();
            }
            Scope::NotFound(_) => return Vec::new(),
            Scope::All => {}
        }

        let base = 0..self.rows.len();
        let query = self.fuzzy_query();
        if query.is_empty() {
            return base.collect();
        }
        match self.lower_rows.as_deref() {
            Some(lower_rows) => {
                let query_lower = query.to_ascii_lowercase();
                base.filter(|&i| Self::fuzzy_match_positions_lower(&lower_rows[i], &query_lower).is_some())
                    .collect()
            }
            None => base
                .filter(|&i| Self::fuzzy_match_positions(&self.rows[i], query).is_some())
                .collect(),
        }
    }

    /// The query used for fuzzy matching. A scope prefix with no name yet
    /// (`album:` while typing) matches everything.
    pub fn fuzzy_query(&self) -> &str {
        let query = self.filter_query.trim();
        if SCOPE_PREFIXES.iter().any(|p| query.eq_ignore_ascii_case(p)) {
            return "";
        }
        query
    }

    /// Return true if this `App` uses precomputed lowercase rows.
    pub fn uses_lower_rows(&self) -> bool {
        self.lower_rows.is_some()
    }

    /// Fuzzy-match `query_lower` against a specific row by index.
    pub fn fuzzy_match_positions_for_row_lower(&self, index: usize, query_lower: &str) -> Option<Vec<usize>> {
        if query_lower.is_empty() {
            return Some(Vec::new());
        }
        match self.lower_rows.as_deref() {
            Some(lower_rows) => Self::fuzzy_match_positions_lower(&lower_rows[index], query_lower),
            None => Self::fuzzy_match_positions(&self.rows[index], query_lower),
        }
    }

    /// Fuzzy/subsequence match: return the character positions in `title`
    /// that match `query`, or `None` if not matched.
    pub fn fuzzy_match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
        if query.is_empty() {
            return Some(Vec::new());
        }

        let mut positions: Vec<usize> = Vec::new();
        let mut title_iter = title.chars().enumerate();

        for qc in query.chars() {
            let qc_low = qc.to_ascii_lowercase();
            loop {
                match title_iter.next() {
                    Some((ti, tc)) if tc.to_ascii_lowercase() == qc_low => {
                        positions.push(ti);
                        break;
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        }

        Some(positions)
    }

    fn fuzzy_match_positions_lower(title_lower: &str, query_lower: &str) -> Option<Vec<usize>> {
        if query_lower.is_empty() {
            return Some(Vec::new());
        }

        let mut positions: Vec<usize> = Vec::new();
        let mut title_iter = title_lower.chars().enumerate();

        for qc in query_lower.chars() {
            loop {
                match title_iter.next() {
                    Some((ti, tc)) if tc == qc => {
                        positions.push(ti);
                        break;
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        }

        Some(positions)
    }

    /// Next visible index after `current`, wrapping to the first.
    pub fn next_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }
        match display.iter().position(|&i| i == current) {
            Some(p) => Some(display[(p + 1) % display.len()]),
            None => Some(display[0]),
        }
    }

    /// Previous visible index before `current`, wrapping to the last.
    pub fn prev_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }
        match display.iter().position(|&i| i == current) {
            Some(0) | None => Some(display[display.len() - 1]),
            Some(p) => Some(display[p - 1]),
        }
    }

    /// Set the selected track index and ensure it is visible in the display.
    pub fn set_selected(&mut self, idx: usize) {
        self.selected = idx;
        self.ensure_selected_visible();
    }

    /// Move selection to the next visible track.
    pub fn next(&mut self) {
        if let Some(next) = self.next_in_view_from(self.selected) {
            self.selected = next;
        }
    }

    /// Move selection to the previous visible track.
    pub fn prev(&mut self) {
        if let Some(prev) = self.prev_in_view_from(self.selected) {
            self.selected = prev;
        }
    }

    pub fn select_first(&mut self) {
        if let Some(&first) = self.display_indices().first() {
            self.selected = first;
        }
    }

    pub fn select_last(&mut self) {
        if let Some(&last) = self.display_indices().last() {
            self.selected = last;
        }
    }

    /// Enter filter mode: enable filtering and stop following playback.
    pub fn enter_filter_mode(&mut self) {
        self.filter_mode = true;
        self.follow_playback_off();
        self.ensure_selected_visible();
    }

    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
    }

    /// Clear the active filter and restore selection visibility.
    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.ensure_selected_visible();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_selected_visible();
    }

    /// Keep `selected` inside the current view, otherwise move it to the
    /// first visible track.
    fn ensure_selected_visible(&mut self) {
        let display = self.display_indices();
        if display.is_empty() {
            return;
        }
        if !display.contains(&self.selected) {
            self.selected = display[0];
        }
    }

    /// Switch to `view`, or back to the library when it is already shown.
    pub fn toggle_view(&mut self, view: View) {
        self.view = if self.view == view { View::Library } else { view };
        if self.view == View::Clips && self.feed.is_none() {
            self.open_feed();
        }
        if self.view != View::Clips {
            self.feed = None;
        }
    }

    fn open_feed(&mut self) {
        let mut feed = VideoFeed::open(self.catalogue.videos(), None);
        let actions = feed.start();
        debug!(?actions, "clip feed started");
        self.feed = Some(feed);
    }

    pub fn feed(&self) -> Option<&VideoFeed> {
        self.feed.as_ref()
    }

    pub fn feed_mut(&mut self) -> Option<&mut VideoFeed> {
        self.feed.as_mut()
    }

    pub fn push_notice(&mut self, text: impl Into<String>, now: Instant) {
        self.notice = Some(Notice {
            text: text.into(),
            until: now + self.notice_ttl,
        });
    }

    /// The notice still visible at `now`, if any.
    pub fn notice(&self, now: Instant) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| now < n.until)
            .map(|n| n.text.as_str())
    }

    pub fn expire_notice(&mut self, now: Instant) {
        if self.notice.as_ref().is_some_and(|n| now >= n.until) {
            self.notice = None;
        }
    }

    /// Flip the liked flag on the playing track; returns the new value.
    pub fn toggle_like_current(&mut self) -> Option<bool> {
        let id = self.snapshot.as_ref()?.track.id.clone();
        Some(self.prefs.toggle_like(&id))
    }

    pub fn is_liked(&self, id: &str) -> bool {
        self.prefs.is_liked(id)
    }

    pub fn banner_visible(&self) -> bool {
        !self.prefs.acknowledged(Acknowledgement::InstallBanner)
    }

    pub fn dismiss_banner(&mut self) {
        self.prefs.acknowledge(Acknowledgement::InstallBanner);
    }

    /// The first-run pledge is shown until the user agrees to it.
    pub fn pledge_pending(&self) -> bool {
        !self.prefs.acknowledged(Acknowledgement::Pledge)
    }

    pub fn agree_to_pledge(&mut self) {
        self.prefs.acknowledge(Acknowledgement::Pledge);
    }

    /// Closing the pledge never works. The first attempt switches it to
    /// Lakers colours, the second one calls for backup.
    pub fn refuse_pledge(&mut self, now: Instant) {
        self.pledge_refusals = self.pledge_refusals.saturating_add(1);
        if self.pledge_refusals == 2 {
            self.push_notice("King James has been notified. Draymond Green is on his way.", now);
        }
    }

    pub fn lakers_mode(&self) -> bool {
        self.pledge_refusals > 0
    }
}

const SCOPE_PREFIXES: [&str; 2] = ["album:", "artist:"];

fn prefixed<'a>(query: &'a str, prefix: &str) -> Option<&'a str> {
    let head = query.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let rest = query[prefix.len()..].trim();
    (!rest.is_empty()).then_some(rest)
}

/// Join the configured `fields` of `track`, skipping empty ones.
pub fn row_text(track: &Track, fields: &[TrackField], separator: &str) -> String {
    let parts: Vec<&str> = fields
        .iter()
        .map(|f| match f {
            TrackField::Title => track.title.as_str(),
            TrackField::Artist => track.artist.as_str(),
            TrackField::PrimaryArtist => track.primary_artist(),
            TrackField::Album => track.album.as_str(),
            TrackField::Id => track.id.as_str(),
        })
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        track.title.clone()
    } else {
        parts.join(separator)
    }
}
