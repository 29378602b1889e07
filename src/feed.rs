//! Vertical clip feed over the catalogue's video edits.
//!
//! The feed owns no player. Every navigation returns the [`ClipAction`]s the
//! surface should apply to its clips, and the feed tracks the resulting
//! [`ClipStatus`] of each one.

use std::collections::HashSet;

use tracing::debug;

use crate::catalogue::Video;

/// Most clips kept in one feed window.
pub const MAX_CLIPS: usize = 10;
/// Minimum vertical travel, in pixels, for a touch to count as a swipe.
pub const SWIPE_THRESHOLD: f32 = 50.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ClipAction {
    Play(String),
    Pause(String),
    Preload(String),
    /// Rewind to 0 and play.
    Restart(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ClipStatus {
    #[default]
    Idle,
    Preloaded,
    Playing,
    Paused,
}

pub struct VideoFeed {
    clips: Vec<Video>,
    status: Vec<ClipStatus>,
    current: usize,
    user_paused: HashSet<String>,
}

impl VideoFeed {
    /// Window of up to [`MAX_CLIPS`] clips starting five before `start_id`.
    /// Unknown or missing ids open the first clips.
    pub fn open(videos: &[Video], start_id: Option<&str>) -> Self {
        let index = start_id.and_then(|id| videos.iter().position(|v| v.id == id));
        let start = index.map(|i| i.saturating_sub(MAX_CLIPS / 2)).unwrap_or(0);
        let clips: Vec<Video> = videos.iter().skip(start).take(MAX_CLIPS).cloned().collect();
        let current = index.map(|i| i - start).unwrap_or(0);
        debug!(clips = clips.len(), current, "clip feed opened");

        Self {
            status: vec![ClipStatus::Idle; clips.len()],
            clips,
            current,
            user_paused: HashSet::new(),
        }
    }

    pub fn clips(&self) -> &[Video] {
        &self.clips
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Video> {
        self.clips.get(self.current)
    }

    pub fn status(&self, index: usize) -> ClipStatus {
        self.status.get(index).copied().unwrap_or_default()
    }

    pub fn is_user_paused(&self, id: &str) -> bool {
        self.user_paused.contains(id)
    }

    /// Actions for showing the feed for the first time.
    pub fn start(&mut self) -> Vec<ClipAction> {
        self.become_current(self.current)
    }

    /// A touch that went from `start_y` to `end_y`. Dragging up moves to the
    /// next clip, dragging down to the previous one.
    pub fn swipe(&mut self, start_y: f32, end_y: f32) -> Vec<ClipAction> {
        let delta = end_y - start_y;
        if delta.abs() <= SWIPE_THRESHOLD {
            return Vec::new();
        }
        if delta < 0.0 { self.next() } else { self.prev() }
    }

    pub fn next(&mut self) -> Vec<ClipAction> {
        if self.current + 1 >= self.clips.len() {
            return Vec::new();
        }
        self.become_current(self.current + 1)
    }

    pub fn prev(&mut self) -> Vec<ClipAction> {
        if self.current == 0 {
            return Vec::new();
        }
        self.become_current(self.current - 1)
    }

    /// Tap on the current clip.
    pub fn toggle_pause(&mut self) -> Vec<ClipAction> {
        let Some(id) = self.current().map(|v| v.id.clone()) else {
            return Vec::new();
        };
        if self.status(self.current) == ClipStatus::Playing {
            self.user_paused.insert(id.clone());
            self.apply(vec![ClipAction::Pause(id)])
        } else {
            self.user_paused.remove(&id);
            self.apply(vec![ClipAction::Play(id)])
        }
    }

    /// The clip `id` played to its end.
    pub fn on_ended(&mut self, id: &str) -> Vec<ClipAction> {
        let Some(index) = self.clips.iter().position(|v| v.id == id) else {
            return Vec::new();
        };
        if index + 1 < self.clips.len() {
            self.become_current(index + 1)
        } else {
            self.apply(vec![ClipAction::Restart(id.to_string())])
        }
    }

    fn become_current(&mut self, index: usize) -> Vec<ClipAction> {
        let Some(id) = self.clips.get(index).map(|v| v.id.clone()) else {
            return Vec::new();
        };
        self.current = index;
        self.user_paused.remove(&id);

        let mut actions = vec![ClipAction::Play(id)];
        for neighbour in [index.checked_sub(1), Some(index + 1)].into_iter().flatten() {
            let Some(v) = self.clips.get(neighbour) else {
                continue;
            };
            if self.status[neighbour] == ClipStatus::Idle {
                actions.push(ClipAction::Preload(v.id.clone()));
            }
        }
        for (i, v) in self.clips.iter().enumerate() {
            if i.abs_diff(index) > 1 && self.status[i] == ClipStatus::Playing {
                actions.push(ClipAction::Pause(v.id.clone()));
            }
        }
        self.apply(actions)
    }

    fn apply(&mut self, actions: Vec<ClipAction>) -> Vec<ClipAction> {
        for action in &actions {
            let (id, status) = match action {
                ClipAction::Play(id) | ClipAction::Restart(id) => (id, ClipStatus::Playing),
                ClipAction::Pause(id) => (id, ClipStatus::Paused),
                ClipAction::Preload(id) => (id, ClipStatus::Preloaded),
            };
            if let Some(i) = self.clips.iter().position(|v| &v.id == id) {
                self.status[i] = status;
            }
        }
        actions
    }
}

#[cfg(test)]
mod tests;
