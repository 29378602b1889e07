//! Builders for the "what plays next" queue.
//!
//! Every builder excludes the current track, so a freshly built queue never
//! contains it.

use std::collections::VecDeque;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalogue::Catalogue;

/// Catalogue order after `current`, wrapping at the end.
pub(crate) fn sequential(catalogue: &Catalogue, current: &str) -> VecDeque<String> {
    let ids: Vec<&str> = catalogue.tracks().iter().map(|t| t.id.as_str()).collect();
    rotate_after(&ids, current)
}

/// Like `sequential`, restricted to the tracks of `current`'s album.
pub(crate) fn album_scoped(catalogue: &Catalogue, current: &str) -> VecDeque<String> {
    let Some(track) = catalogue.track(current) else {
        return VecDeque::new();
    };
    let ids = catalogue.album_track_ids(&track.album);
    rotate_after(&ids, current)
}

/// Random permutation of the whole catalogue without `current`.
pub(crate) fn shuffled<R: Rng + ?Sized>(
    catalogue: &Catalogue,
    current: &str,
    rng: &mut R,
) -> VecDeque<String> {
    let mut ids: Vec<String> = catalogue
        .tracks()
        .iter()
        .filter(|t| t.id != current)
        .map(|t| t.id.clone())
        .collect();
    ids.shuffle(rng);
    ids.into()
}

/// Random permutation of the whole catalogue, current track included.
pub(crate) fn shuffled_all<R: Rng + ?Sized>(catalogue: &Catalogue, rng: &mut R) -> VecDeque<String> {
    let mut ids: Vec<String> = catalogue.tracks().iter().map(|t| t.id.clone()).collect();
    ids.shuffle(rng);
    ids.into()
}

fn rotate_after(ids: &[&str], current: &str) -> VecDeque<String> {
    let Some(pos) = ids.iter().position(|&id| id == current) else {
        return ids.iter().map(|s| s.to_string()).collect();
    };
    ids[pos + 1..]
        .iter()
        .chain(ids[..pos].iter())
        .map(|s| s.to_string())
        .collect()
}
