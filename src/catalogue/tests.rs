use super::*;
use std::collections::HashMap;

pub(crate) fn t(id: &str, album: &str, artist: &str) -> Track {
    Track {
        id: id.into(),
        title: format!("Title {id}"),
        artist: artist.into(),
        album: album.into(),
        cover_url: String::new(),
        audio_url: format!("/audio/{id}.mp3"),
        duration: 180.0,
    }
}

#[test]
fn bundled_catalogue_parses_with_redirects_and_aliases() {
    let c = Catalogue::bundled().unwrap();
    assert_eq!(c.len(), 8);
    assert_eq!(c.first().id, "track-1");
    assert!(!c.videos().is_empty());
    assert_eq!(c.album("tv-off").unwrap().name, "LBJ");
    assert_eq!(c.artist("King James").unwrap().name(), "LeBron James");
}

#[test]
fn new_rejects_empty_and_duplicate_ids() {
    assert!(matches!(Catalogue::new(vec![]), Err(CatalogueError::Empty)));
    let dup = vec![t("a", "X", "A"), t("a", "Y", "B")];
    assert!(matches!(Catalogue::new(dup), Err(CatalogueError::DuplicateId(id)) if id == "a"));
}

#[test]
fn successor_and_predecessor_wrap_around() {
    let c = Catalogue::new(vec![t("a", "X", "A"), t("b", "X", "A"), t("c", "Y", "B")]).unwrap();
    assert_eq!(c.successor("a").unwrap().id, "b");
    assert_eq!(c.successor("c").unwrap().id, "a");
    assert_eq!(c.predecessor("a").unwrap().id, "c");
    assert_eq!(c.predecessor("b").unwrap().id, "a");
    assert!(c.successor("missing").is_none());
}

#[test]
fn album_lookup_is_case_insensitive_then_partial_then_by_title() {
    let c = Catalogue::new(vec![
        t("a", "First Day Out", "A"),
        t("b", "We Don't Guard You", "B"),
        t("c", "We Don't Guard You", "B"),
    ])
    .unwrap();

    let m = c.album("we don't guard you").unwrap();
    assert_eq!(m.name, "We Don't Guard You");
    assert_eq!(m.tracks.len(), 2);

    // Extra whitespace and partial names still land on the album.
    assert_eq!(c.album("first   day").unwrap().name, "First Day Out");

    // A track title resolves to that track's album.
    assert_eq!(c.album("Title c").unwrap().name, "We Don't Guard You");

    assert!(c.album("nothing like this").is_none());
}

#[test]
fn artist_lookup_order_and_featured_fallback() {
    let artists = vec![Artist {
        name: "LeBron James".into(),
        full_name: Some("LeBron Raymone James Sr.".into()),
        image_url: String::new(),
        albums: vec![],
    }];
    let mut aliases = HashMap::new();
    aliases.insert("The King".to_string(), "LeBron James".to_string());

    let c = Catalogue::new(vec![
        t("a", "X", "LeBron James, Guest Star"),
        t("b", "Y", "Guest Star"),
    ])
    .unwrap()
    .with_artists(artists, aliases);

    assert!(matches!(c.artist("LeBron James"), Some(ArtistMatch::Profile(_))));
    assert!(matches!(c.artist("The King"), Some(ArtistMatch::Profile(_))));
    assert!(matches!(c.artist("lebron james"), Some(ArtistMatch::Profile(_))));
    assert!(matches!(c.artist("Raymone"), Some(ArtistMatch::Profile(_))));

    match c.artist("guest star") {
        Some(ArtistMatch::Featured { name, albums }) => {
            assert_eq!(name, "guest star");
            assert_eq!(albums, vec!["X", "Y"]);
        }
        other => panic!("expected featured match, got {other:?}"),
    }
    assert!(c.artist("Nobody").is_none());
}

#[test]
fn blank_names_match_nothing() {
    let c = Catalogue::bundled().unwrap();
    assert!(c.album("").is_none());
    assert!(c.album("   ").is_none());
    assert!(c.artist("").is_none());
    assert!(c.artist(" ").is_none());
}

#[test]
fn primary_artist_and_placeholder_cover() {
    let mut track = t("a", "X", " LeBron James ,  DJ Bronny");
    assert_eq!(track.primary_artist(), "LeBron James");
    assert_eq!(track.artists().collect::<Vec<_>>(), vec!["LeBron James", "DJ Bronny"]);
    assert_eq!(track.cover_or_placeholder(), PLACEHOLDER_ART);
    track.cover_url = "/c.jpg".into();
    assert_eq!(track.cover_or_placeholder(), "/c.jpg");
}

#[test]
fn load_reads_manifest_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalogue.json");
    std::fs::write(
        &path,
        r#"{"tracks":[{"id":"x","title":"X","artist":"A","album":"B","audioUrl":"/x.mp3"}]}"#,
    )
    .unwrap();
    let c = Catalogue::load(&path).unwrap();
    assert_eq!(c.track("x").unwrap().duration, 0.0);

    assert!(matches!(
        Catalogue::load(&dir.path().join("missing.json")),
        Err(CatalogueError::Io { .. })
    ));
}
