use super::*;

fn clips(n: usize) -> Vec<Video> {
    (1..=n)
        .map(|i| Video {
            id: format!("edit-{i}"),
            title: format!("Edit {i}"),
            video_url: format!("/videos/edit-{i}.mp4"),
            thumbnail_url: String::new(),
        })
        .collect()
}

fn ids(feed: &VideoFeed) -> Vec<&str> {
    feed.clips().iter().map(|v| v.id.as_str()).collect()
}

#[test]
fn window_starts_five_before_requested_clip() {
    let all = clips(20);
    let feed = VideoFeed::open(&all, Some("edit-12"));
    assert_eq!(feed.clips().len(), MAX_CLIPS);
    assert_eq!(feed.clips()[0].id, "edit-7");
    assert_eq!(feed.current().unwrap().id, "edit-12");
}

#[test]
fn window_is_clamped_at_the_start_and_truncated_at_the_end() {
    let all = clips(20);
    let feed = VideoFeed::open(&all, Some("edit-2"));
    assert_eq!(feed.clips()[0].id, "edit-1");
    assert_eq!(feed.current_index(), 1);

    let feed = VideoFeed::open(&all, Some("edit-19"));
    assert_eq!(ids(&feed).first(), Some(&"edit-14"));
    assert_eq!(ids(&feed).last(), Some(&"edit-20"));
    assert_eq!(feed.current().unwrap().id, "edit-19");
}

#[test]
fn unknown_clip_opens_the_first_ten() {
    let all = clips(14);
    let feed = VideoFeed::open(&all, Some("edit-99"));
    assert_eq!(feed.clips().len(), 10);
    assert_eq!(feed.current_index(), 0);
    assert!(VideoFeed::open(&[], None).current().is_none());
}

#[test]
fn start_plays_current_and_preloads_neighbours() {
    let all = clips(5);
    let mut feed = VideoFeed::open(&all, Some("edit-3"));
    assert_eq!(
        feed.start(),
        vec![
            ClipAction::Play("edit-3".into()),
            ClipAction::Preload("edit-2".into()),
            ClipAction::Preload("edit-4".into()),
        ]
    );
    assert_eq!(feed.status(2), ClipStatus::Playing);
    assert_eq!(feed.status(1), ClipStatus::Preloaded);
}

#[test]
fn small_swipes_are_ignored() {
    let all = clips(5);
    let mut feed = VideoFeed::open(&all, None);
    feed.start();
    assert!(feed.swipe(300.0, 260.0).is_empty());
    assert_eq!(feed.current_index(), 0);
}

#[test]
fn swiping_up_advances_and_pauses_distant_clips() {
    let all = clips(5);
    let mut feed = VideoFeed::open(&all, None);
    feed.start();
    feed.swipe(400.0, 200.0);
    assert_eq!(feed.current_index(), 1);

    let actions = feed.swipe(400.0, 200.0);
    assert_eq!(feed.current_index(), 2);
    assert_eq!(
        actions,
        vec![
            ClipAction::Play("edit-3".into()),
            ClipAction::Preload("edit-4".into()),
            ClipAction::Pause("edit-1".into()),
        ]
    );
}

#[test]
fn swiping_down_goes_back_but_not_past_the_first_clip() {
    let all = clips(3);
    let mut feed = VideoFeed::open(&all, Some("edit-2"));
    feed.start();
    feed.swipe(100.0, 300.0);
    assert_eq!(feed.current_index(), 0);
    assert!(feed.swipe(100.0, 300.0).is_empty());
}

#[test]
fn user_pause_sticks_until_resumed_or_revisited() {
    let all = clips(4);
    let mut feed = VideoFeed::open(&all, None);
    feed.start();

    assert_eq!(feed.toggle_pause(), vec![ClipAction::Pause("edit-1".into())]);
    assert!(feed.is_user_paused("edit-1"));

    feed.next();
    feed.prev();
    assert!(!feed.is_user_paused("edit-1"));
    assert_eq!(feed.status(0), ClipStatus::Playing);

    feed.toggle_pause();
    assert_eq!(feed.toggle_pause(), vec![ClipAction::Play("edit-1".into())]);
    assert!(!feed.is_user_paused("edit-1"));
}

#[test]
fn ended_clip_advances_and_last_clip_restarts() {
    let all = clips(2);
    let mut feed = VideoFeed::open(&all, None);
    feed.start();

    let actions = feed.on_ended("edit-1");
    assert_eq!(actions[0], ClipAction::Play("edit-2".into()));
    assert_eq!(feed.current_index(), 1);

    assert_eq!(feed.on_ended("edit-2"), vec![ClipAction::Restart("edit-2".into())]);
    assert_eq!(feed.current_index(), 1);
    assert!(feed.on_ended("edit-9").is_empty());
}
