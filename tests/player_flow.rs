use neonspin::core::{CoreOptions, Directive, PlayerCore};
use neonspin::theme::THEMES;
use std::path::PathBuf;
use tempfile::TempDir;

fn desktop_core(dir: &TempDir) -> PlayerCore {
    PlayerCore::new(CoreOptions {
        desktop_host: true,
        media_cache: dir.path().join("cache"),
    })
}

#[test]
fn playlist_import_flows_into_cyclic_playback() {
    let dir = TempDir::new().expect("tempdir");
    let mut core = desktop_core(&dir);

    let directive = core.import_playlist(
        r#"[
            {"path": "/music/one.mp3", "title": "One"},
            {"path": "/music/two.mp3", "title": "Two"},
            {"path": "/music/three.mp3"}
        ]"#,
    );

    assert_eq!(directive, Directive::Load(PathBuf::from("/music/one.mp3")));
    assert_eq!(core.cursor, 0);
    assert_eq!(core.track.title, "One");
    assert!(core.is_playing);

    core.on_metadata_loaded(180.0);
    assert!(core.pending_autoplay.is_none());

    core.on_ended();
    assert_eq!(core.track.title, "Two");
    core.on_ended();
    assert_eq!(core.track.title, "UNTITLED");
    core.on_ended();
    assert_eq!(core.cursor, 0, "advance wraps back to the first entry");
    assert_eq!(core.track.title, "One");
}

#[test]
fn pause_and_resume_round_trip_keeps_the_track() {
    let dir = TempDir::new().expect("tempdir");
    let mut core = desktop_core(&dir);
    core.import_playlist(r#"[{"path": "/music/one.mp3", "title": "One"}]"#);
    core.on_metadata_loaded(90.0);

    assert_eq!(core.toggle_play_pause(), Directive::Pause);
    assert!(!core.is_playing);
    assert_eq!(core.toggle_play_pause(), Directive::Resume);
    assert!(core.is_playing);
    assert_eq!(core.track.title, "One");
}

#[test]
fn rejected_import_leaves_a_running_session_intact() {
    let dir = TempDir::new().expect("tempdir");
    let mut core = desktop_core(&dir);
    core.import_playlist(r#"[{"path": "/music/one.mp3", "title": "One"}]"#);
    core.dismiss_notice();
    let theme_before = core.theme;

    let directive = core.import_playlist(r#"{"path": "/music/evil.mp3"}"#);

    assert_eq!(directive, Directive::None);
    assert!(core.notice.is_some());
    assert_eq!(core.playlist.len(), 1);
    assert_eq!(core.track.title, "One");
    assert_eq!(core.theme.id, theme_before.id, "no rotation on rejection");
}

#[test]
fn every_transition_keeps_the_theme_inside_the_palette() {
    let dir = TempDir::new().expect("tempdir");
    let mut core = desktop_core(&dir);
    core.import_playlist(
        r#"[{"path": "/music/one.mp3"}, {"path": "/music/two.mp3"}]"#,
    );

    for _ in 0..20 {
        core.on_ended();
        assert!(THEMES.iter().any(|theme| theme.id == core.theme.id));
    }
}
