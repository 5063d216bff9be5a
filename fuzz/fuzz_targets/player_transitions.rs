#![no_main]

use libfuzzer_sys::fuzz_target;
use neonspin::core::{CoreOptions, PlayerCore};
use neonspin::model::PlaylistEntry;

fuzz_target!(|data: &[u8]| {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut core = PlayerCore::new(CoreOptions {
        desktop_host: true,
        media_cache: dir.path().join("cache"),
    });
    let len = (data.len() % 16).max(1);
    core.playlist = (0..len)
        .map(|idx| PlaylistEntry {
            path: format!("/music/track_{idx}.mp3"),
            title: None,
            cover: None,
        })
        .collect();

    for byte in data {
        match byte % 7 {
            0 => {
                let _ = core.toggle_play_pause();
            }
            1 => {
                let _ = core.on_ended();
            }
            2 => {
                let _ = core.advance();
            }
            3 => {
                let _ = core.on_metadata_loaded(f64::from(*byte));
            }
            4 => core.on_time_update(f64::from(*byte) * 0.5),
            5 => {
                let _ = core.seek(f64::from(*byte) * 2.0);
            }
            _ => core.rotate_theme(),
        }

        assert!(core.cursor < core.playlist.len());
    }
});
