use crate::config::{self, StagedMedia};
use crate::locate;
use crate::media;
use crate::model::{MediaSource, PlaylistEntry, Track};
use crate::theme::{THEMES, Theme};
use rand::RngExt;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const UNTITLED: &str = "UNTITLED";

/// One-shot auto-play request. Held in an `Option` slot and consumed with
/// `take`, so at most one request is ever outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoPlay;

/// Engine action requested by a state transition. The app layer applies it;
/// the state machine never touches the engine directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    None,
    Pause,
    Resume,
    Load(PathBuf),
    Seek(Duration),
    Stop,
}

#[derive(Debug, Clone)]
pub struct CoreOptions {
    pub desktop_host: bool,
    pub media_cache: PathBuf,
}

#[derive(Debug)]
pub struct PlayerCore {
    pub track: Track,
    pub playlist: Vec<PlaylistEntry>,
    pub cursor: usize,
    pub is_playing: bool,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub pending_autoplay: Option<AutoPlay>,
    pub theme: Theme,
    pub hide_ui: bool,
    pub status: String,
    pub notice: Option<String>,
    pub dirty: bool,
    desktop_host: bool,
    media_cache: PathBuf,
    staged: Option<Arc<StagedMedia>>,
    theme_rng: SmallRng,
}

impl PlayerCore {
    pub fn new(options: CoreOptions) -> Self {
        let mut core = Self {
            track: Track::default(),
            playlist: Vec::new(),
            cursor: 0,
            is_playing: false,
            position_seconds: 0.0,
            duration_seconds: 0.0,
            pending_autoplay: None,
            theme: THEMES[0],
            hide_ui: false,
            status: String::from("Ready"),
            notice: None,
            dirty: true,
            desktop_host: options.desktop_host,
            media_cache: options.media_cache,
            staged: None,
            theme_rng: SmallRng::from_rng(&mut rand::rng()),
        };
        core.rotate_theme();
        core
    }

    pub fn rotate_theme(&mut self) {
        self.theme = THEMES[self.theme_rng.random_range(0..THEMES.len())];
        self.dirty = true;
    }

    pub fn toggle_play_pause(&mut self) -> Directive {
        if self.is_playing {
            self.is_playing = false;
            self.dirty = true;
            return Directive::Pause;
        }

        if self.track.audio.is_some() {
            self.is_playing = true;
            self.dirty = true;
            return Directive::Resume;
        }

        if !self.playlist.is_empty() {
            // Starting from idle keeps the previous title/cover when the
            // entry carries none.
            let entry = self.playlist[0].clone();
            self.cursor = 0;
            let source = MediaSource::Url(locate::to_file_url(&entry.path));
            let playback = source.playback_path();
            self.track.audio = Some(source);
            if let Some(cover) = entry.cover.as_deref() {
                self.track.cover = Some(locate::to_file_url(cover));
            }
            if let Some(title) = entry.title.filter(|title| !title.trim().is_empty()) {
                self.track.title = title;
            }
            self.track.artist.clear();
            self.pending_autoplay = Some(AutoPlay);
            self.is_playing = true;
            self.dirty = true;
            return Directive::Load(playback);
        }

        self.show_notice("Nothing to play yet. Use :open to load a track or import a playlist.");
        Directive::None
    }

    pub fn on_metadata_loaded(&mut self, duration_seconds: f64) -> Directive {
        self.duration_seconds = duration_seconds.max(0.0);
        self.dirty = true;
        if self.pending_autoplay.take().is_some() {
            self.is_playing = true;
            return Directive::Resume;
        }
        Directive::None
    }

    pub fn on_time_update(&mut self, position_seconds: f64) {
        if (position_seconds - self.position_seconds).abs() >= 0.1 {
            self.dirty = true;
        }
        self.position_seconds = position_seconds;
    }

    pub fn on_ended(&mut self) -> Directive {
        if !self.playlist.is_empty() {
            return self.advance_playlist();
        }

        self.is_playing = false;
        self.position_seconds = 0.0;
        self.dirty = true;
        Directive::Stop
    }

    pub fn advance(&mut self) -> Directive {
        if self.playlist.is_empty() {
            self.set_status("No playlist loaded");
            return Directive::None;
        }
        self.advance_playlist()
    }

    fn advance_playlist(&mut self) -> Directive {
        let next = (self.cursor + 1) % self.playlist.len();
        let directive = self.select_entry(next);
        self.rotate_theme();
        directive
    }

    fn select_entry(&mut self, index: usize) -> Directive {
        let Some(entry) = self.playlist.get(index).cloned() else {
            return Directive::None;
        };

        self.cursor = index;
        let source = MediaSource::Url(locate::to_file_url(&entry.path));
        let playback = source.playback_path();
        self.track = Track {
            audio: Some(source),
            cover: entry.cover.as_deref().map(locate::to_file_url),
            title: entry
                .title
                .filter(|title| !title.trim().is_empty())
                .unwrap_or_else(|| String::from(UNTITLED)),
            artist: String::new(),
        };
        self.position_seconds = 0.0;
        self.pending_autoplay = Some(AutoPlay);
        self.is_playing = true;
        self.dirty = true;
        Directive::Load(playback)
    }

    pub fn open_media(&mut self, path: &Path) -> Directive {
        if media::is_playlist_file(path) {
            if !self.desktop_host {
                self.show_notice("Playlist import needs the desktop shell");
                return Directive::None;
            }
            return match fs::read_to_string(path) {
                Ok(contents) => self.import_playlist(&contents),
                Err(err) => {
                    self.set_status(&format!("could not read playlist: {err:#}"));
                    Directive::None
                }
            };
        }
        if !media::is_audio_file(path) {
            self.set_status("Unsupported file type; expected audio or a .json playlist");
            return Directive::None;
        }
        self.load_single_track(path)
    }

    pub fn load_single_track(&mut self, source: &Path) -> Directive {
        let staged = match config::stage_media_in(&self.media_cache, source) {
            Ok(staged) => Arc::new(staged),
            Err(err) => {
                self.set_status(&format!("could not stage media: {err:#}"));
                return Directive::None;
            }
        };
        // Adopting the new copy drops the previous one, releasing its file.
        self.staged = Some(Arc::clone(&staged));

        let stem = source
            .file_stem()
            .and_then(OsStr::to_str)
            .unwrap_or_default();
        let (artist, title) = parse_track_name(stem);
        let playback = staged.path().to_path_buf();

        self.track.audio = Some(MediaSource::Staged(staged));
        self.track.title = title;
        self.track.artist = artist;
        self.pending_autoplay = Some(AutoPlay);
        self.is_playing = true;
        self.rotate_theme();
        self.dirty = true;
        Directive::Load(playback)
    }

    pub fn import_playlist(&mut self, contents: &str) -> Directive {
        if !self.desktop_host {
            self.show_notice("Playlist import needs the desktop shell");
            return Directive::None;
        }

        let value: serde_json::Value = match serde_json::from_str(contents) {
            Ok(value) => value,
            Err(_) => {
                self.show_notice("Could not parse the playlist JSON file");
                return Directive::None;
            }
        };
        if !value.is_array() {
            self.show_notice("Playlist file must be a JSON array");
            return Directive::None;
        }
        let entries: Vec<PlaylistEntry> = match serde_json::from_value(value) {
            Ok(entries) => entries,
            Err(_) => {
                self.show_notice("Could not parse the playlist JSON file");
                return Directive::None;
            }
        };

        self.playlist = entries;
        self.cursor = 0;
        self.dirty = true;
        if self.playlist.is_empty() {
            self.set_status("Imported an empty playlist");
            return Directive::None;
        }

        let directive = self.select_entry(0);
        self.rotate_theme();
        self.set_status(&format!(
            "Imported playlist with {} tracks",
            self.playlist.len()
        ));
        directive
    }

    pub fn set_cover(&mut self, path: &Path) -> Directive {
        self.track.cover = Some(locate::to_file_url(&path.to_string_lossy()));
        self.set_status("Cover updated");
        Directive::None
    }

    /// Stores exactly the value it is given; clamping to the valid range is
    /// the caller's responsibility.
    pub fn seek(&mut self, seconds: f64) -> Directive {
        self.position_seconds = seconds;
        self.dirty = true;
        Directive::Seek(Duration::from_secs_f64(seconds.max(0.0)))
    }

    pub fn track_playback_path(&self) -> Option<PathBuf> {
        self.track.audio.as_ref().map(MediaSource::playback_path)
    }

    pub fn toggle_hide_ui(&mut self) {
        self.hide_ui = !self.hide_ui;
        self.dirty = true;
    }

    pub fn exit_hidden(&mut self) {
        if self.hide_ui {
            self.hide_ui = false;
            self.dirty = true;
        }
    }

    pub fn show_notice(&mut self, message: &str) {
        self.notice = Some(message.to_string());
        self.dirty = true;
    }

    pub fn dismiss_notice(&mut self) {
        if self.notice.take().is_some() {
            self.dirty = true;
        }
    }

    pub fn set_status(&mut self, message: &str) {
        self.status = message.to_string();
        self.dirty = true;
    }
}

/// Filename rule: a stem containing " - " splits at the first occurrence
/// into artist and title (remainder kept verbatim, so further separators
/// stay in the title); an empty parsed title falls back to the whole stem.
fn parse_track_name(stem: &str) -> (String, String) {
    if let Some((artist, rest)) = stem.split_once(" - ") {
        let artist = artist.trim().to_string();
        let title = rest.trim().to_string();
        if title.is_empty() {
            return (artist, stem.to_string());
        }
        return (artist, title);
    }
    (String::new(), stem.to_string())
}
