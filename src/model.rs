use crate::config::StagedMedia;
use crate::locate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Playlist entries resolve to file URLs; single-track uploads hold the
/// staged transient copy, released when a newer source replaces it.
#[derive(Debug, Clone)]
pub enum MediaSource {
    Url(String),
    Staged(Arc<StagedMedia>),
}

impl MediaSource {
    pub fn playback_path(&self) -> PathBuf {
        match self {
            Self::Url(url) => locate::from_file_url(url),
            Self::Staged(staged) => staged.path().to_path_buf(),
        }
    }
}

impl PartialEq for MediaSource {
    fn eq(&self, other: &Self) -> bool {
        self.playback_path() == other.playback_path()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub audio: Option<MediaSource>,
    pub cover: Option<String>,
    pub title: String,
    pub artist: String,
}

impl Default for Track {
    fn default() -> Self {
        Self {
            audio: None,
            cover: None,
            title: String::from("NEONSPIN"),
            artist: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub path: String,
    pub title: Option<String>,
    pub cover: Option<String>,
}
