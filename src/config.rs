use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "neonspin";
const CACHE_DIR: &str = "media_cache";

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var("NEONSPIN_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn cache_root() -> Result<PathBuf> {
    Ok(config_root()?.join(CACHE_DIR))
}

/// Playlist import resolves arbitrary filesystem paths; only the desktop
/// shell supports that, and it announces itself through the environment.
pub fn is_desktop_host() -> bool {
    env::var_os("NEONSPIN_DESKTOP").is_some()
}

/// Staged copy of an uploaded media file. Dropping the handle releases the
/// copy; removal is best effort.
#[derive(Debug)]
pub struct StagedMedia {
    path: PathBuf,
}

impl StagedMedia {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedMedia {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

pub fn stage_media_in(cache: &Path, source: &Path) -> Result<StagedMedia> {
    fs::create_dir_all(cache)
        .with_context(|| format!("failed to create cache dir {}", cache.display()))?;

    let mut name = hashed_name(source);
    if let Some(ext) = source.extension().and_then(|ext| ext.to_str()) {
        let _ = write!(name, ".{ext}");
    }

    let staged_path = cache.join(name);
    fs::copy(source, &staged_path).with_context(|| {
        format!(
            "failed to stage {} into {}",
            source.display(),
            staged_path.display()
        )
    })?;
    Ok(StagedMedia { path: staged_path })
}

fn hashed_name(source: &Path) -> String {
    let digest = Sha256::digest(source.to_string_lossy().as_bytes());
    let mut name = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(name, "{byte:02x}");
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn staged_copy_lands_in_cache_with_source_extension() {
        let dir = tempdir().expect("tempdir");
        let source = dir.path().join("track.mp3");
        fs::write(&source, b"audio-bytes").expect("write source");

        let cache = dir.path().join("cache");
        let staged = stage_media_in(&cache, &source).expect("stage");

        assert!(staged.path().exists());
        assert!(staged.path().starts_with(&cache));
        assert_eq!(
            staged.path().extension().and_then(|ext| ext.to_str()),
            Some("mp3")
        );
        assert_eq!(fs::read(staged.path()).expect("read staged"), b"audio-bytes");
    }

    #[test]
    fn dropping_staged_media_releases_the_copy() {
        let dir = tempdir().expect("tempdir");
        let source = dir.path().join("track.flac");
        fs::write(&source, b"x").expect("write source");

        let cache = dir.path().join("cache");
        let staged = stage_media_in(&cache, &source).expect("stage");
        let staged_path = staged.path().to_path_buf();
        assert!(staged_path.exists());

        drop(staged);
        assert!(!staged_path.exists());
    }

    #[test]
    fn staging_a_missing_source_fails_without_leftovers() {
        let dir = tempdir().expect("tempdir");
        let cache = dir.path().join("cache");

        let result = stage_media_in(&cache, &dir.path().join("absent.mp3"));
        assert!(result.is_err());
        let leftovers = fs::read_dir(&cache).expect("cache dir").count();
        assert_eq!(leftovers, 0);
    }
}
