use image::RgbaImage;
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use std::ffi::OsStr;
use std::path::Path;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "m4a", "aac", "opus"];

pub fn is_audio_file(path: &Path) -> bool {
    let ext = path.extension().and_then(OsStr::to_str).unwrap_or_default();
    AUDIO_EXTENSIONS
        .iter()
        .any(|supported| ext.eq_ignore_ascii_case(supported))
}

pub fn is_playlist_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Front-cover bytes embedded in the track's tags, if any.
pub fn embedded_cover_art(path: &Path) -> Option<Vec<u8>> {
    let tagged_file = Probe::open(path).ok()?.read().ok()?;
    let picture = tagged_file
        .primary_tag()
        .into_iter()
        .chain(tagged_file.tags())
        .flat_map(|tag| tag.pictures())
        .find(|picture| !picture.data().is_empty())?;
    Some(picture.data().to_vec())
}

pub fn decode_cover(bytes: &[u8]) -> Option<RgbaImage> {
    image::load_from_memory(bytes)
        .ok()
        .map(|decoded| decoded.to_rgba8())
}

pub fn open_cover(path: &Path) -> Option<RgbaImage> {
    image::open(path).ok().map(|decoded| decoded.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn audio_extensions_match_case_insensitively() {
        assert!(is_audio_file(&PathBuf::from("song.MP3")));
        assert!(is_audio_file(&PathBuf::from("song.flac")));
        assert!(!is_audio_file(&PathBuf::from("song.txt")));
        assert!(!is_audio_file(&PathBuf::from("song")));
    }

    #[test]
    fn playlist_detection_is_extension_based() {
        assert!(is_playlist_file(&PathBuf::from("mix.json")));
        assert!(is_playlist_file(&PathBuf::from("MIX.JSON")));
        assert!(!is_playlist_file(&PathBuf::from("mix.mp3")));
    }

    #[test]
    fn decode_cover_rejects_garbage_bytes() {
        assert!(decode_cover(b"not-an-image").is_none());
    }
}
