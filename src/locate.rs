use std::path::PathBuf;

/// Characters `encodeURI` leaves alone besides ASCII alphanumerics. `%` is
/// excluded from escaping here because callers pre-escape literal percents.
const URI_KEEP: &[u8] = b";,/?:@&=+$-_.!~*'()#%";

/// Resolve a raw filesystem path to a loadable URL. Values already carrying
/// the file scheme pass through; otherwise backslashes normalize to `/`,
/// literal `%` escapes first, and drive-letter absolute paths gain a
/// `file:///` prefix before the remainder is percent-encoded.
pub fn to_file_url(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    if raw.starts_with("file://") {
        return raw.to_string();
    }

    let normalized = raw.replace('\\', "/").replace('%', "%25");
    if has_drive_prefix(&normalized) {
        format!("file:///{}", encode_uri(&normalized))
    } else {
        encode_uri(&normalized)
    }
}

/// Inverse mapping back to a filesystem path the audio engine can open.
pub fn from_file_url(url: &str) -> PathBuf {
    if url.is_empty() {
        return PathBuf::new();
    }

    if let Some(rest) = url.strip_prefix("file:///") {
        let decoded = percent_decode(rest);
        if has_drive_prefix(&decoded) {
            PathBuf::from(decoded)
        } else {
            PathBuf::from(format!("/{decoded}"))
        }
    } else if let Some(rest) = url.strip_prefix("file://") {
        let decoded = percent_decode(rest);
        if decoded.starts_with('/') {
            PathBuf::from(decoded)
        } else {
            PathBuf::from(format!("/{decoded}"))
        }
    } else {
        PathBuf::from(percent_decode(url))
    }
}

fn has_drive_prefix(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/'
}

fn encode_uri(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || URI_KEEP.contains(&byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%'
            && index + 2 < bytes.len()
            && let (Some(high), Some(low)) = (
                (bytes[index + 1] as char).to_digit(16),
                (bytes[index + 2] as char).to_digit(16),
            )
        {
            out.push((high * 16 + low) as u8);
            index += 3;
        } else {
            out.push(bytes[index]);
            index += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_url() {
        assert_eq!(to_file_url(""), "");
    }

    #[test]
    fn file_scheme_passes_through() {
        assert_eq!(
            to_file_url("file:///C:/Music/a.mp3"),
            "file:///C:/Music/a.mp3"
        );
    }

    #[test]
    fn drive_letter_path_gains_triple_slash_prefix() {
        assert_eq!(
            to_file_url(r"C:\My Music\song 1.mp3"),
            "file:///C:/My%20Music/song%201.mp3"
        );
    }

    #[test]
    fn unix_path_is_percent_encoded_without_scheme() {
        assert_eq!(
            to_file_url("/home/me/my song.mp3"),
            "/home/me/my%20song.mp3"
        );
    }

    #[test]
    fn literal_percent_escapes_before_encoding() {
        assert_eq!(to_file_url("tracks/50% mix.mp3"), "tracks/50%25%20mix.mp3");
    }

    #[test]
    fn non_ascii_escapes_per_utf8_byte() {
        assert_eq!(to_file_url("m\u{fa}sica.mp3"), "m%C3%BAsica.mp3");
    }

    #[test]
    fn windows_round_trip() {
        let url = to_file_url(r"C:\My Music\song 1.mp3");
        assert_eq!(from_file_url(&url), PathBuf::from("C:/My Music/song 1.mp3"));
    }

    #[test]
    fn unix_round_trip() {
        let url = to_file_url("/home/me/50% mix.mp3");
        assert_eq!(from_file_url(&url), PathBuf::from("/home/me/50% mix.mp3"));
    }

    #[test]
    fn plain_relative_path_decodes() {
        assert_eq!(
            from_file_url("tracks/my%20song.mp3"),
            PathBuf::from("tracks/my song.mp3")
        );
    }
}
