//! Random identifiers and MIME-derived file extensions.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::constants::ID_BYTES;

/// Generate a fresh archive id: 24 bytes from the OS RNG, hex encoded.
///
/// Collisions are not checked; 192 bits of randomness per id.
#[must_use]
pub fn generate_id() -> String {
    let mut buf = [0u8; ID_BYTES];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Append the extension registered for `mime` to `name`.
///
/// Returns `name` untouched when the type is absent, unparseable or has no
/// known extension. Parameters such as `; charset=utf-8` are ignored.
#[must_use]
pub fn with_extension(name: &str, mime: Option<&str>) -> String {
    match mime.and_then(extension_for) {
        Some(ext) => format!("{name}.{ext}"),
        None => name.to_string(),
    }
}

/// Canonical extensions for types whose registry entries would otherwise
/// resolve to an obscure alias (`text/plain` lists `asm` first).
const PREFERRED_EXTENSIONS: &[(&str, &str)] = &[
    ("application/javascript", "js"),
    ("application/octet-stream", "bin"),
    ("audio/mp4", "m4a"),
    ("audio/mpeg", "mpga"),
    ("image/tiff", "tif"),
    ("text/javascript", "js"),
    ("text/markdown", "md"),
    ("text/plain", "txt"),
    ("video/x-matroska", "mkv"),
];

/// Look up the preferred file extension for a content type.
fn extension_for(content_type: &str) -> Option<&'static str> {
    let parsed: mime_guess::mime::Mime = content_type.trim().parse().ok()?;
    let essence = parsed.essence_str();
    if let Some((_, ext)) = PREFERRED_EXTENSIONS.iter().find(|(mime, _)| *mime == essence) {
        return Some(*ext);
    }
    let extensions = mime_guess::get_mime_extensions_str(essence)?;

    // The registry lists extensions alphabetically; prefer the one matching the
    // subtype (image/jpeg -> jpeg rather than jfif) when it is registered.
    let subtype = parsed.subtype().as_str();
    extensions
        .iter()
        .find(|ext| ext.eq_ignore_ascii_case(subtype))
        .or_else(|| extensions.first())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_shape() {
        let id = generate_id();
        assert_eq!(id.len(), 48);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_id_unique() {
        let ids: std::collections::HashSet<String> = (0..1000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_with_extension_known_type() {
        assert_eq!(with_extension("abc", Some("image/png")), "abc.png");
        assert_eq!(with_extension("abc", Some("image/jpeg")), "abc.jpeg");
    }

    #[test]
    fn test_with_extension_canonical_choices() {
        let cases = [
            ("text/plain", "id.txt"),
            ("text/plain; charset=utf-8", "id.txt"),
            ("audio/mpeg", "id.mpga"),
            ("application/octet-stream", "id.bin"),
            ("application/javascript", "id.js"),
            ("image/gif", "id.gif"),
            ("video/mp4", "id.mp4"),
            ("application/json", "id.json"),
        ];
        for (mime, expected) in cases {
            assert_eq!(with_extension("id", Some(mime)), expected, "mime: {mime}");
        }
    }

    #[test]
    fn test_with_extension_ignores_parameters() {
        assert_eq!(
            with_extension("page", Some("text/html; charset=utf-8")),
            "page.html"
        );
    }

    #[test]
    fn test_with_extension_absent_or_unknown() {
        assert_eq!(with_extension("abc", None), "abc");
        assert_eq!(with_extension("abc", Some("unknown")), "abc");
        assert_eq!(with_extension("abc", Some("application/x-not-a-real-type")), "abc");
        assert_eq!(with_extension("abc", Some("")), "abc");
    }
}
