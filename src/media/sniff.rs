//! Content type detection from leading file bytes.

use image::ImageFormat;

/// Number of leading bytes needed by [`detect_extension`].
pub const SNIFF_LEN: usize = 64;

/// Detect a file extension from the first bytes of a file.
///
/// Returns `None` when the signature is not recognized.
pub fn detect_extension(prefix: &[u8]) -> Option<&'static str> {
    if let Ok(format) = image::guess_format(prefix) {
        if let Some(ext) = image_extension(format) {
            return Some(ext);
        }
    }

    detect_container(prefix)
}

fn image_extension(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Jpeg => Some("jpg"),
        ImageFormat::Png => Some("png"),
        ImageFormat::Gif => Some("gif"),
        ImageFormat::WebP => Some("webp"),
        ImageFormat::Bmp => Some("bmp"),
        ImageFormat::Tiff => Some("tif"),
        _ => None,
    }
}

/// Audio/video container signatures.
fn detect_container(prefix: &[u8]) -> Option<&'static str> {
    // ISO base media: 4-byte box size then 'ftyp' and the major brand
    if prefix.len() >= 12 && &prefix[4..8] == b"ftyp" {
        return match &prefix[8..12] {
            b"qt  " => Some("mov"),
            b"M4A " | b"M4B " => Some("m4a"),
            _ => Some("mp4"),
        };
    }

    // EBML header (WebM / Matroska)
    if prefix.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some("webm");
    }

    if prefix.len() >= 12 && prefix.starts_with(b"RIFF") {
        return match &prefix[8..12] {
            b"AVI " => Some("avi"),
            b"WAVE" => Some("wav"),
            _ => None,
        };
    }

    if prefix.starts_with(b"OggS") {
        return Some("ogg");
    }

    if prefix.starts_with(b"ID3")
        || (prefix.len() >= 2 && prefix[0] == 0xFF && (prefix[1] & 0xE0) == 0xE0)
    {
        return Some("mp3");
    }

    None
}
