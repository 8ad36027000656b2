//! Image MIME type detection
//!
//! Magic bytes win; the filename extension is only consulted when the bytes
//! are not a recognised image. JPEG is the last resort, never the first guess:
//! some vision backends reject PNG data labelled as JPEG.

/// MIME type used when neither bytes nor filename identify the format
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Detect the MIME type of an uploaded image
#[must_use]
pub fn detect_mime(bytes: &[u8], filename: Option<&str>) -> &'static str {
    if let Some(kind) = infer::get(bytes) {
        if kind.matcher_type() == infer::MatcherType::Image {
            return kind.mime_type();
        }
    }

    filename
        .and_then(mime_from_extension)
        .unwrap_or(DEFAULT_IMAGE_MIME)
}

fn mime_from_extension(filename: &str) -> Option<&'static str> {
    let (_, extension) = filename.rsplit_once('.')?;
    let mime = match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "tif" | "tiff" => "image/tiff",
        _ => return None,
    };
    Some(mime)
}
