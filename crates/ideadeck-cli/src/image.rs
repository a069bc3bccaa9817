//! Local image embedding
//!
//! Cards store images as a URL. A local file is embedded as a
//! `data:<mime>;base64,...` URL so the card stays self-contained.

use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Largest image accepted for embedding (5 MiB)
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Read an image file and encode it as a data URL
pub fn encode_image_file(path: &Path) -> Result<String> {
    let mime = mime_for(path)?;

    let size = std::fs::metadata(path)
        .with_context(|| format!("Failed to read image file: {:?}", path))?
        .len();
    if size > MAX_IMAGE_BYTES {
        bail!(
            "Image {:?} is {} bytes; the limit is {} bytes. Try using a smaller image.",
            path,
            size,
            MAX_IMAGE_BYTES
        );
    }

    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read image file: {:?}", path))?;
    Ok(to_data_url(mime, &bytes))
}

fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

fn mime_for(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    Ok(match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => bail!(
            "Unsupported image type {:?}. Use png, jpg, gif, webp or svg.",
            path
        ),
    })
}

/// True if `url` is an embedded data URL rather than a link
pub fn is_data_url(url: &str) -> bool {
    url.starts_with("data:")
}
