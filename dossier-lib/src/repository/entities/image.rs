//! Avatar ingestion: turn a user-selected image file into the data URL kept
//! in [`Profile::image_url`](super::Profile::image_url).

use std::{fs, path::Path};

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::repository::entities::{Error, Result};

/// Source files above this size are rejected before encoding.
pub const MAX_IMAGE_BYTES: u64 = 5_242_880;

/// Read an image file and encode it as a `data:` URL.
///
/// The size cap applies to the file on disk, not the (larger) encoded
/// output. The MIME type is inferred from the file extension.
pub fn read_data_url(path: &Path) -> Result<String> {
    let size = fs::metadata(path)?.len();
    if size > MAX_IMAGE_BYTES {
        return Err(Error::ImageTooLarge { size });
    }

    let mime = mime_type(path)?;
    let bytes = fs::read(path)?;

    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

fn mime_type(path: &Path) -> Result<&'static str> {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_lowercase)
        .ok_or(Error::UnsupportedImage)?;

    match extension.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "gif" => Ok("image/gif"),
        "webp" => Ok("image/webp"),
        "bmp" => Ok("image/bmp"),
        "svg" => Ok("image/svg+xml"),
        _ => Err(Error::UnsupportedImage),
    }
}
