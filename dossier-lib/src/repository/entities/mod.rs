//! Core domain entities for Dossier.
//!
//! A [`Profile`] is one directory entry: contact details, an optional pair of
//! geo-coordinates, an optional education record, a short bio, and an avatar
//! image encoded as a data URL. Profiles are immutable-by-replacement; edits
//! swap the whole record rather than patching fields in place.

use thiserror::Error;

mod image;
mod profile;

pub use image::{MAX_IMAGE_BYTES, read_data_url};
pub use profile::{
    Coordinates, Education, LatitudeDirection, LongitudeDirection, Profile, ProfileDraft,
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode or decode the profile collection: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("image is {size} bytes, which exceeds the {MAX_IMAGE_BYTES} byte limit")]
    ImageTooLarge { size: u64 },
    #[error("file extension is not a recognized image type")]
    UnsupportedImage,
    #[error("invalid direction, expected N/S for latitude or E/W for longitude")]
    InvalidDirection,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}
