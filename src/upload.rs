//! Plant photo extraction from multipart requests.
//!
//! Size and type checks happen here, before the advisor (and therefore the
//! model) ever sees the image.

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::InlineImage;

/// Multipart field carrying the photo
pub const IMAGE_FIELD: &str = "image";

/// Accepted photo types
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// Extra body allowance on top of the image cap for multipart framing
pub const MULTIPART_OVERHEAD_BYTES: usize = 16 * 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Image size should be less than 2MB")]
    TooLarge,

    #[error("Please upload a JPEG, PNG, or WEBP file")]
    UnsupportedType(String),

    #[error("Failed to read multipart data: {0}")]
    Malformed(String),
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::UnsupportedType(_) | UploadError::Malformed(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn from_multipart(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::TooLarge
        } else {
            UploadError::Malformed(err.body_text())
        }
    }
}

/// Normalize a declared content type ("image/JPEG; charset=x" -> "image/jpeg")
fn normalize_mime(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Check a photo against the type and size limits.
pub fn validate_image(
    mime_type: &str,
    data: Vec<u8>,
    max_bytes: usize,
) -> Result<InlineImage, UploadError> {
    let mime_type = normalize_mime(mime_type);
    if !ALLOWED_IMAGE_TYPES.contains(&mime_type.as_str()) {
        return Err(UploadError::UnsupportedType(mime_type));
    }
    if data.len() > max_bytes {
        return Err(UploadError::TooLarge);
    }
    Ok(InlineImage { mime_type, data })
}

/// Read the `image` field. `Ok(None)` when the request has no such field.
pub async fn read_image(
    multipart: &mut Multipart,
    max_bytes: usize,
) -> Result<Option<InlineImage>, UploadError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(UploadError::from_multipart)?
    {
        if field.name() != Some(IMAGE_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.map_err(UploadError::from_multipart)?;

        let image = validate_image(&content_type, data.to_vec(), max_bytes).map_err(|e| {
            warn!(
                "Rejected upload {:?} ({}, {} bytes): {}",
                file_name,
                content_type,
                data.len(),
                e
            );
            e
        })?;
        return Ok(Some(image));
    }
    Ok(None)
}
