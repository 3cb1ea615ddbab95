// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Text-safe image embedding.
//!
//! Pictures are stored inline in document fields as standard base64, without
//! size limits, compression or chunking. Decoding is lenient about an
//! optional data-URL header and never fails loudly: anything that does not
//! decode to a complete picture is simply "no image".

use crate::error::AppError;
use crate::services::picker::{ResourceHandle, ResourcePicker};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

pub use image::ImageFormat;

/// Delimiter that ends a data-URL header (`data:image/png;base64,`).
const HEADER_DELIMITER: &str = "base64,";

/// A decoded, displayable picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// The stored encoded bytes, unchanged
    pub bytes: Vec<u8>,
}

/// Encode raw picture bytes for storage in a document field.
pub fn encode_image(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Read a picked resource in full and encode it.
pub async fn encode_resource(
    picker: &dyn ResourcePicker,
    handle: &ResourceHandle,
) -> Result<String, AppError> {
    let bytes = picker.read_all(handle).await?;
    tracing::debug!(resource = %handle, size = bytes.len(), "Encoded picked resource");
    Ok(encode_image(&bytes))
}

/// Decode a stored picture field.
///
/// Returns `None` for empty text, malformed base64, or bytes that do not
/// decode to a complete picture.
pub fn decode_image(text: &str) -> Option<DecodedImage> {
    let payload = match text.find(HEADER_DELIMITER) {
        Some(pos) => &text[pos + HEADER_DELIMITER.len()..],
        None => text,
    };

    // Encoders that wrap lines at 76 columns are common.
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    let bytes = match BASE64.decode(compact.as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "Stored image is not valid base64");
            return None;
        }
    };

    let format = match image::guess_format(&bytes) {
        Ok(format) => format,
        Err(e) => {
            tracing::debug!(error = %e, size = bytes.len(), "Stored image has unknown format");
            return None;
        }
    };

    match image::load_from_memory_with_format(&bytes, format) {
        Ok(img) => Some(DecodedImage {
            format,
            width: img.width(),
            height: img.height(),
            bytes,
        }),
        Err(e) => {
            tracing::debug!(error = %e, ?format, "Stored image does not decode");
            None
        }
    }
}
