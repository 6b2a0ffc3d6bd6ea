//! Image content fingerprinting for duplicate detection.
//!
//! Images are re-encoded to a canonical JPEG before hashing so that
//! pixel-identical screenshots fingerprint identically regardless of the
//! container format they arrived in.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use sha2::{Digest, Sha256};
use tracing::debug;

/// JPEG quality used for the canonical re-encode.
const CANONICAL_JPEG_QUALITY: u8 = 80;

/// Compute the content fingerprint of an image: SHA-256 over the canonical
/// JPEG re-encoding, rendered as lowercase hex.
///
/// Returns an empty string when the bytes cannot be decoded or re-encoded.
/// Callers must treat an empty fingerprint as "deduplication unavailable for
/// this run", not as a failure.
pub fn fingerprint(image_bytes: &[u8]) -> String {
    match canonical_jpeg(image_bytes) {
        Ok(encoded) => {
            let mut hasher = Sha256::new();
            hasher.update(&encoded);
            hex::encode(hasher.finalize())
        }
        Err(err) => {
            debug!("fingerprint unavailable: {}", err);
            String::new()
        }
    }
}

/// Re-encode image bytes to the canonical JPEG form used for hashing.
pub fn canonical_jpeg(image_bytes: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let img = image::load_from_memory(image_bytes)?;
    // RGB8 normalizes away alpha channels and bit depths before encoding.
    let rgb = img.to_rgb8();

    let mut encoded = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut encoded), CANONICAL_JPEG_QUALITY);
    rgb.write_with_encoder(encoder)?;
    Ok(encoded)
}
