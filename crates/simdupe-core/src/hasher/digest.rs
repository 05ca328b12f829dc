use crate::model::{Digest, ShortDigest};
use crate::text::normalize_whitespace;
use sha1::Sha1;
use sha2::{Digest as _, Sha256};

/// Hex characters kept by the perceptual-hash placeholder.
pub const PERCEPTUAL_HASH_LENGTH: usize = 16;

/// SHA-256 of the raw bytes. Ground truth for byte-identical duplicates.
pub fn compute_exact_hash(bytes: &[u8]) -> Digest {
    let result = Sha256::digest(bytes);
    Digest::from_hex(hex::encode(result))
}

/// SHA-256 of the text after whitespace collapsing and lower-casing.
///
/// A dedup key, not a security primitive: texts that differ only in
/// whitespace runs or letter case hash identically.
pub fn compute_content_hash(text: &str) -> Digest {
    let normalized = normalize_whitespace(text);
    compute_exact_hash(normalized.as_bytes())
}

/// Placeholder for a perceptual image hash: the first 16 hex characters of
/// a SHA-1 digest over the raw bytes.
///
/// This does not survive re-encoding or resizing. A frequency-domain
/// (DCT) or gradient hash compared by Hamming distance is needed for
/// real near-duplicate image matching.
pub fn compute_perceptual_hash(image_bytes: &[u8]) -> ShortDigest {
    let hex = hex::encode(Sha1::digest(image_bytes));
    ShortDigest::from_hex(&hex[..PERCEPTUAL_HASH_LENGTH])
}
