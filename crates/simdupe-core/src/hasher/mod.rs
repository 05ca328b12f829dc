pub mod buckets;
pub mod digest;

pub use buckets::bucket_by_exact_hash;
pub use digest::{
    compute_content_hash, compute_exact_hash, compute_perceptual_hash, PERCEPTUAL_HASH_LENGTH,
};
