use crate::model::{Digest, FileRecord};
use ahash::AHashMap;

/// Group records by exact hash. Buckets come back in the order their hash
/// was first seen, and members keep input order. Singletons are included;
/// callers filter on `len() > 1`.
pub fn bucket_by_exact_hash(records: &[FileRecord]) -> Vec<(Digest, Vec<&FileRecord>)> {
    let mut index: AHashMap<&Digest, usize> = AHashMap::with_capacity(records.len());
    let mut buckets: Vec<(Digest, Vec<&FileRecord>)> = Vec::new();

    for record in records {
        match index.get(&record.exact_hash) {
            Some(&slot) => buckets[slot].1.push(record),
            None => {
                index.insert(&record.exact_hash, buckets.len());
                buckets.push((record.exact_hash.clone(), vec![record]));
            }
        }
    }

    buckets
}
