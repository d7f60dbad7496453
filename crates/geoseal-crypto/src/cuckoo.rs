//! PRP-driven cuckoo bucketing of selection indices.
//!
//! Each index gets κ candidate buckets from the seeded permutation and is
//! placed into the least-loaded candidate. The output partitions a token's
//! selection set into independent sub-queries; the per-bucket DMPF then
//! hides which columns inside a bucket were semantically selected.

use crate::prf::prp_mod;
use std::collections::BTreeMap;

/// Number of buckets for a selection set: `max(1, ⌈load · |S|⌉)`.
pub fn bucket_count(load: f64, set_len: usize) -> usize {
    ((load * set_len.max(1) as f64).ceil() as usize).max(1)
}

/// Partition `indices` into at most `num_buckets` buckets.
///
/// `m` is the column domain size, used to offset the PRP input per
/// candidate round. Duplicated indices are placed once per occurrence.
/// Empty buckets are dropped; iteration order is ascending bucket id.
pub fn bucketize(
    indices: &[usize],
    m: usize,
    kappa: usize,
    num_buckets: usize,
    seed: &[u8],
) -> BTreeMap<usize, Vec<usize>> {
    let num_buckets = num_buckets.max(1);
    let mut buckets: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut sizes = vec![0usize; num_buckets];

    for &j in indices {
        let mut best: Option<usize> = None;
        for i in 0..kappa {
            let cand = prp_mod(seed, (j + m * i) as u64, num_buckets as u64) as usize;
            // Ties keep the earliest candidate.
            if best.map_or(true, |b| sizes[cand] < sizes[b]) {
                best = Some(cand);
            }
        }
        // kappa >= 1 always holds for valid configs.
        if let Some(b) = best {
            sizes[b] += 1;
            buckets.entry(b).or_default().push(j);
        }
    }

    buckets
}
