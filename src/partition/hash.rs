//! Stable key-to-partition routing.

use crate::types::PartitionId;
use std::hash::Hasher;
use twox_hash::XxHash64;

/// Seed for key hashing. Fixed so every node routes a key identically.
const HASH_SEED: u64 = 0;

/// Map a serialized key to its owning partition.
///
/// `partition_count` must match the grid configuration on every node;
/// the mapping is stable across processes and platforms.
pub fn partition_for_key(key: &[u8], partition_count: u32) -> PartitionId {
    debug_assert!(partition_count > 0);
    let mut hasher = XxHash64::with_seed(HASH_SEED);
    hasher.write(key);
    (hasher.finish() % u64::from(partition_count.max(1))) as PartitionId
}
