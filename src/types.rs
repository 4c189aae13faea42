//! Core types used throughout the data grid.

use std::time::{SystemTime, UNIX_EPOCH};

/// Identifier of a partition (a fixed shard of the key space).
pub type PartitionId = u32;

/// Index of a partition replica: 0 is the primary owner, 1..N are backups.
pub type ReplicaIndex = u32;

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// All record and write-behind timestamps in the grid use this clock.
pub fn current_time_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
