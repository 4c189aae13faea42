//! Snapshot construction on the partition owner.

use crate::partition::PartitionContainer;
use crate::replication::snapshot::{RecordReplicationInfo, ReplicationSnapshot};
use crate::types::ReplicaIndex;
use std::collections::BTreeMap;
use tracing::debug;

/// Build a replication snapshot of a partition for the given replica index.
///
/// Must run on the partition's execution context so the capture observes a
/// single consistent instant across every map in the partition.
///
/// A map's records are captured only if its configured backup count covers
/// `replica_index`; maps that fail the test are absent entirely, never
/// present with an empty set. Pending write-behind queues are captured for
/// every write-behind map regardless of the backup filter, together with the
/// map's flush counter, but only when the queue is non-empty. Absence and
/// empty are applied identically; omission just keeps the wire form small.
pub fn build_snapshot(
    container: &PartitionContainer,
    replica_index: ReplicaIndex,
) -> ReplicationSnapshot {
    let mut record_sets = BTreeMap::new();
    for (name, map) in container.maps() {
        if map.config().backup_count < replica_index {
            continue;
        }
        let records: Vec<RecordReplicationInfo> = map
            .records()
            .iter()
            .map(RecordReplicationInfo::from_record)
            .collect();
        record_sets.insert(name.clone(), records);
    }

    let mut delayed_entries = BTreeMap::new();
    let mut flush_counters = BTreeMap::new();
    for (name, map) in container.maps() {
        let Some(store) = map.write_behind() else {
            continue;
        };
        let entries = store.pending_entries();
        if entries.is_empty() {
            continue;
        }
        delayed_entries.insert(name.clone(), entries);
        flush_counters.insert(name.clone(), store.flush_counter());
    }

    let snapshot = ReplicationSnapshot::new(record_sets, delayed_entries, flush_counters);
    debug!(
        partition_id = container.partition_id(),
        replica_index,
        maps = snapshot.record_sets().len(),
        records = snapshot.record_count(),
        delayed = snapshot.delayed_entry_count(),
        "built replication snapshot"
    );
    snapshot
}
