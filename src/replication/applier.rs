//! Snapshot application on the replica.

use crate::partition::PartitionContainer;
use crate::record::Record;
use crate::replication::snapshot::ReplicationSnapshot;
use crate::types::current_time_millis;
use tracing::debug;

/// Install a received snapshot as the partition's new authoritative state.
///
/// Must run on the partition's execution context so the whole apply is
/// observed atomically by any later operation on that partition. Callers
/// only invoke this with a fully deserialized snapshot; a deserialization
/// failure upstream leaves local state untouched.
///
/// For every map in the snapshot's record sets the local store is reset and
/// repopulated; for every map in the delayed-entries mapping the local queue
/// is replaced wholesale, with the flush counter installed before the
/// entries. Maps absent from the snapshot are left alone. Applying the same
/// snapshot twice therefore converges to the same state as applying it once.
pub fn apply_snapshot(snapshot: &ReplicationSnapshot, container: &mut PartitionContainer) {
    let now = current_time_millis();

    for (name, infos) in snapshot.record_sets() {
        let map = container.ensure_map(name);
        let records = map.records_mut();
        records.reset();
        for info in infos {
            // Two-phase rebuild: a fresh record with a local creation time
            // and the use-map-default TTL, then the replicated metadata
            // overlaid on top.
            let mut record = Record::new(info.key().clone(), info.value().clone(), now);
            record.apply_metadata(info.metadata());
            records.put_record(record);
        }
    }

    for (name, entries) in snapshot.delayed_entries() {
        let counter = snapshot.flush_counters().get(name).copied().unwrap_or(0);
        let map = container.ensure_map(name);
        let store = map.write_behind_mut_or_create();
        store.clear();
        store.set_flush_counter(counter);
        for entry in entries {
            store.append(entry.clone());
        }
    }

    debug!(
        partition_id = container.partition_id(),
        maps = snapshot.record_sets().len(),
        records = snapshot.record_count(),
        delayed = snapshot.delayed_entry_count(),
        "applied replication snapshot"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MapConfig, WriteBehindConfig};
    use crate::partition::MapConfigRegistry;
    use crate::record::RecordMetadata;
    use crate::replication::snapshot::RecordReplicationInfo;
    use crate::writebehind::DelayedEntry;
    use bytes::Bytes;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    fn registry() -> Arc<MapConfigRegistry> {
        let registry = MapConfigRegistry::new();
        registry.register("orders", MapConfig::new().with_backup_count(1));
        registry.register(
            "events",
            MapConfig::new()
                .with_backup_count(1)
                .with_write_behind(WriteBehindConfig::default()),
        );
        Arc::new(registry)
    }

    fn record_snapshot(name: &str, infos: Vec<RecordReplicationInfo>) -> ReplicationSnapshot {
        let mut record_sets = BTreeMap::new();
        record_sets.insert(name.to_string(), infos);
        ReplicationSnapshot::new(record_sets, BTreeMap::new(), BTreeMap::new())
    }

    fn info(key: &str, value: &str, metadata: RecordMetadata) -> RecordReplicationInfo {
        RecordReplicationInfo::new(Bytes::from(key.to_string()), Bytes::from(value.to_string()), metadata)
    }

    #[test]
    fn test_apply_overlays_metadata_and_regenerates_creation_time() {
        let metadata = RecordMetadata {
            version: 9,
            creation_time: 1_000,
            last_access_time: 2_000,
            last_update_time: 3_000,
            hits: 17,
            ttl: Some(Duration::from_secs(45)),
        };
        let snapshot = record_snapshot("orders", vec![info("k1", "v1", metadata)]);

        let before = current_time_millis();
        let mut container = PartitionContainer::new(0, registry());
        apply_snapshot(&snapshot, &mut container);

        let record = container
            .get_map("orders")
            .unwrap()
            .records()
            .peek(b"k1")
            .unwrap();
        assert_eq!(record.value(), &Bytes::from("v1"));

        let meta = record.metadata();
        assert_eq!(meta.version, 9);
        assert_eq!(meta.hits, 17);
        assert_eq!(meta.last_access_time, 2_000);
        assert_eq!(meta.last_update_time, 3_000);
        assert_eq!(meta.ttl, Some(Duration::from_secs(45)));
        // Creation time is local, not the source's 1_000.
        assert!(meta.creation_time >= before);
    }

    #[test]
    fn test_apply_resets_stale_records() {
        let mut container = PartitionContainer::new(0, registry());
        container
            .ensure_map("orders")
            .records_mut()
            .put(Bytes::from("stale"), Bytes::from("x"), 50);

        let snapshot =
            record_snapshot("orders", vec![info("k1", "v1", RecordMetadata::new(100))]);
        apply_snapshot(&snapshot, &mut container);

        let records = container.get_map("orders").unwrap().records();
        assert_eq!(records.len(), 1);
        assert!(!records.contains(b"stale"));
        assert!(records.contains(b"k1"));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let snapshot = record_snapshot(
            "orders",
            vec![
                info("k1", "v1", RecordMetadata::new(100)),
                info("k2", "v2", RecordMetadata::new(100)),
            ],
        );

        let mut once = PartitionContainer::new(0, registry());
        apply_snapshot(&snapshot, &mut once);

        let mut twice = PartitionContainer::new(0, registry());
        apply_snapshot(&snapshot, &mut twice);
        apply_snapshot(&snapshot, &mut twice);

        let a = once.get_map("orders").unwrap().records();
        let b = twice.get_map("orders").unwrap().records();
        assert_eq!(a.len(), b.len());
        for record in a.iter() {
            let other = b.peek(record.key()).unwrap();
            assert_eq!(other.value(), record.value());
            assert_eq!(other.metadata().version, record.metadata().version);
        }
    }

    #[test]
    fn test_apply_replaces_write_behind_state() {
        let mut container = PartitionContainer::new(0, registry());
        let store = container.ensure_map("events").write_behind_mut().unwrap();
        store.append(DelayedEntry::new(Bytes::from("old"), Bytes::from("x"), 10, 0));
        store.set_flush_counter(99);

        let mut delayed = BTreeMap::new();
        delayed.insert(
            "events".to_string(),
            vec![
                DelayedEntry::new(Bytes::from("k1"), Bytes::from("v1"), 100, 0),
                DelayedEntry::new(Bytes::from("k2"), Bytes::from("v2"), 105, 0),
            ],
        );
        let mut counters = BTreeMap::new();
        counters.insert("events".to_string(), 1u64);
        let snapshot = ReplicationSnapshot::new(BTreeMap::new(), delayed, counters);

        apply_snapshot(&snapshot, &mut container);

        let store = container.get_map("events").unwrap().write_behind().unwrap();
        let entries = store.pending_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, Bytes::from("k1"));
        assert_eq!(entries[1].key, Bytes::from("k2"));
        // Captured counter, not the stale 99 and not the queue length.
        assert_eq!(store.flush_counter(), 1);
    }

    #[test]
    fn test_apply_creates_write_behind_store_on_demand() {
        // "orders" has write-behind disabled locally; the snapshot is
        // authoritative and the store is created anyway.
        let mut delayed = BTreeMap::new();
        delayed.insert(
            "orders".to_string(),
            vec![DelayedEntry::new(Bytes::from("k"), Bytes::from("v"), 100, 0)],
        );
        let snapshot = ReplicationSnapshot::new(BTreeMap::new(), delayed, BTreeMap::new());

        let mut container = PartitionContainer::new(0, registry());
        apply_snapshot(&snapshot, &mut container);

        let store = container.get_map("orders").unwrap().write_behind().unwrap();
        assert_eq!(store.pending_entries().len(), 1);
        // No captured counter for the map: applied as zero.
        assert_eq!(store.flush_counter(), 0);
    }

    #[test]
    fn test_maps_absent_from_snapshot_are_untouched() {
        let mut container = PartitionContainer::new(0, registry());
        container
            .ensure_map("events")
            .records_mut()
            .put(Bytes::from("keep"), Bytes::from("me"), 50);

        let snapshot =
            record_snapshot("orders", vec![info("k1", "v1", RecordMetadata::new(100))]);
        apply_snapshot(&snapshot, &mut container);

        assert!(container
            .get_map("events")
            .unwrap()
            .records()
            .contains(b"keep"));
    }
}
