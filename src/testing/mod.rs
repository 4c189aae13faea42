//! Testing utilities for the data grid.
//!
//! Provides fixtures for building populated partition state in tests, plus
//! end-to-end replication suites exercising the whole
//! build → encode → decode → apply pipeline across partition contexts.


use crate::config::{MapConfig, WriteBehindConfig};
use crate::partition::{MapConfigRegistry, PartitionContainer};
use crate::types::PartitionId;
use crate::writebehind::DelayedEntry;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// A registry with one plain map ("orders", one backup), one map that is
/// never replicated to backups ("scratch"), and one write-behind map
/// ("events").
pub fn test_registry() -> Arc<MapConfigRegistry> {
    let registry = MapConfigRegistry::new();
    registry.register("orders", MapConfig::new().with_backup_count(1));
    registry.register("scratch", MapConfig::new().with_backup_count(0));
    registry.register(
        "events",
        MapConfig::new()
            .with_backup_count(1)
            .with_write_behind(WriteBehindConfig::new().with_write_delay(Duration::from_secs(1))),
    );
    Arc::new(registry)
}

/// A container for `partition_id` with records in every test map and a
/// two-entry write-behind queue (flush counter 1) on "events".
pub fn populated_container(partition_id: PartitionId) -> PartitionContainer {
    let mut container = PartitionContainer::new(partition_id, test_registry());

    let orders = container.ensure_map("orders").records_mut();
    for i in 0..3 {
        orders.put(
            Bytes::from(format!("order-{i}")),
            Bytes::from(format!("payload-{i}")),
            1_000 + i as i64,
        );
    }

    container
        .ensure_map("scratch")
        .records_mut()
        .put(Bytes::from("tmp"), Bytes::from("x"), 1_000);

    let events = container.ensure_map("events");
    events
        .records_mut()
        .put(Bytes::from("evt-1"), Bytes::from("body"), 1_000);
    let store = events.write_behind_mut().expect("write-behind enabled");
    store.append(DelayedEntry::new(
        Bytes::from("evt-1"),
        Bytes::from("body"),
        2_000,
        partition_id,
    ));
    store.append(DelayedEntry::new(
        Bytes::from("evt-2"),
        Bytes::from("body-2"),
        2_005,
        partition_id,
    ));
    store.set_flush_counter(1);

    container
}
