//! Partition-local state and the per-partition execution model.
//!
//! Each partition owns a [`PartitionContainer`]: one [`MapPartition`] per map
//! name, holding that map's record store and, when the map persists via
//! write-behind, its write-behind store. Containers are owned by exactly one
//! [`PartitionExecutor`] task, so everything inside them is mutated from a
//! single logical execution context and needs no locking.

mod executor;
mod hash;

pub use executor::PartitionExecutor;
pub use hash::partition_for_key;

use crate::config::MapConfig;
use crate::record::RecordStore;
use crate::types::PartitionId;
use crate::writebehind::{DelayedEntry, WriteBehindStore};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Grid-wide registry of per-map configurations.
///
/// Shared by every partition context on a node; map configurations are the
/// same on all nodes, so the builder and the applier always resolve a map
/// name to the same configuration. Unknown names resolve to the default
/// configuration.
#[derive(Debug, Default)]
pub struct MapConfigRegistry {
    configs: RwLock<HashMap<String, MapConfig>>,
}

impl MapConfigRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the configuration for a map name, replacing any previous one.
    pub fn register(&self, name: impl Into<String>, config: MapConfig) {
        self.configs.write().insert(name.into(), config);
    }

    /// Resolve a map name to its configuration, falling back to defaults.
    pub fn resolve(&self, name: &str) -> MapConfig {
        self.configs.read().get(name).cloned().unwrap_or_default()
    }
}

/// One map's slice of one partition: its configuration, record store and,
/// if write-behind is enabled, its write-behind store.
#[derive(Debug)]
pub struct MapPartition {
    partition_id: PartitionId,
    config: MapConfig,
    records: RecordStore,
    write_behind: Option<WriteBehindStore>,
}

impl MapPartition {
    /// Create the stores for one map in one partition from its configuration.
    pub fn new(name: &str, partition_id: PartitionId, config: MapConfig) -> Self {
        let write_behind = config.write_behind_enabled().then(WriteBehindStore::new);
        Self {
            partition_id,
            config,
            records: RecordStore::new(name),
            write_behind,
        }
    }

    /// The map configuration this partition slice was created from.
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// The record store.
    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// The record store, mutably.
    pub fn records_mut(&mut self) -> &mut RecordStore {
        &mut self.records
    }

    /// The write-behind store, if the map persists via write-behind.
    pub fn write_behind(&self) -> Option<&WriteBehindStore> {
        self.write_behind.as_ref()
    }

    /// The write-behind store, mutably.
    pub fn write_behind_mut(&mut self) -> Option<&mut WriteBehindStore> {
        self.write_behind.as_mut()
    }

    /// The write-behind store, created on demand.
    ///
    /// Replication is authoritative: a snapshot carrying delayed entries for
    /// this map implies write-behind, even if the locally resolved
    /// configuration says otherwise.
    pub fn write_behind_mut_or_create(&mut self) -> &mut WriteBehindStore {
        self.write_behind.get_or_insert_with(WriteBehindStore::new)
    }

    /// Client-path write: store the record and, for write-behind maps,
    /// queue the mutation for delayed persistence.
    pub fn put(&mut self, key: Bytes, value: Bytes, now: i64) -> Option<Bytes> {
        let previous = self.records.put(key.clone(), value.clone(), now);
        if let (Some(store), Some(wb)) = (self.write_behind.as_mut(), &self.config.write_behind) {
            let store_time = now + wb.write_delay.as_millis() as i64;
            store.append(DelayedEntry::new(key, value, store_time, self.partition_id));
        }
        previous
    }
}

/// All of one partition's per-map state, keyed by map name.
#[derive(Debug)]
pub struct PartitionContainer {
    partition_id: PartitionId,
    registry: Arc<MapConfigRegistry>,
    maps: HashMap<String, MapPartition>,
}

impl PartitionContainer {
    /// Create an empty container for a partition.
    pub fn new(partition_id: PartitionId, registry: Arc<MapConfigRegistry>) -> Self {
        Self {
            partition_id,
            registry,
            maps: HashMap::new(),
        }
    }

    /// The partition this container belongs to.
    pub fn partition_id(&self) -> PartitionId {
        self.partition_id
    }

    /// Number of maps with state in this partition.
    pub fn map_count(&self) -> usize {
        self.maps.len()
    }

    /// Iterate over (map name, map state) in no particular order.
    pub fn maps(&self) -> impl Iterator<Item = (&String, &MapPartition)> {
        self.maps.iter()
    }

    /// A map's state, if it has any in this partition.
    pub fn get_map(&self, name: &str) -> Option<&MapPartition> {
        self.maps.get(name)
    }

    /// A map's state, mutably.
    pub fn get_map_mut(&mut self, name: &str) -> Option<&mut MapPartition> {
        self.maps.get_mut(name)
    }

    /// A map's state, created from the registry's configuration on first use.
    pub fn ensure_map(&mut self, name: &str) -> &mut MapPartition {
        let partition_id = self.partition_id;
        let registry = &self.registry;
        self.maps
            .entry(name.to_string())
            .or_insert_with(|| MapPartition::new(name, partition_id, registry.resolve(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WriteBehindConfig;
    use std::time::Duration;

    fn registry() -> Arc<MapConfigRegistry> {
        let registry = MapConfigRegistry::new();
        registry.register(
            "orders",
            MapConfig::new()
                .with_backup_count(1)
                .with_write_behind(WriteBehindConfig::new().with_write_delay(Duration::from_secs(2))),
        );
        Arc::new(registry)
    }

    #[test]
    fn test_registry_resolves_registered_and_default() {
        let registry = registry();
        assert!(registry.resolve("orders").write_behind_enabled());

        let fallback = registry.resolve("never-registered");
        assert_eq!(fallback.backup_count, 1);
        assert!(!fallback.write_behind_enabled());
    }

    #[test]
    fn test_ensure_map_creates_stores_from_config() {
        let mut container = PartitionContainer::new(3, registry());

        let map = container.ensure_map("orders");
        assert!(map.write_behind().is_some());
        assert_eq!(map.records().name(), "orders");

        let plain = container.ensure_map("sessions");
        assert!(plain.write_behind().is_none());

        assert_eq!(container.map_count(), 2);
    }

    #[test]
    fn test_put_queues_delayed_entry_for_write_behind_map() {
        let mut container = PartitionContainer::new(3, registry());

        let map = container.ensure_map("orders");
        map.put(Bytes::from("k1"), Bytes::from("v1"), 1_000);

        let store = map.write_behind().unwrap();
        let entries = store.pending_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, Bytes::from("k1"));
        assert_eq!(entries[0].store_time, 3_000);
        assert_eq!(entries[0].partition_id, 3);
    }

    #[test]
    fn test_put_skips_queue_without_write_behind() {
        let mut container = PartitionContainer::new(3, registry());

        let map = container.ensure_map("sessions");
        map.put(Bytes::from("k1"), Bytes::from("v1"), 1_000);

        assert!(map.write_behind().is_none());
        assert_eq!(map.records().len(), 1);
    }
}
