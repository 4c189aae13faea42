//! Configuration types for the data grid.

use std::time::Duration;

/// Default number of partitions the key space is divided into.
pub const DEFAULT_PARTITION_COUNT: u32 = 271;

/// Grid-wide configuration.
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Number of partitions the key space is divided into.
    ///
    /// Fixed for the lifetime of the grid; changing it would remap every key.
    pub partition_count: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            partition_count: DEFAULT_PARTITION_COUNT,
        }
    }
}

impl GridConfig {
    /// Create a configuration with the default partition count.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the partition count.
    pub fn with_partition_count(mut self, partition_count: u32) -> Self {
        self.partition_count = partition_count.max(1);
        self
    }
}

/// Per-map configuration.
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Number of backup replicas kept for this map.
    ///
    /// A map participates in replication to replica index `r` only if
    /// `backup_count >= r`.
    pub backup_count: u32,

    /// Default time-to-live for records without a per-record override.
    /// `None` means records never expire by default.
    pub default_ttl: Option<Duration>,

    /// Write-behind persistence settings. `None` disables write-behind
    /// for this map.
    pub write_behind: Option<WriteBehindConfig>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            backup_count: 1,
            default_ttl: None,
            write_behind: None,
        }
    }
}

impl MapConfig {
    /// Create a configuration with defaults (one backup, no TTL,
    /// no write-behind).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of backup replicas.
    pub fn with_backup_count(mut self, backup_count: u32) -> Self {
        self.backup_count = backup_count;
        self
    }

    /// Set the default TTL for records of this map.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Enable write-behind persistence with the given settings.
    pub fn with_write_behind(mut self, write_behind: WriteBehindConfig) -> Self {
        self.write_behind = Some(write_behind);
        self
    }

    /// Whether write-behind persistence is enabled for this map.
    pub fn write_behind_enabled(&self) -> bool {
        self.write_behind.is_some()
    }
}

/// Write-behind persistence settings for a map.
#[derive(Debug, Clone)]
pub struct WriteBehindConfig {
    /// Delay between a mutation and the earliest moment it may be flushed
    /// to the external store.
    pub write_delay: Duration,
}

impl Default for WriteBehindConfig {
    fn default() -> Self {
        Self {
            write_delay: Duration::from_secs(1),
        }
    }
}

impl WriteBehindConfig {
    /// Create settings with the default write delay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the write delay.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }
}
