//! Partition replication core for an in-memory key-value data grid.
//!
//! The key space is divided into a fixed number of partitions, each bound to
//! exactly one serial execution context. This crate owns what happens when a
//! partition gains or refreshes a backup replica: capturing a
//! point-in-time-consistent snapshot of the owner's live records and pending
//! write-behind persistence work, carrying it in a compact binary form, and
//! installing it atomically and idempotently on the receiving replica.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │            Migration coordinator               │   (external)
//! └────────────────────────────────────────────────┘
//!                        │ partition id, replica index
//!                        ▼
//! ┌────────────────────────────────────────────────┐
//! │   PartitionExecutor: one serial context per    │
//! │   partition, owning its PartitionContainer     │
//! │   ┌───────────────┐  ┌───────────────────────┐ │
//! │   │ RecordStore   │  │ WriteBehindStore      │ │  per map
//! │   │ (live records)│  │ (queue + flush count) │ │
//! │   └───────────────┘  └───────────────────────┘ │
//! └────────────────────────────────────────────────┘
//!                        │ build_snapshot / apply_snapshot
//!                        ▼
//! ┌────────────────────────────────────────────────┐
//! │  ReplicationOperation + wire codec + envelope  │
//! └────────────────────────────────────────────────┘
//!                        │ bytes
//!                        ▼
//!                operation transport                  (external)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use gridmap::{
//!     GridConfig, MapConfig, MapConfigRegistry, PartitionExecutor, ReplicationOperation,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Arc::new(MapConfigRegistry::new());
//!     registry.register("orders", MapConfig::new().with_backup_count(2));
//!
//!     let config = GridConfig::new().with_partition_count(16);
//!     let executor = PartitionExecutor::new(&config, registry);
//!
//!     // Capture partition 3 for its first backup replica.
//!     let operation = executor
//!         .execute(3, |container| ReplicationOperation::new(container, 1))
//!         .await?;
//!
//!     if !operation.is_empty() {
//!         // hand the encoded operation to the transport ...
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Consistency model
//!
//! - Snapshot capture and apply each run as a single unit of work on the
//!   partition's context: a snapshot reflects one consistent instant, and an
//!   apply is observed atomically by later operations on that partition.
//! - Apply fully resets every map included in the snapshot, so replaying an
//!   operation against an already-synchronized replica converges to the same
//!   state. Retry policy belongs to the external migration coordinator.
//! - A deserialization failure surfaces before any local mutation; the
//!   replica's state is provably unchanged on error.
//! - Partitions are replicated independently; there is no cross-partition
//!   atomicity and none is needed.

pub mod config;
pub mod error;
pub mod partition;
pub mod record;
pub mod replication;
pub mod testing;
pub mod types;
pub mod writebehind;

// Re-export main types for convenience.
pub use config::{GridConfig, MapConfig, WriteBehindConfig, DEFAULT_PARTITION_COUNT};
pub use error::{CodecError, Error, Result};
pub use types::{current_time_millis, PartitionId, ReplicaIndex};

// Re-export storage types.
pub use record::{Record, RecordMetadata, RecordStore};
pub use writebehind::{DelayedEntry, WriteBehindQueue, WriteBehindStore};

// Re-export partition types.
pub use partition::{
    partition_for_key, MapConfigRegistry, MapPartition, PartitionContainer, PartitionExecutor,
};

// Re-export replication types.
pub use replication::{
    apply_snapshot, build_snapshot, decode_message, encode_message, frame_message, read_snapshot,
    write_snapshot, RecordReplicationInfo, ReplicationMessage, ReplicationOperation,
    ReplicationSnapshot,
};
