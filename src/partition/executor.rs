//! Per-partition serial execution contexts.
//!
//! Every partition is bound to exactly one ordered task queue consumed by a
//! dedicated tokio task that owns that partition's [`PartitionContainer`].
//! All reads and mutations of a partition's stores go through
//! [`PartitionExecutor::execute`], so concurrent access from other contexts
//! is structurally impossible and the stores need no locking. Snapshot
//! construction and snapshot application each run as a single closure on the
//! owning context and therefore observe (and produce) a single consistent
//! instant.

use crate::config::GridConfig;
use crate::error::{Error, Result};
use crate::partition::{MapConfigRegistry, PartitionContainer};
use crate::types::PartitionId;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// A unit of work bound to one partition's context.
type PartitionJob = Box<dyn FnOnce(&mut PartitionContainer) + Send + 'static>;

/// Pool of per-partition serial task queues.
///
/// Dropping the executor closes every queue; in-flight jobs finish, then the
/// partition tasks exit.
pub struct PartitionExecutor {
    senders: Vec<mpsc::UnboundedSender<PartitionJob>>,
}

impl PartitionExecutor {
    /// Spawn one owning task per partition.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: &GridConfig, registry: Arc<MapConfigRegistry>) -> Self {
        let partition_count = config.partition_count;
        let mut senders = Vec::with_capacity(partition_count as usize);

        for partition_id in 0..partition_count {
            let (tx, mut rx) = mpsc::unbounded_channel::<PartitionJob>();
            let registry = Arc::clone(&registry);

            tokio::spawn(async move {
                let mut container = PartitionContainer::new(partition_id, registry);
                while let Some(job) = rx.recv().await {
                    job(&mut container);
                }
                debug!(partition_id, "partition context stopped");
            });

            senders.push(tx);
        }

        debug!(partition_count, "partition contexts started");
        Self { senders }
    }

    /// Number of partitions this executor drives.
    pub fn partition_count(&self) -> u32 {
        self.senders.len() as u32
    }

    /// Run a closure on a partition's execution context and return its
    /// result.
    ///
    /// Jobs submitted to the same partition run strictly in submission
    /// order, one at a time.
    pub async fn execute<F, R>(&self, partition_id: PartitionId, job: F) -> Result<R>
    where
        F: FnOnce(&mut PartitionContainer) -> R + Send + 'static,
        R: Send + 'static,
    {
        let sender = self
            .senders
            .get(partition_id as usize)
            .ok_or(Error::UnknownPartition(partition_id))?;

        let (tx, rx) = oneshot::channel();
        let wrapped: PartitionJob = Box::new(move |container| {
            // The receiver may be gone if the caller was dropped; the job
            // still ran to completion on the partition context.
            let _ = tx.send(job(container));
        });

        sender
            .send(wrapped)
            .map_err(|_| Error::ExecutorStopped(partition_id))?;
        rx.await.map_err(|_| Error::ExecutorStopped(partition_id))
    }
}

impl std::fmt::Debug for PartitionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionExecutor")
            .field("partition_count", &self.senders.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use bytes::Bytes;

    fn executor(partitions: u32) -> PartitionExecutor {
        let registry = Arc::new(MapConfigRegistry::new());
        registry.register("orders", MapConfig::new());
        PartitionExecutor::new(
            &GridConfig::new().with_partition_count(partitions),
            registry,
        )
    }

    #[tokio::test]
    async fn test_execute_runs_on_owning_partition() {
        let executor = executor(4);

        let partition_id = executor
            .execute(2, |container| container.partition_id())
            .await
            .unwrap();
        assert_eq!(partition_id, 2);
    }

    #[tokio::test]
    async fn test_unknown_partition_is_rejected() {
        let executor = executor(4);

        let result = executor.execute(9, |_| ()).await;
        assert!(matches!(result, Err(Error::UnknownPartition(9))));
    }

    #[tokio::test]
    async fn test_jobs_on_one_partition_run_in_order() {
        let executor = executor(1);

        for i in 0..100i64 {
            executor
                .execute(0, move |container| {
                    let map = container.ensure_map("orders");
                    map.put(
                        Bytes::from("counter"),
                        Bytes::from(i.to_string()),
                        i,
                    );
                })
                .await
                .unwrap();
        }

        let (value, version) = executor
            .execute(0, |container| {
                let map = container.ensure_map("orders");
                let record = map.records().peek(b"counter").unwrap();
                (record.value().clone(), record.metadata().version)
            })
            .await
            .unwrap();

        assert_eq!(value, Bytes::from("99"));
        // One create plus ninety-nine updates.
        assert_eq!(version, 99);
    }

    #[tokio::test]
    async fn test_state_persists_between_jobs() {
        let executor = executor(2);

        executor
            .execute(1, |container| {
                container
                    .ensure_map("orders")
                    .put(Bytes::from("k"), Bytes::from("v"), 100);
            })
            .await
            .unwrap();

        let found = executor
            .execute(1, |container| {
                container.ensure_map("orders").records().contains(b"k")
            })
            .await
            .unwrap();
        assert!(found);
    }
}
