use super::ordering::{OrderingPolicy, QueueStorage};
use crate::config::QueueConfig;
use crate::errors::{BridgeError, BridgeResult};
use crate::intake::{CrossLayerRequest, RequestId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Counters exposed for monitoring
#[derive(Debug, Default)]
pub struct QueueStats {
    pub enqueued: AtomicU64,
    pub dequeued: AtomicU64,
}

impl QueueStats {
    /// `(enqueued, dequeued)` since the queue was created
    pub fn totals(&self) -> (u64, u64) {
        (self.enqueued.load(Ordering::Relaxed), self.dequeued.load(Ordering::Relaxed))
    }
}

/*
   Holds accepted requests until the executor takes them.
   All mutation goes through one write lock, so a request popped by one
   dequeue_batch call can never be seen by another: each enqueued request
   is handed out exactly once.
*/
#[derive(Debug)]
pub struct PriorityQueue {
    storage: RwLock<QueueStorage>,
    max_pending: usize,
    pub stats: QueueStats,
}

impl PriorityQueue {
    pub fn new(config: &QueueConfig) -> Self {
        Self { storage: RwLock::new(QueueStorage::new(config.ordering)), max_pending: config.max_pending, stats: QueueStats::default() }
    }

    pub fn with_policy(policy: OrderingPolicy) -> Self {
        Self::new(&QueueConfig { ordering: policy, ..QueueConfig::default() })
    }

    fn read(&self) -> RwLockReadGuard<'_, QueueStorage> {
        self.storage.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, QueueStorage> {
        self.storage.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn enqueue(&self, request: CrossLayerRequest) -> BridgeResult<()> {
        let mut storage = self.write();
        if storage.len() >= self.max_pending {
            return Err(BridgeError::QueueFull(storage.len()));
        }
        debug!("Enqueued request {} (serial {})", request.id(), request.serial_id());
        storage.push(request);
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Remove and return up to `max_count` requests in the current ordering
    pub fn dequeue_batch(&self, max_count: usize) -> Vec<CrossLayerRequest> {
        if max_count == 0 {
            return Vec::new();
        }
        let mut storage = self.write();
        let take = max_count.min(storage.len());
        let batch: Vec<CrossLayerRequest> = (0..take).filter_map(|_| storage.pop()).collect();
        drop(storage);

        self.stats.dequeued.fetch_add(batch.len() as u64, Ordering::Relaxed);
        if !batch.is_empty() {
            debug!("Dequeued batch of {} requests", batch.len());
        }
        batch
    }

    pub fn has_capacity(&self) -> bool {
        self.read().len() < self.max_pending
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_pending(&self) -> usize {
        self.max_pending
    }

    /// Identifier of the request the next dequeue would return
    pub fn peek_next_id(&self) -> Option<RequestId> {
        self.read().peek().map(|request| request.id())
    }

    pub fn policy(&self) -> OrderingPolicy {
        self.read().policy()
    }

    /// Re-order pending requests under a different policy. Nothing is lost or duplicated.
    pub fn switch_policy(&self, policy: OrderingPolicy) {
        let mut storage = self.write();
        if storage.policy() == policy {
            return;
        }
        let pending = storage.drain_in_acceptance_order();
        let moved = pending.len();
        let mut replacement = QueueStorage::new(policy);
        for request in pending {
            replacement.push(request);
        }
        *storage = replacement;
        info!("Priority queue switched to {} ordering with {} pending requests", policy, moved);
    }
}

impl Default for PriorityQueue {
    fn default() -> Self {
        Self::new(&QueueConfig::default())
    }
}
