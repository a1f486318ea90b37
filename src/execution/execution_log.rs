use crate::errors::{BridgeError, BridgeResult};
use crate::intake::RequestId;
use crate::utils::now_timestamp;
use ahash::HashMap;
use alloy_primitives::{B256, keccak256};
use serde::{Deserialize, Serialize};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;
use tracing::{debug, error};

/// The single authoritative outcome of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub request_id: RequestId,
    pub serial_id: u64,
    pub succeeded: bool,
    /// Position in the append-only log
    pub log_index: u64,
    pub recorded_at: u64,
    pub prev_hash: B256,
    pub entry_hash: B256,
}

impl ExecutionLogEntry {
    fn chain_hash(prev_hash: B256, request_id: &RequestId, serial_id: u64, succeeded: bool, log_index: u64, recorded_at: u64) -> B256 {
        let mut preimage = Vec::with_capacity(32 + 32 + 8 + 1 + 8 + 8);
        preimage.extend_from_slice(prev_hash.as_slice());
        preimage.extend_from_slice(request_id.as_bytes());
        preimage.extend_from_slice(&serial_id.to_be_bytes());
        preimage.push(succeeded as u8);
        preimage.extend_from_slice(&log_index.to_be_bytes());
        preimage.extend_from_slice(&recorded_at.to_be_bytes());
        keccak256(preimage)
    }

    fn expected_hash(&self) -> B256 {
        Self::chain_hash(self.prev_hash, &self.request_id, self.serial_id, self.succeeded, self.log_index, self.recorded_at)
    }
}

#[derive(Debug, Default)]
struct LogState {
    entries: Vec<ExecutionLogEntry>,
    index: HashMap<RequestId, usize>,
    head: B256,
}

/// Write-once outcome log keyed by request id.
///
/// Entries are hash-chained: each one commits to the previous entry's hash,
/// so rewriting or dropping an earlier outcome breaks `verify_chain`.
/// Callers on L1 poll `lookup` or `subscribe` to new entries.
#[derive(Debug)]
pub struct ExecutionLog {
    state: RwLock<LogState>,
    outcomes: broadcast::Sender<ExecutionLogEntry>,
}

impl ExecutionLog {
    pub fn new(subscriber_buffer: usize) -> Self {
        let (outcomes, _) = broadcast::channel(subscriber_buffer.max(1));
        Self { state: RwLock::new(LogState::default()), outcomes }
    }

    fn read(&self) -> RwLockReadGuard<'_, LogState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, LogState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, request_id: RequestId, serial_id: u64, succeeded: bool) -> BridgeResult<ExecutionLogEntry> {
        let mut state = self.write();
        if state.index.contains_key(&request_id) {
            error!("Second outcome write for request {}", request_id);
            return Err(BridgeError::DuplicateRecord(request_id));
        }

        let log_index = state.entries.len() as u64;
        let recorded_at = now_timestamp();
        let prev_hash = state.head;
        let entry_hash = ExecutionLogEntry::chain_hash(prev_hash, &request_id, serial_id, succeeded, log_index, recorded_at);
        let entry = ExecutionLogEntry { request_id, serial_id, succeeded, log_index, recorded_at, prev_hash, entry_hash };

        state.entries.push(entry.clone());
        state.index.insert(request_id, log_index as usize);
        state.head = entry_hash;

        // Sent under the write lock so subscribers see entries in log_index order.
        // No subscribers is fine, the entry is still in the log.
        let _ = self.outcomes.send(entry.clone());
        drop(state);

        debug!("Recorded outcome for request {}: succeeded={}", request_id, succeeded);
        Ok(entry)
    }

    /// `None` until the outcome is recorded, then the recorded flag forever
    pub fn lookup(&self, request_id: &RequestId) -> Option<bool> {
        let state = self.read();
        state.index.get(request_id).map(|&i| state.entries[i].succeeded)
    }

    pub fn entry(&self, request_id: &RequestId) -> BridgeResult<ExecutionLogEntry> {
        let state = self.read();
        state.index.get(request_id).map(|&i| state.entries[i].clone()).ok_or(BridgeError::NotFound(*request_id))
    }

    /// Entries from `log_index` onwards, for auditors catching up
    pub fn entries_from(&self, log_index: u64) -> Vec<ExecutionLogEntry> {
        let state = self.read();
        let start = usize::try_from(log_index).unwrap_or(usize::MAX).min(state.entries.len());
        state.entries[start..].to_vec()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionLogEntry> {
        self.outcomes.subscribe()
    }

    pub fn head_hash(&self) -> B256 {
        self.read().head
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recompute the hash chain from genesis and compare with the stored head
    pub fn verify_chain(&self) -> bool {
        let state = self.read();
        verify_entries(&state.entries, state.head)
    }
}

impl Default for ExecutionLog {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// Check an exported list of entries against a published head hash
pub fn verify_entries(entries: &[ExecutionLogEntry], head: B256) -> bool {
    let mut prev = B256::ZERO;
    for (position, entry) in entries.iter().enumerate() {
        if entry.log_index != position as u64 || entry.prev_hash != prev || entry.entry_hash != entry.expected_hash() {
            return false;
        }
        prev = entry.entry_hash;
    }
    prev == head
}
