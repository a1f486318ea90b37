use crate::intake::CrossLayerRequest;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, VecDeque};
use strum_macros::{Display, EnumIter, EnumString, VariantNames};

/// Order in which pending requests are handed to the executor
#[derive(Copy, Clone, Debug, Default, Display, PartialEq, Eq, Hash, EnumString, EnumIter, VariantNames, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderingPolicy {
    /// Acceptance order
    #[default]
    Fifo,
    /// Highest declared tip first, acceptance order among equal tips
    TipHeap,
}

/// Heap entry ordered by tip, then by earliest serial id
#[derive(Debug, Clone)]
pub(crate) struct TipOrdered {
    tip: U256,
    serial: Reverse<u64>,
    request: CrossLayerRequest,
}

impl TipOrdered {
    fn new(request: CrossLayerRequest) -> Self {
        Self { tip: request.tip(), serial: Reverse(request.serial_id()), request }
    }
}

impl PartialEq for TipOrdered {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TipOrdered {}

impl PartialOrd for TipOrdered {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TipOrdered {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tip.cmp(&other.tip).then_with(|| self.serial.cmp(&other.serial))
    }
}

/// Storage of pending requests for one ordering policy
#[derive(Debug)]
pub(crate) enum QueueStorage {
    Fifo(VecDeque<CrossLayerRequest>),
    TipHeap(BinaryHeap<TipOrdered>),
}

impl QueueStorage {
    pub fn new(policy: OrderingPolicy) -> Self {
        match policy {
            OrderingPolicy::Fifo => QueueStorage::Fifo(VecDeque::new()),
            OrderingPolicy::TipHeap => QueueStorage::TipHeap(BinaryHeap::new()),
        }
    }

    pub fn policy(&self) -> OrderingPolicy {
        match self {
            QueueStorage::Fifo(_) => OrderingPolicy::Fifo,
            QueueStorage::TipHeap(_) => OrderingPolicy::TipHeap,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            QueueStorage::Fifo(queue) => queue.len(),
            QueueStorage::TipHeap(heap) => heap.len(),
        }
    }

    pub fn push(&mut self, request: CrossLayerRequest) {
        match self {
            QueueStorage::Fifo(queue) => queue.push_back(request),
            QueueStorage::TipHeap(heap) => heap.push(TipOrdered::new(request)),
        }
    }

    pub fn pop(&mut self) -> Option<CrossLayerRequest> {
        match self {
            QueueStorage::Fifo(queue) => queue.pop_front(),
            QueueStorage::TipHeap(heap) => heap.pop().map(|entry| entry.request),
        }
    }

    pub fn peek(&self) -> Option<&CrossLayerRequest> {
        match self {
            QueueStorage::Fifo(queue) => queue.front(),
            QueueStorage::TipHeap(heap) => heap.peek().map(|entry| &entry.request),
        }
    }

    /// Every pending request in acceptance order
    pub fn drain_in_acceptance_order(&mut self) -> Vec<CrossLayerRequest> {
        let mut drained: Vec<CrossLayerRequest> = match self {
            QueueStorage::Fifo(queue) => queue.drain(..).collect(),
            QueueStorage::TipHeap(heap) => heap.drain().map(|entry| entry.request).collect(),
        };
        drained.sort_by_key(|request| request.serial_id());
        drained
    }
}
