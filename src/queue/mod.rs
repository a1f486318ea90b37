/// Queue Layer
///
/// Holds accepted requests until the executor takes them in batches.
/// The storage structure follows the configured ordering policy, so
/// switching from FIFO to tip ordering never touches intake or the log.

pub mod ordering;
pub mod priority_queue;

pub use ordering::OrderingPolicy;
pub use priority_queue::{PriorityQueue, QueueStats};
