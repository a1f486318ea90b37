/// Execution Layer
///
/// This layer is responsible for:
/// - Taking request batches from the priority queue
/// - Handing them to the L2 executor collaborator
/// - Recording exactly one outcome per request in the execution log
/// - Settling escrow according to the configured policy

pub mod execution_log;
pub mod service;
pub mod settlement;

pub use execution_log::{ExecutionLog, ExecutionLogEntry, verify_entries};
pub use service::{BatchReport, ExecutionService, ExecutionWorker, L2Executor};
pub use settlement::SettlementPolicy;
