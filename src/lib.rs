// Three-Layer Architecture
pub mod intake;     // Intake Layer: fee calculation, validation, escrow, identifiers
pub mod queue;      // Queue Layer: pending requests, ordering policies
pub mod execution;  // Execution Layer: executor hand-off, outcome log, settlement

pub mod bridge;
pub mod config;
pub mod errors;

// Common utilities and constants
pub mod utils;

// Re-export key components from each layer
pub use bridge::{PriorityBridge, PriorityBridgeBuilder, RequestStatus};
pub use config::{BridgeConfig, ExecutorConfig, FeeConfig, IntakeConfig, QueueConfig};
pub use errors::{BridgeError, BridgeResult, LedgerError};
pub use execution::{
    BatchReport, ExecutionLog, ExecutionLogEntry, ExecutionService, ExecutionWorker, L2Executor, SettlementPolicy,
};
pub use intake::{
    CrossLayerRequest, EscrowLedger, FeeCalculator, FeeQuote, FixedGasPrice, GasPriceOracle, InMemoryLedger, RequestId,
    Settlement, SubmitRequest, TransactionIntake,
};
pub use queue::{OrderingPolicy, PriorityQueue};
