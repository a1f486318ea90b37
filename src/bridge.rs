use crate::config::BridgeConfig;
use crate::errors::{BridgeError, BridgeResult};
use crate::execution::{ExecutionLog, ExecutionLogEntry, ExecutionService, ExecutionWorker, L2Executor};
use crate::intake::{
    EscrowLedger, FeeCalculator, FeeQuote, FixedGasPrice, GasPriceOracle, RequestId, SubmitRequest, TransactionIntake,
};
use crate::queue::PriorityQueue;
use alloy_primitives::U256;
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// 1 gwei
pub const DEFAULT_GAS_PRICE_WEI: u64 = 1_000_000_000;

/// Where an accepted request stands, as seen from L1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RequestStatus {
    Pending,
    Executed { succeeded: bool },
}

/// The L1 side of the bridge: fee estimation, submission and outcome polling.
///
/// Owns one queue and one execution log. The executor role is attached with
/// [`PriorityBridge::execution_service`].
pub struct PriorityBridge {
    config: BridgeConfig,
    intake: Arc<TransactionIntake>,
    queue: Arc<PriorityQueue>,
    log: Arc<ExecutionLog>,
    ledger: Arc<dyn EscrowLedger>,
}

impl PriorityBridge {
    pub fn builder() -> PriorityBridgeBuilder {
        PriorityBridgeBuilder::new()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Read-only estimate of the minimum payment, without value or tip
    pub fn base_cost(&self, unit_price: U256, execution_limit: u64, payload_length: usize) -> BridgeResult<U256> {
        self.intake.fee_calculator().base_cost(unit_price, execution_limit, payload_length)
    }

    /// Quote for a request at the current gas price
    pub fn quote(&self, request: &SubmitRequest) -> BridgeResult<FeeQuote> {
        self.intake.quote(request)
    }

    /// Accept a request with `payment` attached. Returns as soon as the request is queued.
    pub fn submit(&self, request: SubmitRequest, payment: U256) -> BridgeResult<RequestId> {
        self.intake.submit(request, payment)
    }

    pub fn lookup(&self, request_id: &RequestId) -> Option<bool> {
        self.log.lookup(request_id)
    }

    pub fn status(&self, request_id: &RequestId) -> BridgeResult<RequestStatus> {
        if let Some(succeeded) = self.log.lookup(request_id) {
            return Ok(RequestStatus::Executed { succeeded });
        }
        if self.intake.is_accepted(request_id) {
            Ok(RequestStatus::Pending)
        } else {
            Err(BridgeError::NotFound(*request_id))
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionLogEntry> {
        self.log.subscribe()
    }

    pub fn intake(&self) -> &Arc<TransactionIntake> {
        &self.intake
    }

    pub fn queue(&self) -> &Arc<PriorityQueue> {
        &self.queue
    }

    pub fn log(&self) -> &Arc<ExecutionLog> {
        &self.log
    }

    pub fn execution_worker(&self, executor: Arc<dyn L2Executor>) -> ExecutionWorker {
        ExecutionWorker::new(&self.config.executor, self.queue.clone(), self.log.clone(), self.ledger.clone(), executor)
    }

    pub fn execution_service(&self, executor: Arc<dyn L2Executor>) -> ExecutionService {
        ExecutionService::new(self.config.executor.clone(), self.execution_worker(executor))
    }
}

/// Builder for [`PriorityBridge`]
#[derive(Default)]
pub struct PriorityBridgeBuilder {
    config: Option<BridgeConfig>,
    ledger: Option<Arc<dyn EscrowLedger>>,
    gas_price: Option<Arc<dyn GasPriceOracle>>,
}

impl PriorityBridgeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn EscrowLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_gas_price(mut self, gas_price: Arc<dyn GasPriceOracle>) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    pub fn build(self) -> Result<PriorityBridge> {
        let config = self.config.unwrap_or_default();
        config.validate().map_err(|e| eyre!("Invalid bridge configuration: {}", e))?;
        let ledger = self.ledger.ok_or_else(|| eyre!("An escrow ledger is required"))?;
        let gas_price = self.gas_price.unwrap_or_else(|| Arc::new(FixedGasPrice::new(U256::from(DEFAULT_GAS_PRICE_WEI))));

        let queue = Arc::new(PriorityQueue::new(&config.queue));
        let log = Arc::new(ExecutionLog::new(config.executor.subscriber_buffer));
        let intake = Arc::new(TransactionIntake::new(
            config.intake.clone(),
            FeeCalculator::new(config.fee.clone()),
            gas_price,
            ledger.clone(),
            queue.clone(),
        ));

        info!("PriorityBridge built with {} ordering, settlement policy {}", config.queue.ordering, config.executor.settlement);
        Ok(PriorityBridge { config, intake, queue, log, ledger })
    }
}
