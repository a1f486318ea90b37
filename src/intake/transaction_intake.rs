use super::fee_calculator::{FeeCalculator, FeeQuote};
use super::gas_price::GasPriceOracle;
use super::ledger::{EscrowLedger, Settlement};
use super::request::{CrossLayerRequest, SubmitRequest};
use super::request_id::RequestId;
use crate::config::IntakeConfig;
use crate::errors::{BridgeError, BridgeResult};
use crate::queue::PriorityQueue;
use crate::utils::now_timestamp;
use alloy_primitives::U256;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

/// Accepts L1->L2 calls: validates them, takes payment and hands them to the queue.
///
/// A request is either fully accepted (escrowed, enqueued, identified) or
/// rejected with nothing changed. Serial ids are assigned under one lock and
/// only consumed by accepted requests, so the sequence has no gaps.
pub struct TransactionIntake {
    config: IntakeConfig,
    fee_calculator: FeeCalculator,
    gas_price: Arc<dyn GasPriceOracle>,
    ledger: Arc<dyn EscrowLedger>,
    queue: Arc<PriorityQueue>,
    next_serial: Mutex<u64>,
    accepted: DashMap<RequestId, u64>,
}

impl TransactionIntake {
    pub fn new(
        config: IntakeConfig,
        fee_calculator: FeeCalculator,
        gas_price: Arc<dyn GasPriceOracle>,
        ledger: Arc<dyn EscrowLedger>,
        queue: Arc<PriorityQueue>,
    ) -> Self {
        Self { config, fee_calculator, gas_price, ledger, queue, next_serial: Mutex::new(0), accepted: DashMap::new() }
    }

    pub fn fee_calculator(&self) -> &FeeCalculator {
        &self.fee_calculator
    }

    /// Quote for `request` at the current gas price
    pub fn quote(&self, request: &SubmitRequest) -> BridgeResult<FeeQuote> {
        self.fee_calculator.quote(self.gas_price.unit_price(), request.execution_limit, request.payload_length(), request.tip)
    }

    pub fn submit(&self, request: SubmitRequest, payment: U256) -> BridgeResult<RequestId> {
        self.validate_sizes(&request)?;
        if request.execution_limit > self.config.max_execution_limit {
            return Err(BridgeError::InvalidInput(format!(
                "execution limit {} exceeds maximum {}",
                request.execution_limit, self.config.max_execution_limit
            )));
        }

        let quote = self.quote(&request)?;
        let required = quote
            .required_payment(request.value)
            .ok_or_else(|| BridgeError::InvalidInput("required payment overflows".to_string()))?;
        if payment < required {
            debug!("Rejecting request from {}: payment {} below required {}", request.sender, payment, required);
            return Err(BridgeError::InsufficientPayment { required, supplied: payment });
        }

        let mut next_serial = self.next_serial.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !self.queue.has_capacity() {
            return Err(BridgeError::QueueFull(self.queue.len()));
        }

        let serial_id = *next_serial;
        let sender = request.sender;
        let accepted =
            CrossLayerRequest::accept(serial_id, request, payment, now_timestamp(), self.config.priority_expiration_secs);
        let request_id = accepted.id();

        self.ledger.debit(sender, payment, request_id)?;
        // Only intake enqueues and it holds the serial lock, so the capacity checked above cannot be taken.
        if let Err(e) = self.queue.enqueue(accepted) {
            error!("Enqueue failed after escrow for request {}: {}", request_id, e);
            self.ledger.settle(request_id, Settlement { refund_recipient: sender, refund: payment })?;
            return Err(e);
        }
        self.accepted.insert(request_id, serial_id);
        *next_serial += 1;
        drop(next_serial);

        info!(
            "Accepted request {} (serial {}) from {}: base cost {}, tip {}, payment {}",
            request_id, serial_id, sender, quote.base_cost, quote.tip, payment
        );
        Ok(request_id)
    }

    fn validate_sizes(&self, request: &SubmitRequest) -> BridgeResult<()> {
        if request.calldata.len() > self.config.max_calldata_bytes {
            return Err(BridgeError::PayloadTooLarge {
                what: "calldata",
                size: request.calldata.len(),
                limit: self.config.max_calldata_bytes,
            });
        }
        if request.factory_deps.len() > self.config.max_factory_deps {
            return Err(BridgeError::PayloadTooLarge {
                what: "factory dependency list",
                size: request.factory_deps.len(),
                limit: self.config.max_factory_deps,
            });
        }
        for dep in &request.factory_deps {
            if dep.is_empty() {
                return Err(BridgeError::InvalidInput("factory dependency bytecode is empty".to_string()));
            }
            if dep.len() > self.config.max_factory_dep_bytes {
                return Err(BridgeError::PayloadTooLarge {
                    what: "factory dependency",
                    size: dep.len(),
                    limit: self.config.max_factory_dep_bytes,
                });
            }
        }
        Ok(())
    }

    pub fn is_accepted(&self, request_id: &RequestId) -> bool {
        self.accepted.contains_key(request_id)
    }

    pub fn serial_of(&self, request_id: &RequestId) -> Option<u64> {
        self.accepted.get(request_id).map(|serial| *serial)
    }

    /// Number of requests accepted so far, which is also the next serial id
    pub fn accepted_count(&self) -> u64 {
        *self.next_serial.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeeConfig, QueueConfig};
    use crate::errors::LedgerError;
    use crate::intake::gas_price::FixedGasPrice;
    use crate::intake::ledger::InMemoryLedger;
    use crate::queue::OrderingPolicy;
    use alloy_primitives::{Address, Bytes};
    use std::collections::HashSet;

    struct Fixture {
        intake: Arc<TransactionIntake>,
        ledger: Arc<InMemoryLedger>,
        queue: Arc<PriorityQueue>,
    }

    fn fixture(intake_config: IntakeConfig, queue_config: QueueConfig) -> Fixture {
        let ledger = Arc::new(InMemoryLedger::new());
        let queue = Arc::new(PriorityQueue::new(&queue_config));
        let intake = Arc::new(TransactionIntake::new(
            intake_config,
            FeeCalculator::new(FeeConfig::default()),
            Arc::new(FixedGasPrice::new(U256::from(1))),
            ledger.clone(),
            queue.clone(),
        ));
        Fixture { intake, ledger, queue }
    }

    fn default_fixture() -> Fixture {
        fixture(IntakeConfig::default(), QueueConfig::default())
    }

    fn sender() -> Address {
        Address::repeat_byte(0x11)
    }

    fn call(value: u64) -> SubmitRequest {
        SubmitRequest::new(sender(), Address::repeat_byte(0x22), Bytes::new(), 10_000).with_value(U256::from(value))
    }

    #[test]
    fn test_exact_payment_accepted_one_less_rejected() {
        let f = default_fixture();
        f.ledger.deposit(sender(), U256::from(100_000_000u64));
        let required = U256::from(21_010_000u64 + 500);

        let err = f.intake.submit(call(500), required - U256::from(1)).unwrap_err();
        assert_eq!(err, BridgeError::InsufficientPayment { required, supplied: required - U256::from(1) });
        assert_eq!(f.intake.accepted_count(), 0);
        assert!(f.queue.is_empty());

        let id = f.intake.submit(call(500), required).unwrap();
        assert!(f.intake.is_accepted(&id));
        assert_eq!(f.intake.serial_of(&id), Some(0));
        assert_eq!(f.ledger.escrowed(&id), Some(required));
        assert_eq!(f.queue.peek_next_id(), Some(id));
    }

    #[test]
    fn test_tip_is_part_of_required_payment() {
        let f = default_fixture();
        f.ledger.deposit(sender(), U256::from(100_000_000u64));
        let request = call(0).with_tip(U256::from(1_000));

        let quote = f.intake.quote(&request).unwrap();
        assert_eq!(quote.total(), U256::from(21_011_000u64));
        assert!(matches!(
            f.intake.submit(request.clone(), U256::from(21_010_000u64)),
            Err(BridgeError::InsufficientPayment { .. })
        ));
        assert!(f.intake.submit(request, U256::from(21_011_000u64)).is_ok());
    }

    #[test]
    fn test_payload_limits() {
        let config = IntakeConfig { max_calldata_bytes: 4, max_factory_dep_bytes: 2, max_factory_deps: 1, ..IntakeConfig::default() };
        let f = fixture(config, QueueConfig::default());
        f.ledger.deposit(sender(), U256::MAX);
        let payment = U256::from(1_000_000_000u64);

        let big_calldata = SubmitRequest::new(sender(), Address::ZERO, vec![0u8; 5], 10_000);
        assert!(matches!(f.intake.submit(big_calldata, payment), Err(BridgeError::PayloadTooLarge { what: "calldata", .. })));

        let big_dep = call(0).with_factory_dep(vec![1u8, 2, 3]);
        assert!(matches!(f.intake.submit(big_dep, payment), Err(BridgeError::PayloadTooLarge { what: "factory dependency", .. })));

        let too_many = call(0).with_factory_dep(vec![1u8]).with_factory_dep(vec![2u8]);
        assert!(matches!(f.intake.submit(too_many, payment), Err(BridgeError::PayloadTooLarge { .. })));

        let empty_dep = call(0).with_factory_dep(Bytes::new());
        assert!(matches!(f.intake.submit(empty_dep, payment), Err(BridgeError::InvalidInput(_))));

        assert_eq!(f.intake.accepted_count(), 0);
    }

    #[test]
    fn test_payload_exactly_at_limits_accepted() {
        let config = IntakeConfig { max_calldata_bytes: 4, max_factory_dep_bytes: 2, max_factory_deps: 1, ..IntakeConfig::default() };
        let f = fixture(config, QueueConfig::default());
        f.ledger.deposit(sender(), U256::MAX);
        let payment = U256::from(1_000_000_000u64);

        let full_calldata = SubmitRequest::new(sender(), Address::ZERO, vec![0u8; 4], 10_000);
        let calldata_id = f.intake.submit(full_calldata, payment).unwrap();

        let full_dep = call(0).with_factory_dep(vec![1u8, 2]);
        let dep_id = f.intake.submit(full_dep, payment).unwrap();

        assert_eq!(f.intake.serial_of(&calldata_id), Some(0));
        assert_eq!(f.intake.serial_of(&dep_id), Some(1));
        assert_eq!(f.queue.len(), 2);
    }

    #[test]
    fn test_zero_execution_limit_is_invalid() {
        let f = default_fixture();
        f.ledger.deposit(sender(), U256::MAX);
        let request = SubmitRequest::new(sender(), Address::ZERO, Bytes::new(), 0);
        assert!(matches!(f.intake.submit(request, U256::from(1_000_000_000u64)), Err(BridgeError::InvalidInput(_))));

        let request = SubmitRequest::new(sender(), Address::ZERO, Bytes::new(), IntakeConfig::default().max_execution_limit + 1);
        assert!(matches!(f.intake.submit(request, U256::MAX), Err(BridgeError::InvalidInput(_))));
    }

    #[test]
    fn test_ledger_failure_does_not_consume_serial() {
        let f = default_fixture();
        let payment = U256::from(21_010_000u64);

        let err = f.intake.submit(call(0), payment).unwrap_err();
        assert!(matches!(err, BridgeError::Ledger(LedgerError::InsufficientBalance { .. })));
        assert_eq!(f.intake.accepted_count(), 0);
        assert!(f.queue.is_empty());

        f.ledger.deposit(sender(), payment);
        let id = f.intake.submit(call(0), payment).unwrap();
        assert_eq!(f.intake.serial_of(&id), Some(0));
    }

    #[test]
    fn test_full_queue_rejects_before_debit() {
        let f = fixture(IntakeConfig::default(), QueueConfig { ordering: OrderingPolicy::Fifo, max_pending: 1 });
        f.ledger.deposit(sender(), U256::from(100_000_000u64));
        let payment = U256::from(21_010_000u64);

        f.intake.submit(call(0), payment).unwrap();
        let balance = f.ledger.balance_of(&sender());
        assert!(matches!(f.intake.submit(call(0), payment), Err(BridgeError::QueueFull(1))));
        assert_eq!(f.ledger.balance_of(&sender()), balance);
    }

    #[test]
    fn test_concurrent_submitters_get_gap_free_serials() {
        let f = default_fixture();
        let payment = U256::from(21_010_000u64);
        let submitters = 8u64;
        let per_submitter = 50u64;

        let handles: Vec<_> = (0..submitters)
            .map(|i| {
                let intake = f.intake.clone();
                let ledger = f.ledger.clone();
                std::thread::spawn(move || {
                    let sender = Address::with_last_byte(i as u8 + 1);
                    ledger.deposit(sender, payment * U256::from(per_submitter));
                    (0..per_submitter)
                        .map(|_| {
                            let request = SubmitRequest::new(sender, Address::ZERO, Bytes::new(), 10_000);
                            intake.submit(request, payment).unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let ids: Vec<RequestId> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        let total = submitters * per_submitter;
        assert_eq!(ids.len() as u64, total);
        assert_eq!(f.intake.accepted_count(), total);

        let serials: HashSet<u64> = ids.iter().map(|id| f.intake.serial_of(id).unwrap()).collect();
        assert_eq!(serials, (0..total).collect::<HashSet<_>>());

        let queued: Vec<u64> = f.queue.dequeue_batch(total as usize).iter().map(|r| r.serial_id()).collect();
        assert_eq!(queued, (0..total).collect::<Vec<_>>());
    }
}
