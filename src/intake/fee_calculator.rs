use crate::config::FeeConfig;
use crate::errors::{BridgeError, BridgeResult};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Price of a request at the current gas price. Computed on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuote {
    pub base_cost: U256,
    pub tip: U256,
}

impl FeeQuote {
    pub fn total(&self) -> U256 {
        self.base_cost.saturating_add(self.tip)
    }

    /// Payment a caller has to attach to deliver `value` on L2 with this quote
    pub fn required_payment(&self, value: U256) -> Option<U256> {
        self.base_cost.checked_add(self.tip)?.checked_add(value)
    }
}

/// Computes the minimum L1 payment that covers L2 execution of a request.
///
/// The pricing is linear: `unit_price * (intrinsic_gas + execution_limit + payload_length * gas_per_payload_byte)`.
/// Every term is positive, so the cost is strictly increasing in each argument.
#[derive(Debug, Clone)]
pub struct FeeCalculator {
    config: FeeConfig,
}

impl FeeCalculator {
    pub fn new(config: FeeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeeConfig {
        &self.config
    }

    /// Gas units a request of this shape is charged for
    pub fn gas_units(&self, execution_limit: u64, payload_length: usize) -> BridgeResult<U256> {
        if execution_limit == 0 {
            return Err(BridgeError::InvalidInput("execution limit must be positive".to_string()));
        }
        if payload_length > self.config.max_payload_length {
            return Err(BridgeError::InvalidInput(format!(
                "payload length {} exceeds maximum {}",
                payload_length, self.config.max_payload_length
            )));
        }

        let payload_gas = U256::from(payload_length)
            .checked_mul(U256::from(self.config.gas_per_payload_byte))
            .ok_or_else(|| BridgeError::InvalidInput("payload gas overflows".to_string()))?;

        U256::from(self.config.intrinsic_gas)
            .checked_add(U256::from(execution_limit))
            .and_then(|gas| gas.checked_add(payload_gas))
            .ok_or_else(|| BridgeError::InvalidInput("gas units overflow".to_string()))
    }

    pub fn base_cost(&self, unit_price: U256, execution_limit: u64, payload_length: usize) -> BridgeResult<U256> {
        if unit_price.is_zero() {
            return Err(BridgeError::InvalidInput("unit price must be positive".to_string()));
        }
        let gas = self.gas_units(execution_limit, payload_length)?;
        unit_price
            .checked_mul(gas)
            .ok_or_else(|| BridgeError::InvalidInput("base cost overflows".to_string()))
    }

    pub fn quote(&self, unit_price: U256, execution_limit: u64, payload_length: usize, tip: U256) -> BridgeResult<FeeQuote> {
        let base_cost = self.base_cost(unit_price, execution_limit, payload_length)?;
        Ok(FeeQuote { base_cost, tip })
    }
}

impl Default for FeeCalculator {
    fn default() -> Self {
        Self::new(FeeConfig::default())
    }
}
