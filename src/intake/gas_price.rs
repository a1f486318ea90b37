use alloy_primitives::U256;
use std::sync::RwLock;

/// Source of the current L2 gas price, in wei per gas unit
pub trait GasPriceOracle: Send + Sync {
    fn unit_price(&self) -> U256;
}

/// Oracle returning an operator-set price
#[derive(Debug)]
pub struct FixedGasPrice {
    price: RwLock<U256>,
}

impl FixedGasPrice {
    pub fn new(price: U256) -> Self {
        Self { price: RwLock::new(price) }
    }

    pub fn set(&self, price: U256) {
        *self.price.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = price;
    }
}

impl GasPriceOracle for FixedGasPrice {
    fn unit_price(&self) -> U256 {
        *self.price.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
