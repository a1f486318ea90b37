use alloy_primitives::{Address, address};

/// Gas charged for every L1->L2 request before any execution takes place.
pub const L1_TX_INTRINSIC_GAS: u64 = 21_000;

/// Gas charged per byte of calldata and factory dependency bytecode.
pub const GAS_PER_PAYLOAD_BYTE: u64 = 16;

pub const MAX_CALLDATA_BYTES: usize = 128 * 1024;
pub const MAX_FACTORY_DEP_BYTES: usize = 24 * 1024;
pub const MAX_FACTORY_DEPS: usize = 32;

/// Largest payload the fee calculator will price: full calldata plus every dependency at its limit.
pub const MAX_PAYLOAD_LENGTH: usize = MAX_CALLDATA_BYTES + MAX_FACTORY_DEPS * MAX_FACTORY_DEP_BYTES;

pub const MAX_EXECUTION_LIMIT: u64 = 80_000_000;

pub const PRIORITY_EXPIRATION_SECS: u64 = 24 * 60 * 60;

pub const DEFAULT_MAX_PENDING: usize = 1_000_000;

/// Account on the settlement layer that receives released escrow.
pub const L2_BRIDGE_VAULT: Address = address!("0x0000000000000000000000000000000000008001");
