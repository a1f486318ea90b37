use crate::intake::RequestId;
use alloy_primitives::{Address, U256};

/// Failures reported by the escrow ledger collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient balance for {account}: available {available}, requested {requested}")]
    InsufficientBalance { account: Address, available: U256, requested: U256 },
    #[error("escrow already exists for request {0}")]
    EscrowExists(RequestId),
    #[error("no escrow held for request {0}")]
    UnknownEscrow(RequestId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("insufficient payment: required {required}, supplied {supplied}")]
    InsufficientPayment { required: U256, supplied: U256 },
    #[error("{what} too large: {size} bytes exceeds limit of {limit}")]
    PayloadTooLarge { what: &'static str, size: usize, limit: usize },
    #[error("outcome already recorded for request {0}")]
    DuplicateRecord(RequestId),
    #[error("unknown request {0}")]
    NotFound(RequestId),
    #[error("priority queue is full ({0} pending requests)")]
    QueueFull(usize),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl BridgeError {
    /// A duplicate outcome write means the executor broke the exactly-once
    /// contract. Callers cannot recover from it by resubmitting.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BridgeError::DuplicateRecord(_))
    }

    /// Intake-time errors the caller can fix and resubmit.
    pub fn is_caller_recoverable(&self) -> bool {
        matches!(
            self,
            BridgeError::InvalidInput(_)
                | BridgeError::InsufficientPayment { .. }
                | BridgeError::PayloadTooLarge { .. }
                | BridgeError::QueueFull(_)
                | BridgeError::Ledger(LedgerError::InsufficientBalance { .. })
        )
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let id = RequestId::from([7u8; 32]);
        assert!(BridgeError::DuplicateRecord(id.clone()).is_fatal());
        assert!(!BridgeError::DuplicateRecord(id.clone()).is_caller_recoverable());
        assert!(BridgeError::InvalidInput("zero".into()).is_caller_recoverable());
        assert!(!BridgeError::NotFound(id).is_caller_recoverable());

        let err = BridgeError::InsufficientPayment { required: U256::from(10), supplied: U256::from(9) };
        assert_eq!(err.to_string(), "insufficient payment: required 10, supplied 9");
    }
}
