use super::request_id::RequestId;
use crate::errors::LedgerError;
use crate::utils::L2_BRIDGE_VAULT;
use alloy_primitives::{Address, U256};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

/// How an escrow is closed once the request's outcome is known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub refund_recipient: Address,
    /// Part of the escrow returned on L1; the rest is released to L2
    pub refund: U256,
}

/// Settlement-layer payment ledger. Intake only ever debits through it; the
/// executor settles each escrow exactly once after the outcome is recorded.
pub trait EscrowLedger: Send + Sync {
    /// Move `amount` from `payer` into an escrow held for `request_id`
    fn debit(&self, payer: Address, amount: U256, request_id: RequestId) -> Result<(), LedgerError>;

    fn settle(&self, request_id: RequestId, settlement: Settlement) -> Result<(), LedgerError>;
}

#[derive(Debug, Clone, Copy)]
struct Escrow {
    amount: U256,
}

/// Ledger kept in memory, used by tests and local runs
#[derive(Debug)]
pub struct InMemoryLedger {
    balances: DashMap<Address, U256>,
    escrows: DashMap<RequestId, Escrow>,
    vault: Address,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self { balances: DashMap::new(), escrows: DashMap::new(), vault: L2_BRIDGE_VAULT }
    }

    pub fn deposit(&self, account: Address, amount: U256) {
        let mut balance = self.balances.entry(account).or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn balance_of(&self, account: &Address) -> U256 {
        self.balances.get(account).map(|b| *b).unwrap_or_default()
    }

    pub fn escrowed(&self, request_id: &RequestId) -> Option<U256> {
        self.escrows.get(request_id).map(|e| e.amount)
    }

    pub fn open_escrows(&self) -> usize {
        self.escrows.len()
    }

    /// Account credited with escrow released to L2
    pub fn vault(&self) -> Address {
        self.vault
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl EscrowLedger for InMemoryLedger {
    fn debit(&self, payer: Address, amount: U256, request_id: RequestId) -> Result<(), LedgerError> {
        let escrow_slot = match self.escrows.entry(request_id) {
            Entry::Occupied(_) => return Err(LedgerError::EscrowExists(request_id)),
            Entry::Vacant(slot) => slot,
        };

        let mut balance = self.balances.entry(payer).or_default();
        if *balance < amount {
            return Err(LedgerError::InsufficientBalance { account: payer, available: *balance, requested: amount });
        }
        *balance -= amount;
        escrow_slot.insert(Escrow { amount });

        debug!("Escrowed {} from {} for request {}", amount, payer, request_id);
        Ok(())
    }

    fn settle(&self, request_id: RequestId, settlement: Settlement) -> Result<(), LedgerError> {
        let (_, escrow) = self.escrows.remove(&request_id).ok_or(LedgerError::UnknownEscrow(request_id))?;

        let refund = settlement.refund.min(escrow.amount);
        let released = escrow.amount - refund;
        if !refund.is_zero() {
            self.deposit(settlement.refund_recipient, refund);
        }
        if !released.is_zero() {
            self.deposit(self.vault, released);
        }

        debug!("Settled request {}: refunded {}, released {}", request_id, refund, released);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debit_and_settle_conserve_funds() {
        let ledger = InMemoryLedger::new();
        let payer = Address::repeat_byte(0x01);
        let id = RequestId::from([1u8; 32]);
        ledger.deposit(payer, U256::from(1_000));

        ledger.debit(payer, U256::from(600), id).unwrap();
        assert_eq!(ledger.balance_of(&payer), U256::from(400));
        assert_eq!(ledger.escrowed(&id), Some(U256::from(600)));

        ledger.settle(id, Settlement { refund_recipient: payer, refund: U256::from(100) }).unwrap();
        assert_eq!(ledger.balance_of(&payer), U256::from(500));
        assert_eq!(ledger.balance_of(&ledger.vault()), U256::from(500));
        assert_eq!(ledger.open_escrows(), 0);
    }

    #[test]
    fn test_insufficient_balance_leaves_no_escrow() {
        let ledger = InMemoryLedger::new();
        let payer = Address::repeat_byte(0x02);
        let id = RequestId::from([2u8; 32]);
        ledger.deposit(payer, U256::from(10));

        let err = ledger.debit(payer, U256::from(11), id).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(ledger.escrowed(&id), None);
        assert_eq!(ledger.balance_of(&payer), U256::from(10));
    }

    #[test]
    fn test_double_debit_and_double_settle_rejected() {
        let ledger = InMemoryLedger::new();
        let payer = Address::repeat_byte(0x03);
        let id = RequestId::from([3u8; 32]);
        ledger.deposit(payer, U256::from(100));

        ledger.debit(payer, U256::from(10), id).unwrap();
        assert_eq!(ledger.debit(payer, U256::from(10), id), Err(LedgerError::EscrowExists(id)));

        let settlement = Settlement { refund_recipient: payer, refund: U256::ZERO };
        ledger.settle(id, settlement).unwrap();
        assert_eq!(ledger.settle(id, settlement), Err(LedgerError::UnknownEscrow(id)));
    }

    #[test]
    fn test_refund_is_capped_at_escrow() {
        let ledger = InMemoryLedger::new();
        let payer = Address::repeat_byte(0x04);
        let id = RequestId::from([4u8; 32]);
        ledger.deposit(payer, U256::from(50));
        ledger.debit(payer, U256::from(50), id).unwrap();

        ledger.settle(id, Settlement { refund_recipient: payer, refund: U256::from(1_000) }).unwrap();
        assert_eq!(ledger.balance_of(&payer), U256::from(50));
        assert_eq!(ledger.balance_of(&ledger.vault()), U256::ZERO);
    }
}
