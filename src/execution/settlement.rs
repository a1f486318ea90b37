use crate::intake::{CrossLayerRequest, Settlement};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, VariantNames};

/// What happens to a request's escrow once its outcome is recorded.
/// Fees are always consumed; the policy only decides the fate of the delivered value.
#[derive(Copy, Clone, Debug, Default, Display, PartialEq, Eq, Hash, EnumString, VariantNames, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SettlementPolicy {
    /// A failed call gets its value back at the refund recipient
    #[default]
    RefundValueOnFailure,
    /// Everything is released to L2 whatever the outcome
    BurnAll,
}

impl SettlementPolicy {
    pub fn settlement_for(&self, request: &CrossLayerRequest, succeeded: bool) -> Settlement {
        let refund = match (self, succeeded) {
            (SettlementPolicy::RefundValueOnFailure, false) => request.value(),
            _ => U256::ZERO,
        };
        Settlement { refund_recipient: request.refund_recipient(), refund }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::SubmitRequest;
    use alloy_primitives::{Address, Bytes};
    use std::str::FromStr;

    fn request_with_value(value: u64) -> CrossLayerRequest {
        let submit = SubmitRequest::new(Address::repeat_byte(1), Address::repeat_byte(2), Bytes::new(), 10)
            .with_value(U256::from(value))
            .with_refund_recipient(Address::repeat_byte(3));
        CrossLayerRequest::accept(0, submit, U256::from(value + 100), 0, 0)
    }

    #[test]
    fn test_refund_value_on_failure() {
        let request = request_with_value(40);
        let policy = SettlementPolicy::RefundValueOnFailure;

        let failed = policy.settlement_for(&request, false);
        assert_eq!(failed.refund, U256::from(40));
        assert_eq!(failed.refund_recipient, Address::repeat_byte(3));
        assert_eq!(policy.settlement_for(&request, true).refund, U256::ZERO);
    }

    #[test]
    fn test_burn_all() {
        let request = request_with_value(40);
        assert_eq!(SettlementPolicy::BurnAll.settlement_for(&request, false).refund, U256::ZERO);
        assert_eq!(SettlementPolicy::from_str("burn_all").unwrap(), SettlementPolicy::BurnAll);
    }
}
