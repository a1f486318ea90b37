use super::request_id::RequestId;
use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
use alloy_sol_types::{SolType, sol};
use serde::{Deserialize, Serialize};

sol! {
    /// Canonical encoding hashed into a request identifier
    struct L2CanonicalRequest {
        uint256 serialId;
        address sender;
        address target;
        uint256 value;
        bytes data;
        uint256 executionLimit;
        uint256 payment;
        uint256 tip;
        address refundRecipient;
        bytes32[] factoryDepsHashes;
        uint64 submittedAt;
    }
}

/// Call parameters supplied by an L1 caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub sender: Address,
    pub target: Address,
    /// Amount delivered to `target` on L2
    pub value: U256,
    pub calldata: Bytes,
    pub execution_limit: u64,
    /// Auxiliary bytecode the call depends on
    pub factory_deps: Vec<Bytes>,
    /// Declared operator tip on top of the base cost
    pub tip: U256,
    /// Receives refunds on L1. Defaults to `sender`.
    pub refund_recipient: Option<Address>,
}

impl SubmitRequest {
    pub fn new(sender: Address, target: Address, calldata: impl Into<Bytes>, execution_limit: u64) -> Self {
        Self {
            sender,
            target,
            value: U256::ZERO,
            calldata: calldata.into(),
            execution_limit,
            factory_deps: Vec::new(),
            tip: U256::ZERO,
            refund_recipient: None,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_tip(mut self, tip: U256) -> Self {
        self.tip = tip;
        self
    }

    pub fn with_factory_dep(mut self, bytecode: impl Into<Bytes>) -> Self {
        self.factory_deps.push(bytecode.into());
        self
    }

    pub fn with_refund_recipient(mut self, recipient: Address) -> Self {
        self.refund_recipient = Some(recipient);
        self
    }

    /// Bytes priced by the fee calculator: calldata plus all dependency bytecode
    pub fn payload_length(&self) -> usize {
        self.calldata.len() + self.factory_deps.iter().map(|dep| dep.len()).sum::<usize>()
    }
}

/// An accepted L1->L2 request. Immutable once created by intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossLayerRequest {
    id: RequestId,
    serial_id: u64,
    sender: Address,
    target: Address,
    value: U256,
    calldata: Bytes,
    execution_limit: u64,
    factory_deps: Vec<Bytes>,
    payment: U256,
    tip: U256,
    refund_recipient: Address,
    submitted_at: u64,
    expiration_timestamp: u64,
}

impl CrossLayerRequest {
    pub(crate) fn accept(
        serial_id: u64,
        request: SubmitRequest,
        payment: U256,
        submitted_at: u64,
        expiration_secs: u64,
    ) -> Self {
        let refund_recipient = request.refund_recipient.unwrap_or(request.sender);
        let mut accepted = Self {
            id: RequestId::default(),
            serial_id,
            sender: request.sender,
            target: request.target,
            value: request.value,
            calldata: request.calldata,
            execution_limit: request.execution_limit,
            factory_deps: request.factory_deps,
            payment,
            tip: request.tip,
            refund_recipient,
            submitted_at,
            expiration_timestamp: submitted_at.saturating_add(expiration_secs),
        };
        accepted.id = accepted.compute_id();
        accepted
    }

    /// keccak-256 over the ABI encoding of every field, serial id included
    pub fn compute_id(&self) -> RequestId {
        let encoding = L2CanonicalRequest {
            serialId: U256::from(self.serial_id),
            sender: self.sender,
            target: self.target,
            value: self.value,
            data: self.calldata.clone(),
            executionLimit: U256::from(self.execution_limit),
            payment: self.payment,
            tip: self.tip,
            refundRecipient: self.refund_recipient,
            factoryDepsHashes: self.factory_deps_hashes(),
            submittedAt: self.submitted_at,
        };
        RequestId::from(keccak256(<L2CanonicalRequest as SolType>::abi_encode(&encoding)))
    }

    pub fn factory_deps_hashes(&self) -> Vec<B256> {
        self.factory_deps.iter().map(|dep| keccak256(dep)).collect()
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn serial_id(&self) -> u64 {
        self.serial_id
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn target(&self) -> Address {
        self.target
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn calldata(&self) -> &Bytes {
        &self.calldata
    }

    pub fn execution_limit(&self) -> u64 {
        self.execution_limit
    }

    pub fn factory_deps(&self) -> &[Bytes] {
        &self.factory_deps
    }

    pub fn payment(&self) -> U256 {
        self.payment
    }

    pub fn tip(&self) -> U256 {
        self.tip
    }

    pub fn refund_recipient(&self) -> Address {
        self.refund_recipient
    }

    pub fn submitted_at(&self) -> u64 {
        self.submitted_at
    }

    pub fn expiration_timestamp(&self) -> u64 {
        self.expiration_timestamp
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now > self.expiration_timestamp
    }
}
