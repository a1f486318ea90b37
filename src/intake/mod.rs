/// Intake Layer
///
/// This layer is responsible for:
/// - Pricing requests (base cost from gas price, execution limit and payload size)
/// - Validating and accepting L1->L2 calls
/// - Escrowing payment through the settlement-layer ledger
/// - Assigning canonical identifiers and gap-free serial ids

pub mod fee_calculator;
pub mod gas_price;
pub mod ledger;
pub mod request;
pub mod request_id;
pub mod transaction_intake;

pub use fee_calculator::{FeeCalculator, FeeQuote};
pub use gas_price::{FixedGasPrice, GasPriceOracle};
pub use ledger::{EscrowLedger, InMemoryLedger, Settlement};
pub use request::{CrossLayerRequest, SubmitRequest};
pub use request_id::RequestId;
pub use transaction_intake::TransactionIntake;
