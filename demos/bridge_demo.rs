// demos/bridge_demo.rs
//
// Submits a few L1->L2 calls, runs the executor service and polls their outcomes.
// Optional: BRIDGE_CONFIG=path/to/bridge.toml to load limits and policies from a file.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use eyre::Result;
use priority_bridge::{BridgeConfig, CrossLayerRequest, FixedGasPrice, InMemoryLedger, L2Executor, PriorityBridge, SubmitRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Stand-in for the L2 sequencer: calls into the zero address revert
struct DemoExecutor;

#[async_trait]
impl L2Executor for DemoExecutor {
    async fn execute(&self, request: &CrossLayerRequest) -> Result<bool> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(request.target() != Address::ZERO)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();

    let config = match std::env::var("BRIDGE_CONFIG") {
        Ok(path) => BridgeConfig::load(path).await?,
        Err(_) => BridgeConfig::from_env()?,
    };

    let ledger = Arc::new(InMemoryLedger::new());
    let gas_price = Arc::new(FixedGasPrice::new(U256::from(250_000_000u64)));
    let bridge = PriorityBridge::builder().with_config(config).with_ledger(ledger.clone()).with_gas_price(gas_price).build()?;

    let user = Address::repeat_byte(0x42);
    ledger.deposit(user, U256::from(10u64).pow(U256::from(18)));

    let mut service = bridge.execution_service(Arc::new(DemoExecutor));
    service.start()?;

    let targets = [Address::repeat_byte(0xc0), Address::ZERO, Address::repeat_byte(0xc1)];
    let mut ids = Vec::new();
    for (i, target) in targets.into_iter().enumerate() {
        let call = SubmitRequest::new(user, target, vec![0xdeu8, 0xad, 0xbe, 0xef], 300_000)
            .with_value(U256::from(1_000_000u64 * (i as u64 + 1)));
        let quote = bridge.quote(&call)?;
        let payment = quote.required_payment(call.value).ok_or_else(|| eyre::eyre!("payment overflow"))?;
        info!("Base cost {} wei, paying {} wei", quote.base_cost, payment);
        ids.push(bridge.submit(call, payment)?);
    }

    // Callers own their timeout: poll until every request has an outcome or give up.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while ids.iter().any(|id| bridge.lookup(id).is_none()) && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    for id in &ids {
        info!("Request {} -> {:?}", id, bridge.status(id)?);
    }

    service.stop().await?;
    info!("Log head {} over {} entries, chain valid: {}", bridge.log().head_hash(), bridge.log().len(), bridge.log().verify_chain());
    info!("User balance after settlement: {} wei", ledger.balance_of(&user));
    Ok(())
}
