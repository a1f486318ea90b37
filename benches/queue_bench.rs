use alloy_primitives::{Address, Bytes, U256};
use criterion::{Criterion, criterion_group, criterion_main};
use lazy_static::lazy_static;
use priority_bridge::{BridgeConfig, FixedGasPrice, InMemoryLedger, OrderingPolicy, PriorityBridge, SubmitRequest};
use std::sync::Arc;

lazy_static! {
    static ref SENDER: Address = Address::repeat_byte(0x5e);
    static ref TARGET: Address = Address::repeat_byte(0x7a);
}

fn build_bridge(ordering: OrderingPolicy) -> PriorityBridge {
    let mut config = BridgeConfig::default();
    config.queue.ordering = ordering;
    let ledger = Arc::new(InMemoryLedger::new());
    ledger.deposit(*SENDER, U256::MAX);
    PriorityBridge::builder()
        .with_config(config)
        .with_ledger(ledger)
        .with_gas_price(Arc::new(FixedGasPrice::new(U256::from(1))))
        .build()
        .expect("bridge")
}

fn submit_and_drain(ordering: OrderingPolicy) {
    let bridge = build_bridge(ordering);
    for i in 0..1000u64 {
        let call = SubmitRequest::new(*SENDER, *TARGET, Bytes::from(i.to_be_bytes().to_vec()), 50_000).with_tip(U256::from(i % 17));
        let payment = bridge.quote(&call).expect("quote").total();
        bridge.submit(call, payment).expect("submit");
    }
    while !bridge.queue().dequeue_batch(64).is_empty() {}
}

fn benchmark_queue_policies(c: &mut Criterion) {
    let mut group = c.benchmark_group("priority_queue");
    group.sample_size(10);

    group.bench_function("submit_and_drain_fifo", |b| b.iter(|| submit_and_drain(OrderingPolicy::Fifo)));
    group.bench_function("submit_and_drain_tip_heap", |b| b.iter(|| submit_and_drain(OrderingPolicy::TipHeap)));
    group.finish();
}

criterion_group!(benches, benchmark_queue_policies);
criterion_main!(benches);
