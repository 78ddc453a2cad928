use analytics::AnalyticsEngine;
use common::MerchantId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{CreateTransaction, GatewayKind, GatewayOutcome, Merchant, Transaction};
use ledger::{InMemoryLedgerStore, LedgerStore};
use rust_decimal_macros::dec;

/// Populate a store with one merchant and `n` completed transactions spread
/// over every gateway, roughly nine in ten approved.
async fn populate_store(store: &InMemoryLedgerStore, n: usize) -> MerchantId {
    let merchant = store
        .insert_merchant(Merchant::issue("Bench", "bench@example.com", GatewayKind::Razorpay))
        .await
        .unwrap();

    for i in 0..n {
        let gateway = GatewayKind::ALL[i % GatewayKind::ALL.len()];
        let fields = CreateTransaction::new(merchant.merchant_id.clone(), dec!(125.50), "c@example.com")
            .validate()
            .unwrap();
        let txn = store
            .insert_transaction(Transaction::pending(
                merchant.merchant_id.clone(),
                gateway,
                fields,
            ))
            .await
            .unwrap();
        let outcome = if i % 10 == 0 {
            GatewayOutcome::declined(gateway, "ref")
        } else {
            GatewayOutcome::approved(gateway, "ref")
        };
        store
            .complete_transaction(&txn.transaction_id, outcome)
            .await
            .unwrap();
    }

    merchant.merchant_id
}

fn bench_stats_1000_transactions(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryLedgerStore::new();
    rt.block_on(populate_store(&store, 1_000));
    let engine = AnalyticsEngine::new(store);

    c.bench_function("analytics/stats_1000_transactions", |b| {
        b.iter(|| {
            rt.block_on(async {
                engine.stats(None).await.unwrap();
            });
        });
    });
}

fn bench_stats_for_merchant_10000_transactions(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryLedgerStore::new();
    let merchant_id = rt.block_on(populate_store(&store, 10_000));
    let engine = AnalyticsEngine::new(store);

    c.bench_function("analytics/stats_for_merchant_10000_transactions", |b| {
        b.iter(|| {
            rt.block_on(async {
                engine.stats(Some(merchant_id.clone())).await.unwrap();
            });
        });
    });
}

fn bench_gateway_performance_10000_transactions(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryLedgerStore::new();
    rt.block_on(populate_store(&store, 10_000));
    let engine = AnalyticsEngine::new(store);

    c.bench_function("analytics/gateway_performance_10000_transactions", |b| {
        b.iter(|| {
            rt.block_on(async {
                engine.gateway_performance().await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_stats_1000_transactions,
    bench_stats_for_merchant_10000_transactions,
    bench_gateway_performance_10000_transactions,
);
criterion_main!(benches);
