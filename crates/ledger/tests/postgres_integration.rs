//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container and need a Docker daemon.
//! Run with:
//!
//! ```bash
//! cargo test -p ledger --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use common::{MerchantId, Page};
use domain::{
    CreateTransaction, GatewayKind, GatewayOutcome, Merchant, Transaction, TransactionStatus,
};
use futures_util::TryStreamExt;
use ledger::{LedgerError, LedgerStore, LedgerStoreExt, PostgresLedgerStore, TransactionQuery};
use rust_decimal_macros::dec;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresLedgerStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresLedgerStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE transactions, merchants")
        .execute(&pool)
        .await
        .unwrap();

    PostgresLedgerStore::new(pool)
}

async fn seeded_merchant(store: &PostgresLedgerStore, email: &str) -> Merchant {
    store
        .insert_merchant(Merchant::issue("Acme", email, GatewayKind::Stripe))
        .await
        .unwrap()
}

fn pending(merchant_id: &MerchantId, gateway: GatewayKind) -> Transaction {
    let fields = CreateTransaction::new(merchant_id.clone(), dec!(250.75), "buyer@example.com")
        .with_phone("+91-9000000000")
        .validate()
        .unwrap();
    Transaction::pending(merchant_id.clone(), gateway, fields)
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn merchant_roundtrip_and_lookup_by_api_key() {
    let store = get_test_store().await;
    let merchant = seeded_merchant(&store, "roundtrip@example.com").await;

    let fetched = store.require_merchant(&merchant.merchant_id).await.unwrap();
    assert_eq!(fetched.email, "roundtrip@example.com");
    assert_eq!(fetched.preferred_gateway, GatewayKind::Stripe);
    assert!(fetched.is_active);

    let by_key = store
        .get_merchant_by_api_key(&merchant.api_key)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_key.merchant_id, merchant.merchant_id);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn duplicate_email_maps_to_ledger_error() {
    let store = get_test_store().await;
    seeded_merchant(&store, "dup@example.com").await;

    let result = store
        .insert_merchant(Merchant::issue("Other", "dup@example.com", GatewayKind::Paytm))
        .await;
    assert!(matches!(result, Err(LedgerError::DuplicateEmail(_))));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn list_and_deactivate_merchants() {
    let store = get_test_store().await;
    for i in 0..3 {
        seeded_merchant(&store, &format!("m{i}@example.com")).await;
    }

    let page = store.list_merchants(Page::new(1, 5)).await.unwrap();
    let emails: Vec<_> = page.iter().map(|m| m.email.as_str()).collect();
    assert_eq!(emails, vec!["m1@example.com", "m2@example.com"]);

    let target = page[0].merchant_id.clone();
    let updated = store.deactivate_merchant(&target).await.unwrap();
    assert!(!updated.is_active);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn transaction_lifecycle() {
    let store = get_test_store().await;
    let merchant = seeded_merchant(&store, "life@example.com").await;

    let txn = store
        .insert_transaction(pending(&merchant.merchant_id, GatewayKind::Stripe))
        .await
        .unwrap();

    let stored = store.require_transaction(&txn.transaction_id).await.unwrap();
    assert_eq!(stored.status, TransactionStatus::Pending);
    assert_eq!(stored.amount, dec!(250.75));
    assert_eq!(stored.currency.as_str(), "INR");
    assert_eq!(stored.customer_phone.as_deref(), Some("+91-9000000000"));
    assert!(stored.gateway_response.is_none());

    let outcome = GatewayOutcome::approved(GatewayKind::Stripe, "stripe_0123456789ab");
    let done = store
        .complete_transaction(&txn.transaction_id, outcome.clone())
        .await
        .unwrap();
    assert_eq!(done.status, TransactionStatus::Success);
    assert_eq!(done.gateway_response, Some(outcome));

    let again = store
        .complete_transaction(
            &txn.transaction_id,
            GatewayOutcome::declined(GatewayKind::Stripe, "stripe_ba9876543210"),
        )
        .await;
    assert!(matches!(again, Err(LedgerError::Domain(_))));

    let reconciled = store.mark_reconciled(&txn.transaction_id).await.unwrap();
    assert!(reconciled.is_reconciled);
    assert_eq!(reconciled.status, TransactionStatus::Success);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn pending_transaction_cannot_be_reconciled() {
    let store = get_test_store().await;
    let merchant = seeded_merchant(&store, "pending@example.com").await;
    let txn = store
        .insert_transaction(pending(&merchant.merchant_id, GatewayKind::Paytm))
        .await
        .unwrap();

    let result = store.mark_reconciled(&txn.transaction_id).await;
    assert!(matches!(result, Err(LedgerError::Domain(_))));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn constraint_violations_map_to_variants() {
    let store = get_test_store().await;
    let merchant = seeded_merchant(&store, "keys@example.com").await;

    let mut first = pending(&merchant.merchant_id, GatewayKind::Phonepe);
    first.idempotency_key = Some("order-1".to_string());
    store.insert_transaction(first.clone()).await.unwrap();

    let dup_id = store.insert_transaction(first.clone()).await.unwrap_err();
    assert!(matches!(dup_id, LedgerError::DuplicateTransactionId(_)));

    let mut replay = pending(&merchant.merchant_id, GatewayKind::Phonepe);
    replay.idempotency_key = Some("order-1".to_string());
    let dup_key = store.insert_transaction(replay).await.unwrap_err();
    assert!(matches!(dup_key, LedgerError::DuplicateIdempotencyKey { .. }));

    let orphan = pending(&MerchantId::new("MERCH_0000000000"), GatewayKind::Phonepe);
    let missing = store.insert_transaction(orphan).await.unwrap_err();
    assert!(matches!(missing, LedgerError::MerchantNotFound(_)));

    let found = store
        .find_by_idempotency_key(&merchant.merchant_id, "order-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.transaction_id, first.transaction_id);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn list_filters_and_stream() {
    let store = get_test_store().await;
    let merchant = seeded_merchant(&store, "list@example.com").await;

    let mut ids = Vec::new();
    for gateway in [GatewayKind::Stripe, GatewayKind::Paytm, GatewayKind::Stripe] {
        let txn = store
            .insert_transaction(pending(&merchant.merchant_id, gateway))
            .await
            .unwrap();
        ids.push(txn.transaction_id);
    }

    let listed = store
        .list_transactions(TransactionQuery::for_merchant(merchant.merchant_id.clone()))
        .await
        .unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].transaction_id, ids[2]);

    let stripe = store
        .list_transactions(TransactionQuery::new().gateway(GatewayKind::Stripe))
        .await
        .unwrap();
    assert_eq!(stripe.len(), 2);

    let streamed: Vec<_> = store
        .stream_transactions(TransactionQuery::new())
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    let streamed_ids: Vec<_> = streamed.into_iter().map(|t| t.transaction_id).collect();
    assert_eq!(streamed_ids, ids);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn stream_spans_multiple_batches() {
    let store = get_test_store().await;
    let merchant = seeded_merchant(&store, "bulk@example.com").await;

    for _ in 0..1_050 {
        store
            .insert_transaction(pending(&merchant.merchant_id, GatewayKind::Razorpay))
            .await
            .unwrap();
    }

    let count = store
        .count_transactions(TransactionQuery::for_merchant(merchant.merchant_id))
        .await
        .unwrap();
    assert_eq!(count, 1_050);
}
