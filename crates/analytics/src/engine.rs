//! Query-time aggregation over the ledger.

use std::collections::BTreeMap;

use common::MerchantId;
use domain::GatewayKind;
use futures_util::TryStreamExt;
use ledger::{LedgerStore, TransactionQuery};

use crate::{AnalyticsError, Result};
use crate::report::{GatewayPerformance, Tally, TransactionStats};

/// Computes statistics by scanning the ledger on every call.
///
/// Transactions are folded one at a time from the store's stream, so memory
/// use is bounded by the number of gateways rather than the ledger size.
/// Rows written during a scan may or may not be counted.
pub struct AnalyticsEngine<S: LedgerStore> {
    store: S,
}

impl<S: LedgerStore> AnalyticsEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Totals, volume and success rate, optionally for one merchant.
    #[tracing::instrument(skip(self))]
    pub async fn stats(&self, merchant_id: Option<MerchantId>) -> Result<TransactionStats> {
        metrics::counter!("analytics_queries_total", "query" => "stats").increment(1);

        let query = TransactionQuery::new().merchant(merchant_id);
        let tally = self
            .store
            .stream_transactions(query)
            .await?
            .map_err(AnalyticsError::from)
            .try_fold(Tally::default(), |mut tally, txn| async move {
                tally.record(&txn)?;
                Ok(tally)
            })
            .await?;

        tracing::debug!(total = tally.total, "stats computed");
        Ok(tally.into())
    }

    /// Figures per gateway. Gateways with no transactions are omitted.
    #[tracing::instrument(skip(self))]
    pub async fn gateway_performance(&self) -> Result<BTreeMap<GatewayKind, GatewayPerformance>> {
        metrics::counter!("analytics_queries_total", "query" => "gateway_performance").increment(1);

        let tallies = self
            .store
            .stream_transactions(TransactionQuery::new())
            .await?
            .map_err(AnalyticsError::from)
            .try_fold(
                BTreeMap::<GatewayKind, Tally>::new(),
                |mut tallies, txn| async move {
                    tallies.entry(txn.gateway).or_default().record(&txn)?;
                    Ok(tallies)
                },
            )
            .await?;

        Ok(tallies
            .into_iter()
            .map(|(gateway, tally)| (gateway, tally.into()))
            .collect())
    }
}
