use async_trait::async_trait;
use chrono::Utc;
use common::{ApiKey, MerchantId, Page, TransactionId};
use domain::{Currency, GatewayKind, GatewayOutcome, Merchant, Transaction, TransactionStatus};
use sqlx::{PgPool, Row, postgres::PgRow, types::Json};

use crate::{
    LedgerError, Result, TransactionQuery,
    store::{LedgerStore, TransactionStream},
};

/// Rows fetched per round trip when streaming.
const STREAM_BATCH_SIZE: i64 = 500;

const MERCHANT_COLUMNS: &str = "merchant_id, merchant_name, email, api_key, preferred_gateway, is_active, created_at";

const INSERT_MERCHANT: &str = r#"
    INSERT INTO merchants (merchant_id, merchant_name, email, api_key, preferred_gateway, is_active, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
"#;

const INSERT_TRANSACTION: &str = r#"
    INSERT INTO transactions (
        transaction_id, merchant_id, amount, currency, gateway, status,
        customer_email, customer_phone, idempotency_key, gateway_response,
        is_reconciled, created_at, updated_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
"#;

const SELECT_TRANSACTION: &str = r#"
    SELECT seq, transaction_id, merchant_id, amount, currency, gateway, status,
           customer_email, customer_phone, idempotency_key, gateway_response,
           is_reconciled, created_at, updated_at
    FROM transactions
"#;

const RETURNING_TRANSACTION: &str = r#"
    RETURNING seq, transaction_id, merchant_id, amount, currency, gateway, status,
              customer_email, customer_phone, idempotency_key, gateway_response,
              is_reconciled, created_at, updated_at
"#;

const FILTERS: &str = r#"
    ($1::TEXT IS NULL OR merchant_id = $1)
    AND ($2::TEXT IS NULL OR status = $2)
    AND ($3::TEXT IS NULL OR gateway = $3)
"#;

/// PostgreSQL-backed ledger implementation.
///
/// Uniqueness is enforced by the schema; constraint violations are mapped
/// back to the matching [`LedgerError`] variant.
#[derive(Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    /// Creates a new PostgreSQL ledger.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_merchant(row: PgRow) -> Result<Merchant> {
        Ok(Merchant {
            merchant_id: MerchantId::new(row.try_get::<String, _>("merchant_id")?),
            merchant_name: row.try_get("merchant_name")?,
            email: row.try_get("email")?,
            api_key: ApiKey::new(row.try_get::<String, _>("api_key")?),
            preferred_gateway: parse_gateway(row.try_get("preferred_gateway")?)?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_transaction(row: &PgRow) -> Result<Transaction> {
        let status: String = row.try_get("status")?;
        let currency: String = row.try_get("currency")?;
        let gateway_response: Option<Json<GatewayOutcome>> = row.try_get("gateway_response")?;

        Ok(Transaction {
            transaction_id: TransactionId::new(row.try_get::<String, _>("transaction_id")?),
            merchant_id: MerchantId::new(row.try_get::<String, _>("merchant_id")?),
            amount: row.try_get("amount")?,
            currency: Currency::parse(&currency)
                .map_err(|_| LedgerError::Corrupt(format!("currency {currency:?}")))?,
            gateway: parse_gateway(row.try_get("gateway")?)?,
            status: status
                .parse::<TransactionStatus>()
                .map_err(|_| LedgerError::Corrupt(format!("status {status:?}")))?,
            customer_email: row.try_get("customer_email")?,
            customer_phone: row.try_get("customer_phone")?,
            idempotency_key: row.try_get("idempotency_key")?,
            gateway_response: gateway_response.map(|Json(outcome)| outcome),
            is_reconciled: row.try_get("is_reconciled")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn fetch_transaction_batch(
        pool: &PgPool,
        query: &TransactionQuery,
        after_seq: i64,
    ) -> Result<Vec<(i64, Transaction)>> {
        let sql = format!(
            "{SELECT_TRANSACTION} WHERE {FILTERS} AND seq > $4 ORDER BY seq ASC LIMIT $5"
        );
        let rows = bind_filters(sqlx::query(&sql), query)
            .bind(after_seq)
            .bind(STREAM_BATCH_SIZE)
            .fetch_all(pool)
            .await?;

        rows.iter()
            .map(|row| Ok((row.try_get::<i64, _>("seq")?, Self::row_to_transaction(row)?)))
            .collect()
    }
}

fn parse_gateway(name: String) -> Result<GatewayKind> {
    name.parse()
        .map_err(|_| LedgerError::Corrupt(format!("gateway {name:?}")))
}

fn bind_filters<'q>(
    sql: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    query: &TransactionQuery,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    sql.bind(query.merchant_id.as_ref().map(|id| id.as_str().to_string()))
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.gateway.map(|g| g.as_str()))
}

/// Maps a unique or foreign-key violation to its ledger error.
fn map_merchant_insert_error(err: sqlx::Error, merchant: &Merchant) -> LedgerError {
    if let sqlx::Error::Database(ref db_err) = err {
        match db_err.constraint() {
            Some("merchants_email_key") => {
                return LedgerError::DuplicateEmail(merchant.email.clone());
            }
            Some("merchants_pkey") => {
                return LedgerError::DuplicateMerchantId(merchant.merchant_id.clone());
            }
            Some("merchants_api_key_key") => return LedgerError::DuplicateApiKey,
            _ => {}
        }
    }
    LedgerError::Database(err)
}

fn map_transaction_insert_error(err: sqlx::Error, transaction: &Transaction) -> LedgerError {
    if let sqlx::Error::Database(ref db_err) = err {
        match db_err.constraint() {
            Some("transactions_pkey") => {
                return LedgerError::DuplicateTransactionId(transaction.transaction_id.clone());
            }
            Some("transactions_idempotency_key") => {
                return LedgerError::DuplicateIdempotencyKey {
                    merchant_id: transaction.merchant_id.clone(),
                    key: transaction.idempotency_key.clone().unwrap_or_default(),
                };
            }
            Some("transactions_merchant_id_fkey") => {
                return LedgerError::MerchantNotFound(transaction.merchant_id.clone());
            }
            _ => {}
        }
    }
    LedgerError::Database(err)
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn insert_merchant(&self, merchant: Merchant) -> Result<Merchant> {
        sqlx::query(INSERT_MERCHANT)
            .bind(merchant.merchant_id.as_str())
            .bind(&merchant.merchant_name)
            .bind(&merchant.email)
            .bind(merchant.api_key.as_str())
            .bind(merchant.preferred_gateway.as_str())
            .bind(merchant.is_active)
            .bind(merchant.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_merchant_insert_error(e, &merchant))?;

        Ok(merchant)
    }

    async fn get_merchant(&self, merchant_id: &MerchantId) -> Result<Option<Merchant>> {
        let sql = format!("SELECT {MERCHANT_COLUMNS} FROM merchants WHERE merchant_id = $1");
        let row = sqlx::query(&sql)
            .bind(merchant_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_merchant).transpose()
    }

    async fn get_merchant_by_api_key(&self, api_key: &ApiKey) -> Result<Option<Merchant>> {
        let sql = format!("SELECT {MERCHANT_COLUMNS} FROM merchants WHERE api_key = $1");
        let row = sqlx::query(&sql)
            .bind(api_key.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_merchant).transpose()
    }

    async fn list_merchants(&self, page: Page) -> Result<Vec<Merchant>> {
        let page = page.clamped();
        let sql = format!(
            "SELECT {MERCHANT_COLUMNS} FROM merchants ORDER BY seq ASC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query(&sql)
            .bind(page.limit as i64)
            .bind(page.skip as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_merchant).collect()
    }

    async fn deactivate_merchant(&self, merchant_id: &MerchantId) -> Result<Merchant> {
        let sql = format!(
            "UPDATE merchants SET is_active = FALSE WHERE merchant_id = $1 RETURNING {MERCHANT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(merchant_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Self::row_to_merchant(row),
            None => Err(LedgerError::MerchantNotFound(merchant_id.clone())),
        }
    }

    async fn insert_transaction(&self, transaction: Transaction) -> Result<Transaction> {
        sqlx::query(INSERT_TRANSACTION)
            .bind(transaction.transaction_id.as_str())
            .bind(transaction.merchant_id.as_str())
            .bind(transaction.amount)
            .bind(transaction.currency.as_str())
            .bind(transaction.gateway.as_str())
            .bind(transaction.status.as_str())
            .bind(&transaction.customer_email)
            .bind(&transaction.customer_phone)
            .bind(&transaction.idempotency_key)
            .bind(transaction.gateway_response.clone().map(Json))
            .bind(transaction.is_reconciled)
            .bind(transaction.created_at)
            .bind(transaction.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_transaction_insert_error(e, &transaction))?;

        Ok(transaction)
    }

    async fn get_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<Transaction>> {
        let sql = format!("{SELECT_TRANSACTION} WHERE transaction_id = $1");
        let row = sqlx::query(&sql)
            .bind(transaction_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_transaction).transpose()
    }

    async fn find_by_idempotency_key(
        &self,
        merchant_id: &MerchantId,
        key: &str,
    ) -> Result<Option<Transaction>> {
        let sql = format!("{SELECT_TRANSACTION} WHERE merchant_id = $1 AND idempotency_key = $2");
        let row = sqlx::query(&sql)
            .bind(merchant_id.as_str())
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_transaction).transpose()
    }

    async fn complete_transaction(
        &self,
        transaction_id: &TransactionId,
        outcome: GatewayOutcome,
    ) -> Result<Transaction> {
        let next = TransactionStatus::from_outcome(outcome.succeeded);
        let sql = format!(
            "UPDATE transactions SET status = $2, gateway_response = $3, updated_at = $4 \
             WHERE transaction_id = $1 AND status = 'pending' {RETURNING_TRANSACTION}"
        );
        let row = sqlx::query(&sql)
            .bind(transaction_id.as_str())
            .bind(next.as_str())
            .bind(Json(outcome))
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            return Self::row_to_transaction(&row);
        }

        // Nothing updated: either the row is missing or it already left pending.
        let current = self
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.clone()))?;
        Err(domain::DomainError::InvalidStatusTransition {
            from: current.status,
            to: next,
        }
        .into())
    }

    async fn mark_reconciled(&self, transaction_id: &TransactionId) -> Result<Transaction> {
        let sql = format!(
            "UPDATE transactions SET is_reconciled = TRUE \
             WHERE transaction_id = $1 AND status <> 'pending' {RETURNING_TRANSACTION}"
        );
        let row = sqlx::query(&sql)
            .bind(transaction_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            return Self::row_to_transaction(&row);
        }

        let current = self
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.clone()))?;
        Err(domain::DomainError::NotReconcilable {
            status: current.status,
        }
        .into())
    }

    async fn list_transactions(&self, query: TransactionQuery) -> Result<Vec<Transaction>> {
        // LIMIT NULL is LIMIT ALL in PostgreSQL.
        let sql = format!(
            "{SELECT_TRANSACTION} WHERE {FILTERS} ORDER BY created_at DESC, seq DESC LIMIT $4 OFFSET $5"
        );
        let rows = bind_filters(sqlx::query(&sql), &query)
            .bind(query.limit.map(|l| l as i64))
            .bind(query.offset.unwrap_or(0) as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    async fn stream_transactions(&self, query: TransactionQuery) -> Result<TransactionStream> {
        use futures_util::{TryStreamExt, stream};

        let pool = self.pool.clone();

        // Keyset pagination on seq; the cursor is None once a short batch is seen.
        let batches = stream::try_unfold(Some(0i64), move |cursor| {
            let pool = pool.clone();
            let query = query.clone();
            async move {
                let Some(after_seq) = cursor else {
                    return Ok::<_, LedgerError>(None);
                };
                let batch = Self::fetch_transaction_batch(&pool, &query, after_seq).await?;
                if batch.is_empty() {
                    return Ok(None);
                }
                let next = if (batch.len() as i64) < STREAM_BATCH_SIZE {
                    None
                } else {
                    batch.last().map(|(seq, _)| *seq)
                };
                let transactions: Vec<Transaction> =
                    batch.into_iter().map(|(_, txn)| txn).collect();
                Ok(Some((transactions, next)))
            }
        });

        let stream = batches
            .map_ok(|batch| stream::iter(batch.into_iter().map(Ok::<_, LedgerError>)))
            .try_flatten();

        Ok(Box::pin(stream))
    }
}
