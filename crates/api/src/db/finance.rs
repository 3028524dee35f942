//! Ledger repository: daily metrics and transactions.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use strive_core::ledger::{DateWindow, WindowTotals};
use strive_core::{MetricId, OrderId, TransactionId};

use super::{RepositoryError, parse_column};
use crate::models::finance::{FinancialMetric, FinancialTransaction};

const METRIC_COLUMNS: &str = "id, date, daily_revenue, orders_count, average_order_value";
const TRANSACTION_COLUMNS: &str = "id, order_id, amount, description, transaction_type, created_at";

#[derive(Debug, sqlx::FromRow)]
struct MetricRow {
    id: i32,
    date: NaiveDate,
    daily_revenue: Decimal,
    orders_count: i32,
    average_order_value: Decimal,
}

impl From<MetricRow> for FinancialMetric {
    fn from(row: MetricRow) -> Self {
        Self {
            id: MetricId::new(row.id),
            date: row.date,
            daily_revenue: row.daily_revenue,
            orders_count: row.orders_count,
            average_order_value: row.average_order_value,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: i32,
    order_id: Option<i32>,
    amount: Decimal,
    description: String,
    transaction_type: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for FinancialTransaction {
    type Error = RepositoryError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TransactionId::new(row.id),
            order_id: row.order_id.map(OrderId::new),
            amount: row.amount,
            description: row.description,
            transaction_type: parse_column(&row.transaction_type)?,
            created_at: row.created_at,
        })
    }
}

/// Repository for the revenue ledger.
pub struct FinanceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FinanceRepository<'a> {
    /// Create a new finance repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Revenue and order count summed over the metric rows in `window`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn window_totals(&self, window: DateWindow) -> Result<WindowTotals, RepositoryError> {
        let (revenue, orders): (Decimal, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(daily_revenue), 0), COALESCE(SUM(orders_count), 0)::int8 \
             FROM shop.financial_metrics \
             WHERE date BETWEEN $1 AND $2",
        )
        .bind(window.start)
        .bind(window.end)
        .fetch_one(self.pool)
        .await?;

        Ok(WindowTotals { revenue, orders })
    }

    /// Revenue recorded for one day, zero without a metric row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revenue_on(&self, date: NaiveDate) -> Result<Decimal, RepositoryError> {
        let revenue: Option<Decimal> = sqlx::query_scalar(
            "SELECT daily_revenue FROM shop.financial_metrics WHERE date = $1",
        )
        .bind(date)
        .fetch_optional(self.pool)
        .await?;

        Ok(revenue.unwrap_or(Decimal::ZERO))
    }

    /// The latest `limit` metric rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_metrics(&self, limit: i64) -> Result<Vec<FinancialMetric>, RepositoryError> {
        let rows = sqlx::query_as::<_, MetricRow>(&format!(
            "SELECT {METRIC_COLUMNS} FROM shop.financial_metrics ORDER BY date DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Metric rows dated within `start..=end`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn metrics_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FinancialMetric>, RepositoryError> {
        let rows = sqlx::query_as::<_, MetricRow>(&format!(
            "SELECT {METRIC_COLUMNS} FROM shop.financial_metrics \
             WHERE date BETWEEN $1 AND $2 ORDER BY date DESC"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// The latest `limit` transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a transaction type is invalid.
    pub async fn recent_transactions(
        &self,
        limit: i64,
    ) -> Result<Vec<FinancialTransaction>, RepositoryError> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM shop.financial_transactions \
             ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
