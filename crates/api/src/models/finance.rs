//! Ledger rows and the financial overview.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use strive_core::ledger::OverviewFigures;
use strive_core::{MetricId, OrderId, TransactionId, TransactionType};

/// Number of rows in each "recent" list of the overview.
pub const RECENT_ROWS: i64 = 10;

const MAX_TRANSACTIONS: i64 = 100;

/// Aggregates for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialMetric {
    pub id: MetricId,
    pub date: NaiveDate,
    pub daily_revenue: Decimal,
    pub orders_count: i32,
    pub average_order_value: Decimal,
}

/// One ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialTransaction {
    pub id: TransactionId,
    pub order_id: Option<OrderId>,
    pub amount: Decimal,
    pub description: String,
    pub transaction_type: TransactionType,
    pub created_at: DateTime<Utc>,
}

/// Response of `GET /api/finances/overview`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialOverview {
    #[serde(flatten)]
    pub figures: OverviewFigures,
    pub recent_metrics: Vec<FinancialMetric>,
    pub recent_transactions: Vec<FinancialTransaction>,
}

/// Query of `GET /api/finances/metrics`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Query of `GET /api/finances/transactions`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TransactionsQuery {
    pub limit: Option<i64>,
}

impl TransactionsQuery {
    /// Requested row count clamped to `1..=100`, 10 by default.
    #[must_use]
    pub fn limit(self) -> i64 {
        self.limit.unwrap_or(RECENT_ROWS).clamp(1, MAX_TRANSACTIONS)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strive_core::ledger::LedgerSnapshot;

    #[test]
    fn test_transactions_limit_is_clamped() {
        assert_eq!(TransactionsQuery::default().limit(), 10);
        assert_eq!(TransactionsQuery { limit: Some(0) }.limit(), 1);
        assert_eq!(TransactionsQuery { limit: Some(500) }.limit(), 100);
        assert_eq!(TransactionsQuery { limit: Some(25) }.limit(), 25);
    }

    #[test]
    fn test_overview_is_flat() {
        let overview = FinancialOverview {
            figures: OverviewFigures::from(&LedgerSnapshot::default()),
            recent_metrics: Vec::new(),
            recent_transactions: Vec::new(),
        };
        let json = serde_json::to_value(overview).unwrap();
        assert_eq!(json["totalOrders"], 0);
        assert_eq!(json["revenueGrowthRate"], 0);
        assert!(json["recentMetrics"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_metrics_query_dates() {
        let query: MetricsQuery =
            serde_json::from_str(r#"{"startDate":"2026-10-01","endDate":"2026-10-18"}"#).unwrap();
        assert!(query.start_date < query.end_date);
    }
}
