//! Financial overview assembly.

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use tracing::instrument;

use strive_core::ledger::{LedgerSnapshot, OverviewFigures, ReportingCalendar};

use crate::db::finance::FinanceRepository;
use crate::error::AppError;
use crate::models::finance::{FinancialOverview, RECENT_ROWS};

/// Read-side reporting over the ledger tables.
pub struct FinanceService<'a> {
    ledger: FinanceRepository<'a>,
}

impl<'a> FinanceService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            ledger: FinanceRepository::new(pool),
        }
    }

    /// Overview as of today (UTC).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a query fails.
    pub async fn overview(&self) -> Result<FinancialOverview, AppError> {
        self.overview_on(Utc::now().date_naive()).await
    }

    /// Overview as of `today`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a query fails, or `AppError::Internal`
    /// for a date at the edge of the calendar.
    #[instrument(skip(self))]
    pub async fn overview_on(&self, today: NaiveDate) -> Result<FinancialOverview, AppError> {
        let calendar = ReportingCalendar::for_date(today)
            .ok_or_else(|| AppError::Internal(format!("no reporting calendar for {today}")))?;

        let snapshot = LedgerSnapshot {
            all_time: self.ledger.window_totals(calendar.all_time).await?,
            month_to_date: self.ledger.window_totals(calendar.month_to_date).await?,
            previous_month: self.ledger.window_totals(calendar.previous_month).await?,
            week_to_date: self.ledger.window_totals(calendar.week_to_date).await?,
            previous_week: self.ledger.window_totals(calendar.previous_week).await?,
            today_revenue: self.ledger.revenue_on(calendar.today).await?,
        };

        Ok(FinancialOverview {
            figures: OverviewFigures::from(&snapshot),
            recent_metrics: self.ledger.recent_metrics(RECENT_ROWS).await?,
            recent_transactions: self.ledger.recent_transactions(RECENT_ROWS).await?,
        })
    }
}
