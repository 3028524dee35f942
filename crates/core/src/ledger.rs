//! Revenue ledger arithmetic.
//!
//! The api crate sums `financial_metrics` rows over the windows described by
//! [`ReportingCalendar`] and hands the totals to [`OverviewFigures::from`],
//! which does the rounding and growth math. All money is `Decimal`; nothing
//! here goes through floating point.

use chrono::{Datelike, Days, Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::OrderId;

/// First day of the all-time reporting window.
#[must_use]
pub fn ledger_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Ledger description for an order's transaction row.
#[must_use]
pub fn order_description(order_id: OrderId) -> String {
    format!("Order #{order_id}")
}

/// Round a money value half-up to cents.
#[must_use]
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Revenue divided by order count, rounded to cents. Zero without orders.
#[must_use]
pub fn average_order_value(revenue: Decimal, orders: i64) -> Decimal {
    if orders <= 0 {
        return Decimal::ZERO;
    }
    round_currency(revenue / Decimal::from(orders))
}

/// Percentage change from `previous` to `current`, rounded half-up to a whole
/// percent. Zero when `previous` is not positive.
#[must_use]
pub fn growth_rate(current: Decimal, previous: Decimal) -> i32 {
    if previous <= Decimal::ZERO {
        return 0;
    }
    ((current - previous) * Decimal::ONE_HUNDRED / previous)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i32()
        .unwrap_or(0)
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

/// The reporting windows relative to one day. Weeks start on Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingCalendar {
    pub today: NaiveDate,
    pub all_time: DateWindow,
    pub month_to_date: DateWindow,
    pub previous_month: DateWindow,
    pub week_to_date: DateWindow,
    pub previous_week: DateWindow,
}

impl ReportingCalendar {
    /// Windows for `today`. `None` only for dates at the edge of chrono's range.
    #[must_use]
    pub fn for_date(today: NaiveDate) -> Option<Self> {
        let month_start = today.with_day(1)?;
        let previous_month_start = month_start.checked_sub_months(Months::new(1))?;
        let previous_month_end = month_start.pred_opt()?;

        let days_since_monday = u64::from(today.weekday().num_days_from_monday());
        let week_start = today.checked_sub_days(Days::new(days_since_monday))?;
        let previous_week_start = week_start.checked_sub_days(Days::new(7))?;
        let previous_week_end = week_start.pred_opt()?;

        Some(Self {
            today,
            all_time: DateWindow::new(ledger_epoch(), today),
            month_to_date: DateWindow::new(month_start, today),
            previous_month: DateWindow::new(previous_month_start, previous_month_end),
            week_to_date: DateWindow::new(week_start, today),
            previous_week: DateWindow::new(previous_week_start, previous_week_end),
        })
    }
}

/// Revenue and order count summed over one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowTotals {
    pub revenue: Decimal,
    pub orders: i64,
}

/// Totals for every window of a [`ReportingCalendar`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub all_time: WindowTotals,
    pub month_to_date: WindowTotals,
    pub previous_month: WindowTotals,
    pub week_to_date: WindowTotals,
    pub previous_week: WindowTotals,
    /// Today's metric row revenue, zero when there is none.
    pub today_revenue: Decimal,
}

/// Headline numbers of the financial overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewFigures {
    pub total_revenue: Decimal,
    pub monthly_revenue: Decimal,
    pub weekly_revenue: Decimal,
    pub daily_revenue: Decimal,
    pub total_orders: i64,
    pub average_order_value: Decimal,
    pub revenue_growth_rate: i32,
    pub order_growth_rate: i32,
    pub weekly_revenue_growth_rate: i32,
}

impl From<&LedgerSnapshot> for OverviewFigures {
    fn from(snapshot: &LedgerSnapshot) -> Self {
        Self {
            total_revenue: snapshot.all_time.revenue,
            monthly_revenue: snapshot.month_to_date.revenue,
            weekly_revenue: snapshot.week_to_date.revenue,
            daily_revenue: snapshot.today_revenue,
            total_orders: snapshot.all_time.orders,
            average_order_value: average_order_value(
                snapshot.all_time.revenue,
                snapshot.all_time.orders,
            ),
            revenue_growth_rate: growth_rate(
                snapshot.month_to_date.revenue,
                snapshot.previous_month.revenue,
            ),
            order_growth_rate: growth_rate(
                Decimal::from(snapshot.month_to_date.orders),
                Decimal::from(snapshot.previous_month.orders),
            ),
            weekly_revenue_growth_rate: growth_rate(
                snapshot.week_to_date.revenue,
                snapshot.previous_week.revenue,
            ),
        }
    }
}
