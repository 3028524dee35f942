//! Financial reporting handlers (staff only).

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use tracing::instrument;

use crate::db::finance::FinanceRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireStaff;
use crate::models::finance::{
    FinancialMetric, FinancialOverview, FinancialTransaction, MetricsQuery, TransactionsQuery,
};
use crate::services::finance::FinanceService;
use crate::state::AppState;

/// Build the finances router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(overview))
        .route("/metrics", get(metrics))
        .route("/transactions", get(transactions))
}

#[instrument(skip(state))]
async fn overview(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
) -> Result<Json<FinancialOverview>> {
    Ok(Json(FinanceService::new(state.pool()).overview().await?))
}

#[instrument(skip(state))]
async fn metrics(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<Vec<FinancialMetric>>> {
    if query.start_date > query.end_date {
        return Err(AppError::bad_request("startDate must not be after endDate"));
    }
    let metrics = FinanceRepository::new(state.pool())
        .metrics_between(query.start_date, query.end_date)
        .await?;
    Ok(Json(metrics))
}

#[instrument(skip(state))]
async fn transactions(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<Vec<FinancialTransaction>>> {
    let rows = FinanceRepository::new(state.pool())
        .recent_transactions(query.limit())
        .await?;
    Ok(Json(rows))
}
