use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use flota_core::CallerContext;
use flota_gastos::{
    models::{Expense, ExpenseStatus, ExpenseTotals, NewExpense},
    ExpenseFilter,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ListExpensesParams {
    pub trip_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub status: Option<ExpenseStatus>,
}

#[derive(Debug, Deserialize)]
pub struct RejectExpenseBody {
    pub reason: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", post(file_expense).get(list_expenses))
        .route("/expenses/{id}", get(get_expense))
        .route("/expenses/{id}/approve", post(approve_expense))
        .route("/expenses/{id}/reject", post(reject_expense))
        .route("/trips/{id}/expenses/totals", get(trip_expense_totals))
}

/// POST /expenses
/// Driver files a road expense against their trip
async fn file_expense(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<NewExpense>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let expense = state.expenses.file_expense(&caller, body).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

/// GET /expenses?trip_id=&driver_id=&status=
/// Drivers see their own ledger regardless of the driver_id filter
async fn list_expenses(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Query(params): Query<ListExpensesParams>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    let filter = ExpenseFilter {
        trip_id: params.trip_id,
        driver_id: params.driver_id,
        status: params.status,
    };
    let expenses = state.expenses.list_expenses(&caller, filter).await?;
    Ok(Json(expenses))
}

/// GET /expenses/{id}
async fn get_expense(
    State(state): State<AppState>,
    Extension(_caller): Extension<CallerContext>,
    Path(expense_id): Path<Uuid>,
) -> Result<Json<Expense>, ApiError> {
    let expense = state.expenses.get_expense(expense_id).await?;
    Ok(Json(expense))
}

/// POST /expenses/{id}/approve
async fn approve_expense(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(expense_id): Path<Uuid>,
) -> Result<Json<Expense>, ApiError> {
    let expense = state.expenses.approve_expense(&caller, expense_id).await?;
    Ok(Json(expense))
}

/// POST /expenses/{id}/reject
async fn reject_expense(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(expense_id): Path<Uuid>,
    Json(body): Json<RejectExpenseBody>,
) -> Result<Json<Expense>, ApiError> {
    let expense = state
        .expenses
        .reject_expense(&caller, expense_id, &body.reason)
        .await?;
    Ok(Json(expense))
}

/// GET /trips/{id}/expenses/totals
/// Rollup of the trip's ledger by decision status
async fn trip_expense_totals(
    State(state): State<AppState>,
    Extension(_caller): Extension<CallerContext>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<ExpenseTotals>, ApiError> {
    let totals = state.expenses.totals_for_trip(trip_id).await?;
    Ok(Json(totals))
}
