use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Expense, ExpenseStatus, ExpenseTotals};
use flota_core::DispatchResult;

#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub trip_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub status: Option<ExpenseStatus>,
}

/// Persistence contract for the expense ledger.
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// Insert after checking the trip: NotFound when the trip is missing,
    /// Forbidden when the filer is not its assigned driver, InvalidState
    /// when the trip never left pending or was cancelled.
    async fn insert_expense(&self, expense: &Expense) -> DispatchResult<()>;

    async fn expense_by_id(&self, expense_id: Uuid) -> DispatchResult<Option<Expense>>;

    async fn list_expenses(&self, filter: &ExpenseFilter) -> DispatchResult<Vec<Expense>>;

    /// pending -> approved; answered expenses cannot be re-answered.
    async fn approve_expense(
        &self,
        expense_id: Uuid,
        responder_id: Uuid,
    ) -> DispatchResult<Expense>;

    /// pending -> rejected with the reason on file.
    async fn reject_expense(
        &self,
        expense_id: Uuid,
        responder_id: Uuid,
        reason: &str,
    ) -> DispatchResult<Expense>;

    async fn totals_for_trip(&self, trip_id: Uuid) -> DispatchResult<ExpenseTotals>;
}
