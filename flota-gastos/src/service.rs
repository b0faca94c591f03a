use std::sync::Arc;

use uuid::Uuid;

use flota_core::{CallerContext, DispatchError, DispatchResult};

use crate::models::{Expense, ExpenseTotals, NewExpense};
use crate::repository::{ExpenseFilter, ExpenseRepository};

/// Caps a single line item at 500,000.00 MXN. Anything above that is a
/// typo or a problem for a human, not this service.
const MAX_AMOUNT_CENTS: i64 = 50_000_000;

pub struct ExpenseService {
    repo: Arc<dyn ExpenseRepository>,
}

impl ExpenseService {
    pub fn new(repo: Arc<dyn ExpenseRepository>) -> Self {
        Self { repo }
    }

    /// Drivers file expenses against their own trips only; the repository
    /// enforces the assignment when it checks the trip.
    pub async fn file_expense(
        &self,
        caller: &CallerContext,
        params: NewExpense,
    ) -> DispatchResult<Expense> {
        if params.amount_cents <= 0 {
            return Err(DispatchError::InvalidInput(
                "amount_cents debe ser mayor que cero".into(),
            ));
        }
        if params.amount_cents > MAX_AMOUNT_CENTS {
            return Err(DispatchError::InvalidInput(
                "amount_cents excede el limite permitido".into(),
            ));
        }
        let expense = Expense::new(params, caller.user_id);
        self.repo.insert_expense(&expense).await?;
        tracing::info!(
            expense_id = %expense.id,
            trip_id = %expense.trip_id,
            category = %expense.category,
            amount_cents = expense.amount_cents,
            "expense filed"
        );
        Ok(expense)
    }

    pub async fn get_expense(&self, expense_id: Uuid) -> DispatchResult<Expense> {
        self.repo
            .expense_by_id(expense_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("el gasto no existe"))
    }

    /// Drivers see their own ledger; administrators see everything.
    pub async fn list_expenses(
        &self,
        caller: &CallerContext,
        mut filter: ExpenseFilter,
    ) -> DispatchResult<Vec<Expense>> {
        if !caller.is_admin() {
            filter.driver_id = Some(caller.user_id);
        }
        self.repo.list_expenses(&filter).await
    }

    pub async fn approve_expense(
        &self,
        caller: &CallerContext,
        expense_id: Uuid,
    ) -> DispatchResult<Expense> {
        caller.require_admin()?;
        let expense = self.repo.approve_expense(expense_id, caller.user_id).await?;
        tracing::info!(expense_id = %expense_id, responder_id = %caller.user_id, "expense approved");
        Ok(expense)
    }

    pub async fn reject_expense(
        &self,
        caller: &CallerContext,
        expense_id: Uuid,
        reason: &str,
    ) -> DispatchResult<Expense> {
        caller.require_admin()?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DispatchError::InvalidInput(
                "el motivo de rechazo es obligatorio".into(),
            ));
        }
        let expense = self
            .repo
            .reject_expense(expense_id, caller.user_id, reason)
            .await?;
        tracing::info!(expense_id = %expense_id, responder_id = %caller.user_id, "expense rejected");
        Ok(expense)
    }

    pub async fn totals_for_trip(&self, trip_id: Uuid) -> DispatchResult<ExpenseTotals> {
        self.repo.totals_for_trip(trip_id).await
    }
}
