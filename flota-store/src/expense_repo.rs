use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use flota_core::{DispatchError, DispatchResult};
use flota_dispatch::models::TripStatus;
use flota_gastos::models::{Expense, ExpenseTotals};
use flota_gastos::repository::{ExpenseFilter, ExpenseRepository};

const EXPENSE_COLUMNS: &str = "id, trip_id, driver_id, category, amount_cents, description, \
     status, rejection_reason, responded_at, responder_id, created_at";

pub struct StoreExpenseRepository {
    pool: Pool<Sqlite>,
}

impl StoreExpenseRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpenseRepository for StoreExpenseRepository {
    async fn insert_expense(&self, expense: &Expense) -> DispatchResult<()> {
        let mut tx = self.pool.begin().await.map_err(DispatchError::storage)?;

        let trip: Option<(Option<Uuid>, TripStatus)> =
            sqlx::query_as("SELECT driver_id, status FROM trips WHERE id = ?")
                .bind(expense.trip_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(DispatchError::storage)?;

        match trip {
            None => return Err(DispatchError::not_found("el viaje no existe")),
            Some((_, TripStatus::Pending)) => {
                return Err(DispatchError::InvalidState(
                    "el viaje aun no inicia, no acepta gastos".into(),
                ))
            }
            Some((_, TripStatus::Cancelled)) => {
                return Err(DispatchError::InvalidState(
                    "el viaje esta cancelado, no acepta gastos".into(),
                ))
            }
            Some((driver_id, _)) if driver_id != Some(expense.driver_id) => {
                return Err(DispatchError::Forbidden(
                    "solo el transportista asignado puede registrar gastos".into(),
                ))
            }
            Some(_) => {}
        }

        sqlx::query(
            "INSERT INTO expenses (id, trip_id, driver_id, category, amount_cents, description, \
             status, rejection_reason, responded_at, responder_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(expense.id)
        .bind(expense.trip_id)
        .bind(expense.driver_id)
        .bind(expense.category)
        .bind(expense.amount_cents)
        .bind(expense.description.as_deref())
        .bind(expense.status)
        .bind(expense.rejection_reason.as_deref())
        .bind(expense.responded_at)
        .bind(expense.responder_id)
        .bind(expense.created_at)
        .execute(&mut *tx)
        .await
        .map_err(DispatchError::storage)?;

        tx.commit().await.map_err(DispatchError::storage)?;
        Ok(())
    }

    async fn expense_by_id(&self, expense_id: Uuid) -> DispatchResult<Option<Expense>> {
        let sql = format!("SELECT {} FROM expenses WHERE id = ?", EXPENSE_COLUMNS);
        sqlx::query_as::<_, Expense>(&sql)
            .bind(expense_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DispatchError::storage)
    }

    async fn list_expenses(&self, filter: &ExpenseFilter) -> DispatchResult<Vec<Expense>> {
        let mut sql = format!("SELECT {} FROM expenses", EXPENSE_COLUMNS);
        let mut clauses: Vec<&str> = Vec::new();
        if filter.trip_id.is_some() {
            clauses.push("trip_id = ?");
        }
        if filter.driver_id.is_some() {
            clauses.push("driver_id = ?");
        }
        if filter.status.is_some() {
            clauses.push("status = ?");
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY rowid DESC");

        let mut query = sqlx::query_as::<_, Expense>(&sql);
        if let Some(trip_id) = filter.trip_id {
            query = query.bind(trip_id);
        }
        if let Some(driver_id) = filter.driver_id {
            query = query.bind(driver_id);
        }
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        query
            .fetch_all(&self.pool)
            .await
            .map_err(DispatchError::storage)
    }

    async fn approve_expense(
        &self,
        expense_id: Uuid,
        responder_id: Uuid,
    ) -> DispatchResult<Expense> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE expenses SET status = 'approved', responded_at = ?, responder_id = ? \
             WHERE id = ? AND status = 'pending'",
        )
        .bind(now)
        .bind(responder_id)
        .bind(expense_id)
        .execute(&self.pool)
        .await
        .map_err(DispatchError::storage)?;

        if result.rows_affected() == 0 {
            return match self.expense_by_id(expense_id).await? {
                None => Err(DispatchError::not_found("el gasto no existe")),
                Some(_) => Err(DispatchError::conflict("el gasto ya fue respondido")),
            };
        }
        self.expense_by_id(expense_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("el gasto no existe"))
    }

    async fn reject_expense(
        &self,
        expense_id: Uuid,
        responder_id: Uuid,
        reason: &str,
    ) -> DispatchResult<Expense> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE expenses SET status = 'rejected', rejection_reason = ?, responded_at = ?, \
             responder_id = ? WHERE id = ? AND status = 'pending'",
        )
        .bind(reason)
        .bind(now)
        .bind(responder_id)
        .bind(expense_id)
        .execute(&self.pool)
        .await
        .map_err(DispatchError::storage)?;

        if result.rows_affected() == 0 {
            return match self.expense_by_id(expense_id).await? {
                None => Err(DispatchError::not_found("el gasto no existe")),
                Some(_) => Err(DispatchError::conflict("el gasto ya fue respondido")),
            };
        }
        self.expense_by_id(expense_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("el gasto no existe"))
    }

    async fn totals_for_trip(&self, trip_id: Uuid) -> DispatchResult<ExpenseTotals> {
        sqlx::query_as::<_, ExpenseTotals>(
            "SELECT \
             COALESCE(SUM(amount_cents), 0) AS total_cents, \
             COALESCE(SUM(CASE WHEN status = 'approved' THEN amount_cents ELSE 0 END), 0) AS approved_cents, \
             COALESCE(SUM(CASE WHEN status = 'pending' THEN amount_cents ELSE 0 END), 0) AS pending_cents, \
             COALESCE(SUM(CASE WHEN status = 'rejected' THEN amount_cents ELSE 0 END), 0) AS rejected_cents, \
             COUNT(*) AS count \
             FROM expenses WHERE trip_id = ?",
        )
        .bind(trip_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DispatchError::storage)
    }
}
