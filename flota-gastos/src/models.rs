use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Expense ledger status. Unlike trip requests, a rejected expense is
/// kept on file; drivers dispute it out of band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ExpenseStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Fuel,
    Tolls,
    Lodging,
    Maintenance,
    Other,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Fuel => "fuel",
            ExpenseCategory::Tolls => "tolls",
            ExpenseCategory::Lodging => "lodging",
            ExpenseCategory::Maintenance => "maintenance",
            ExpenseCategory::Other => "other",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cost charged against a trip by its driver. Amounts are integer
/// cents; no floats touch money.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub driver_id: Uuid,
    pub category: ExpenseCategory,
    pub amount_cents: i64,
    pub description: Option<String>,
    pub status: ExpenseStatus,
    pub rejection_reason: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub responder_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    pub trip_id: Uuid,
    pub category: ExpenseCategory,
    pub amount_cents: i64,
    pub description: Option<String>,
}

impl Expense {
    pub fn new(params: NewExpense, driver_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            trip_id: params.trip_id,
            driver_id,
            category: params.category,
            amount_cents: params.amount_cents,
            description: params
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            status: ExpenseStatus::Pending,
            rejection_reason: None,
            responded_at: None,
            responder_id: None,
            created_at: Utc::now(),
        }
    }
}

/// Per-trip rollup used by the settlement view.
#[derive(Debug, Clone, Serialize, Default, FromRow)]
pub struct ExpenseTotals {
    pub total_cents: i64,
    pub approved_cents: i64,
    pub pending_cents: i64,
    pub rejected_cents: i64,
    pub count: i64,
}
