pub mod models;
pub mod repository;
pub mod service;

pub use models::{Expense, ExpenseCategory, ExpenseStatus, ExpenseTotals, NewExpense};
pub use repository::{ExpenseFilter, ExpenseRepository};
pub use service::ExpenseService;
