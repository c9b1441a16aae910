//! Monthly budgets: per-category and overall spending caps, joined with
//! actual spending.

pub mod budgets_endpoint;
pub mod core;
pub mod create_endpoint;
pub mod delete_endpoint;

pub use budgets_endpoint::budgets_endpoint;
pub use core::{BudgetCategory, budgets_with_spending, create_budget_table};
pub use create_endpoint::create_budget_endpoint;
pub use delete_endpoint::delete_budget_endpoint;
