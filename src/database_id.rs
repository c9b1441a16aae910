//! Type aliases for database row IDs.

/// The integer primary key type used by all tables.
pub type DatabaseId = i64;

/// The ID of an expense row.
pub type ExpenseId = DatabaseId;

/// The ID of a budget row.
pub type BudgetId = DatabaseId;

/// The ID of a savings goal row.
pub type GoalId = DatabaseId;
