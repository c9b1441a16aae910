//! Recording and querying expenses, the primary domain records of the
//! application.

pub mod core;
pub mod create_endpoint;
pub mod delete_endpoint;
pub mod edit_endpoint;
pub mod list_endpoint;

pub use core::{Category, Expense, ExpenseBuilder, PaymentMethod, create_expense_table};
pub use create_endpoint::create_expense_endpoint;
pub use delete_endpoint::delete_expense_endpoint;
pub use edit_endpoint::edit_expense_endpoint;
pub use list_endpoint::list_expenses_endpoint;
