//! The API endpoint URIs.

/// The route for the monthly dashboard aggregates.
pub const DASHBOARD: &str = "/api/dashboard";
/// The route for the analytics aggregates, including raw expense records.
pub const ANALYTICS: &str = "/api/analytics";
/// The route for monthly insights and recommendations.
pub const INSIGHTS: &str = "/api/insights";
/// The route to list and create expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route to update or delete a single expense.
pub const EXPENSE: &str = "/api/expenses/{expense_id}";
/// The route to list and create budgets.
pub const BUDGETS: &str = "/api/budgets";
/// The route to delete a single budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";
/// The route to list and create savings goals.
pub const SAVINGS_GOALS: &str = "/api/savings-goals";
/// The route to update or delete a single savings goal.
pub const SAVINGS_GOAL: &str = "/api/savings-goals/{goal_id}";
/// The route to purge all records belonging to the requesting owner.
pub const PROFILE: &str = "/api/profile";
