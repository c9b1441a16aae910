//! Defines the routes for the REST server and maps them to handlers.

use axum::{
    Router,
    routing::{delete, get, patch, put},
};

use crate::{
    AppState,
    analytics::analytics_endpoint,
    budget::{budgets_endpoint, create_budget_endpoint, delete_budget_endpoint},
    dashboard::dashboard_endpoint,
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, edit_expense_endpoint,
        list_expenses_endpoint,
    },
    insights::insights_endpoint,
    profile::delete_profile_endpoint,
    savings::{create_goal_endpoint, delete_goal_endpoint, goals_endpoint, update_goal_endpoint},
};

/// Return the router for the REST server.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::DASHBOARD, get(dashboard_endpoint))
        .route(endpoints::ANALYTICS, get(analytics_endpoint))
        .route(endpoints::INSIGHTS, get(insights_endpoint))
        .route(
            endpoints::EXPENSES,
            get(list_expenses_endpoint).post(create_expense_endpoint),
        )
        .route(
            endpoints::EXPENSE,
            put(edit_expense_endpoint).delete(delete_expense_endpoint),
        )
        .route(
            endpoints::BUDGETS,
            get(budgets_endpoint).post(create_budget_endpoint),
        )
        .route(endpoints::BUDGET, delete(delete_budget_endpoint))
        .route(
            endpoints::SAVINGS_GOALS,
            get(goals_endpoint).post(create_goal_endpoint),
        )
        .route(
            endpoints::SAVINGS_GOAL,
            patch(update_goal_endpoint).delete(delete_goal_endpoint),
        )
        .route(endpoints::PROFILE, delete(delete_profile_endpoint))
        .with_state(state)
}
