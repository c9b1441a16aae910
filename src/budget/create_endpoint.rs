//! Defines the endpoint for creating a new budget.
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::OwnerId,
    budget::core::{NewBudget, create_budget},
    query::run_bounded,
};

/// The state needed to create a budget.
#[derive(Debug, Clone)]
pub struct CreateBudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The per-query timeout for store queries.
    pub query_timeout: Duration,
}

impl FromRef<AppState> for CreateBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_timeout: state.query_timeout,
        }
    }
}

/// A route handler for creating a new budget.
///
/// Responds with the stored budget. Creating a second budget for the same
/// category and month is rejected with a conflict.
pub async fn create_budget_endpoint(
    State(state): State<CreateBudgetState>,
    owner: OwnerId,
    Json(new_budget): Json<NewBudget>,
) -> Result<impl IntoResponse, Error> {
    let budget = run_bounded(
        state.db_connection,
        state.query_timeout,
        move |connection| create_budget(&owner, new_budget, connection),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(budget)))
}
