//! Defines the endpoint for deleting an expense.
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;

use crate::{
    AppState, Error, auth::OwnerId, database_id::ExpenseId, expense::core::delete_expense,
    query::run_bounded,
};

/// The state needed to delete an expense.
#[derive(Debug, Clone)]
pub struct DeleteExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The per-query timeout for store queries.
    pub query_timeout: Duration,
}

impl FromRef<AppState> for DeleteExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_timeout: state.query_timeout,
        }
    }
}

/// A route handler for deleting an expense.
///
/// Responds with no content on success.
pub async fn delete_expense_endpoint(
    State(state): State<DeleteExpenseState>,
    owner: OwnerId,
    Path(expense_id): Path<ExpenseId>,
) -> Result<impl IntoResponse, Error> {
    run_bounded(
        state.db_connection,
        state.query_timeout,
        move |connection| delete_expense(expense_id, &owner, connection),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
