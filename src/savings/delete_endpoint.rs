//! Defines the endpoint for deleting a savings goal.
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
    AppState, Error, auth::OwnerId, database_id::GoalId, query::run_bounded,
    savings::core::delete_savings_goal,
};

/// The state needed to delete a savings goal.
#[derive(Debug, Clone)]
pub struct DeleteGoalState {
    /// The database connection for managing savings goals.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The per-query timeout for store queries.
    pub query_timeout: Duration,
}

impl FromRef<AppState> for DeleteGoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_timeout: state.query_timeout,
        }
    }
}

/// A route handler for deleting a savings goal.
///
/// Responds with no content on success.
pub async fn delete_goal_endpoint(
    State(state): State<DeleteGoalState>,
    owner: OwnerId,
    Path(goal_id): Path<GoalId>,
) -> Result<impl IntoResponse, Error> {
    run_bounded(
        state.db_connection,
        state.query_timeout,
        move |connection| delete_savings_goal(goal_id, &owner, connection),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
