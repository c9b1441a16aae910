//! Defines the endpoint for updating a savings goal.
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    response::IntoResponse,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::OwnerId,
    database_id::GoalId,
    query::run_bounded,
    savings::core::{GoalPayload, update_savings_goal},
};

/// The state needed to update a savings goal.
#[derive(Debug, Clone)]
pub struct UpdateGoalState {
    /// The database connection for managing savings goals.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The per-query timeout for store queries.
    pub query_timeout: Duration,
}

impl FromRef<AppState> for UpdateGoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_timeout: state.query_timeout,
        }
    }
}

/// A route handler for overwriting a savings goal, typically to record
/// saved progress.
///
/// Responds with the updated goal. Completion latches: reaching the
/// target marks the goal completed for good.
pub async fn update_goal_endpoint(
    State(state): State<UpdateGoalState>,
    owner: OwnerId,
    Path(goal_id): Path<GoalId>,
    Json(payload): Json<GoalPayload>,
) -> Result<impl IntoResponse, Error> {
    let goal = run_bounded(
        state.db_connection,
        state.query_timeout,
        move |connection| update_savings_goal(goal_id, &owner, payload, connection),
    )
    .await?;

    Ok(Json(goal))
}
