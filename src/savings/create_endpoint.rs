//! Defines the endpoint for creating a new savings goal.
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
    query::run_bounded,
    savings::core::{GoalPayload, create_savings_goal},
};

/// The state needed to create a savings goal.
#[derive(Debug, Clone)]
pub struct CreateGoalState {
    /// The database connection for managing savings goals.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The per-query timeout for store queries.
    pub query_timeout: Duration,
}

impl FromRef<AppState> for CreateGoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_timeout: state.query_timeout,
        }
    }
}

/// A route handler for creating a new savings goal.
///
/// Responds with the stored goal, including its assigned ID.
pub async fn create_goal_endpoint(
    State(state): State<CreateGoalState>,
    owner: OwnerId,
    Json(payload): Json<GoalPayload>,
) -> Result<impl IntoResponse, Error> {
    let goal = run_bounded(
        state.db_connection,
        state.query_timeout,
        move |connection| create_savings_goal(&owner, payload, connection),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(goal)))
}
