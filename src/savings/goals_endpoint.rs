//! Defines the endpoint for listing savings goals with progress figures.
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json,
    extract::{FromRef, State},
    response::IntoResponse,
};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error, auth::OwnerId, query::run_bounded, savings::core::goals_with_progress,
};

/// The state needed to list savings goals.
#[derive(Debug, Clone)]
pub struct GoalsState {
    /// The database connection for managing savings goals.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The per-query timeout for store queries.
    pub query_timeout: Duration,
}

impl FromRef<AppState> for GoalsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_timeout: state.query_timeout,
        }
    }
}

/// A route handler for listing an owner's savings goals, active goals
/// first, each joined with its progress figures.
pub async fn goals_endpoint(
    State(state): State<GoalsState>,
    owner: OwnerId,
) -> Result<impl IntoResponse, Error> {
    let today = OffsetDateTime::now_utc().date();

    let goals = run_bounded(
        state.db_connection,
        state.query_timeout,
        move |connection| goals_with_progress(&owner, today, connection),
    )
    .await?;

    Ok(Json(goals))
}
