//! Defines the endpoint serving the monthly insights report.
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

use crate::{AppState, Error, auth::OwnerId, insights::core::generate_insights, query::run_bounded};

/// The state needed to generate insights.
#[derive(Debug, Clone)]
pub struct InsightsState {
    /// The database connection for reading expenses and budgets.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The per-query timeout for store queries.
    pub query_timeout: Duration,
}

impl FromRef<AppState> for InsightsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_timeout: state.query_timeout,
        }
    }
}

/// A route handler serving the monthly insights report for the
/// requesting owner.
pub async fn insights_endpoint(
    State(state): State<InsightsState>,
    owner: OwnerId,
) -> Result<impl IntoResponse, Error> {
    let now = OffsetDateTime::now_utc();

    let insights = run_bounded(
        state.db_connection,
        state.query_timeout,
        move |connection| generate_insights(&owner, now, connection),
    )
    .await?;

    Ok(Json(insights))
}
