//! Defines the endpoint for listing budgets joined with actual spending.
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error, auth::OwnerId, budget::core::budgets_with_spending, query::run_bounded,
};

/// The state needed to list budgets.
#[derive(Debug, Clone)]
pub struct BudgetsState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The per-query timeout for store queries.
    pub query_timeout: Duration,
}

impl FromRef<AppState> for BudgetsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_timeout: state.query_timeout,
        }
    }
}

/// Which month to report budgets for. Defaults to the current UTC month.
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetsParams {
    /// The calendar month, 1 through 12.
    pub month: Option<u8>,
    /// The calendar year.
    pub year: Option<i32>,
}

/// A route handler for listing an owner's budgets for a month, each
/// joined with the month's actual spending.
pub async fn budgets_endpoint(
    State(state): State<BudgetsState>,
    owner: OwnerId,
    Query(params): Query<BudgetsParams>,
) -> Result<impl IntoResponse, Error> {
    let now = OffsetDateTime::now_utc();
    let month = params.month.unwrap_or(u8::from(now.month()));
    let year = params.year.unwrap_or(now.year());

    let tracked = run_bounded(
        state.db_connection,
        state.query_timeout,
        move |connection| budgets_with_spending(&owner, month, year, connection),
    )
    .await?;

    Ok(Json(tracked))
}
