//! Defines the endpoint for listing an owner's expenses, one page at a time.
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
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::OwnerId,
    expense::{
        Expense,
        core::{count_expenses, get_expenses_page},
    },
    query::run_bounded,
};

/// The default number of expenses per page.
const DEFAULT_PAGE_SIZE: u32 = 20;
/// The largest page size a client may request.
const MAX_PAGE_SIZE: u32 = 100;

/// The state needed to list expenses.
#[derive(Debug, Clone)]
pub struct ListExpensesState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The per-query timeout for store queries.
    pub query_timeout: Duration,
}

impl FromRef<AppState> for ListExpensesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_timeout: state.query_timeout,
        }
    }
}

/// The pagination query parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ListExpensesParams {
    /// The 1-based page number. Defaults to the first page.
    pub page: Option<u32>,
    /// How many expenses to return per page.
    pub limit: Option<u32>,
}

/// One page of an owner's expenses, newest first.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensePage {
    /// The expenses on this page.
    pub expenses: Vec<Expense>,
    /// How many expenses the owner has in total.
    pub total: u32,
    /// The 1-based page number of this page.
    pub page: u32,
    /// How many pages there are in total.
    pub total_pages: u32,
}

/// A route handler for listing an owner's expenses.
pub async fn list_expenses_endpoint(
    State(state): State<ListExpensesState>,
    owner: OwnerId,
    Query(params): Query<ListExpensesParams>,
) -> Result<impl IntoResponse, Error> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let page_data = run_bounded(
        state.db_connection,
        state.query_timeout,
        move |connection| {
            let expenses = get_expenses_page(&owner, page, limit, connection)?;
            let total = count_expenses(&owner, connection)?;

            Ok(ExpensePage {
                expenses,
                total,
                page,
                total_pages: total.div_ceil(limit),
            })
        },
    )
    .await?;

    Ok(Json(page_data))
}
