//! Defines the endpoint serving the monthly dashboard aggregates.
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
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    aggregation::{
        CategoryTotal, DailyBucketer, DailyTotal, RawRecordLocalBucketer, ServerGroupedBucketer,
        highest_category, local_day_total, total_for_day, total_for_period,
    },
    auth::OwnerId,
    expense::{
        Expense,
        core::{get_expenses_in_range, get_recent_expenses},
    },
    period::widened_month_bounds,
    query::run_bounded,
    timezone::get_local_offset,
};

/// How many recent expenses the dashboard shows.
const RECENT_EXPENSE_LIMIT: u32 = 5;

/// The state needed to build the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The per-query timeout for store queries.
    pub query_timeout: Duration,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_timeout: state.query_timeout,
        }
    }
}

/// The viewer's timezone, if the client declared one.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardParams {
    /// A canonical timezone name such as `Asia/Kolkata`.
    pub tz: Option<String>,
}

/// The monthly dashboard aggregates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    /// Total spent this month.
    pub total_spent: f64,
    /// Total spent today.
    pub today_spent: f64,
    /// The category with the most spending this month, if any.
    pub highest_category: Option<CategoryTotal>,
    /// The per-day spending series for the month.
    pub daily_trend: Vec<DailyTotal>,
    /// The most recently recorded expenses.
    pub recent_expenses: Vec<Expense>,
}

/// A route handler serving the monthly dashboard aggregates.
///
/// The month is fetched over bounds widened by one day on each side so
/// that expenses near the month boundary survive timezone shifts. When
/// the client declares its timezone via the `tz` query parameter, the
/// raw records are re-bucketed under the viewer's local calendar and
/// that series, with its sum and its notion of "today", becomes
/// authoritative for the response.
pub async fn dashboard_endpoint(
    State(state): State<DashboardState>,
    owner: OwnerId,
    Query(params): Query<DashboardParams>,
) -> Result<impl IntoResponse, Error> {
    let offset = params
        .tz
        .map(|name| get_local_offset(&name).ok_or(Error::InvalidTimezone(name)))
        .transpose()?;

    let now = OffsetDateTime::now_utc();
    let bounds = widened_month_bounds(now.year(), now.month());
    let today = now.date();

    let (total_spent, today_spent, highest, raw_expenses, recent_expenses) = tokio::try_join!(
        run_bounded(state.db_connection.clone(), state.query_timeout, {
            let owner = owner.clone();
            move |connection| total_for_period(&owner, &bounds, connection)
        }),
        run_bounded(state.db_connection.clone(), state.query_timeout, {
            let owner = owner.clone();
            move |connection| total_for_day(&owner, today, connection)
        }),
        run_bounded(state.db_connection.clone(), state.query_timeout, {
            let owner = owner.clone();
            move |connection| highest_category(&owner, &bounds, connection)
        }),
        run_bounded(state.db_connection.clone(), state.query_timeout, {
            let owner = owner.clone();
            move |connection| get_expenses_in_range(&owner, &bounds, connection)
        }),
        run_bounded(state.db_connection.clone(), state.query_timeout, {
            let owner = owner.clone();
            move |connection| get_recent_expenses(&owner, RECENT_EXPENSE_LIMIT, connection)
        }),
    )?;

    let (daily_trend, total_spent, today_spent) = match offset {
        Some(offset) => {
            let local_now = now.to_offset(offset);
            let bucketer = RawRecordLocalBucketer {
                offset,
                year: local_now.year(),
                month: local_now.month(),
            };
            let series = bucketer.bucket(&raw_expenses);
            let total = series.iter().map(|entry| entry.amount).sum();
            let local_today = local_day_total(&raw_expenses, offset, local_now.date());

            (series, total, local_today)
        }
        None => (ServerGroupedBucketer.bucket(&raw_expenses), total_spent, today_spent),
    };

    Ok(Json(DashboardData {
        total_spent,
        today_spent,
        highest_category: highest,
        daily_trend,
        recent_expenses,
    }))
}
