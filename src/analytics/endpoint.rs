//! Defines the endpoint serving the analytics aggregates, including the
//! raw expense records clients use for their own charting.
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
        category_totals, local_day_total, total_for_day, total_for_period,
    },
    auth::OwnerId,
    expense::{Category, Expense, core::get_expenses_in_range},
    period::widened_month_bounds,
    query::run_bounded,
    timezone::get_local_offset,
};

/// The state needed to build the analytics view.
#[derive(Debug, Clone)]
pub struct AnalyticsState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The per-query timeout for store queries.
    pub query_timeout: Duration,
}

impl FromRef<AppState> for AnalyticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_timeout: state.query_timeout,
        }
    }
}

/// The viewer's timezone, if the client declared one.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsParams {
    /// A canonical timezone name such as `Asia/Kolkata`.
    pub tz: Option<String>,
}

/// One slice of the per-category spending breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySlice {
    /// The spending category.
    pub name: Category,
    /// The amount spent in the category this month.
    pub value: f64,
}

/// The analytics aggregates for the month.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsData {
    /// Total spent this month.
    pub total_spent: f64,
    /// Total spent today.
    pub today_spent: f64,
    /// The category with the most spending this month, if any.
    pub highest_category: Option<CategoryTotal>,
    /// The per-day spending series for the month.
    pub daily_trend: Vec<DailyTotal>,
    /// Spending per category, largest first.
    pub category_breakdown: Vec<CategorySlice>,
    /// The raw, ungrouped expense records of the period, oldest first.
    pub raw_expenses: Vec<Expense>,
}

/// A route handler serving the analytics aggregates.
///
/// Uses the same widened month bounds and timezone handling as the
/// dashboard, and additionally returns the raw records so clients can
/// re-bucket them under whatever calendar they need.
pub async fn analytics_endpoint(
    State(state): State<AnalyticsState>,
    owner: OwnerId,
    Query(params): Query<AnalyticsParams>,
) -> Result<impl IntoResponse, Error> {
    let offset = params
        .tz
        .map(|name| get_local_offset(&name).ok_or(Error::InvalidTimezone(name)))
        .transpose()?;

    let now = OffsetDateTime::now_utc();
    let bounds = widened_month_bounds(now.year(), now.month());
    let today = now.date();

    let (total_spent, today_spent, totals, raw_expenses) = tokio::try_join!(
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
            move |connection| category_totals(&owner, &bounds, connection)
        }),
        run_bounded(state.db_connection.clone(), state.query_timeout, {
            let owner = owner.clone();
            move |connection| get_expenses_in_range(&owner, &bounds, connection)
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

    Ok(Json(AnalyticsData {
        total_spent,
        today_spent,
        highest_category: totals.first().cloned(),
        daily_trend,
        category_breakdown: totals
            .into_iter()
            .map(|entry| CategorySlice {
                name: entry.category,
                value: entry.total,
            })
            .collect(),
        raw_expenses,
    }))
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use axum::{
        body::to_bytes,
        extract::{Query, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use serde_json::Value;
    use time::OffsetDateTime;

    use super::{AnalyticsParams, AnalyticsState, analytics_endpoint};
    use crate::{
        auth::OwnerId,
        db::initialize,
        expense::{Category, Expense, core::create_expense},
    };

    fn get_test_state() -> AnalyticsState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        AnalyticsState {
            db_connection: Arc::new(Mutex::new(conn)),
            query_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn analytics_include_breakdown_and_raw_records() {
        let state = get_test_state();
        let now = OffsetDateTime::now_utc();
        {
            let conn = state.db_connection.lock().unwrap();
            for (title, amount, category) in [
                ("Groceries", 100.0, Category::Food),
                ("Dinner", 50.0, Category::Food),
                ("Bus", 30.0, Category::Transport),
            ] {
                create_expense(
                    &OwnerId::new("alice"),
                    Expense::build(title, amount, category, now),
                    &conn,
                )
                .unwrap();
            }
        }

        let response = analytics_endpoint(
            State(state),
            OwnerId::new("alice"),
            Query(AnalyticsParams { tz: None }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["totalSpent"], 180.0);
        assert_eq!(json["highestCategory"]["category"], "Food");
        assert_eq!(json["categoryBreakdown"][0]["name"], "Food");
        assert_eq!(json["categoryBreakdown"][0]["value"], 150.0);
        assert_eq!(json["categoryBreakdown"][1]["name"], "Transport");
        assert_eq!(json["rawExpenses"].as_array().unwrap().len(), 3);
    }
}
