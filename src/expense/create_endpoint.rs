//! Defines the endpoint for recording a new expense.
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
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::OwnerId,
    expense::{Category, Expense, ExpenseBuilder, PaymentMethod, core::create_expense},
    query::run_bounded,
};

/// The state needed to create an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The per-query timeout for store queries.
    pub query_timeout: Duration,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_timeout: state.query_timeout,
        }
    }
}

/// The request body for creating or overwriting an expense.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensePayload {
    /// A short description of what the money was spent on.
    pub title: String,
    /// The amount of money spent.
    pub amount: f64,
    /// The spending category.
    pub category: Category,
    /// When the expense happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// An optional free-form note.
    #[serde(default)]
    pub note: Option<String>,
    /// Optional labels for filtering.
    #[serde(default)]
    pub tags: Vec<String>,
    /// How the expense was paid.
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl ExpensePayload {
    /// Convert the payload into a builder ready for validation and storage.
    pub fn into_builder(self) -> ExpenseBuilder {
        Expense::build(&self.title, self.amount, self.category, self.date)
            .note(self.note)
            .tags(self.tags)
            .payment_method(self.payment_method)
    }
}

/// A route handler for recording a new expense.
///
/// Responds with the stored expense, including its assigned ID.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    owner: OwnerId,
    Json(payload): Json<ExpensePayload>,
) -> Result<impl IntoResponse, Error> {
    let expense = run_bounded(
        state.db_connection,
        state.query_timeout,
        move |connection| create_expense(&owner, payload.into_builder(), connection),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(expense)))
}
