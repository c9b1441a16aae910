//! Defines the endpoint for overwriting an existing expense.
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
    database_id::ExpenseId,
    expense::{core::update_expense, create_endpoint::ExpensePayload},
    query::run_bounded,
};

/// The state needed to edit an expense.
#[derive(Debug, Clone)]
pub struct EditExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The per-query timeout for store queries.
    pub query_timeout: Duration,
}

impl FromRef<AppState> for EditExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_timeout: state.query_timeout,
        }
    }
}

/// A route handler for overwriting every field of an expense.
///
/// Responds with the updated expense.
pub async fn edit_expense_endpoint(
    State(state): State<EditExpenseState>,
    owner: OwnerId,
    Path(expense_id): Path<ExpenseId>,
    Json(payload): Json<ExpensePayload>,
) -> Result<impl IntoResponse, Error> {
    let expense = run_bounded(
        state.db_connection,
        state.query_timeout,
        move |connection| update_expense(expense_id, &owner, payload.into_builder(), connection),
    )
    .await?;

    Ok(Json(expense))
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use axum::{
        Json,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use time::macros::datetime;

    use super::{EditExpenseState, edit_expense_endpoint};
    use crate::{
        auth::OwnerId,
        db::initialize,
        expense::{
            Category, Expense, PaymentMethod,
            core::{create_expense, get_expense},
            create_endpoint::ExpensePayload,
        },
    };

    fn get_test_state() -> EditExpenseState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        EditExpenseState {
            db_connection: Arc::new(Mutex::new(conn)),
            query_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn edit_overwrites_expense() {
        let state = get_test_state();
        let expense = {
            let conn = state.db_connection.lock().unwrap();
            create_expense(
                &OwnerId::new("alice"),
                Expense::build("Lunch", 12.5, Category::Food, datetime!(2024-03-05 12:30:00 UTC)),
                &conn,
            )
            .unwrap()
        };

        let response = edit_expense_endpoint(
            State(state.clone()),
            OwnerId::new("alice"),
            Path(expense.id),
            Json(ExpensePayload {
                title: "Taxi".to_owned(),
                amount: 8.0,
                category: Category::Transport,
                date: datetime!(2024-03-06 09:00:00 UTC),
                note: None,
                tags: vec![],
                payment_method: PaymentMethod::Cash,
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let conn = state.db_connection.lock().unwrap();
        let updated = get_expense(expense.id, &OwnerId::new("alice"), &conn).unwrap();
        assert_eq!(updated.title, "Taxi");
        assert_eq!(updated.category, Category::Transport);
    }

    #[tokio::test]
    async fn edit_unknown_expense_is_not_found() {
        let state = get_test_state();

        let response = edit_expense_endpoint(
            State(state),
            OwnerId::new("alice"),
            Path(1337),
            Json(ExpensePayload {
                title: "Taxi".to_owned(),
                amount: 8.0,
                category: Category::Transport,
                date: datetime!(2024-03-06 09:00:00 UTC),
                note: None,
                tags: vec![],
                payment_method: PaymentMethod::Cash,
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
