//! Defines the endpoint for deleting a budget.
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;

use crate::{
    AppState, Error, auth::OwnerId, budget::core::delete_budget, database_id::BudgetId,
    query::run_bounded,
};

/// The state needed to delete a budget.
#[derive(Debug, Clone)]
pub struct DeleteBudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The per-query timeout for store queries.
    pub query_timeout: Duration,
}

impl FromRef<AppState> for DeleteBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_timeout: state.query_timeout,
        }
    }
}

/// A route handler for deleting a budget.
///
/// Responds with no content on success.
pub async fn delete_budget_endpoint(
    State(state): State<DeleteBudgetState>,
    owner: OwnerId,
    Path(budget_id): Path<BudgetId>,
) -> Result<impl IntoResponse, Error> {
    run_bounded(
        state.db_connection,
        state.query_timeout,
        move |connection| delete_budget(budget_id, &owner, connection),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;

    use super::{DeleteBudgetState, delete_budget_endpoint};
    use crate::{
        auth::OwnerId,
        budget::core::{BudgetCategory, NewBudget, create_budget},
        db::initialize,
    };

    fn get_test_state() -> DeleteBudgetState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        DeleteBudgetState {
            db_connection: Arc::new(Mutex::new(conn)),
            query_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn delete_removes_budget() {
        let state = get_test_state();
        let budget = {
            let conn = state.db_connection.lock().unwrap();
            create_budget(
                &OwnerId::new("alice"),
                NewBudget {
                    category: BudgetCategory::Total,
                    amount: 1000.0,
                    month: Some(3),
                    year: Some(2024),
                    alert_threshold: None,
                },
                &conn,
            )
            .unwrap()
        };

        let response =
            delete_budget_endpoint(State(state.clone()), OwnerId::new("alice"), Path(budget.id))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn delete_unknown_budget_is_not_found() {
        let state = get_test_state();

        let response = delete_budget_endpoint(State(state), OwnerId::new("alice"), Path(1337))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
