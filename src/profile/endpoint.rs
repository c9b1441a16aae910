//! Defines the endpoint that deletes all of an owner's records.
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{AppState, Error, auth::OwnerId, query::run_bounded};

/// The state needed to purge an owner's records.
#[derive(Debug, Clone)]
pub struct DeleteProfileState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The per-query timeout for store queries.
    pub query_timeout: Duration,
}

impl FromRef<AppState> for DeleteProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            query_timeout: state.query_timeout,
        }
    }
}

/// Delete every expense, budget and savings goal belonging to an owner,
/// atomically.
///
/// # Errors
/// This function will return an [Error::StoreUnavailable] if there is an
/// SQL error. Nothing is deleted unless everything is.
pub fn delete_owner_data(owner: &OwnerId, connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    for table in ["expense", "budget", "savings_goal"] {
        transaction.execute(
            &format!("DELETE FROM {table} WHERE owner_id = ?1"),
            [owner.as_str()],
        )?;
    }

    transaction.commit()?;

    Ok(())
}

/// A route handler that purges all records belonging to the requesting
/// owner.
///
/// Responds with no content on success. Deleting an owner with no
/// records is not an error.
pub async fn delete_profile_endpoint(
    State(state): State<DeleteProfileState>,
    owner: OwnerId,
) -> Result<impl IntoResponse, Error> {
    run_bounded(
        state.db_connection,
        state.query_timeout,
        move |connection| delete_owner_data(&owner, connection),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
