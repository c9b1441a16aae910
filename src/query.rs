//! Bounded execution of store queries from async handlers.
//!
//! Each aggregate query of a request is logically independent, so handlers
//! fan them out with `tokio::try_join!` over [run_bounded] calls. A query
//! that outlives the configured timeout aborts the whole request with
//! [Error::StoreUnavailable] instead of resolving to empty or zeroed
//! results.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use rusqlite::Connection;
use tokio::task;

use crate::Error;

/// Run a blocking store query with a timeout.
///
/// # Errors
/// Returns [Error::StoreUnavailable] if the query panics, is cancelled, or
/// does not complete within `timeout`; otherwise returns the query's own
/// result.
///
/// # Panics
/// The spawned task panics if the lock for the database connection is
/// already held by the same thread.
pub async fn run_bounded<T, F>(
    db_connection: Arc<Mutex<Connection>>,
    timeout: Duration,
    query: F,
) -> Result<T, Error>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, Error> + Send + 'static,
{
    let task = task::spawn_blocking(move || {
        let connection = db_connection.lock().unwrap();
        query(&connection)
    });

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(Error::StoreUnavailable(join_error.to_string())),
        Err(_) => Err(Error::StoreUnavailable(format!(
            "query did not complete within {timeout:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use rusqlite::Connection;

    use super::run_bounded;
    use crate::Error;

    fn get_test_connection() -> Arc<Mutex<Connection>> {
        Arc::new(Mutex::new(Connection::open_in_memory().unwrap()))
    }

    #[tokio::test]
    async fn returns_query_result() {
        let conn = get_test_connection();

        let result = run_bounded(conn, Duration::from_secs(1), |connection| {
            connection
                .query_row("SELECT 40 + 2", [], |row| row.get::<_, i64>(0))
                .map_err(Error::from)
        })
        .await;

        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn propagates_query_error() {
        let conn = get_test_connection();

        let result: Result<(), Error> =
            run_bounded(conn, Duration::from_secs(1), |_| Err(Error::NotFound)).await;

        assert_eq!(result, Err(Error::NotFound));
    }

    #[tokio::test]
    async fn slow_query_maps_to_store_unavailable() {
        let conn = get_test_connection();

        let result = run_bounded(conn, Duration::from_millis(10), |_| {
            std::thread::sleep(Duration::from_millis(200));
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(Error::StoreUnavailable(_))));
    }
}
