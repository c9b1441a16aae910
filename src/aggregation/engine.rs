//! SQL aggregates over an owner's expenses within a period.
//!
//! Every function here is period-aware: callers pass the [PeriodBounds]
//! they resolved up front, and the same bounds are reused for every
//! aggregate of a request so the numbers agree with each other.

use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    auth::OwnerId,
    expense::Category,
    period::{PeriodBounds, day_bounds},
};

/// The amount spent in one category over a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    /// The spending category.
    pub category: Category,
    /// The sum of expense amounts in the category.
    pub total: f64,
}

/// The amount spent and the number of expenses in one category over a
/// period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpend {
    /// The spending category.
    pub category: Category,
    /// The sum of expense amounts in the category.
    pub total: f64,
    /// How many expenses fell in the category.
    pub count: u32,
}

/// Sum the expense amounts of an owner within a period.
///
/// Returns zero when the owner has no expenses in the period.
///
/// # Errors
/// This function will return an [Error::StoreUnavailable] if there is an
/// SQL error.
pub fn total_for_period(
    owner: &OwnerId,
    bounds: &PeriodBounds,
    connection: &Connection,
) -> Result<f64, Error> {
    let (start, end) = bounds.unix_range();

    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM expense
             WHERE owner_id = ?1 AND date BETWEEN ?2 AND ?3",
            (owner.as_str(), start, end),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Sum the expense amounts of an owner on a single UTC calendar day.
///
/// # Errors
/// This function will return an [Error::StoreUnavailable] if there is an
/// SQL error.
pub fn total_for_day(owner: &OwnerId, day: Date, connection: &Connection) -> Result<f64, Error> {
    total_for_period(owner, &day_bounds(day), connection)
}

/// Count the expenses of an owner within a period.
///
/// # Errors
/// This function will return an [Error::StoreUnavailable] if there is an
/// SQL error.
pub fn count_for_period(
    owner: &OwnerId,
    bounds: &PeriodBounds,
    connection: &Connection,
) -> Result<u32, Error> {
    let (start, end) = bounds.unix_range();

    connection
        .query_row(
            "SELECT COUNT(id) FROM expense
             WHERE owner_id = ?1 AND date BETWEEN ?2 AND ?3",
            (owner.as_str(), start, end),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Sum the expense amounts of an owner in each category within a period.
///
/// Categories with no expenses are omitted. Results are sorted by total
/// descending, with ties broken by category name ascending so the order
/// is deterministic.
///
/// # Errors
/// This function will return an [Error::StoreUnavailable] if there is an
/// SQL error.
pub fn category_totals(
    owner: &OwnerId,
    bounds: &PeriodBounds,
    connection: &Connection,
) -> Result<Vec<CategoryTotal>, Error> {
    let (start, end) = bounds.unix_range();

    connection
        .prepare(
            "SELECT category, SUM(amount) AS total FROM expense
             WHERE owner_id = ?1 AND date BETWEEN ?2 AND ?3
             GROUP BY category
             ORDER BY total DESC, category ASC",
        )?
        .query_map((owner.as_str(), start, end), |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                total: row.get(1)?,
            })
        })?
        .map(|row_result| row_result.map_err(Error::from))
        .collect()
}

/// The top spending categories of an owner within a period, with expense
/// counts.
///
/// Sorted like [category_totals], truncated to `limit` entries.
///
/// # Errors
/// This function will return an [Error::StoreUnavailable] if there is an
/// SQL error.
pub fn top_categories(
    owner: &OwnerId,
    bounds: &PeriodBounds,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<CategorySpend>, Error> {
    let (start, end) = bounds.unix_range();

    connection
        .prepare(
            "SELECT category, SUM(amount) AS total, COUNT(id) FROM expense
             WHERE owner_id = ?1 AND date BETWEEN ?2 AND ?3
             GROUP BY category
             ORDER BY total DESC, category ASC
             LIMIT ?4",
        )?
        .query_map((owner.as_str(), start, end, limit), |row| {
            Ok(CategorySpend {
                category: row.get(0)?,
                total: row.get(1)?,
                count: row.get(2)?,
            })
        })?
        .map(|row_result| row_result.map_err(Error::from))
        .collect()
}

/// The single category an owner spent the most on within a period.
///
/// Ties are broken by category name ascending. Returns `None` when the
/// owner has no expenses in the period.
///
/// # Errors
/// This function will return an [Error::StoreUnavailable] if there is an
/// SQL error.
pub fn highest_category(
    owner: &OwnerId,
    bounds: &PeriodBounds,
    connection: &Connection,
) -> Result<Option<CategoryTotal>, Error> {
    Ok(top_categories(owner, bounds, 1, connection)?
        .into_iter()
        .next()
        .map(|spend| CategoryTotal {
            category: spend.category,
            total: spend.total,
        }))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Month, macros::datetime};

    use super::{
        CategoryTotal, category_totals, count_for_period, highest_category, top_categories,
        total_for_day, total_for_period,
    };
    use crate::{
        auth::OwnerId,
        db::initialize,
        expense::{Category, Expense, core::create_expense},
        period::month_bounds,
    };

    fn owner() -> OwnerId {
        OwnerId::new("alice")
    }

    /// Two food expenses and one transport expense in March 2024.
    fn get_seeded_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let expenses = [
            ("Groceries", 100.0, Category::Food, datetime!(2024-03-02 10:00:00 UTC)),
            ("Dinner", 50.0, Category::Food, datetime!(2024-03-10 19:00:00 UTC)),
            ("Bus pass", 30.0, Category::Transport, datetime!(2024-03-15 08:00:00 UTC)),
            // Outside the period, must never be counted.
            ("Old rent", 900.0, Category::Housing, datetime!(2024-02-01 09:00:00 UTC)),
        ];
        for (title, amount, category, date) in expenses {
            create_expense(&owner(), Expense::build(title, amount, category, date), &conn)
                .unwrap();
        }

        conn
    }

    #[test]
    fn total_and_count_cover_only_the_period() {
        let conn = get_seeded_connection();
        let bounds = month_bounds(2024, Month::March);

        assert_eq!(total_for_period(&owner(), &bounds, &conn), Ok(180.0));
        assert_eq!(count_for_period(&owner(), &bounds, &conn), Ok(3));
    }

    #[test]
    fn day_total_covers_only_that_day() {
        let conn = get_seeded_connection();

        let day_total = total_for_day(&owner(), time::macros::date!(2024-03-02), &conn);
        let empty_day = total_for_day(&owner(), time::macros::date!(2024-03-03), &conn);

        assert_eq!(day_total, Ok(100.0));
        assert_eq!(empty_day, Ok(0.0));
    }

    #[test]
    fn empty_period_totals_to_zero() {
        let conn = get_seeded_connection();
        let bounds = month_bounds(2024, Month::July);

        assert_eq!(total_for_period(&owner(), &bounds, &conn), Ok(0.0));
        assert_eq!(count_for_period(&owner(), &bounds, &conn), Ok(0));
        assert_eq!(highest_category(&owner(), &bounds, &conn), Ok(None));
    }

    #[test]
    fn category_totals_sort_by_total_descending() {
        let conn = get_seeded_connection();
        let bounds = month_bounds(2024, Month::March);

        let totals = category_totals(&owner(), &bounds, &conn).unwrap();

        assert_eq!(
            totals,
            vec![
                CategoryTotal { category: Category::Food, total: 150.0 },
                CategoryTotal { category: Category::Transport, total: 30.0 },
            ]
        );
    }

    #[test]
    fn equal_totals_break_ties_by_category_name() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        for category in [Category::Shopping, Category::Entertainment] {
            create_expense(
                &owner(),
                Expense::build("tied", 25.0, category, datetime!(2024-03-02 10:00:00 UTC)),
                &conn,
            )
            .unwrap();
        }

        let highest = highest_category(&owner(), &month_bounds(2024, Month::March), &conn)
            .unwrap()
            .unwrap();

        assert_eq!(highest.category, Category::Entertainment);
    }

    #[test]
    fn top_categories_respects_limit_and_counts() {
        let conn = get_seeded_connection();
        let bounds = month_bounds(2024, Month::March);

        let top = top_categories(&owner(), &bounds, 1, &conn).unwrap();

        assert_eq!(top.len(), 1);
        assert_eq!(top[0].category, Category::Food);
        assert_eq!(top[0].total, 150.0);
        assert_eq!(top[0].count, 2);
    }

}
