//! Defines the core data models and database queries for monthly budgets.

use std::{fmt, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{
    Error,
    aggregation::category_totals,
    auth::OwnerId,
    database_id::BudgetId,
    expense::Category,
    money::{round1, round2},
    period::{month_bounds, month_from_number, year_from_number},
};

/// The default alert threshold, in percent, applied when a budget does
/// not specify one.
pub const DEFAULT_ALERT_THRESHOLD: f64 = 80.0;

/// What a budget covers: one spending category, or all spending combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BudgetCategory {
    /// A cap on one spending category.
    Category(Category),
    /// A cap on the owner's overall monthly spending.
    Total,
}

impl BudgetCategory {
    /// The budget category name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetCategory::Category(category) => category.as_str(),
            BudgetCategory::Total => "Total",
        }
    }
}

impl fmt::Display for BudgetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "Total" {
            return Ok(BudgetCategory::Total);
        }

        s.parse().map(BudgetCategory::Category)
    }
}

// Budget categories appear in JSON as plain names, with "Total" standing
// for the overall cap.
impl Serialize for BudgetCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BudgetCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

impl ToSql for BudgetCategory {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for BudgetCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A monthly spending cap for one category, or for all spending combined.
///
/// An owner may hold at most one budget per category and month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// What the budget covers.
    pub category: BudgetCategory,
    /// The spending cap for the month.
    pub amount: f64,
    /// The calendar month the budget applies to, 1 through 12.
    pub month: u8,
    /// The calendar year the budget applies to.
    pub year: i32,
    /// The utilisation percentage at which the budget starts alerting.
    pub alert_threshold: f64,
}

/// The fields needed to create a budget.
///
/// Month and year default to the current UTC month when omitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudget {
    /// What the budget covers.
    pub category: BudgetCategory,
    /// The spending cap for the month.
    pub amount: f64,
    /// The calendar month the budget applies to, 1 through 12.
    #[serde(default)]
    pub month: Option<u8>,
    /// The calendar year the budget applies to.
    #[serde(default)]
    pub year: Option<i32>,
    /// The utilisation percentage at which the budget starts alerting.
    #[serde(default)]
    pub alert_threshold: Option<f64>,
}

impl NewBudget {
    fn validate(&self) -> Result<(), Error> {
        if !self.amount.is_finite() {
            return Err(Error::InvalidAmount(self.amount));
        }

        if self.amount < 0.0 {
            return Err(Error::NegativeAmount(self.amount));
        }

        // Reject nonsense months and years before they reach the unique
        // index.
        if let Some(month) = self.month {
            month_from_number(month)?;
        }

        if let Some(year) = self.year {
            year_from_number(year)?;
        }

        if let Some(threshold) = self.alert_threshold
            && !(0.0..=100.0).contains(&threshold)
        {
            return Err(Error::InvalidThreshold(threshold));
        }

        Ok(())
    }
}

/// A budget joined with the owner's actual spending for its month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetWithSpending {
    /// The budget itself.
    #[serde(flatten)]
    pub budget: Budget,
    /// How much was spent against the budget this month.
    pub spent: f64,
    /// How much of the cap is left. Negative when overspent.
    pub remaining: f64,
    /// Utilisation of the cap in percent, rounded to one decimal place.
    pub percentage: f64,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const BUDGET_COLUMNS: &str = "id, category, amount, month, year, alert_threshold";

/// Create a new budget for an owner.
///
/// # Errors
/// This function will return a validation error if the fields are out of
/// bounds, an [Error::DuplicateBudget] if the owner already has a budget
/// for the same category and month, or an [Error::StoreUnavailable] if
/// there is some other SQL error.
pub fn create_budget(
    owner: &OwnerId,
    new_budget: NewBudget,
    connection: &Connection,
) -> Result<Budget, Error> {
    new_budget.validate()?;

    let now = time::OffsetDateTime::now_utc();
    let month = new_budget.month.unwrap_or(u8::from(now.month()));
    let year = new_budget.year.unwrap_or(now.year());
    let alert_threshold = new_budget.alert_threshold.unwrap_or(DEFAULT_ALERT_THRESHOLD);

    let budget = connection
        .prepare(&format!(
            "INSERT INTO budget (owner_id, category, amount, month, year, alert_threshold)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            (
                owner.as_str(),
                new_budget.category,
                new_budget.amount,
                month,
                year,
                alert_threshold,
            ),
            map_budget_row,
        )?;

    Ok(budget)
}

/// Retrieve an owner's budgets for a month, sorted by category name.
///
/// # Errors
/// This function will return an [Error::StoreUnavailable] if there is an
/// SQL error.
pub fn get_budgets(
    owner: &OwnerId,
    month: u8,
    year: i32,
    connection: &Connection,
) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget
             WHERE owner_id = ?1 AND month = ?2 AND year = ?3
             ORDER BY category ASC"
        ))?
        .query_map((owner.as_str(), month, year), map_budget_row)?
        .map(|budget_result| budget_result.map_err(Error::from))
        .collect()
}

/// Delete a budget owned by `owner`.
///
/// # Errors
/// This function will return an [Error::NotFound] if `id` does not refer
/// to a budget owned by `owner`, or an [Error::StoreUnavailable] if there
/// is some other SQL error.
pub fn delete_budget(id: BudgetId, owner: &OwnerId, connection: &Connection) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND owner_id = ?2",
        (id, owner.as_str()),
    )?;

    if rows_deleted == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Join an owner's budgets for a month with the month's actual spending.
///
/// Category budgets track the spending of their category; a `Total`
/// budget tracks the month's overall spending. A category with no
/// expenses counts as zero spent. Percentages are rounded to one decimal
/// place, amounts to two; a zero-amount budget reports zero percent
/// rather than dividing by zero.
///
/// # Errors
/// This function will return an [Error::InvalidMonth] if `month` is not a
/// calendar month, an [Error::InvalidYear] if `year` cannot form a date,
/// or an [Error::StoreUnavailable] if there is an SQL error.
pub fn budgets_with_spending(
    owner: &OwnerId,
    month: u8,
    year: i32,
    connection: &Connection,
) -> Result<Vec<BudgetWithSpending>, Error> {
    let bounds = month_bounds(year_from_number(year)?, month_from_number(month)?);

    let budgets = get_budgets(owner, month, year, connection)?;
    let totals = category_totals(owner, &bounds, connection)?;
    let grand_total: f64 = totals.iter().map(|entry| entry.total).sum();

    let tracked = budgets
        .into_iter()
        .map(|budget| {
            let spent = match budget.category {
                BudgetCategory::Total => grand_total,
                BudgetCategory::Category(category) => totals
                    .iter()
                    .find(|entry| entry.category == category)
                    .map(|entry| entry.total)
                    .unwrap_or(0.0),
            };

            let percentage = if budget.amount > 0.0 {
                round1(spent / budget.amount * 100.0)
            } else {
                0.0
            };

            BudgetWithSpending {
                spent: round2(spent),
                remaining: round2(budget.amount - spent),
                percentage,
                budget,
            }
        })
        .collect();

    Ok(tracked)
}

/// Create the budget table in the database.
///
/// The unique index enforces one budget per owner, category and month.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL
/// error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id TEXT NOT NULL,
                category TEXT NOT NULL,
                amount REAL NOT NULL,
                month INTEGER NOT NULL,
                year INTEGER NOT NULL,
                alert_threshold REAL NOT NULL DEFAULT 80.0,
                UNIQUE(owner_id, category, month, year)
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Budget].
pub fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        category: row.get(1)?,
        amount: row.get(2)?,
        month: row.get(3)?,
        year: row.get(4)?,
        alert_threshold: row.get(5)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use super::{
        BudgetCategory, DEFAULT_ALERT_THRESHOLD, NewBudget, budgets_with_spending, create_budget,
        delete_budget, get_budgets,
    };
    use crate::{
        Error,
        auth::OwnerId,
        db::initialize,
        expense::{Category, Expense, core::create_expense},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn owner() -> OwnerId {
        OwnerId::new("alice")
    }

    fn new_budget(category: BudgetCategory, amount: f64) -> NewBudget {
        NewBudget {
            category,
            amount,
            month: Some(3),
            year: Some(2024),
            alert_threshold: None,
        }
    }

    #[test]
    fn create_applies_default_threshold() {
        let conn = get_test_connection();

        let budget = create_budget(
            &owner(),
            new_budget(BudgetCategory::Category(Category::Food), 500.0),
            &conn,
        )
        .expect("could not create budget");

        assert!(budget.id > 0);
        assert_eq!(budget.alert_threshold, DEFAULT_ALERT_THRESHOLD);
    }

    #[test]
    fn create_defaults_to_the_current_month() {
        let conn = get_test_connection();
        let now = time::OffsetDateTime::now_utc();

        let budget = create_budget(
            &owner(),
            NewBudget {
                category: BudgetCategory::Total,
                amount: 1000.0,
                month: None,
                year: None,
                alert_threshold: None,
            },
            &conn,
        )
        .unwrap();

        assert_eq!(budget.month, u8::from(now.month()));
        assert_eq!(budget.year, now.year());
    }

    #[test]
    fn duplicate_budget_is_rejected() {
        let conn = get_test_connection();
        let budget = new_budget(BudgetCategory::Category(Category::Food), 500.0);

        create_budget(&owner(), budget.clone(), &conn).unwrap();
        let result = create_budget(&owner(), budget.clone(), &conn);

        assert_eq!(result, Err(Error::DuplicateBudget));

        // A different owner can budget the same category and month.
        create_budget(&OwnerId::new("bob"), budget, &conn)
            .expect("other owners should not collide");
    }

    #[test]
    fn create_rejects_invalid_month_and_threshold() {
        let conn = get_test_connection();

        let bad_month = NewBudget {
            month: Some(13),
            ..new_budget(BudgetCategory::Total, 100.0)
        };
        assert_eq!(create_budget(&owner(), bad_month, &conn), Err(Error::InvalidMonth(13)));

        let bad_threshold = NewBudget {
            alert_threshold: Some(120.0),
            ..new_budget(BudgetCategory::Total, 100.0)
        };
        assert_eq!(
            create_budget(&owner(), bad_threshold, &conn),
            Err(Error::InvalidThreshold(120.0))
        );
    }

    #[test]
    fn out_of_range_year_is_rejected() {
        let conn = get_test_connection();

        assert_eq!(
            budgets_with_spending(&owner(), 3, 10_000, &conn),
            Err(Error::InvalidYear(10_000))
        );

        let far_future = NewBudget {
            year: Some(10_000),
            ..new_budget(BudgetCategory::Total, 100.0)
        };
        assert_eq!(create_budget(&owner(), far_future, &conn), Err(Error::InvalidYear(10_000)));
    }

    #[test]
    fn budgets_are_sorted_by_category_name() {
        let conn = get_test_connection();
        for category in [
            BudgetCategory::Total,
            BudgetCategory::Category(Category::Food),
            BudgetCategory::Category(Category::Entertainment),
        ] {
            create_budget(&owner(), new_budget(category, 100.0), &conn).unwrap();
        }

        let budgets = get_budgets(&owner(), 3, 2024, &conn).unwrap();

        let names: Vec<&str> =
            budgets.iter().map(|budget| budget.category.as_str()).collect();
        assert_eq!(names, vec!["Entertainment", "Food", "Total"]);
    }

    #[test]
    fn delete_is_scoped_to_owner() {
        let conn = get_test_connection();
        let budget =
            create_budget(&owner(), new_budget(BudgetCategory::Total, 100.0), &conn).unwrap();

        assert_eq!(
            delete_budget(budget.id, &OwnerId::new("mallory"), &conn),
            Err(Error::NotFound)
        );
        assert_eq!(delete_budget(budget.id, &owner(), &conn), Ok(()));
    }

    #[test]
    fn spending_joins_category_and_total_budgets() {
        let conn = get_test_connection();
        create_budget(
            &owner(),
            new_budget(BudgetCategory::Category(Category::Food), 500.0),
            &conn,
        )
        .unwrap();
        create_budget(&owner(), new_budget(BudgetCategory::Total, 1000.0), &conn).unwrap();
        for (amount, category) in [(420.0, Category::Food), (80.0, Category::Transport)] {
            create_expense(
                &owner(),
                Expense::build("spend", amount, category, datetime!(2024-03-10 12:00:00 UTC)),
                &conn,
            )
            .unwrap();
        }

        let tracked = budgets_with_spending(&owner(), 3, 2024, &conn).unwrap();

        let food = tracked
            .iter()
            .find(|entry| entry.budget.category == BudgetCategory::Category(Category::Food))
            .unwrap();
        assert_eq!(food.spent, 420.0);
        assert_eq!(food.remaining, 80.0);
        assert_eq!(food.percentage, 84.0);

        let total = tracked
            .iter()
            .find(|entry| entry.budget.category == BudgetCategory::Total)
            .unwrap();
        assert_eq!(total.spent, 500.0);
        assert_eq!(total.percentage, 50.0);
    }

    #[test]
    fn unspent_budget_reports_zero_spending() {
        let conn = get_test_connection();
        create_budget(
            &owner(),
            new_budget(BudgetCategory::Category(Category::Health), 200.0),
            &conn,
        )
        .unwrap();

        let tracked = budgets_with_spending(&owner(), 3, 2024, &conn).unwrap();

        assert_eq!(tracked[0].spent, 0.0);
        assert_eq!(tracked[0].remaining, 200.0);
        assert_eq!(tracked[0].percentage, 0.0);
    }

    #[test]
    fn zero_amount_budget_does_not_divide_by_zero() {
        let conn = get_test_connection();
        create_budget(
            &owner(),
            new_budget(BudgetCategory::Category(Category::Food), 0.0),
            &conn,
        )
        .unwrap();
        create_expense(
            &owner(),
            Expense::build("spend", 10.0, Category::Food, datetime!(2024-03-10 12:00:00 UTC)),
            &conn,
        )
        .unwrap();

        let tracked = budgets_with_spending(&owner(), 3, 2024, &conn).unwrap();

        assert_eq!(tracked[0].percentage, 0.0);
        assert_eq!(tracked[0].remaining, -10.0);
    }
}
