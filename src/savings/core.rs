//! Defines the core data models and database queries for savings goals.

use std::{fmt, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    auth::OwnerId,
    database_id::GoalId,
    money::{round1, round2},
};

/// The icon used when a goal does not specify one.
pub const DEFAULT_GOAL_ICON: &str = "\u{1F3AF}";

/// What a savings goal is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalCategory {
    /// A holiday or trip.
    Vacation,
    /// A rainy-day fund.
    #[serde(rename = "Emergency Fund")]
    EmergencyFund,
    /// Tuition, courses, books.
    Education,
    /// Stocks, funds, other investments.
    Investment,
    /// A one-off purchase.
    Purchase,
    /// A car.
    Car,
    /// A house or deposit.
    House,
    /// Retirement savings.
    Retirement,
    /// Phones, laptops, appliances.
    Electronics,
    /// A wedding.
    Wedding,
    /// Anything else.
    Other,
}

impl GoalCategory {
    /// The goal category name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalCategory::Vacation => "Vacation",
            GoalCategory::EmergencyFund => "Emergency Fund",
            GoalCategory::Education => "Education",
            GoalCategory::Investment => "Investment",
            GoalCategory::Purchase => "Purchase",
            GoalCategory::Car => "Car",
            GoalCategory::House => "House",
            GoalCategory::Retirement => "Retirement",
            GoalCategory::Electronics => "Electronics",
            GoalCategory::Wedding => "Wedding",
            GoalCategory::Other => "Other",
        }
    }
}

impl fmt::Display for GoalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Vacation" => Ok(GoalCategory::Vacation),
            "Emergency Fund" => Ok(GoalCategory::EmergencyFund),
            "Education" => Ok(GoalCategory::Education),
            "Investment" => Ok(GoalCategory::Investment),
            "Purchase" => Ok(GoalCategory::Purchase),
            "Car" => Ok(GoalCategory::Car),
            "House" => Ok(GoalCategory::House),
            "Retirement" => Ok(GoalCategory::Retirement),
            "Electronics" => Ok(GoalCategory::Electronics),
            "Wedding" => Ok(GoalCategory::Wedding),
            "Other" => Ok(GoalCategory::Other),
            other => Err(Error::InvalidCategory(other.to_owned())),
        }
    }
}

impl ToSql for GoalCategory {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for GoalCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A savings goal: an amount to put aside by a deadline.
///
/// Completion latches: once the saved amount reaches the target the goal
/// stays completed even if the amounts are later edited downwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    /// The ID of the goal.
    pub id: GoalId,
    /// What the goal is called.
    pub name: String,
    /// The amount to save.
    pub target_amount: f64,
    /// The amount saved so far.
    pub current_amount: f64,
    /// When the goal should be reached.
    pub deadline: Date,
    /// What the goal is for.
    pub category: GoalCategory,
    /// An emoji shown next to the goal.
    pub icon: String,
    /// Whether the goal has ever reached its target.
    pub is_completed: bool,
}

/// The fields needed to create or overwrite a savings goal.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalPayload {
    /// What the goal is called.
    pub name: String,
    /// The amount to save.
    pub target_amount: f64,
    /// The amount saved so far.
    #[serde(default)]
    pub current_amount: f64,
    /// When the goal should be reached.
    pub deadline: Date,
    /// What the goal is for.
    pub category: GoalCategory,
    /// An emoji shown next to the goal.
    #[serde(default)]
    pub icon: Option<String>,
}

impl GoalPayload {
    fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::EmptyGoalName);
        }

        if self.name.chars().count() > 100 {
            return Err(Error::GoalNameTooLong);
        }

        for amount in [self.target_amount, self.current_amount] {
            if !amount.is_finite() {
                return Err(Error::InvalidAmount(amount));
            }

            if amount < 0.0 {
                return Err(Error::NegativeAmount(amount));
            }
        }

        Ok(())
    }
}

/// A savings goal joined with its derived progress figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalWithProgress {
    /// The goal itself.
    #[serde(flatten)]
    pub goal: SavingsGoal,
    /// How far along the goal is, in percent, capped at 100.
    pub progress: f64,
    /// How much is still to be saved. Never negative.
    pub remaining: f64,
    /// Whole days until the deadline. Zero on the deadline day, negative
    /// once it has passed.
    pub days_left: i64,
}

impl GoalWithProgress {
    /// Derive the progress figures for a goal as of `today`.
    pub fn derive(goal: SavingsGoal, today: Date) -> Self {
        let progress = if goal.target_amount > 0.0 {
            round1((goal.current_amount / goal.target_amount * 100.0).min(100.0))
        } else {
            100.0
        };
        let remaining = round2((goal.target_amount - goal.current_amount).max(0.0));
        let days_left = (goal.deadline - today).whole_days();

        Self {
            goal,
            progress,
            remaining,
            days_left,
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const GOAL_COLUMNS: &str =
    "id, name, target_amount, current_amount, deadline, category, icon, is_completed";

/// Create a new savings goal for an owner.
///
/// The goal starts completed if the initial saved amount already reaches
/// the target.
///
/// # Errors
/// This function will return a validation error if the fields are out of
/// bounds, or an [Error::StoreUnavailable] if there is an SQL error.
pub fn create_savings_goal(
    owner: &OwnerId,
    payload: GoalPayload,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    payload.validate()?;

    let icon = payload.icon.as_deref().unwrap_or(DEFAULT_GOAL_ICON);
    let is_completed = payload.current_amount >= payload.target_amount;

    let goal = connection
        .prepare(&format!(
            "INSERT INTO savings_goal
                (owner_id, name, target_amount, current_amount, deadline, category, icon,
                 is_completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING {GOAL_COLUMNS}"
        ))?
        .query_row(
            (
                owner.as_str(),
                &payload.name,
                payload.target_amount,
                payload.current_amount,
                payload.deadline,
                payload.category,
                icon,
                is_completed,
            ),
            map_savings_goal_row,
        )?;

    Ok(goal)
}

/// Overwrite a savings goal, latching completion.
///
/// If the new saved amount reaches the new target the goal is marked
/// completed; a goal that was already completed stays completed.
///
/// # Errors
/// This function will return a validation error if the fields are out of
/// bounds, an [Error::NotFound] if `id` does not refer to a goal owned by
/// `owner`, or an [Error::StoreUnavailable] if there is some other SQL
/// error.
pub fn update_savings_goal(
    id: GoalId,
    owner: &OwnerId,
    payload: GoalPayload,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    payload.validate()?;

    let icon = payload.icon.as_deref().unwrap_or(DEFAULT_GOAL_ICON);

    let goal = connection
        .prepare(&format!(
            "UPDATE savings_goal
             SET name = ?1, target_amount = ?2, current_amount = ?3, deadline = ?4,
                 category = ?5, icon = ?6,
                 is_completed = CASE WHEN ?3 >= ?2 THEN 1 ELSE is_completed END
             WHERE id = ?7 AND owner_id = ?8
             RETURNING {GOAL_COLUMNS}"
        ))?
        .query_row(
            (
                &payload.name,
                payload.target_amount,
                payload.current_amount,
                payload.deadline,
                payload.category,
                icon,
                id,
                owner.as_str(),
            ),
            map_savings_goal_row,
        )?;

    Ok(goal)
}

/// Delete a savings goal owned by `owner`.
///
/// # Errors
/// This function will return an [Error::NotFound] if `id` does not refer
/// to a goal owned by `owner`, or an [Error::StoreUnavailable] if there
/// is some other SQL error.
pub fn delete_savings_goal(
    id: GoalId,
    owner: &OwnerId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM savings_goal WHERE id = ?1 AND owner_id = ?2",
        (id, owner.as_str()),
    )?;

    if rows_deleted == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Retrieve an owner's savings goals with derived progress figures.
///
/// Active goals come first, each group sorted by nearest deadline.
///
/// # Errors
/// This function will return an [Error::StoreUnavailable] if there is an
/// SQL error.
pub fn goals_with_progress(
    owner: &OwnerId,
    today: Date,
    connection: &Connection,
) -> Result<Vec<GoalWithProgress>, Error> {
    connection
        .prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM savings_goal WHERE owner_id = ?1
             ORDER BY is_completed ASC, deadline ASC"
        ))?
        .query_map([owner.as_str()], map_savings_goal_row)?
        .map(|goal_result| {
            goal_result
                .map(|goal| GoalWithProgress::derive(goal, today))
                .map_err(Error::from)
        })
        .collect()
}

/// Create the savings goal table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL
/// error.
pub fn create_savings_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS savings_goal (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                target_amount REAL NOT NULL,
                current_amount REAL NOT NULL DEFAULT 0.0,
                deadline TEXT NOT NULL,
                category TEXT NOT NULL,
                icon TEXT NOT NULL,
                is_completed INTEGER NOT NULL DEFAULT 0
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [SavingsGoal].
pub fn map_savings_goal_row(row: &Row) -> Result<SavingsGoal, rusqlite::Error> {
    Ok(SavingsGoal {
        id: row.get(0)?,
        name: row.get(1)?,
        target_amount: row.get(2)?,
        current_amount: row.get(3)?,
        deadline: row.get(4)?,
        category: row.get(5)?,
        icon: row.get(6)?,
        is_completed: row.get(7)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use super::{
        DEFAULT_GOAL_ICON, GoalCategory, GoalPayload, create_savings_goal, delete_savings_goal,
        goals_with_progress, update_savings_goal,
    };
    use crate::{Error, auth::OwnerId, db::initialize};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn owner() -> OwnerId {
        OwnerId::new("alice")
    }

    fn payload(name: &str, target: f64, current: f64, deadline: time::Date) -> GoalPayload {
        GoalPayload {
            name: name.to_owned(),
            target_amount: target,
            current_amount: current,
            deadline,
            category: GoalCategory::Vacation,
            icon: None,
        }
    }

    #[test]
    fn create_applies_default_icon() {
        let conn = get_test_connection();

        let goal =
            create_savings_goal(&owner(), payload("Bali", 2000.0, 0.0, date!(2025-06-01)), &conn)
                .expect("could not create goal");

        assert!(goal.id > 0);
        assert_eq!(goal.icon, DEFAULT_GOAL_ICON);
        assert!(!goal.is_completed);
    }

    #[test]
    fn create_rejects_blank_name_and_negative_amounts() {
        let conn = get_test_connection();

        assert_eq!(
            create_savings_goal(&owner(), payload("  ", 100.0, 0.0, date!(2025-06-01)), &conn),
            Err(Error::EmptyGoalName)
        );
        assert_eq!(
            create_savings_goal(&owner(), payload("Bali", -1.0, 0.0, date!(2025-06-01)), &conn),
            Err(Error::NegativeAmount(-1.0))
        );
    }

    #[test]
    fn reaching_the_target_completes_the_goal() {
        let conn = get_test_connection();
        let goal =
            create_savings_goal(&owner(), payload("Bali", 1000.0, 0.0, date!(2025-06-01)), &conn)
                .unwrap();

        let updated = update_savings_goal(
            goal.id,
            &owner(),
            payload("Bali", 1000.0, 1000.0, date!(2025-06-01)),
            &conn,
        )
        .unwrap();

        assert!(updated.is_completed);
    }

    #[test]
    fn completion_latches_when_amounts_are_edited_down() {
        let conn = get_test_connection();
        let goal = create_savings_goal(
            &owner(),
            payload("Bali", 1000.0, 1000.0, date!(2025-06-01)),
            &conn,
        )
        .unwrap();
        assert!(goal.is_completed);

        let updated = update_savings_goal(
            goal.id,
            &owner(),
            payload("Bali", 1000.0, 400.0, date!(2025-06-01)),
            &conn,
        )
        .unwrap();

        assert!(updated.is_completed);
    }

    #[test]
    fn progress_is_capped_and_remaining_never_negative() {
        let conn = get_test_connection();
        create_savings_goal(&owner(), payload("Bali", 1000.0, 1200.0, date!(2025-06-01)), &conn)
            .unwrap();

        let goals = goals_with_progress(&owner(), date!(2025-06-01), &conn).unwrap();

        assert_eq!(goals[0].progress, 100.0);
        assert_eq!(goals[0].remaining, 0.0);
        assert_eq!(goals[0].days_left, 0);
    }

    #[test]
    fn zero_target_counts_as_fully_funded() {
        let conn = get_test_connection();
        create_savings_goal(&owner(), payload("Buffer", 0.0, 0.0, date!(2025-06-01)), &conn)
            .unwrap();

        let goals = goals_with_progress(&owner(), date!(2025-01-01), &conn).unwrap();

        assert_eq!(goals[0].progress, 100.0);
    }

    #[test]
    fn goals_sort_active_first_then_by_deadline() {
        let conn = get_test_connection();
        create_savings_goal(&owner(), payload("Done", 100.0, 100.0, date!(2025-01-01)), &conn)
            .unwrap();
        create_savings_goal(&owner(), payload("Later", 100.0, 0.0, date!(2025-12-01)), &conn)
            .unwrap();
        create_savings_goal(&owner(), payload("Soon", 100.0, 0.0, date!(2025-02-01)), &conn)
            .unwrap();

        let goals = goals_with_progress(&owner(), date!(2025-01-15), &conn).unwrap();

        let names: Vec<&str> = goals.iter().map(|entry| entry.goal.name.as_str()).collect();
        assert_eq!(names, vec!["Soon", "Later", "Done"]);
    }

    #[test]
    fn days_left_goes_negative_after_the_deadline() {
        let conn = get_test_connection();
        create_savings_goal(&owner(), payload("Past", 100.0, 0.0, date!(2025-01-01)), &conn)
            .unwrap();

        let goals = goals_with_progress(&owner(), date!(2025-01-04), &conn).unwrap();

        assert_eq!(goals[0].days_left, -3);
    }

    #[test]
    fn delete_is_scoped_to_owner() {
        let conn = get_test_connection();
        let goal =
            create_savings_goal(&owner(), payload("Bali", 1000.0, 0.0, date!(2025-06-01)), &conn)
                .unwrap();

        assert_eq!(
            delete_savings_goal(goal.id, &OwnerId::new("mallory"), &conn),
            Err(Error::NotFound)
        );
        assert_eq!(delete_savings_goal(goal.id, &owner(), &conn), Ok(()));
    }
}
