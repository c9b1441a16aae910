//! Defines the core data models and database queries for expenses.

use std::{fmt, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::OwnerId, database_id::ExpenseId, period::PeriodBounds};

// ============================================================================
// MODELS
// ============================================================================

/// The closed set of spending categories an expense may belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Groceries, restaurants, takeaways.
    Food,
    /// Fuel, fares, ride shares.
    Transport,
    /// Rent, mortgage, maintenance.
    Housing,
    /// Power, water, internet, phone.
    Utilities,
    /// Movies, games, subscriptions, outings.
    Entertainment,
    /// Doctor visits, medicine, insurance.
    Health,
    /// Clothing, gadgets, everything bought for fun.
    Shopping,
    /// Anything that does not fit the other categories.
    Other,
}

impl Category {
    /// The category name as stored in the database and shown to users.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Housing => "Housing",
            Category::Utilities => "Utilities",
            Category::Entertainment => "Entertainment",
            Category::Health => "Health",
            Category::Shopping => "Shopping",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Food" => Ok(Category::Food),
            "Transport" => Ok(Category::Transport),
            "Housing" => Ok(Category::Housing),
            "Utilities" => Ok(Category::Utilities),
            "Entertainment" => Ok(Category::Entertainment),
            "Health" => Ok(Category::Health),
            "Shopping" => Ok(Category::Shopping),
            "Other" => Ok(Category::Other),
            other => Err(Error::InvalidCategory(other.to_owned())),
        }
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// How an expense was paid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Physical cash.
    #[default]
    Cash,
    /// A credit card.
    #[serde(rename = "Credit Card")]
    CreditCard,
    /// A debit card.
    #[serde(rename = "Debit Card")]
    DebitCard,
    /// A UPI transfer.
    #[serde(rename = "UPI")]
    Upi,
    /// An online bank transfer.
    #[serde(rename = "Net Banking")]
    NetBanking,
    /// Anything else.
    Other,
}

impl PaymentMethod {
    /// The payment method name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::CreditCard => "Credit Card",
            PaymentMethod::DebitCard => "Debit Card",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::NetBanking => "Net Banking",
            PaymentMethod::Other => "Other",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cash" => Ok(PaymentMethod::Cash),
            "Credit Card" => Ok(PaymentMethod::CreditCard),
            "Debit Card" => Ok(PaymentMethod::DebitCard),
            "UPI" => Ok(PaymentMethod::Upi),
            "Net Banking" => Ok(PaymentMethod::NetBanking),
            "Other" => Ok(PaymentMethod::Other),
            other => Err(Error::InvalidPaymentMethod(other.to_owned())),
        }
    }
}

impl ToSql for PaymentMethod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for PaymentMethod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A single recorded expense.
///
/// Expenses are owned exclusively by one user and are immutable except for
/// full-field update or deletion; edits overwrite in place and keep no
/// history. To create a new `Expense`, use [Expense::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
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
    pub note: Option<String>,
    /// Optional labels for filtering.
    #[serde(default)]
    pub tags: Vec<String>,
    /// How the expense was paid.
    pub payment_method: PaymentMethod,
}

impl Expense {
    /// Create a new expense.
    ///
    /// Shortcut for [ExpenseBuilder] for discoverability.
    pub fn build(
        title: &str,
        amount: f64,
        category: Category,
        date: OffsetDateTime,
    ) -> ExpenseBuilder {
        ExpenseBuilder {
            title: title.to_owned(),
            amount,
            category,
            date,
            note: None,
            tags: Vec::new(),
            payment_method: PaymentMethod::default(),
        }
    }
}

/// A builder for creating [Expense] instances.
///
/// Optional fields default to no note, no tags and cash payment. The
/// builder is validated when it is passed to [create_expense] or
/// [update_expense].
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseBuilder {
    /// A short description of what the money was spent on.
    pub title: String,
    /// The amount of money spent.
    pub amount: f64,
    /// The spending category.
    pub category: Category,
    /// When the expense happened.
    pub date: OffsetDateTime,
    /// An optional free-form note.
    pub note: Option<String>,
    /// Optional labels for filtering.
    pub tags: Vec<String>,
    /// How the expense was paid.
    pub payment_method: PaymentMethod,
}

impl ExpenseBuilder {
    /// Set the note for the expense.
    pub fn note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    /// Set the tags for the expense.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the payment method for the expense.
    pub fn payment_method(mut self, payment_method: PaymentMethod) -> Self {
        self.payment_method = payment_method;
        self
    }

    fn validate(&self) -> Result<(), Error> {
        if self.title.trim().is_empty() {
            return Err(Error::EmptyTitle);
        }

        if self.title.chars().count() > 100 {
            return Err(Error::TitleTooLong);
        }

        if !self.amount.is_finite() {
            return Err(Error::InvalidAmount(self.amount));
        }

        if let Some(note) = &self.note
            && note.chars().count() > 500
        {
            return Err(Error::NoteTooLong);
        }

        for tag in &self.tags {
            if tag.chars().count() > 30 {
                return Err(Error::TagTooLong(tag.clone()));
            }
        }

        Ok(())
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const EXPENSE_COLUMNS: &str = "id, title, amount, category, date, note, tags, payment_method";

/// Create a new expense in the database from a builder.
///
/// # Errors
/// This function will return a validation error if the builder's fields
/// are out of bounds, or an [Error::StoreUnavailable] if there is an SQL
/// error.
pub fn create_expense(
    owner: &OwnerId,
    builder: ExpenseBuilder,
    connection: &Connection,
) -> Result<Expense, Error> {
    builder.validate()?;

    let tags = serialize_tags(&builder.tags)?;

    let expense = connection
        .prepare(&format!(
            "INSERT INTO expense (owner_id, title, amount, category, date, note, tags, payment_method)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            (
                owner.as_str(),
                &builder.title,
                builder.amount,
                builder.category,
                builder.date.unix_timestamp(),
                &builder.note,
                tags,
                builder.payment_method,
            ),
            map_expense_row,
        )?;

    Ok(expense)
}

/// Retrieve a single expense owned by `owner`.
///
/// # Errors
/// This function will return an [Error::NotFound] if `id` does not refer
/// to an expense owned by `owner`, or an [Error::StoreUnavailable] if
/// there is some other SQL error.
pub fn get_expense(
    id: ExpenseId,
    owner: &OwnerId,
    connection: &Connection,
) -> Result<Expense, Error> {
    let expense = connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense WHERE id = ?1 AND owner_id = ?2"
        ))?
        .query_one((id, owner.as_str()), map_expense_row)?;

    Ok(expense)
}

/// Overwrite every field of an existing expense.
///
/// Edits overwrite in place; no history is kept.
///
/// # Errors
/// This function will return a validation error if the builder's fields
/// are out of bounds, an [Error::NotFound] if `id` does not refer to an
/// expense owned by `owner`, or an [Error::StoreUnavailable] if there is
/// some other SQL error.
pub fn update_expense(
    id: ExpenseId,
    owner: &OwnerId,
    builder: ExpenseBuilder,
    connection: &Connection,
) -> Result<Expense, Error> {
    builder.validate()?;

    let tags = serialize_tags(&builder.tags)?;

    let expense = connection
        .prepare(&format!(
            "UPDATE expense
             SET title = ?1, amount = ?2, category = ?3, date = ?4, note = ?5, tags = ?6,
                 payment_method = ?7
             WHERE id = ?8 AND owner_id = ?9
             RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            (
                &builder.title,
                builder.amount,
                builder.category,
                builder.date.unix_timestamp(),
                &builder.note,
                tags,
                builder.payment_method,
                id,
                owner.as_str(),
            ),
            map_expense_row,
        )?;

    Ok(expense)
}

/// Delete an expense owned by `owner`.
///
/// # Errors
/// This function will return an [Error::NotFound] if `id` does not refer
/// to an expense owned by `owner`, or an [Error::StoreUnavailable] if
/// there is some other SQL error.
pub fn delete_expense(
    id: ExpenseId,
    owner: &OwnerId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM expense WHERE id = ?1 AND owner_id = ?2",
        (id, owner.as_str()),
    )?;

    if rows_deleted == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Count the expenses owned by `owner`.
///
/// # Errors
/// This function will return an [Error::StoreUnavailable] if there is an
/// SQL error.
pub fn count_expenses(owner: &OwnerId, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM expense WHERE owner_id = ?1",
            [owner.as_str()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Retrieve one page of an owner's expenses, newest first.
///
/// `page` is 1-based. Rows are sorted by date descending, then ID
/// descending so that order stays stable after edits.
///
/// # Errors
/// This function will return an [Error::StoreUnavailable] if there is an
/// SQL error.
pub fn get_expenses_page(
    owner: &OwnerId,
    page: u32,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    let offset = (page.max(1) - 1) * limit;

    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense WHERE owner_id = ?1
             ORDER BY date DESC, id DESC LIMIT ?2 OFFSET ?3"
        ))?
        .query_map((owner.as_str(), limit, offset), map_expense_row)?
        .map(|expense_result| expense_result.map_err(Error::from))
        .collect()
}

/// Retrieve the `limit` most recent expenses for an owner.
///
/// # Errors
/// This function will return an [Error::StoreUnavailable] if there is an
/// SQL error.
pub fn get_recent_expenses(
    owner: &OwnerId,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense WHERE owner_id = ?1
             ORDER BY date DESC, id DESC LIMIT ?2"
        ))?
        .query_map((owner.as_str(), limit), map_expense_row)?
        .map(|expense_result| expense_result.map_err(Error::from))
        .collect()
}

/// Retrieve the raw, ungrouped expense records of an owner within a
/// period, oldest first.
///
/// These are the per-transaction records the daily bucketing strategies
/// operate on.
///
/// # Errors
/// This function will return an [Error::StoreUnavailable] if there is an
/// SQL error.
pub fn get_expenses_in_range(
    owner: &OwnerId,
    bounds: &PeriodBounds,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    let (start, end) = bounds.unix_range();

    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense
             WHERE owner_id = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY date ASC, id ASC"
        ))?
        .query_map((owner.as_str(), start, end), map_expense_row)?
        .map(|expense_result| expense_result.map_err(Error::from))
        .collect()
}

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL
/// error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                date INTEGER NOT NULL,
                note TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                payment_method TEXT NOT NULL DEFAULT 'Cash'
                )",
        (),
    )?;

    // Composite indexes used by the period and category aggregations.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_owner_date ON expense(owner_id, date);",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_owner_category ON expense(owner_id, category);",
        (),
    )?;

    Ok(())
}

/// Map a database row to an [Expense].
pub fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id = row.get(0)?;
    let title = row.get(1)?;
    let amount = row.get(2)?;
    let category = row.get(3)?;
    let unix_timestamp: i64 = row.get(4)?;
    let note = row.get(5)?;
    let raw_tags: String = row.get(6)?;
    let payment_method = row.get(7)?;

    let date = OffsetDateTime::from_unix_timestamp(unix_timestamp).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Integer,
            Box::new(error),
        )
    })?;
    let tags = serde_json::from_str(&raw_tags).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(Expense {
        id,
        title,
        amount,
        category,
        date,
        note,
        tags,
        payment_method,
    })
}

fn serialize_tags(tags: &[String]) -> Result<String, Error> {
    serde_json::to_string(tags).map_err(|error| Error::JsonSerialization(error.to_string()))
}

// ============================================================================
// TESTS
// ============================================================================
