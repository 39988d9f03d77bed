//! Defines the core data model and database queries for ledger transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{GoalId, TransactionId},
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction puts money into a goal or takes money out.
///
/// The textual form (`"Deposit"` / `"Withdraw"`) is the persisted
/// representation. Parsing any other string fails; in particular the
/// defensive `"Invalid"` placeholder that user-facing forms may hold before
/// a choice is made can never reach the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Money put towards the goal.
    Deposit,
    /// Money taken back out of the goal.
    Withdraw,
}

impl TransactionKind {
    /// The persisted string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "Deposit",
            TransactionKind::Withdraw => "Withdraw",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Deposit" => Ok(TransactionKind::Deposit),
            "Withdraw" => Ok(TransactionKind::Withdraw),
            other => Err(Error::InvalidTransactionType(other.to_string())),
        }
    }
}

/// An immutable deposit or withdrawal record owned by one goal.
///
/// Transactions are only created through [crate::ledger::deposit] and
/// [crate::ledger::withdraw], and are only removed as a cascade of deleting
/// their goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The goal this transaction belongs to.
    pub goal_id: GoalId,
    /// Whether this is a deposit or a withdrawal.
    pub kind: TransactionKind,
    /// When the transaction happened, as selected by the user at creation.
    pub timestamp: OffsetDateTime,
    /// The amount of money moved. Always positive; the kind carries the
    /// sign.
    pub amount: f64,
    /// Free-text notes attached to the transaction.
    pub notes: String,
}

/// A transaction that has not been written to the database yet.
///
/// Amount validation and rounding happen in the deposit/withdraw
/// operations before one of these is constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The goal this transaction belongs to.
    pub goal_id: GoalId,
    /// Whether this is a deposit or a withdrawal.
    pub kind: TransactionKind,
    /// When the transaction happened.
    pub timestamp: OffsetDateTime,
    /// The amount of money moved. Must be positive and already rounded.
    pub amount: f64,
    /// Free-text notes.
    pub notes: String,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Append a new transaction to the ledger.
///
/// Existing rows are never mutated; the ledger is append-only.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the owning goal does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn record_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (goal_id, type, timestamp, amount, notes)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, goal_id, type, timestamp, amount, notes",
        )?
        .query_row(
            (
                new_transaction.goal_id,
                new_transaction.kind.as_str(),
                timestamp_to_millis(new_transaction.timestamp),
                new_transaction.amount,
                new_transaction.notes,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::NotFound,
            error => error.into(),
        })?;

    Ok(transaction)
}

/// Retrieve all transactions for a goal, ordered by timestamp.
///
/// The same ordered sequence is used for display and for aggregation.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn transactions_for_goal(
    goal_id: GoalId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, goal_id, type, timestamp, amount, notes FROM \"transaction\"
             WHERE goal_id = :goal_id ORDER BY timestamp ASC, id ASC",
        )?
        .query_map(&[(":goal_id", &goal_id)], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL
/// error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                goal_id INTEGER NOT NULL,
                type TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                amount REAL NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                FOREIGN KEY(goal_id) REFERENCES goal(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Composite index used by the per-goal history query and the saved-amount sum.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_goal_timestamp
         ON \"transaction\"(goal_id, timestamp);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let goal_id = row.get(1)?;
    let kind_text: String = row.get(2)?;
    let millis: i64 = row.get(3)?;
    let amount = row.get(4)?;
    let notes = row.get(5)?;

    let kind = TransactionKind::from_str(&kind_text).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(error))
    })?;
    let timestamp = millis_to_timestamp(millis).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Integer, Box::new(error))
    })?;

    Ok(Transaction {
        id,
        goal_id,
        kind,
        timestamp,
        amount,
        notes,
    })
}

fn timestamp_to_millis(timestamp: OffsetDateTime) -> i64 {
    (timestamp.unix_timestamp_nanos() / 1_000_000) as i64
}

fn millis_to_timestamp(millis: i64) -> Result<OffsetDateTime, time::error::ComponentRange> {
    OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000)
}

// ============================================================================
// TESTS
// ============================================================================
