//! JSON export and import of goals, their ledgers, and preferences.
//!
//! The backup carries no database IDs: importing recreates each goal with a
//! fresh ID and replays its transaction history, so a backup can be
//! restored into a database that already holds other goals. Reminders are
//! not rescheduled on import; the host re-applies them from the restored
//! reminder flags once its scheduler is available.

use std::str::FromStr;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    goal::{NewGoal, create_goal, get_active_goals, get_archived_goals, update_goal},
    ledger::{
        NewTransaction, TransactionKind, count_transactions, record_transaction,
        transactions_for_goal,
    },
    money::round_amount,
    preferences::{self, Preferences},
};

/// Everything a backup contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupData {
    /// The preference snapshot at export time.
    pub preferences: Preferences,
    /// All goals, archived ones included, in insertion order.
    pub goals: Vec<GoalBackup>,
}

/// A goal and its full transaction history, without database IDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalBackup {
    /// The display title.
    pub title: String,
    /// The savings target.
    pub target_amount: f64,
    /// The deadline date.
    pub deadline: Date,
    /// Optional image bytes.
    pub image: Option<Vec<u8>>,
    /// Free-text notes.
    pub additional_notes: String,
    /// Whether the goal was archived.
    pub archived: bool,
    /// Whether a reminder was enabled.
    pub reminder: bool,
    /// The goal's ledger, ordered by timestamp.
    pub transactions: Vec<TransactionBackup>,
}

/// One ledger record in a backup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionBackup {
    /// The transaction type as its persisted string, `"Deposit"` or
    /// `"Withdraw"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// When the transaction happened, as epoch milliseconds.
    pub timestamp: i64,
    /// The amount of money moved.
    pub amount: f64,
    /// Free-text notes.
    pub notes: String,
}

impl BackupData {
    /// Encode the backup as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an [Error::SerializationError] if encoding fails.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|error| {
            Error::SerializationError(error.to_string())
        })
    }

    /// Decode a backup from JSON.
    ///
    /// # Errors
    /// Returns an [Error::SerializationError] if `json` is not a valid
    /// backup document.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|error| Error::SerializationError(error.to_string()))
    }
}

/// Collect all goals, their ledgers, and the preference snapshot.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn export_backup(connection: &Connection) -> Result<BackupData, Error> {
    let mut goals = get_active_goals(connection)?;
    goals.extend(get_archived_goals(connection)?);
    goals.sort_by_key(|goal| goal.id);

    let goals = goals
        .into_iter()
        .map(|goal| {
            let transactions = transactions_for_goal(goal.id, connection)?
                .into_iter()
                .map(|transaction| TransactionBackup {
                    kind: transaction.kind.as_str().to_string(),
                    timestamp: (transaction.timestamp.unix_timestamp_nanos() / 1_000_000) as i64,
                    amount: transaction.amount,
                    notes: transaction.notes,
                })
                .collect();

            Ok(GoalBackup {
                title: goal.title,
                target_amount: goal.target_amount,
                deadline: goal.deadline,
                image: goal.image,
                additional_notes: goal.additional_notes,
                archived: goal.archived,
                reminder: goal.reminder,
                transactions,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    tracing::info!(
        "exported backup with {} goals and {} transactions",
        goals.len(),
        count_transactions(connection)?
    );

    Ok(BackupData {
        preferences: preferences::load_preferences(connection)?,
        goals,
    })
}

/// Restore a backup, recreating its goals and ledgers with fresh IDs.
///
/// The whole import is one database transaction: a single bad record rolls
/// back everything. Returns the number of goals restored.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyTitle] or [Error::InvalidTargetAmount] if a goal record
///   fails validation,
/// - [Error::InvalidTransactionType] if a transaction's type string is not
///   recognised,
/// - [Error::InvalidAmount] if a transaction's amount is not positive,
/// - [Error::SerializationError] if a timestamp is out of range,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn import_backup(data: BackupData, connection: &Connection) -> Result<usize, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    preferences::set_currency(&data.preferences.currency, &sql_transaction)?;
    preferences::set_date_format(&data.preferences.date_format, &sql_transaction)?;
    preferences::set_theme(data.preferences.theme, &sql_transaction)?;
    preferences::set_app_lock(data.preferences.app_lock, &sql_transaction)?;

    for goal_backup in &data.goals {
        let mut new_goal = NewGoal::new(
            &goal_backup.title,
            goal_backup.target_amount,
            goal_backup.deadline,
        )?
        .additional_notes(&goal_backup.additional_notes);

        if let Some(image) = &goal_backup.image {
            new_goal = new_goal.image(image.clone());
        }

        let mut goal = create_goal(new_goal, &sql_transaction)?;

        if goal_backup.archived || goal_backup.reminder {
            goal.archived = goal_backup.archived;
            goal.reminder = goal_backup.reminder;
            update_goal(&goal, &sql_transaction)?;
        }

        for transaction in &goal_backup.transactions {
            let kind = TransactionKind::from_str(&transaction.kind)?;

            if !transaction.amount.is_finite() || transaction.amount <= 0.0 {
                return Err(Error::InvalidAmount(transaction.amount.to_string()));
            }

            let timestamp =
                OffsetDateTime::from_unix_timestamp_nanos(transaction.timestamp as i128 * 1_000_000)
                    .map_err(|_| {
                        Error::SerializationError(format!(
                            "timestamp {} is out of range",
                            transaction.timestamp
                        ))
                    })?;

            record_transaction(
                NewTransaction {
                    goal_id: goal.id,
                    kind,
                    timestamp,
                    amount: round_amount(transaction.amount),
                    notes: transaction.notes.clone(),
                },
                &sql_transaction,
            )?;
        }
    }

    sql_transaction.commit()?;

    tracing::info!("imported backup with {} goals", data.goals.len());

    Ok(data.goals.len())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::{date, datetime};

    use crate::{
        Error,
        db::initialize,
        goal::{NewGoal, create_goal, get_active_goals, get_archived_goals, saved_amount},
        ledger::{deposit, withdraw},
        preferences::{Theme, load_preferences, set_currency, set_theme},
        reminder::{InMemoryReminderScheduler, set_goal_reminder},
    };

    use super::{BackupData, export_backup, import_backup};

    const WHEN: time::OffsetDateTime = datetime!(2026 - 02 - 14 18:30 UTC);

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn populate(conn: &Connection) {
        let scheduler = InMemoryReminderScheduler::default();

        let bike = create_goal(
            NewGoal::new("Bike", 500.0, date!(2026 - 12 - 31)).unwrap(),
            conn,
        )
        .unwrap();
        deposit(bike.id, "120.00", WHEN, "first payday", conn).unwrap();
        deposit(bike.id, "80.00", WHEN, "", conn).unwrap();
        withdraw(bike.id, "25.50", WHEN, "tyre repair", conn).unwrap();
        set_goal_reminder(bike.id, true, conn, &scheduler).unwrap();

        let trip = create_goal(
            NewGoal::new("Trip", 1000.0, date!(2027 - 06 - 01)).unwrap(),
            conn,
        )
        .unwrap();
        crate::goal::archive_goal(trip.id, conn, &scheduler).unwrap();

        set_currency("EUR", conn).unwrap();
        set_theme(Theme::Dark, conn).unwrap();
    }

    #[test]
    fn export_import_round_trip() {
        let source = get_test_connection();
        populate(&source);

        let json = export_backup(&source).unwrap().to_json().unwrap();

        let target = get_test_connection();
        let restored = import_backup(BackupData::from_json(&json).unwrap(), &target).unwrap();
        assert_eq!(restored, 2);

        let active = get_active_goals(&target).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "Bike");
        assert!(active[0].reminder);
        assert_eq!(saved_amount(active[0].id, &target), Ok(174.5));

        let archived = get_archived_goals(&target).unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].title, "Trip");

        let preferences = load_preferences(&target).unwrap();
        assert_eq!(preferences.currency, "EUR");
        assert_eq!(preferences.theme, Theme::Dark);
    }

    #[test]
    fn exported_backup_survives_json_round_trip() {
        let conn = get_test_connection();
        populate(&conn);

        let data = export_backup(&conn).unwrap();
        let decoded = BackupData::from_json(&data.to_json().unwrap()).unwrap();

        assert_eq!(data, decoded);
    }

    #[test]
    fn import_rejects_unknown_transaction_types_and_rolls_back() {
        let source = get_test_connection();
        populate(&source);

        let mut data = export_backup(&source).unwrap();
        data.goals[0].transactions[0].kind = "Invalid".to_string();

        let target = get_test_connection();
        let result = import_backup(data, &target);

        assert_eq!(
            result,
            Err(Error::InvalidTransactionType("Invalid".to_string()))
        );
        assert!(get_active_goals(&target).unwrap().is_empty());
        assert!(get_archived_goals(&target).unwrap().is_empty());
    }

    #[test]
    fn import_rejects_non_positive_amounts() {
        let source = get_test_connection();
        populate(&source);

        let mut data = export_backup(&source).unwrap();
        data.goals[0].transactions[0].amount = -10.0;

        let target = get_test_connection();
        let result = import_backup(data, &target);

        assert_eq!(result, Err(Error::InvalidAmount("-10".to_string())));
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let result = BackupData::from_json("{not json");

        assert!(matches!(result, Err(Error::SerializationError(_))));
    }
}
