//! GreenStash core: locally persisted savings goals with a deposit/withdraw
//! ledger and derived progress.
//!
//! This library is the storage and domain layer of a savings-goal tracker.
//! A host application shell (the rendering layer, the home-screen widget
//! process, the platform notification scheduler) embeds an [AppState] and
//! drives it through its async methods; every committed mutation is pushed
//! to observers through the change bus so live queries can re-render.
//!
//! The ledger is append-mostly: transactions are immutable once written and
//! are only ever removed as a cascade of deleting their goal. A goal's saved
//! amount is always derived from its transaction history, never stored.

#![warn(missing_docs)]

mod app_state;
mod backup;
mod database_id;
mod db;
mod goal;
mod ledger;
mod logging;
mod money;
mod observe;
mod preferences;
mod reminder;
mod session;
mod widget;

pub use app_state::AppState;
pub use backup::{BackupData, GoalBackup, TransactionBackup, export_backup, import_backup};
pub use database_id::{AppWidgetId, DatabaseId, GoalId, TransactionId};
pub use db::initialize as initialize_db;
pub use goal::{
    Goal, GoalWithProgress, NewGoal, Progress, active_goals_with_progress,
    archive_goal, archived_goals_with_progress, create_goal, delete_goal, format_deadline,
    get_active_goals, get_archived_goals, get_goal, goal_progress, parse_deadline, restore_goal,
    saved_amount, update_goal,
};
pub use ledger::{
    DepositOutcome, Transaction, TransactionKind, deposit, transactions_for_goal, withdraw,
};
pub use logging::init as init_logging;
pub use observe::{ChangeBus, ChangeEvent, LiveQuery};
pub use preferences::{Preferences, Theme};
pub use reminder::{InMemoryReminderScheduler, ReminderScheduler, set_goal_reminder};
pub use session::Session;
pub use widget::{bind_widget, unbind_widget, widget_goal};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty or blank string was used as a goal title.
    #[error("goal title cannot be empty")]
    EmptyTitle,

    /// A goal was created with a target amount that is zero, negative, or
    /// not a number.
    #[error("target amount must be a positive number")]
    InvalidTargetAmount,

    /// A deposit or withdrawal amount could not be parsed as a positive
    /// decimal number.
    ///
    /// Callers should pass in the raw input string so it can be shown back
    /// to the user.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// A withdrawal was requested for more money than the goal currently
    /// holds.
    ///
    /// This is distinct from [Error::InvalidAmount] so the caller can show
    /// specific UI. No transaction is written when this error is returned.
    #[error("cannot withdraw {requested} when only {available} is saved")]
    InsufficientFunds {
        /// The rounded amount the caller asked to withdraw.
        requested: f64,
        /// The amount currently saved towards the goal.
        available: f64,
    },

    /// A transaction type string was not recognised.
    ///
    /// Only `Deposit` and `Withdraw` may be persisted. The defensive
    /// `Invalid` sentinel from user input or an imported backup is rejected
    /// with this error rather than silently defaulted.
    #[error("\"{0}\" is not a valid transaction type")]
    InvalidTransactionType(String),

    /// A deadline string could not be parsed or formatted with the
    /// configured date format.
    #[error("could not parse date \"{0}\"")]
    InvalidDateFormat(String),

    /// The requested resource was not found.
    ///
    /// Returned when operating on a goal or widget id that no longer
    /// exists. Internally, this error may occur when a query returns no
    /// rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Backup data could not be encoded or decoded.
    #[error("could not serialize backup data: {0}")]
    SerializationError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
