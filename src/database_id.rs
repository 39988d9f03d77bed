//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// Identifier of a savings goal.
pub type GoalId = DatabaseId;

/// Identifier of a ledger transaction.
pub type TransactionId = DatabaseId;

/// Identifier of a home-screen widget instance, assigned by the host shell.
pub type AppWidgetId = i64;
