//! Derived progress for savings goals.
//!
//! Progress is recomputed from the raw transaction history on every read.
//! There is no stored total and no cache, so the reported saved amount can
//! never drift from the ledger. Recomputing is O(transactions-per-goal),
//! which stays small for a personal savings tracker.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::GoalId,
    goal::core::{Goal, get_active_goals, get_archived_goals, get_goal},
};

/// A goal's progress towards its target, derived from its ledger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Deposits minus withdrawals over the goal's transaction history.
    pub saved_amount: f64,
    /// How much is left to save. Zero once the target is met.
    pub remaining_amount: f64,
    /// Saved amount as a fraction of the target, capped at 1 for display in
    /// progress bars.
    pub ratio: f64,
    /// Whether the saved amount meets or exceeds the target.
    pub achieved: bool,
}

impl Progress {
    /// Derive progress from a target and a saved amount.
    pub fn derive(target_amount: f64, saved_amount: f64) -> Self {
        Self {
            saved_amount,
            remaining_amount: (target_amount - saved_amount).max(0.0),
            ratio: (saved_amount / target_amount).min(1.0),
            achieved: saved_amount >= target_amount,
        }
    }
}

/// A goal paired with its derived progress, as shown in goal lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalWithProgress {
    /// The stored goal record.
    pub goal: Goal,
    /// Progress derived from the goal's ledger at query time.
    pub progress: Progress,
}

/// Sum the goal's ledger: deposits count positively, withdrawals negatively.
///
/// Returns `0.0` for a goal with no transactions, including a goal id that
/// does not exist. Callers that need to distinguish a missing goal should
/// use [goal_progress] or [get_goal] instead.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn saved_amount(goal_id: GoalId, connection: &Connection) -> Result<f64, Error> {
    let total = connection
        .prepare(
            "SELECT COALESCE(SUM(CASE type WHEN 'Deposit' THEN amount ELSE -amount END), 0.0)
             FROM \"transaction\" WHERE goal_id = :goal_id",
        )?
        .query_one(&[(":goal_id", &goal_id)], |row| row.get(0))?;

    Ok(total)
}

/// Derive a goal's progress from its ledger.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `goal_id` does not refer to a valid goal,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn goal_progress(goal_id: GoalId, connection: &Connection) -> Result<Progress, Error> {
    let goal = get_goal(goal_id, connection)?;
    let saved = saved_amount(goal_id, connection)?;

    Ok(Progress::derive(goal.target_amount, saved))
}

/// Retrieve all non-archived goals with their derived progress, in insertion
/// order.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn active_goals_with_progress(connection: &Connection) -> Result<Vec<GoalWithProgress>, Error> {
    attach_progress(get_active_goals(connection)?, connection)
}

/// Retrieve all archived goals with their derived progress, in insertion
/// order.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn archived_goals_with_progress(
    connection: &Connection,
) -> Result<Vec<GoalWithProgress>, Error> {
    attach_progress(get_archived_goals(connection)?, connection)
}

fn attach_progress(
    goals: Vec<Goal>,
    connection: &Connection,
) -> Result<Vec<GoalWithProgress>, Error> {
    goals
        .into_iter()
        .map(|goal| {
            let saved = saved_amount(goal.id, connection)?;
            let progress = Progress::derive(goal.target_amount, saved);

            Ok(GoalWithProgress { goal, progress })
        })
        .collect()
}
