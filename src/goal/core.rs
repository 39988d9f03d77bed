//! Defines the core data model and database queries for savings goals.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, format_description};

use crate::{Error, database_id::GoalId, money::round_amount};

// ============================================================================
// MODELS
// ============================================================================

/// A named savings target with a deadline and an accumulated transaction
/// history.
///
/// To create a new `Goal`, validate the input with [NewGoal::new] and insert
/// it with [create_goal].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// The ID of the goal, stable for the goal's lifetime.
    pub id: GoalId,
    /// The display title of the goal.
    pub title: String,
    /// The savings target. Always positive.
    pub target_amount: f64,
    /// The calendar date the user wants to reach the target by.
    pub deadline: Date,
    /// Optional image bytes shown alongside the goal.
    pub image: Option<Vec<u8>>,
    /// Free-text notes attached to the goal.
    pub additional_notes: String,
    /// Archived goals are excluded from the active list but retained for
    /// history.
    pub archived: bool,
    /// Whether a recurring reminder is scheduled for this goal.
    pub reminder: bool,
}

/// A validated goal that has not been written to the database yet.
///
/// # Examples
///
/// ```ignore
/// use time::macros::date;
///
/// let new_goal = NewGoal::new("New bicycle", 500.0, date!(2026 - 12 - 31))
///     .unwrap()
///     .additional_notes("The red one from the shop window");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    /// The display title, trimmed and non-empty.
    pub title: String,
    /// The savings target, rounded to the canonical precision.
    pub target_amount: f64,
    /// The calendar date the user wants to reach the target by.
    pub deadline: Date,
    /// Optional image bytes.
    pub image: Option<Vec<u8>>,
    /// Free-text notes.
    pub additional_notes: String,
}

impl NewGoal {
    /// Validate user input for a new goal.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::EmptyTitle] if `title` is empty or only whitespace,
    /// - or [Error::InvalidTargetAmount] if `target_amount` is not a
    ///   positive, finite number.
    pub fn new(title: &str, target_amount: f64, deadline: Date) -> Result<Self, Error> {
        let title = title.trim();

        if title.is_empty() {
            return Err(Error::EmptyTitle);
        }

        if !target_amount.is_finite() || target_amount <= 0.0 {
            return Err(Error::InvalidTargetAmount);
        }

        Ok(Self {
            title: title.to_string(),
            target_amount: round_amount(target_amount),
            deadline,
            image: None,
            additional_notes: String::new(),
        })
    }

    /// Set the image bytes for the goal.
    pub fn image(mut self, image: Vec<u8>) -> Self {
        self.image = Some(image);
        self
    }

    /// Set the free-text notes for the goal.
    pub fn additional_notes(mut self, notes: &str) -> Self {
        self.additional_notes = notes.to_string();
        self
    }
}

/// Parse a deadline string entered by the user with the configured date
/// format, e.g. `"[day]/[month]/[year]"`.
///
/// # Errors
/// Returns an [Error::InvalidDateFormat] if `input` does not match
/// `date_format`, or if `date_format` itself is not a valid format
/// description.
pub fn parse_deadline(input: &str, date_format: &str) -> Result<Date, Error> {
    let format = format_description::parse(date_format)
        .map_err(|_| Error::InvalidDateFormat(date_format.to_string()))?;

    Date::parse(input.trim(), &format).map_err(|_| Error::InvalidDateFormat(input.to_string()))
}

/// Render a deadline in the configured date format for display.
///
/// # Errors
/// Returns an [Error::InvalidDateFormat] if `date_format` is not a valid
/// format description.
pub fn format_deadline(deadline: Date, date_format: &str) -> Result<String, Error> {
    let format = format_description::parse(date_format)
        .map_err(|_| Error::InvalidDateFormat(date_format.to_string()))?;

    deadline
        .format(&format)
        .map_err(|_| Error::InvalidDateFormat(date_format.to_string()))
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new goal in the database and return it with its generated ID.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn create_goal(new_goal: NewGoal, connection: &Connection) -> Result<Goal, Error> {
    let goal = connection
        .prepare(
            "INSERT INTO goal (title, target_amount, deadline, image, additional_notes)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, title, target_amount, deadline, image, additional_notes, archived, reminder",
        )?
        .query_row(
            (
                new_goal.title,
                new_goal.target_amount,
                new_goal.deadline,
                new_goal.image,
                new_goal.additional_notes,
            ),
            map_goal_row,
        )?;

    tracing::info!("created goal {} \"{}\"", goal.id, goal.title);

    Ok(goal)
}

/// Retrieve a goal from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid goal,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_goal(id: GoalId, connection: &Connection) -> Result<Goal, Error> {
    let goal = connection
        .prepare(
            "SELECT id, title, target_amount, deadline, image, additional_notes, archived, reminder
             FROM goal WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_goal_row)?;

    Ok(goal)
}

/// Replace a goal record, keyed by its ID.
///
/// This is a full-record replace, used for archive/restore and reminder-flag
/// toggles.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the goal no longer exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_goal(goal: &Goal, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE goal
         SET title = ?1, target_amount = ?2, deadline = ?3, image = ?4,
             additional_notes = ?5, archived = ?6, reminder = ?7
         WHERE id = ?8",
        (
            &goal.title,
            goal.target_amount,
            goal.deadline,
            &goal.image,
            &goal.additional_notes,
            goal.archived,
            goal.reminder,
            goal.id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete a goal and, as an atomic cascade, all transactions and widget
/// mappings owned by it.
///
/// Stopping the goal's reminder is the caller's responsibility since the
/// scheduler lives outside the database.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the goal no longer exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_goal(id: GoalId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM goal WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    tracing::info!("deleted goal {} and its transactions", id);

    Ok(())
}

/// Retrieve all non-archived goals in insertion order.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_active_goals(connection: &Connection) -> Result<Vec<Goal>, Error> {
    connection
        .prepare(
            "SELECT id, title, target_amount, deadline, image, additional_notes, archived, reminder
             FROM goal WHERE archived = 0 ORDER BY id ASC",
        )?
        .query_map([], map_goal_row)?
        .map(|maybe_goal| maybe_goal.map_err(|error| error.into()))
        .collect()
}

/// Retrieve all archived goals in insertion order.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_archived_goals(connection: &Connection) -> Result<Vec<Goal>, Error> {
    connection
        .prepare(
            "SELECT id, title, target_amount, deadline, image, additional_notes, archived, reminder
             FROM goal WHERE archived = 1 ORDER BY id ASC",
        )?
        .query_map([], map_goal_row)?
        .map(|maybe_goal| maybe_goal.map_err(|error| error.into()))
        .collect()
}

/// Create the goal table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL
/// error.
pub fn create_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS goal (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                target_amount REAL NOT NULL,
                deadline TEXT NOT NULL,
                image BLOB,
                additional_notes TEXT NOT NULL DEFAULT '',
                archived INTEGER NOT NULL DEFAULT 0,
                reminder INTEGER NOT NULL DEFAULT 0
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Goal.
pub fn map_goal_row(row: &Row) -> Result<Goal, rusqlite::Error> {
    let id = row.get(0)?;
    let title = row.get(1)?;
    let target_amount = row.get(2)?;
    let deadline = row.get(3)?;
    let image = row.get(4)?;
    let additional_notes = row.get(5)?;
    let archived = row.get(6)?;
    let reminder = row.get(7)?;

    Ok(Goal {
        id,
        title,
        target_amount,
        deadline,
        image,
        additional_notes,
        archived,
        reminder,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod new_goal_tests {
    use time::macros::date;

    use crate::Error;

    use super::NewGoal;

    #[test]
    fn new_fails_on_empty_title() {
        let result = NewGoal::new("", 100.0, date!(2026 - 12 - 31));

        assert_eq!(result, Err(Error::EmptyTitle));
    }

    #[test]
    fn new_fails_on_whitespace_title() {
        let result = NewGoal::new("\t \n", 100.0, date!(2026 - 12 - 31));

        assert_eq!(result, Err(Error::EmptyTitle));
    }

    #[test]
    fn new_fails_on_non_positive_target() {
        assert_eq!(
            NewGoal::new("Bike", 0.0, date!(2026 - 12 - 31)),
            Err(Error::InvalidTargetAmount)
        );
        assert_eq!(
            NewGoal::new("Bike", -10.0, date!(2026 - 12 - 31)),
            Err(Error::InvalidTargetAmount)
        );
        assert_eq!(
            NewGoal::new("Bike", f64::NAN, date!(2026 - 12 - 31)),
            Err(Error::InvalidTargetAmount)
        );
    }

    #[test]
    fn new_trims_title_and_rounds_target() {
        let new_goal = NewGoal::new("  Bike  ", 499.999, date!(2026 - 12 - 31)).unwrap();

        assert_eq!(new_goal.title, "Bike");
        assert_eq!(new_goal.target_amount, 500.0);
    }
}
