//! Home-screen widget to goal mapping.
//!
//! Each widget instance the host shell places on the home screen displays
//! exactly one goal. The mapping lives in its own table so deleting a goal
//! also cleans up any widgets that pointed at it (FK cascade); the shell
//! discovers the dangling widget on its next refresh and renders a
//! placeholder.

use rusqlite::Connection;

use crate::{
    Error,
    database_id::{AppWidgetId, GoalId},
};

/// Point a widget instance at a goal, replacing any previous binding.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `goal_id` does not refer to a valid goal,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn bind_widget(
    app_widget_id: AppWidgetId,
    goal_id: GoalId,
    connection: &Connection,
) -> Result<(), Error> {
    connection
        .execute(
            "INSERT OR REPLACE INTO widget_data (app_widget_id, goal_id) VALUES (?1, ?2)",
            (app_widget_id, goal_id),
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

    Ok(())
}

/// Look up the goal a widget instance displays.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the widget is not bound (or its goal was
///   deleted),
/// - or [Error::SqlError] if there is some other SQL error.
pub fn widget_goal(app_widget_id: AppWidgetId, connection: &Connection) -> Result<GoalId, Error> {
    let goal_id = connection
        .prepare("SELECT goal_id FROM widget_data WHERE app_widget_id = :id")?
        .query_one(&[(":id", &app_widget_id)], |row| row.get(0))?;

    Ok(goal_id)
}

/// Remove a widget instance's binding, e.g. when the user removes the
/// widget from their home screen.
///
/// Unbinding a widget that was never bound is a no-op.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn unbind_widget(app_widget_id: AppWidgetId, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM widget_data WHERE app_widget_id = ?1",
        [app_widget_id],
    )?;

    Ok(())
}

/// Create the widget_data table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL
/// error.
pub fn create_widget_data_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS widget_data (
            app_widget_id INTEGER PRIMARY KEY,
            goal_id INTEGER NOT NULL,
            FOREIGN KEY(goal_id) REFERENCES goal(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}
