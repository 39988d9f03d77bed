//! Archive and restore transitions for goals.
//!
//! Archiving hides a goal from the active list while retaining its full
//! transaction history. An archived goal's reminder is stopped; restoring
//! the goal reschedules the reminder iff the stored reminder flag is set.

use rusqlite::Connection;

use crate::{
    Error,
    database_id::GoalId,
    goal::core::{Goal, get_goal, update_goal},
    reminder::ReminderScheduler,
};

/// Archive a goal and stop its reminder.
///
/// Returns the updated goal.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the goal does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn archive_goal(
    id: GoalId,
    connection: &Connection,
    scheduler: &dyn ReminderScheduler,
) -> Result<Goal, Error> {
    let mut goal = get_goal(id, connection)?;

    goal.archived = true;
    update_goal(&goal, connection)?;
    scheduler.stop_reminder(id);

    tracing::info!("archived goal {}", id);

    Ok(goal)
}

/// Restore an archived goal to the active list.
///
/// The reminder is rescheduled iff the goal's reminder flag was set when it
/// was archived.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the goal does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn restore_goal(
    id: GoalId,
    connection: &Connection,
    scheduler: &dyn ReminderScheduler,
) -> Result<Goal, Error> {
    let mut goal = get_goal(id, connection)?;

    goal.archived = false;
    update_goal(&goal, connection)?;

    if goal.reminder {
        scheduler.schedule_reminder(id);
    }

    tracing::info!("restored goal {}", id);

    Ok(goal)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        goal::core::{NewGoal, create_goal, get_active_goals, get_archived_goals},
        reminder::{InMemoryReminderScheduler, ReminderScheduler, set_goal_reminder},
    };

    use super::{archive_goal, restore_goal};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn archive_moves_goal_to_archived_list() {
        let conn = get_test_connection();
        let scheduler = InMemoryReminderScheduler::default();
        let goal = create_goal(
            NewGoal::new("Car", 5000.0, date!(2027 - 01 - 01)).unwrap(),
            &conn,
        )
        .unwrap();

        let archived = archive_goal(goal.id, &conn, &scheduler).unwrap();

        assert!(archived.archived);
        assert!(get_active_goals(&conn).unwrap().is_empty());
        assert_eq!(get_archived_goals(&conn).unwrap(), vec![archived]);
    }

    #[test]
    fn restore_moves_goal_back_to_active_list() {
        let conn = get_test_connection();
        let scheduler = InMemoryReminderScheduler::default();
        let goal = create_goal(
            NewGoal::new("Car", 5000.0, date!(2027 - 01 - 01)).unwrap(),
            &conn,
        )
        .unwrap();
        archive_goal(goal.id, &conn, &scheduler).unwrap();

        let restored = restore_goal(goal.id, &conn, &scheduler).unwrap();

        assert!(!restored.archived);
        assert_eq!(get_active_goals(&conn).unwrap(), vec![restored]);
        assert!(get_archived_goals(&conn).unwrap().is_empty());
    }

    #[test]
    fn archive_stops_reminder_and_restore_reschedules_it() {
        let conn = get_test_connection();
        let scheduler = InMemoryReminderScheduler::default();
        let goal = create_goal(
            NewGoal::new("Car", 5000.0, date!(2027 - 01 - 01)).unwrap(),
            &conn,
        )
        .unwrap();
        set_goal_reminder(goal.id, true, &conn, &scheduler).unwrap();
        assert!(scheduler.is_reminder_set(goal.id));

        archive_goal(goal.id, &conn, &scheduler).unwrap();
        assert!(!scheduler.is_reminder_set(goal.id));

        restore_goal(goal.id, &conn, &scheduler).unwrap();
        assert!(scheduler.is_reminder_set(goal.id));
    }

    #[test]
    fn restore_without_reminder_flag_does_not_reschedule() {
        let conn = get_test_connection();
        let scheduler = InMemoryReminderScheduler::default();
        let goal = create_goal(
            NewGoal::new("Car", 5000.0, date!(2027 - 01 - 01)).unwrap(),
            &conn,
        )
        .unwrap();

        archive_goal(goal.id, &conn, &scheduler).unwrap();
        restore_goal(goal.id, &conn, &scheduler).unwrap();

        assert!(!scheduler.is_reminder_set(goal.id));
    }

    #[test]
    fn archive_missing_goal_returns_not_found() {
        let conn = get_test_connection();
        let scheduler = InMemoryReminderScheduler::default();

        let result = archive_goal(404, &conn, &scheduler);

        assert_eq!(result.unwrap_err(), Error::NotFound);
    }
}
