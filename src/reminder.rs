//! The recurring reminder contract between the core and the platform
//! notification scheduler.
//!
//! The core never schedules notifications itself. It records the user's
//! choice in the goal's reminder flag and tells the scheduler to start or
//! stop; how the scheduler arranges the recurring notification is the host
//! platform's concern.

use std::{
    collections::HashSet,
    sync::{Mutex, PoisonError},
};

use rusqlite::Connection;

use crate::{
    Error,
    database_id::GoalId,
    goal::{Goal, get_goal, update_goal},
};

/// Schedules and cancels recurring per-goal reminders.
///
/// Implementations are provided by the host shell (platform alarm or
/// notification service). All three operations are idempotent: scheduling
/// an already-scheduled reminder or stopping an already-stopped one is a
/// no-op.
pub trait ReminderScheduler: Send + Sync {
    /// Arrange a recurring future notification for the goal.
    fn schedule_reminder(&self, goal_id: GoalId);

    /// Cancel any scheduled notification for the goal.
    fn stop_reminder(&self, goal_id: GoalId);

    /// Whether a reminder is currently scheduled for the goal.
    fn is_reminder_set(&self, goal_id: GoalId) -> bool;
}

/// A [ReminderScheduler] that only tracks which reminders are set.
///
/// Used in tests and by headless hosts that have no platform scheduler to
/// delegate to.
#[derive(Debug, Default)]
pub struct InMemoryReminderScheduler {
    scheduled: Mutex<HashSet<GoalId>>,
}

impl ReminderScheduler for InMemoryReminderScheduler {
    fn schedule_reminder(&self, goal_id: GoalId) {
        self.scheduled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(goal_id);
    }

    fn stop_reminder(&self, goal_id: GoalId) {
        self.scheduled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&goal_id);
    }

    fn is_reminder_set(&self, goal_id: GoalId) -> bool {
        self.scheduled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&goal_id)
    }
}

/// Turn a goal's recurring reminder on or off.
///
/// Updates the stored reminder flag and tells the scheduler to start or
/// stop. Returns the updated goal.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the goal does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn set_goal_reminder(
    goal_id: GoalId,
    enabled: bool,
    connection: &Connection,
    scheduler: &dyn ReminderScheduler,
) -> Result<Goal, Error> {
    let mut goal = get_goal(goal_id, connection)?;

    goal.reminder = enabled;
    update_goal(&goal, connection)?;

    if enabled {
        scheduler.schedule_reminder(goal_id);
    } else {
        scheduler.stop_reminder(goal_id);
    }

    tracing::info!(
        "reminder for goal {} {}",
        goal_id,
        if enabled { "scheduled" } else { "stopped" }
    );

    Ok(goal)
}
