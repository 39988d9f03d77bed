//! Implements the shared state a host shell drives the core through.
//!
//! [AppState] owns the database connection, the change bus, and the
//! reminder scheduler handle. Its async methods run all store work on a
//! background blocking context and publish a change event for every
//! committed mutation, so a host can treat each method as fire-and-forget
//! with a completion result. There is no cancellation of in-flight store
//! work and no automatic retry; a failed write surfaces its error once.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::OffsetDateTime;
use tokio::task;

use crate::{
    Error,
    backup::{self, BackupData},
    database_id::{AppWidgetId, GoalId},
    db,
    goal::{self, Goal, GoalWithProgress, NewGoal, Progress},
    ledger::{self, DepositOutcome, Transaction},
    observe::{ChangeBus, ChangeEvent},
    preferences::{self, Preferences, Theme},
    reminder::{ReminderScheduler, set_goal_reminder},
    widget,
};

/// The shared state of the application core.
#[derive(Clone)]
pub struct AppState {
    /// The database connection.
    db_connection: Arc<Mutex<Connection>>,
    /// Fans committed mutations out to observers.
    change_bus: ChangeBus,
    /// The host's reminder scheduler.
    reminders: Arc<dyn ReminderScheduler>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection and the
    /// host's reminder scheduler.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        reminders: Arc<dyn ReminderScheduler>,
    ) -> Result<Self, Error> {
        db::initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            change_bus: ChangeBus::default(),
            reminders,
        })
    }

    /// The bus observers subscribe to for change events, e.g. to build a
    /// [crate::LiveQuery].
    pub fn change_bus(&self) -> &ChangeBus {
        &self.change_bus
    }

    /// Run a store operation on the background blocking context.
    async fn run<T, F>(&self, operation: F) -> Result<T, Error>
    where
        F: FnOnce(&Connection) -> Result<T, Error> + Send + 'static,
        T: Send + 'static,
    {
        let db_connection = Arc::clone(&self.db_connection);

        task::spawn_blocking(move || {
            let connection = db_connection.lock().map_err(|_| Error::DatabaseLockError)?;
            operation(&connection)
        })
        .await
        .expect("store operation panicked")
    }

    // ========================================================================
    // GOALS
    // ========================================================================

    /// Create a new goal and return it with its generated ID.
    pub async fn create_goal(&self, new_goal: NewGoal) -> Result<Goal, Error> {
        let goal = self
            .run(move |connection| goal::create_goal(new_goal, connection))
            .await?;

        self.change_bus.publish(ChangeEvent::Goals);

        Ok(goal)
    }

    /// Retrieve a goal by its ID.
    pub async fn goal(&self, id: GoalId) -> Result<Goal, Error> {
        self.run(move |connection| goal::get_goal(id, connection))
            .await
    }

    /// Replace a goal record, keyed by its ID.
    pub async fn update_goal(&self, goal: Goal) -> Result<(), Error> {
        self.run(move |connection| goal::update_goal(&goal, connection))
            .await?;

        self.change_bus.publish(ChangeEvent::Goals);

        Ok(())
    }

    /// Delete a goal, its transactions, and its widget bindings, and stop
    /// its reminder.
    pub async fn delete_goal(&self, id: GoalId) -> Result<(), Error> {
        self.run(move |connection| goal::delete_goal(id, connection))
            .await?;

        self.reminders.stop_reminder(id);
        self.change_bus.publish(ChangeEvent::Goals);
        self.change_bus.publish(ChangeEvent::Ledger(id));
        self.change_bus.publish(ChangeEvent::Widgets);

        Ok(())
    }

    /// All non-archived goals with derived progress, in insertion order.
    pub async fn active_goals(&self) -> Result<Vec<GoalWithProgress>, Error> {
        self.run(goal::active_goals_with_progress).await
    }

    /// All archived goals with derived progress, in insertion order.
    pub async fn archived_goals(&self) -> Result<Vec<GoalWithProgress>, Error> {
        self.run(goal::archived_goals_with_progress).await
    }

    /// Archive a goal and stop its reminder.
    pub async fn archive_goal(&self, id: GoalId) -> Result<Goal, Error> {
        let reminders = Arc::clone(&self.reminders);
        let goal = self
            .run(move |connection| goal::archive_goal(id, connection, reminders.as_ref()))
            .await?;

        self.change_bus.publish(ChangeEvent::Goals);

        Ok(goal)
    }

    /// Restore an archived goal, rescheduling its reminder iff the reminder
    /// flag is set.
    pub async fn restore_goal(&self, id: GoalId) -> Result<Goal, Error> {
        let reminders = Arc::clone(&self.reminders);
        let goal = self
            .run(move |connection| goal::restore_goal(id, connection, reminders.as_ref()))
            .await?;

        self.change_bus.publish(ChangeEvent::Goals);

        Ok(goal)
    }

    /// Turn a goal's recurring reminder on or off.
    pub async fn set_reminder(&self, id: GoalId, enabled: bool) -> Result<Goal, Error> {
        let reminders = Arc::clone(&self.reminders);
        let goal = self
            .run(move |connection| {
                set_goal_reminder(id, enabled, connection, reminders.as_ref())
            })
            .await?;

        self.change_bus.publish(ChangeEvent::Goals);

        Ok(goal)
    }

    /// A goal's progress, derived from its ledger.
    pub async fn progress(&self, id: GoalId) -> Result<Progress, Error> {
        self.run(move |connection| goal::goal_progress(id, connection))
            .await
    }

    // ========================================================================
    // LEDGER
    // ========================================================================

    /// Deposit money towards a goal.
    ///
    /// The returned outcome carries the one-time goal-achieved signal.
    pub async fn deposit(
        &self,
        goal_id: GoalId,
        amount: &str,
        timestamp: OffsetDateTime,
        notes: &str,
    ) -> Result<DepositOutcome, Error> {
        let amount = amount.to_string();
        let notes = notes.to_string();
        let outcome = self
            .run(move |connection| {
                ledger::deposit(goal_id, &amount, timestamp, &notes, connection)
            })
            .await?;

        self.change_bus.publish(ChangeEvent::Ledger(goal_id));

        Ok(outcome)
    }

    /// Withdraw money from a goal.
    pub async fn withdraw(
        &self,
        goal_id: GoalId,
        amount: &str,
        timestamp: OffsetDateTime,
        notes: &str,
    ) -> Result<Transaction, Error> {
        let amount = amount.to_string();
        let notes = notes.to_string();
        let transaction = self
            .run(move |connection| {
                ledger::withdraw(goal_id, &amount, timestamp, &notes, connection)
            })
            .await?;

        self.change_bus.publish(ChangeEvent::Ledger(goal_id));

        Ok(transaction)
    }

    /// A goal's transactions, ordered by timestamp.
    pub async fn transactions(&self, goal_id: GoalId) -> Result<Vec<Transaction>, Error> {
        self.run(move |connection| ledger::transactions_for_goal(goal_id, connection))
            .await
    }

    // ========================================================================
    // WIDGETS
    // ========================================================================

    /// Point a widget instance at a goal.
    pub async fn bind_widget(
        &self,
        app_widget_id: AppWidgetId,
        goal_id: GoalId,
    ) -> Result<(), Error> {
        self.run(move |connection| widget::bind_widget(app_widget_id, goal_id, connection))
            .await?;

        self.change_bus.publish(ChangeEvent::Widgets);

        Ok(())
    }

    /// The goal a widget instance displays.
    pub async fn widget_goal(&self, app_widget_id: AppWidgetId) -> Result<GoalId, Error> {
        self.run(move |connection| widget::widget_goal(app_widget_id, connection))
            .await
    }

    /// Remove a widget instance's binding.
    pub async fn unbind_widget(&self, app_widget_id: AppWidgetId) -> Result<(), Error> {
        self.run(move |connection| widget::unbind_widget(app_widget_id, connection))
            .await?;

        self.change_bus.publish(ChangeEvent::Widgets);

        Ok(())
    }

    // ========================================================================
    // PREFERENCES AND BACKUP
    // ========================================================================

    /// The stored preferences, with defaults for missing keys.
    pub async fn preferences(&self) -> Result<Preferences, Error> {
        self.run(preferences::load_preferences).await
    }

    /// Store the currency code shown next to amounts.
    pub async fn set_currency(&self, code: &str) -> Result<(), Error> {
        let code = code.to_string();
        self.run(move |connection| preferences::set_currency(&code, connection))
            .await?;

        self.change_bus.publish(ChangeEvent::Preferences);

        Ok(())
    }

    /// Store the deadline display format.
    pub async fn set_date_format(&self, format: &str) -> Result<(), Error> {
        let format = format.to_string();
        self.run(move |connection| preferences::set_date_format(&format, connection))
            .await?;

        self.change_bus.publish(ChangeEvent::Preferences);

        Ok(())
    }

    /// Store the app theme.
    pub async fn set_theme(&self, theme: Theme) -> Result<(), Error> {
        self.run(move |connection| preferences::set_theme(theme, connection))
            .await?;

        self.change_bus.publish(ChangeEvent::Preferences);

        Ok(())
    }

    /// Store whether the app requires unlocking on launch.
    pub async fn set_app_lock(&self, enabled: bool) -> Result<(), Error> {
        self.run(move |connection| preferences::set_app_lock(enabled, connection))
            .await?;

        self.change_bus.publish(ChangeEvent::Preferences);

        Ok(())
    }

    /// Export all goals, their ledgers, and the preference snapshot as
    /// JSON.
    pub async fn export_backup(&self) -> Result<String, Error> {
        self.run(|connection| {
            let data = backup::export_backup(connection)?;
            data.to_json()
        })
        .await
    }

    /// Import a JSON backup, recreating its goals and ledgers with fresh
    /// IDs. Returns the number of goals restored.
    pub async fn import_backup(&self, json: &str) -> Result<usize, Error> {
        let json = json.to_string();
        let restored = self
            .run(move |connection| {
                let data = BackupData::from_json(&json)?;
                backup::import_backup(data, connection)
            })
            .await?;

        self.change_bus.publish(ChangeEvent::Goals);
        self.change_bus.publish(ChangeEvent::Preferences);

        Ok(restored)
    }
}
