//! Savings goal management.
//!
//! This module contains everything related to goals:
//! - The `Goal` model and validated `NewGoal` input for creating goals
//! - Database functions for storing, querying, and deleting goals
//! - Archive/restore transitions and their reminder side effects
//! - Derived progress (saved amount, remaining amount, achieved state)

mod archive;
mod core;
mod progress;

pub use archive::{archive_goal, restore_goal};
pub use core::{
    Goal, NewGoal, create_goal, create_goal_table, delete_goal, format_deadline, get_active_goals,
    get_archived_goals, get_goal, map_goal_row, parse_deadline, update_goal,
};
pub use progress::{
    GoalWithProgress, Progress, active_goals_with_progress, archived_goals_with_progress,
    goal_progress, saved_amount,
};
