//! Process-wide app-lock session state.
//!
//! The session is an explicit object owned by the host's top-level
//! navigation controller rather than a global mutable flag. Its lifetime is
//! tied to the process: a new session starts locked iff the app-lock
//! preference is enabled, and the host drives the unlock transition after
//! the platform authentication prompt succeeds.

use crate::preferences::Preferences;

/// Whether the app is currently locked behind the platform authentication
/// prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    locked: bool,
}

impl Session {
    /// Start a session at process launch.
    pub fn start(preferences: &Preferences) -> Self {
        Self {
            locked: preferences.app_lock,
        }
    }

    /// Whether the UI should show the lock screen.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Mark the session unlocked after successful authentication.
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Re-lock the session, e.g. when the app is backgrounded.
    pub fn lock(&mut self) {
        self.locked = true;
    }
}
