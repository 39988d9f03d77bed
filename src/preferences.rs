//! Persisted user preferences.
//!
//! Preferences are simple key/value rows in the same database as the goal
//! data, read through a typed snapshot. Missing keys fall back to defaults,
//! so a fresh install needs no seeding step.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::format_description;

use crate::Error;

/// The default currency code shown next to amounts.
pub const DEFAULT_CURRENCY: &str = "USD";

/// The default deadline display format.
pub const DEFAULT_DATE_FORMAT: &str = "[day]/[month]/[year]";

const CURRENCY_KEY: &str = "currency";
const DATE_FORMAT_KEY: &str = "date_format";
const THEME_KEY: &str = "theme";
const APP_LOCK_KEY: &str = "app_lock";

/// The app's colour theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    /// Always light.
    Light,
    /// Always dark.
    Dark,
    /// Follow the platform setting.
    #[default]
    System,
}

impl Theme {
    /// The persisted string representation of the theme.
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
            Theme::System => "System",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "Light" => Some(Theme::Light),
            "Dark" => Some(Theme::Dark),
            "System" => Some(Theme::System),
            _ => None,
        }
    }
}

/// A typed snapshot of the stored preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Currency code shown next to amounts, e.g. `"USD"`.
    pub currency: String,
    /// Deadline display format as a format description, e.g.
    /// `"[day]/[month]/[year]"`.
    pub date_format: String,
    /// The app's colour theme.
    pub theme: Theme,
    /// Whether the app requires unlocking on launch.
    pub app_lock: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            theme: Theme::default(),
            app_lock: false,
        }
    }
}

/// Load the stored preferences, falling back to defaults for missing keys.
///
/// An unrecognised stored theme name falls back to the default theme rather
/// than failing the whole snapshot.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn load_preferences(connection: &Connection) -> Result<Preferences, Error> {
    let defaults = Preferences::default();

    let theme = match get(THEME_KEY, connection)? {
        Some(name) => Theme::from_name(&name).unwrap_or_else(|| {
            tracing::warn!("unrecognised stored theme \"{}\", using default", name);
            Theme::default()
        }),
        None => defaults.theme,
    };

    Ok(Preferences {
        currency: get(CURRENCY_KEY, connection)?.unwrap_or(defaults.currency),
        date_format: get(DATE_FORMAT_KEY, connection)?.unwrap_or(defaults.date_format),
        theme,
        app_lock: get(APP_LOCK_KEY, connection)?
            .map(|value| value == "true")
            .unwrap_or(defaults.app_lock),
    })
}

/// Store the currency code shown next to amounts.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn set_currency(code: &str, connection: &Connection) -> Result<(), Error> {
    set(CURRENCY_KEY, code, connection)
}

/// Store the deadline display format.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidDateFormat] if `format` is not a valid format
///   description,
/// - or [Error::SqlError] if there is an SQL error.
pub fn set_date_format(format: &str, connection: &Connection) -> Result<(), Error> {
    format_description::parse(format).map_err(|_| Error::InvalidDateFormat(format.to_string()))?;

    set(DATE_FORMAT_KEY, format, connection)
}

/// Store the app theme.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn set_theme(theme: Theme, connection: &Connection) -> Result<(), Error> {
    set(THEME_KEY, theme.as_str(), connection)
}

/// Store whether the app requires unlocking on launch.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn set_app_lock(enabled: bool, connection: &Connection) -> Result<(), Error> {
    set(APP_LOCK_KEY, if enabled { "true" } else { "false" }, connection)
}

/// Create the preference table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL
/// error.
pub fn create_preference_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS preference (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

fn get(key: &str, connection: &Connection) -> Result<Option<String>, Error> {
    let mut statement = connection.prepare("SELECT value FROM preference WHERE key = :key")?;
    let mut rows = statement.query_map(&[(":key", &key)], |row| row.get(0))?;

    match rows.next() {
        Some(value) => Ok(Some(value?)),
        None => Ok(None),
    }
}

fn set(key: &str, value: &str, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO preference (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (key, value),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize};

    use super::{
        DEFAULT_CURRENCY, DEFAULT_DATE_FORMAT, Theme, load_preferences, set_app_lock,
        set_currency, set_date_format, set_theme,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn fresh_database_yields_defaults() {
        let conn = get_test_connection();

        let preferences = load_preferences(&conn).unwrap();

        assert_eq!(preferences.currency, DEFAULT_CURRENCY);
        assert_eq!(preferences.date_format, DEFAULT_DATE_FORMAT);
        assert_eq!(preferences.theme, Theme::System);
        assert!(!preferences.app_lock);
    }

    #[test]
    fn stored_values_round_trip() {
        let conn = get_test_connection();

        set_currency("EUR", &conn).unwrap();
        set_date_format("[year]-[month]-[day]", &conn).unwrap();
        set_theme(Theme::Dark, &conn).unwrap();
        set_app_lock(true, &conn).unwrap();

        let preferences = load_preferences(&conn).unwrap();
        assert_eq!(preferences.currency, "EUR");
        assert_eq!(preferences.date_format, "[year]-[month]-[day]");
        assert_eq!(preferences.theme, Theme::Dark);
        assert!(preferences.app_lock);
    }

    #[test]
    fn setting_a_key_twice_keeps_the_latest_value() {
        let conn = get_test_connection();

        set_currency("EUR", &conn).unwrap();
        set_currency("INR", &conn).unwrap();

        assert_eq!(load_preferences(&conn).unwrap().currency, "INR");
    }

    #[test]
    fn invalid_date_format_is_rejected() {
        let conn = get_test_connection();

        let result = set_date_format("[not-a-real-component]", &conn);

        assert_eq!(
            result,
            Err(Error::InvalidDateFormat("[not-a-real-component]".to_string()))
        );
        // The stored format is untouched.
        assert_eq!(load_preferences(&conn).unwrap().date_format, DEFAULT_DATE_FORMAT);
    }

    #[test]
    fn unknown_stored_theme_falls_back_to_default() {
        let conn = get_test_connection();
        conn.execute(
            "INSERT INTO preference (key, value) VALUES ('theme', 'Sepia')",
            (),
        )
        .unwrap();

        assert_eq!(load_preferences(&conn).unwrap().theme, Theme::System);
    }
}
