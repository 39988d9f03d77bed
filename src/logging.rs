//! Logging setup for host applications.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// The host shell calls this once at process start. The filter is read from
/// the `RUST_LOG` environment variable and falls back to `info`. Calling
/// this again after a subscriber is installed is a no-op, so embedded and
/// test processes may call it freely.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::init;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }
}
