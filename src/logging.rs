//! Logging setup and console formatting helpers
//!
//! Diagnostics go through `tracing`; the subscriber writes to stderr so
//! demo output on stdout stays clean. Task progress lines use the
//! `[hh:mm:ss]` prefix produced by [`timestamp`].

use std::time::{Duration, SystemTime};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over `level` when set. Calling this twice is harmless.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Wall-clock time of day (UTC) as `hh:mm:ss`.
pub fn timestamp() -> String {
    let now = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
    let secs = now.as_secs() % 86400;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Format duration for display
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{} ms", millis)
    } else {
        format!("{:.2} s", duration.as_secs_f64())
    }
}

/// Clear the terminal screen
pub fn clear_screen() {
    print!("\x1B[2J\x1B[1;1H");
}
