use std::io;

use tracing::Level;
use tracing_subscriber::fmt;

/// Accepted values for `--log`.
pub const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Installs a stderr subscriber. Without a level nothing is logged.
pub fn init(level: Option<Level>) {
    if let Some(level) = level {
        let format = fmt::format().without_time().with_target(false).compact();
        fmt()
            .with_max_level(level)
            .event_format(format)
            .with_writer(io::stderr)
            .init();
    }
}
