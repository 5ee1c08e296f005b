// A minimal stderr logger for the `log` facade. Every line looks like
// `timestamp|LEVEL|file:line: message`.

use std::{
    path::{Path, PathBuf},
    sync::{LazyLock, Mutex},
};

use {jiff::tz::TimeZone, log::Log};

use crate::style::Theme;

/// Writes every record it is given to stderr.
///
/// Filtering happens through `log::set_max_level` only.
#[derive(Debug)]
pub struct Logger {
    tz: Mutex<Option<TimeZone>>,
}

impl Logger {
    /// Install a new logger as the global logger.
    ///
    /// Timestamps are in UTC until `set_time_zone` is called.
    pub fn init() -> Result<&'static Logger, log::SetLoggerError> {
        let logger = Box::leak(Box::new(Logger { tz: Mutex::new(None) }));
        log::set_logger(logger)?;
        Ok(logger)
    }

    pub fn set_time_zone(&self, tz: TimeZone) {
        *self.tz.lock().unwrap() = Some(tz);
    }

    fn timestamp(&self) -> String {
        // `Zoned::now()` could read the system time zone and log while
        // doing so, which would recurse back into this logger.
        let ts = jiff::Timestamp::now();
        match self.tz.lock().unwrap().clone() {
            None => ts.to_string(),
            Some(tz) => ts.to_zoned(tz).to_string(),
        }
    }
}

impl Log for Logger {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        let theme = Theme::stderr();
        let now = theme.timestamp(self.timestamp());
        let level = theme.level(record.level());
        match (record.file(), record.line()) {
            (Some(file), Some(line)) => eprintln!(
                "{now}|{level}|{}:{line}: {}",
                relative(file),
                record.args(),
            ),
            (Some(file), None) => eprintln!(
                "{now}|{level}|{}: {}",
                relative(file),
                record.args(),
            ),
            _ => eprintln!("{now}|{level}: {}", record.args()),
        }
    }

    fn flush(&self) {}
}

fn relative(path: &str) -> &str {
    static CWD: LazyLock<Option<PathBuf>> =
        LazyLock::new(|| std::env::current_dir().ok());

    let Some(cwd) = CWD.as_deref() else { return path };
    Path::new(path)
        .strip_prefix(cwd)
        .ok()
        .and_then(|p| p.to_str())
        .unwrap_or(path)
}
