// src/logging.rs

//! Logging for `hotreload`.
//!
//! Two layers:
//! - Process diagnostics go through `tracing`. [`init_logging`] installs a
//!   `tracing-subscriber` fmt subscriber on stderr. Level priority:
//!   1. `--log-level` CLI flag (if provided)
//!   2. `HOTRELOAD_LOG` environment variable (e.g. "info", "debug")
//!   3. default to `info`
//! - User-facing messages (the "log view") go through [`LogSink`], which
//!   timestamps each line, keeps a bounded history and forwards it to an
//!   optional callback.

use std::collections::VecDeque;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;

use anyhow::Result;
use tracing_subscriber::fmt as tracing_fmt;

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "HOTRELOAD_LOG";

/// Timestamp format of [`LogSink`] lines.
pub const TIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

const DEFAULT_HISTORY: usize = 1000;

/// Initialise the global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var(LOG_ENV)
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    tracing_fmt()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

pub(crate) fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

/// Callback receiving each formatted log line.
pub type LogCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Sink for user-facing, one-line messages.
///
/// Never fails: a panicking callback is caught and ignored so that a broken
/// log consumer cannot take down the reload path.
pub struct LogSink {
    callback: Option<LogCallback>,
    history: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink")
            .field("has_callback", &self.callback.is_some())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(None)
    }
}

impl LogSink {
    pub fn new(callback: Option<LogCallback>) -> Self {
        Self {
            callback,
            history: Mutex::new(VecDeque::new()),
            capacity: DEFAULT_HISTORY,
        }
    }

    pub fn with_callback(callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self::new(Some(Box::new(callback)))
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Timestamp `msg`, record it and hand it to the callback.
    /// Returns the formatted line.
    pub fn log(&self, msg: &str) -> String {
        let now = chrono::Local::now().format(TIME_FMT);
        let line = format!("{now} - {msg}");
        tracing::debug!(target: "hotreload::log_view", "{line}");

        if let Ok(mut history) = self.history.lock() {
            if history.len() == self.capacity {
                history.pop_front();
            }
            history.push_back(line.clone());
        }

        if let Some(cb) = &self.callback {
            if catch_unwind(AssertUnwindSafe(|| cb(&line))).is_err() {
                tracing::warn!("log callback panicked; message dropped");
            }
        }
        line
    }

    /// Lines logged so far, oldest first.
    pub fn history(&self) -> Vec<String> {
        match self.history.lock() {
            Ok(h) => h.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Most recent line, if any.
    pub fn last(&self) -> Option<String> {
        self.history.lock().ok().and_then(|h| h.back().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn lines_are_timestamped() {
        let sink = LogSink::default();
        let line = sink.log("hello");
        // "YYYY-MM-DD HH:MM:SS - hello"
        assert_eq!(line.len(), 19 + " - hello".len());
        assert!(line.ends_with(" - hello"));
        assert_eq!(sink.last().as_deref(), Some(line.as_str()));
    }

    #[test]
    fn callback_receives_lines() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = Arc::clone(&seen);
        let sink = LogSink::with_callback(move |l| seen2.lock().unwrap().push(l.to_string()));
        sink.log("one");
        sink.log("two");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[1].ends_with("two"));
    }

    #[test]
    fn panicking_callback_is_swallowed() {
        let sink = LogSink::with_callback(|_| panic!("broken consumer"));
        sink.log("still fine");
        assert_eq!(sink.history().len(), 1);
    }

    #[test]
    fn history_is_bounded() {
        let sink = LogSink::default().with_capacity(2);
        sink.log("a");
        sink.log("b");
        sink.log("c");
        let h = sink.history();
        assert_eq!(h.len(), 2);
        assert!(h[0].ends_with("b"));
    }

    #[test]
    fn level_strings() {
        assert_eq!(parse_level_str(" Warning "), Some(tracing::Level::WARN));
        assert_eq!(parse_level_str("verbose"), None);
    }
}
