//! # Level-filtered text logging sink.
//!
//! [`Logger`] writes one timestamped line per event to the console and/or an
//! append-mode log file. Errors go to stderr, everything else to stdout.
//!
//! ## Output format
//! ```text
//! [2025-11-04 09:12:44] [INFO] worker pool created, workers: 4, max: 8
//! [2025-11-04 09:12:44] [DEBUG] worker 0 started
//! [2025-11-04 09:12:45] [ERROR] task 'etl' timed out after 100ms
//! ```
//!
//! The level is runtime-adjustable via [`Logger::set_level`]; messages above
//! the configured level are dropped before formatting. [`LogLevel::None`]
//! silences the sink entirely.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::Mutex;

/// Verbosity threshold for the pool's log output.
///
/// Levels are ordered `None < Error < Warn < Info < Debug`; a message is
/// emitted when its level is at or below the configured threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    /// Log nothing.
    None = 0,
    /// Task failures, refused cancellations, lifecycle misuse.
    Error = 1,
    /// Currently unused by the pool itself; available to callers.
    Warn = 2,
    /// Construction, shutdown, pause/resume, resize, clear, cancel.
    Info = 3,
    /// Worker starts/exits, submissions, acquisitions, completions.
    Debug = 4,
}

impl LogLevel {
    fn from_u8(v: u8) -> LogLevel {
        match v {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::None => "NONE",
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        };
        f.write_str(s)
    }
}

/// Mutex-guarded output destinations.
struct Sink {
    console: bool,
    file: Option<File>,
}

/// Level-filtered, mutex-guarded text logger.
///
/// Cheap to share (`Arc<Logger>`); the level check happens before the sink
/// lock is taken, so filtered-out messages cost one relaxed atomic load.
pub struct Logger {
    level: AtomicU8,
    sink: Mutex<Sink>,
}

impl Logger {
    /// Creates a logger writing to the console and/or `log_file`.
    ///
    /// If the file cannot be opened the logger falls back to console-only
    /// output and reports the failure on stderr.
    pub fn new(level: LogLevel, console: bool, log_file: Option<&Path>) -> Self {
        let file = log_file.and_then(|path| {
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(f) => Some(f),
                Err(e) => {
                    if console {
                        eprintln!("cannot open log file {}: {e}", path.display());
                    }
                    None
                }
            }
        });

        Self {
            level: AtomicU8::new(level as u8),
            sink: Mutex::new(Sink { console, file }),
        }
    }

    /// Changes the verbosity threshold.
    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    /// Returns the current verbosity threshold.
    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Emits `message` at `level`, if the threshold allows it.
    pub fn log(&self, level: LogLevel, message: &str) {
        let threshold = self.level.load(Ordering::Relaxed);
        if threshold == LogLevel::None as u8 || level as u8 > threshold || level == LogLevel::None {
            return;
        }

        let line = format!(
            "[{}] [{level}] {message}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );

        let mut sink = self.sink.lock();
        if sink.console {
            if level == LogLevel::Error {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        }
        if let Some(file) = sink.file.as_mut() {
            // Write failures are swallowed; the log file is best-effort.
            let _ = writeln!(file, "{line}");
        }
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }
}
