//! Structured logging for the auto-fire planner
//!
//! Provides context-rich logging with station/basin identifiers,
//! timestamps, and severity levels. Supports both console output
//! and file-based logging for unattended ship-side operation.

use chrono::Utc;
use serde::Deserialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// The part of the system a log line originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    StationBasin,
    PressureMatrix,
    BottleOrder,
    Planner,
    Acquisition,
    Launcher,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::StationBasin => write!(f, "STATIONS"),
            Component::PressureMatrix => write!(f, "PRESSURES"),
            Component::BottleOrder => write!(f, "BTLORDER"),
            Component::Planner => write!(f, "AUTOFIRE"),
            Component::Acquisition => write!(f, "SEASAVE"),
            Component::Launcher => write!(f, "LAUNCH"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn format_entry(level: LogLevel, component: Component, subject: Option<&str>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let subject_part = subject.map(|s| format!(" [{}]", s)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, component, subject_part, message)
    }

    fn log(&self, level: LogLevel, component: Component, subject: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, component, subject, message);
        let subject_part = subject.map(|s| format!(" [{}]", s)).unwrap_or_default();

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, subject_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, subject_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, component: Component, subject: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, component, subject, message);
        }
    }
}

/// Log a general informational message
pub fn info(component: Component, subject: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, component, subject, message);
}

/// Log a warning message
pub fn warn(component: Component, subject: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, component, subject, message);
}

/// Log an error message
pub fn error(component: Component, subject: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, component, subject, message);
}

/// Log a debug message
pub fn debug(component: Component, subject: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, component, subject, message);
}

// ---------------------------------------------------------------------------
// Load Summary Logging
// ---------------------------------------------------------------------------

/// Log the outcome of loading a reference table
pub fn log_load_summary(component: Component, path: &str, kept: usize, skipped: usize) {
    let message = format!(
        "Loaded {}: {} rows kept, {} skipped",
        path,
        kept,
        skipped
    );

    if kept == 0 {
        error(component, None, &message);
    } else if skipped > 0 {
        warn(component, None, &message);
    } else {
        info(component, None, &message);
    }
}
