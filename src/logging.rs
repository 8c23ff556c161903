/// Structured logging for hydraulic analysis runs
///
/// Provides context-rich logging tagged with the solver component and,
/// where relevant, the link or node label being solved. Supports console
/// output and file-based logging for long routing runs.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;

use crate::model::HydraulicError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
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

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// The part of the crate a message originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Section,
    Reach,
    Weir,
    Network,
    Steady,
    Routing,
    Hydrology,
    Data,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Section => write!(f, "SECTION"),
            Component::Reach => write!(f, "REACH"),
            Component::Weir => write!(f, "WEIR"),
            Component::Network => write!(f, "NET"),
            Component::Steady => write!(f, "HGL"),
            Component::Routing => write!(f, "ROUTE"),
            Component::Hydrology => write!(f, "HYDRO"),
            Component::Data => write!(f, "DATA"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Geometry, flow, and boundary combine into a regime the solver cannot bracket
    Expected,
    /// Bad input or a solver that stopped short of its tolerance
    Unexpected,
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
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

    fn log(&self, level: LogLevel, component: Component, label: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

        let label_part = label.map(|s| format!(" [{}]", s)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp, level, component, label_part, message
        );

        if self.console_timestamps {
            match level {
                LogLevel::Error => eprintln!("{}", log_entry),
                LogLevel::Warning => eprintln!("   {}", log_entry),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, label_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, label_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {}
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
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

fn emit(level: LogLevel, component: Component, label: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, component, label, message);
        }
    }
}

pub fn info(component: Component, label: Option<&str>, message: &str) {
    emit(LogLevel::Info, component, label, message);
}

pub fn warn(component: Component, label: Option<&str>, message: &str) {
    emit(LogLevel::Warning, component, label, message);
}

pub fn error(component: Component, label: Option<&str>, message: &str) {
    emit(LogLevel::Error, component, label, message);
}

pub fn debug(component: Component, label: Option<&str>, message: &str) {
    emit(LogLevel::Debug, component, label, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a solver failure by its error variant
pub fn classify_solver_failure(err: &HydraulicError) -> FailureType {
    match err {
        // The flow/geometry combination is outside the solvable regime
        HydraulicError::BoundNotFound { .. } | HydraulicError::NoSignChange { .. } => {
            FailureType::Expected
        }
        HydraulicError::NotConverged { .. }
        | HydraulicError::SameEndpoints { .. }
        | HydraulicError::InvalidOption { .. }
        | HydraulicError::InvalidGeometry(_)
        | HydraulicError::MissingRoughness
        | HydraulicError::UnknownNode(_)
        | HydraulicError::UnknownLink(_) => FailureType::Unexpected,
        _ => FailureType::Unknown,
    }
}

/// Log a solver failure with automatic classification
pub fn log_solver_failure(
    component: Component,
    label: Option<&str>,
    operation: &str,
    err: &HydraulicError,
) {
    let failure_type = classify_solver_failure(err);
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Expected => warn(component, label, &message),
        FailureType::Unexpected => error(component, label, &message),
        FailureType::Unknown => warn(component, label, &message),
    }
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of an analysis run
pub fn log_run_summary(component: Component, total: usize, solved: usize, failed: usize) {
    let message = format!(
        "Analysis complete: {}/{} links solved, {} failed",
        solved, total, failed
    );

    if failed == 0 {
        info(component, None, &message);
    } else if solved == 0 {
        error(component, None, &message);
    } else {
        warn(component, None, &message);
    }
}
