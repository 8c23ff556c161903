//! Solver and logging settings.
//!
//! Settings come from a TOML file (every section optional) and may be
//! overridden from the process environment after a `.env` file is loaded.
//!
//! ```toml
//! [solver]
//! max_iterations = 200
//!
//! [logging]
//! level = "debug"
//! file = "drainflo.log"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::logging::{self, LogLevel};
use crate::model::{DataError, DataResult};

// ---------------------------------------------------------------------------
// Solver settings
// ---------------------------------------------------------------------------

/// Numeric controls shared by every root-finding call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Absolute tolerance on the bracket width.
    pub x_tolerance: f64,
    /// Relative tolerance on the bracket width.
    pub r_tolerance: f64,
    /// Bisection iteration cap.
    pub max_iterations: usize,
    /// Number of trial values scanned while searching for a bracket.
    pub trial_budget: usize,
    /// Residual a trial must exceed to close a scanned bracket.
    pub bracket_threshold: f64,
    /// Smallest depth (or flow) used as a lower bracket.
    pub lower_bound: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            x_tolerance: 2e-12,
            r_tolerance: 4.0 * f64::EPSILON,
            max_iterations: 100,
            trial_budget: 100,
            bracket_threshold: 1.0,
            lower_bound: 1e-12,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            console_timestamps: false,
        }
    }
}

impl LogSettings {
    pub fn log_level(&self) -> DataResult<LogLevel> {
        self.level
            .parse()
            .map_err(|_| DataError::Config(format!("unknown log level '{}'", self.level)))
    }
}

// ---------------------------------------------------------------------------
// Top-level settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub solver: SolverConfig,
    pub logging: LogSettings,
}

impl Settings {
    pub fn from_toml_str(text: &str) -> DataResult<Self> {
        toml::from_str(text).map_err(|e| DataError::Config(e.to_string()))
    }

    /// Reads settings from a TOML file. Fails if the file does not exist.
    pub fn from_file(path: impl AsRef<Path>) -> DataResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DataError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Loads `.env` (if present) and applies `DRAINFLO_*` overrides from the
    /// process environment.
    pub fn with_env_overrides(self) -> DataResult<Self> {
        dotenv::dotenv().ok();
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    ///
    /// Recognized keys: `DRAINFLO_LOG_LEVEL`, `DRAINFLO_LOG_FILE`,
    /// `DRAINFLO_MAX_ITERATIONS`, `DRAINFLO_TOLERANCE`.
    pub fn with_overrides<F>(mut self, lookup: F) -> DataResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("DRAINFLO_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(file) = lookup("DRAINFLO_LOG_FILE") {
            self.logging.file = Some(file);
        }
        if let Some(raw) = lookup("DRAINFLO_MAX_ITERATIONS") {
            self.solver.max_iterations = raw.trim().parse().map_err(|_| {
                DataError::Config(format!("DRAINFLO_MAX_ITERATIONS is not an integer: '{}'", raw))
            })?;
        }
        if let Some(raw) = lookup("DRAINFLO_TOLERANCE") {
            self.solver.x_tolerance = raw.trim().parse().map_err(|_| {
                DataError::Config(format!("DRAINFLO_TOLERANCE is not a number: '{}'", raw))
            })?;
        }
        // Validate eagerly so a bad level fails at startup, not at first log.
        self.logging.log_level()?;
        Ok(self)
    }

    /// Installs the global logger described by these settings.
    pub fn init_logging(&self) -> DataResult<()> {
        let level = self.logging.log_level()?;
        logging::init_logger(
            level,
            self.logging.file.as_deref(),
            self.logging.console_timestamps,
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let settings = Settings::from_toml_str("").expect("empty toml is valid");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.solver.max_iterations, 100);
        assert_eq!(settings.solver.trial_budget, 100);
    }

    #[test]
    fn test_partial_solver_section_keeps_other_defaults() {
        let settings = Settings::from_toml_str("[solver]\nmax_iterations = 250\n")
            .expect("partial section should parse");
        assert_eq!(settings.solver.max_iterations, 250);
        assert_eq!(settings.solver.bracket_threshold, 1.0);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = Settings::from_toml_str("[solver\nmax_iterations = ");
        assert!(matches!(result, Err(DataError::Config(_))));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = Settings::from_file("/nonexistent/drainflo.toml");
        assert!(matches!(result, Err(DataError::FileNotFound { .. })));
    }

    #[test]
    fn test_overrides_apply_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("DRAINFLO_LOG_LEVEL", "debug"),
            ("DRAINFLO_MAX_ITERATIONS", "150"),
        ]
        .into_iter()
        .collect();
        let settings = Settings::default()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .expect("overrides are valid");
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.solver.max_iterations, 150);
        assert_eq!(settings.logging.file, None);
    }

    #[test]
    fn test_non_numeric_override_is_rejected() {
        let result = Settings::default().with_overrides(|key| {
            (key == "DRAINFLO_TOLERANCE").then(|| "tight".to_string())
        });
        assert!(matches!(result, Err(DataError::Config(_))));
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let result = Settings::default().with_overrides(|key| {
            (key == "DRAINFLO_LOG_LEVEL").then(|| "chatty".to_string())
        });
        assert!(result.is_err());
    }
}
