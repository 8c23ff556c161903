//! Rainfall intensity sources for the rational method.

use serde::{Deserialize, Serialize};

use super::Hydrograph;
use crate::model::{HydraulicError, HydraulicResult};

/// Rainfall intensity (in/hr) as a function of duration in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Intensity {
    Constant(f64),
    /// IDF fit `Σ c_k · ln(t)^k`.
    LogPolynomial(Vec<f64>),
    /// Tabulated (duration, intensity) pairs.
    Table(Hydrograph),
}

impl Intensity {
    pub fn at(&self, minutes: f64) -> HydraulicResult<f64> {
        match self {
            Intensity::Constant(rate) => Ok(*rate),
            Intensity::LogPolynomial(coefficients) => {
                if !(minutes > 0.0) {
                    return Err(HydraulicError::InvalidTimeSeries(format!(
                        "intensity fit needs a positive duration, got {}",
                        minutes
                    )));
                }
                let ln_t = minutes.ln();
                Ok(coefficients
                    .iter()
                    .rev()
                    .fold(0.0, |acc, c| acc * ln_t + c))
            }
            Intensity::Table(table) => Ok(table.value_at(minutes)),
        }
    }
}
