//! Bounded root finding shared by every hydraulic solve.
//!
//! Each call site states how its bracket is found ([`BracketPolicy`]) and
//! hands an objective to [`Bisection::solve`]. Bracket search and
//! bisection are both capped, so every solve either converges or fails
//! with a [`HydraulicError`] naming the operation.

use crate::config::SolverConfig;
use crate::model::{HydraulicError, HydraulicResult};

/// What a scanned trial must satisfy to close the bracket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanTarget {
    /// The objective at the trial exceeds this value.
    Exceeds(f64),
    /// The objective at the trial has the opposite sign from the lower bound.
    SignChange,
}

/// How the upper end of a bracket is established.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BracketPolicy {
    /// Both ends are known in advance (e.g. a closed section's rise).
    Fixed { lower: f64, upper: f64 },
    /// Trials `origin + k·step` for `k` in `first..budget` until the
    /// target is met; the first qualifying trial is the upper bound.
    Scan {
        lower: f64,
        origin: f64,
        step: f64,
        first: usize,
        target: ScanTarget,
    },
}

/// Interval-halving solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bisection {
    pub config: SolverConfig,
}

impl Bisection {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Establishes a bracket according to `policy`.
    pub fn bracket<F>(
        &self,
        operation: &'static str,
        policy: BracketPolicy,
        f: &F,
    ) -> HydraulicResult<(f64, f64)>
    where
        F: Fn(f64) -> f64,
    {
        match policy {
            BracketPolicy::Fixed { lower, upper } => Ok((lower, upper)),
            BracketPolicy::Scan {
                lower,
                origin,
                step,
                first,
                target,
            } => {
                let upper = self
                    .scan(|k| origin + k as f64 * step, f, first, lower, target)
                    .ok_or(HydraulicError::BoundNotFound {
                        operation,
                        trials: self.config.trial_budget,
                    })?;
                Ok((lower, upper))
            }
        }
    }

    /// Scans `trial(k)` for `k` in `first..trial_budget` and returns the
    /// first trial meeting `target`. `lower` is the reference point for
    /// [`ScanTarget::SignChange`].
    pub fn scan<T, F>(
        &self,
        trial: T,
        f: &F,
        first: usize,
        lower: f64,
        target: ScanTarget,
    ) -> Option<f64>
    where
        T: Fn(usize) -> f64,
        F: Fn(f64) -> f64,
    {
        let f_lower = match target {
            ScanTarget::SignChange => f(lower),
            ScanTarget::Exceeds(_) => 0.0,
        };
        (first..self.config.trial_budget)
            .map(trial)
            .find(|&x| {
                let fx = f(x);
                match target {
                    ScanTarget::Exceeds(threshold) => fx > threshold,
                    ScanTarget::SignChange => fx * f_lower <= 0.0,
                }
            })
    }

    /// Bracket with `policy`, then bisect.
    pub fn solve_with<F>(
        &self,
        operation: &'static str,
        policy: BracketPolicy,
        f: F,
    ) -> HydraulicResult<f64>
    where
        F: Fn(f64) -> f64,
    {
        let (lower, upper) = self.bracket(operation, policy, &f)?;
        self.solve(operation, &f, lower, upper)
    }

    /// Bisects `f` on `[lower, upper]`.
    ///
    /// Fails with `NoSignChange` if `f(lower)` and `f(upper)` share a sign,
    /// and with `NotConverged` if the iteration cap is reached.
    pub fn solve<F>(
        &self,
        operation: &'static str,
        f: &F,
        lower: f64,
        upper: f64,
    ) -> HydraulicResult<f64>
    where
        F: Fn(f64) -> f64,
    {
        let f_lower = f(lower);
        let f_upper = f(upper);
        if f_lower.is_nan() || f_upper.is_nan() || f_lower * f_upper > 0.0 {
            return Err(HydraulicError::NoSignChange {
                operation,
                lower,
                upper,
            });
        }
        if f_lower == 0.0 {
            return Ok(lower);
        }
        if f_upper == 0.0 {
            return Ok(upper);
        }

        let mut a = lower;
        let mut width = upper - lower;
        for _ in 0..self.config.max_iterations {
            width *= 0.5;
            let mid = a + width;
            let f_mid = f(mid);
            if f_mid * f_lower >= 0.0 {
                a = mid;
            }
            if f_mid == 0.0
                || width.abs() < self.config.x_tolerance + self.config.r_tolerance * mid.abs()
            {
                return Ok(mid);
            }
        }
        Err(HydraulicError::NotConverged {
            operation,
            iterations: self.config.max_iterations,
        })
    }
}

impl Default for Bisection {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
