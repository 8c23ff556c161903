//! Piecewise-linear time series.
//!
//! Used for rainfall distributions, unit hydrographs, and runoff
//! hydrographs alike. Times are in hours.

use serde::{Deserialize, Serialize};

use crate::model::{HydraulicError, HydraulicResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hydrograph {
    points: Vec<(f64, f64)>,
}

impl Hydrograph {
    /// Sorts the pairs by time. Fails on non-finite values.
    pub fn new(mut points: Vec<(f64, f64)>) -> HydraulicResult<Self> {
        if let Some((t, v)) = points
            .iter()
            .find(|(t, v)| !t.is_finite() || !v.is_finite())
        {
            return Err(HydraulicError::InvalidTimeSeries(format!(
                "non-finite pair ({}, {})",
                t, v
            )));
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Self { points })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.1)
    }

    pub fn start(&self) -> Option<f64> {
        self.points.first().map(|p| p.0)
    }

    pub fn end(&self) -> Option<f64> {
        self.points.last().map(|p| p.0)
    }

    /// Linear interpolation, held flat beyond either end. Zero when empty.
    pub fn value_at(&self, time: f64) -> f64 {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return 0.0,
        };
        if time <= first.0 {
            return first.1;
        }
        if time >= last.0 {
            return last.1;
        }
        // First pair strictly after `time`; the one before it is at or below.
        let upper = self.points.partition_point(|p| p.0 <= time);
        let (t1, v1) = self.points[upper - 1];
        let (t2, v2) = self.points[upper];
        if t2 == t1 {
            v2
        } else {
            v1 + (v2 - v1) * (time - t1) / (t2 - t1)
        }
    }

    /// Multiplies every time by `x` and every value by `y`.
    pub fn scaled(&self, x: f64, y: f64) -> Self {
        Self {
            points: self.points.iter().map(|&(t, v)| (t * x, v * y)).collect(),
        }
    }

    /// Resamples at a fixed `interval` from the first time. Steps continue
    /// until the last time is reached or passed.
    pub fn resampled(&self, interval: f64) -> HydraulicResult<Self> {
        if !(interval.is_finite() && interval > 0.0) {
            return Err(HydraulicError::InvalidTimeSeries(format!(
                "interval must be positive, got {}",
                interval
            )));
        }
        let (start, end) = match (self.start(), self.end()) {
            (Some(start), Some(end)) => (start, end),
            _ => return Ok(Self::default()),
        };
        let steps = ((end - start) / interval - 1e-9).ceil().max(0.0) as usize;
        let points = (0..=steps)
            .map(|i| {
                let time = start + i as f64 * interval;
                (time, self.value_at(time))
            })
            .collect();
        Ok(Self { points })
    }

    /// Differences between consecutive values.
    pub fn increments(&self) -> Vec<f64> {
        self.points.windows(2).map(|w| w[1].1 - w[0].1).collect()
    }
}
