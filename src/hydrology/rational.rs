//! Rational-method basins: `Q = i·C·A`.

use serde::{Deserialize, Serialize};

use super::{Hydrograph, weighted_merge};
use crate::model::{HydraulicResult, K_RATIONAL};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RationalBasin {
    /// Acres.
    pub area: f64,
    pub runoff_coefficient: f64,
    /// Time of concentration, in minutes.
    pub tc: f64,
}

impl RationalBasin {
    pub fn new(area: f64, runoff_coefficient: f64, tc: f64) -> Self {
        Self {
            area,
            runoff_coefficient,
            tc,
        }
    }

    /// `C·A`, in acres.
    pub fn runoff_area(&self) -> f64 {
        self.area * self.runoff_coefficient
    }

    /// Merges `(area, c)` sub-areas into this basin.
    pub fn add_shapes(&mut self, shapes: &[(f64, f64)]) {
        let (area, c) = weighted_merge(self.area, self.runoff_coefficient, shapes);
        self.area = area;
        self.runoff_coefficient = c;
    }

    /// Peak flow for a rainfall intensity in in/hr.
    pub fn flow(&self, intensity: f64) -> f64 {
        intensity * self.runoff_area() * K_RATIONAL
    }

    /// Runoff from a cumulative rainfall distribution (hours, inches). The
    /// average intensity to each time drives that time's flow.
    pub fn flood_hydrograph(&self, rain: &Hydrograph, interval: f64) -> HydraulicResult<Hydrograph> {
        let points = rain
            .resampled(interval)?
            .points()
            .iter()
            .map(|&(time, rainfall)| {
                let flow = if time > 0.0 {
                    self.flow(rainfall / time)
                } else {
                    0.0
                };
                (time, flow)
            })
            .collect();
        Hydrograph::new(points)
    }
}
