//! NRCS (SCS) curve-number basins with unit-hydrograph synthesis.
//!
//! Times are in hours, rainfall and runoff depths in inches, areas in
//! acres. The runoff distribution is the dimensionless unit hydrograph
//! (time / peak time, flow / peak flow).

use serde::{Deserialize, Serialize};

use super::{Hydrograph, weighted_merge};
use crate::model::{HydraulicResult, SQFT_PER_ACRE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NrcsBasin {
    pub area: f64,
    pub curve_number: f64,
    /// Time of concentration, in hours.
    pub tc: f64,
    pub runoff_distribution: Hydrograph,
    pub peak_factor: f64,
}

impl NrcsBasin {
    pub fn new(
        area: f64,
        curve_number: f64,
        tc: f64,
        runoff_distribution: Hydrograph,
        peak_factor: f64,
    ) -> Self {
        Self {
            area,
            curve_number,
            tc,
            runoff_distribution,
            peak_factor,
        }
    }

    /// `S = 1000/CN − 10`, in inches.
    pub fn potential_retention(&self) -> f64 {
        1000.0 / self.curve_number - 10.0
    }

    /// `Ia = 0.2·S`.
    pub fn initial_abstraction(&self) -> f64 {
        0.2 * self.potential_retention()
    }

    /// Merges `(area, cn)` sub-areas into this basin.
    pub fn add_shapes(&mut self, shapes: &[(f64, f64)]) {
        let (area, cn) = weighted_merge(self.area, self.curve_number, shapes);
        self.area = area;
        self.curve_number = cn;
    }

    /// Direct runoff depth for a cumulative rainfall depth.
    pub fn runoff_depth(&self, rain_depth: f64) -> f64 {
        let ia = self.initial_abstraction();
        if rain_depth > ia {
            (rain_depth - ia).powi(2) / (rain_depth - ia + self.potential_retention())
        } else {
            0.0
        }
    }

    /// Runoff volume in ft³.
    pub fn runoff_volume(&self, rain_depth: f64) -> f64 {
        self.runoff_depth(rain_depth) * self.area * SQFT_PER_ACRE / 12.0
    }

    /// Runoff generated during each `interval` of a cumulative rainfall
    /// distribution.
    pub fn runoff_depth_incremental(
        &self,
        rain: &Hydrograph,
        interval: f64,
    ) -> HydraulicResult<Vec<f64>> {
        let runoff: Vec<f64> = rain
            .resampled(interval)?
            .values()
            .map(|depth| self.runoff_depth(depth))
            .collect();
        Ok(runoff.windows(2).map(|w| w[1] - w[0]).collect())
    }

    pub fn peak_time(&self) -> f64 {
        0.133 * self.tc / 2.0 + 0.6 * self.tc
    }

    /// Peak flow of the unit hydrograph, in cfs per inch of runoff.
    pub fn peak_runoff(&self) -> f64 {
        self.peak_factor * self.area / self.peak_time()
    }

    /// Dimensional unit hydrograph sampled at `interval`.
    pub fn unit_hydrograph(&self, interval: f64) -> HydraulicResult<Hydrograph> {
        self.runoff_distribution
            .scaled(self.peak_time(), self.peak_runoff())
            .resampled(interval)
    }

    /// Runoff hydrograph for a cumulative rainfall distribution.
    pub fn flood_hydrograph(&self, rain: &Hydrograph, interval: f64) -> HydraulicResult<Hydrograph> {
        let unit = self.unit_hydrograph(interval)?;
        let increments = self.runoff_depth_incremental(rain, interval)?;
        convolve(&unit, &increments, interval)
    }
}

/// Discrete convolution of a unit hydrograph with incremental runoff
/// depths: `out[i] = Σ_j unit[j]·increments[i − j]`.
pub fn convolve(unit: &Hydrograph, increments: &[f64], interval: f64) -> HydraulicResult<Hydrograph> {
    let ordinates: Vec<f64> = unit.values().collect();
    if ordinates.is_empty() {
        return Ok(Hydrograph::default());
    }
    let length = (ordinates.len() + increments.len()).saturating_sub(1);
    let points = (0..length)
        .map(|i| {
            let lower = (i + 1).saturating_sub(increments.len());
            let upper = i.min(ordinates.len() - 1);
            let total: f64 = (lower..=upper)
                .map(|j| ordinates[j] * increments[i - j])
                .sum();
            (i as f64 * interval, total)
        })
        .collect();
    Hydrograph::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_two_ratios() -> Hydrograph {
        Hydrograph::new(vec![
            (0.00, 0.000),
            (0.05, 0.074),
            (0.10, 0.174),
            (0.15, 0.280),
            (0.20, 0.378),
            (0.25, 0.448),
            (0.30, 0.496),
            (0.35, 0.526),
            (0.40, 0.540),
            (0.45, 0.540),
            (0.50, 0.540),
            (0.55, 0.542),
            (0.60, 0.554),
            (0.65, 0.582),
            (0.70, 0.640),
            (0.75, 0.724),
            (0.80, 0.816),
            (0.85, 0.886),
            (0.90, 0.940),
            (0.95, 0.980),
            (1.00, 1.000),
        ])
        .unwrap()
    }

    fn basin(cn: f64) -> NrcsBasin {
        let unit = Hydrograph::new(vec![(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]).unwrap();
        NrcsBasin::new(4.6, cn, 2.3, unit, 484.0)
    }

    #[test]
    fn test_retention_and_abstraction() {
        let b = basin(80.0);
        assert!((b.potential_retention() - 2.5).abs() < 1e-12);
        assert!((b.initial_abstraction() - 0.5).abs() < 1e-12);
        assert_eq!(b.runoff_depth(0.4), 0.0);
        assert!((b.runoff_depth(3.0) - 6.25 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_incremental_runoff_from_scaled_distribution() {
        let rain = type_two_ratios().scaled(6.0, 5.0);
        let increments = basin(85.0).runoff_depth_incremental(&rain, 0.3).unwrap();
        let expected = [
            0.00, 0.12, 0.27, 0.33, 0.26, 0.19, 0.12, 0.06, 0.00, 0.00, 0.01, 0.05, 0.12, 0.24,
            0.36, 0.41, 0.32, 0.25, 0.18, 0.09,
        ];
        assert_eq!(increments.len(), expected.len());
        for (i, (got, want)) in increments.iter().zip(expected.iter()).enumerate() {
            assert!(
                (got - want).abs() <= 0.005 + 1e-9,
                "increment {}: got {:.4}, expected {}",
                i,
                got,
                want
            );
        }
    }

    #[test]
    fn test_peak_time_and_runoff() {
        let b = basin(85.0);
        assert!((b.peak_time() - 1.53295).abs() < 1e-9);
        assert!((b.peak_runoff() - 1452.36).abs() < 0.01);
    }

    #[test]
    fn test_unit_hydrograph_is_scaled_distribution() {
        let b = basin(85.0);
        let unit = b.unit_hydrograph(0.1).unwrap();
        let peak = unit.values().fold(0.0, f64::max);
        assert_eq!(unit.points()[0], (0.0, 0.0));
        assert!(peak <= b.peak_runoff() + 1e-9);
        assert!(peak > 0.9 * b.peak_runoff(), "grid sample near the peak: {}", peak);
        assert!(unit.end().unwrap() >= 2.0 * b.peak_time());
    }

    #[test]
    fn test_convolution() {
        let unit = Hydrograph::new(vec![(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)])
            .unwrap()
            .scaled(1.0, 10.0)
            .resampled(0.5)
            .unwrap();
        let flood = convolve(&unit, &[0.5, 1.0], 0.5).unwrap();
        assert_eq!(
            flood.points(),
            &[(0.0, 0.0), (0.5, 2.5), (1.0, 10.0), (1.5, 12.5), (2.0, 5.0), (2.5, 0.0)]
        );
    }

    #[test]
    fn test_flood_hydrograph_spans_unit_and_rain() {
        let b = basin(85.0);
        let rain = type_two_ratios().scaled(6.0, 5.0);
        let interval = 0.1;
        let flood = b.flood_hydrograph(&rain, interval).unwrap();
        let unit = b.unit_hydrograph(interval).unwrap();
        let increments = b.runoff_depth_incremental(&rain, interval).unwrap();
        assert_eq!(flood.len(), unit.len() + increments.len() - 1);
        assert!(flood.values().all(|q| q >= -1e-12));
    }

    #[test]
    fn test_add_shapes_weights_curve_number() {
        let mut b = basin(80.0);
        b.add_shapes(&[(4.6, 90.0)]);
        assert!((b.area - 9.2).abs() < 1e-12);
        assert!((b.curve_number - 85.0).abs() < 1e-12);
    }
}
