//! Stage–area–storage relationships and time-varying tailwater.

use serde::{Deserialize, Serialize};

use crate::config::SolverConfig;
use crate::hydrology::Hydrograph;
use crate::model::{HydraulicError, HydraulicResult};
use crate::solver::Bisection;

// ---------------------------------------------------------------------------
// Reservoir
// ---------------------------------------------------------------------------

/// A storage node described by `(stage, surface area)` contours.
///
/// Stages are in feet and areas in ft², so storage is in ft³. Contours are
/// kept sorted by stage; two contours at the same stage are both retained
/// and describe a vertical wall in the pond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ReservoirFields")]
pub struct Reservoir {
    contours: Vec<(f64, f64)>,
    start_stage: f64,
    pub solver: SolverConfig,
}

/// Serialized form of a [`Reservoir`], validated through `Reservoir::new`.
#[derive(Deserialize)]
struct ReservoirFields {
    contours: Vec<(f64, f64)>,
    start_stage: Option<f64>,
    #[serde(default)]
    solver: SolverConfig,
}

impl TryFrom<ReservoirFields> for Reservoir {
    type Error = HydraulicError;

    fn try_from(fields: ReservoirFields) -> HydraulicResult<Self> {
        Ok(Reservoir::new(fields.contours, fields.start_stage)?.with_solver(fields.solver))
    }
}

impl Reservoir {
    /// `start_stage` defaults to the lowest contour.
    pub fn new(mut contours: Vec<(f64, f64)>, start_stage: Option<f64>) -> HydraulicResult<Self> {
        if contours.len() < 2 {
            return Err(HydraulicError::InvalidGeometry(format!(
                "reservoir needs at least two contours, got {}",
                contours.len()
            )));
        }
        if contours.iter().any(|(s, a)| !s.is_finite() || !a.is_finite()) {
            return Err(HydraulicError::InvalidGeometry(
                "reservoir contours must be finite".to_string(),
            ));
        }
        contours.sort_by(|a, b| a.0.total_cmp(&b.0));
        let start_stage = start_stage.unwrap_or(contours[0].0);
        Ok(Self {
            contours,
            start_stage,
            solver: SolverConfig::default(),
        })
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    pub fn contours(&self) -> &[(f64, f64)] {
        &self.contours
    }

    pub fn start_stage(&self) -> f64 {
        self.start_stage
    }

    pub fn min_stage(&self) -> f64 {
        self.contours[0].0
    }

    pub fn max_stage(&self) -> f64 {
        self.contours[self.contours.len() - 1].0
    }

    /// Surface area at `stage`, extrapolated above the top contour from the
    /// last two. `None` below the bottom contour.
    pub fn area(&self, stage: f64) -> Option<f64> {
        if stage < self.min_stage() {
            return None;
        }
        let n = self.contours.len();
        let (lower, upper) = if stage >= self.max_stage() {
            (self.contours[n - 2], self.contours[n - 1])
        } else {
            // Last contour at or below `stage`, and the one after it.
            let above = self.contours.partition_point(|c| c.0 <= stage);
            (self.contours[above - 1], self.contours[above])
        };
        let (s1, a1) = lower;
        let (s2, a2) = upper;
        if s2 == s1 {
            return Some(a2);
        }
        Some(a1 + (a2 - a1) * (stage - s1) / (s2 - s1))
    }

    /// Volume below `stage` by trapezoidal integration of the contours.
    pub fn storage(&self, stage: f64) -> f64 {
        let top = match self.area(stage) {
            Some(area) if stage > self.min_stage() => (stage, area),
            _ => return 0.0,
        };
        let mut previous: Option<(f64, f64)> = None;
        let mut volume = 0.0;
        for &(s, a) in self
            .contours
            .iter()
            .filter(|c| c.0 < stage)
            .chain(std::iter::once(&top))
        {
            if let Some((s0, a0)) = previous {
                volume += (a0 + a) / 2.0 * (s - s0);
            }
            previous = Some((s, a));
        }
        volume
    }

    /// Stage holding `storage`, searched between the lowest and highest
    /// contour.
    pub fn stage(&self, storage: f64) -> HydraulicResult<f64> {
        Bisection::new(self.solver).solve(
            "reservoir_stage",
            &|stage| self.storage(stage) - storage,
            self.min_stage(),
            self.max_stage(),
        )
    }
}

// ---------------------------------------------------------------------------
// Tailwater
// ---------------------------------------------------------------------------

/// Downstream stage as a function of time (hours).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tailwater {
    series: Hydrograph,
}

impl Tailwater {
    pub fn new(points: Vec<(f64, f64)>) -> HydraulicResult<Self> {
        if let Some((t, _)) = points.iter().find(|p| p.0 < 0.0) {
            return Err(HydraulicError::InvalidTimeSeries(format!(
                "tailwater time {} is negative",
                t
            )));
        }
        Ok(Self {
            series: Hydrograph::new(points)?,
        })
    }

    /// Interpolated stage, flat beyond the series. Zero when empty.
    pub fn stage_at(&self, time: f64) -> f64 {
        self.series.value_at(time)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SQFT_PER_ACRE;

    fn pond() -> Reservoir {
        let acres = |a: f64| a * SQFT_PER_ACRE;
        Reservoir::new(
            vec![
                (14.0, acres(0.75)),
                (17.0, acres(0.81)),
                (17.0, acres(2.95)),
                (26.0, acres(4.46)),
                (30.5, acres(5.10)),
                (1.5, acres(6.07)),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_contours_sorted_with_duplicates_kept() {
        let stages: Vec<f64> = pond().contours().iter().map(|c| c.0).collect();
        assert_eq!(stages, vec![1.5, 14.0, 17.0, 17.0, 26.0, 30.5]);
        assert_eq!(pond().start_stage(), 1.5);
    }

    #[test]
    fn test_stage_storage_round_trip() {
        let pond = pond();
        for stage in [5.0, 16.0, 20.0, 29.0] {
            let recovered = pond.stage(pond.storage(stage)).unwrap();
            assert!(
                (recovered - stage).abs() < 1e-6,
                "stage {} came back as {}",
                stage,
                recovered
            );
        }
    }

    #[test]
    fn test_area_interpolation_and_extrapolation() {
        let r = Reservoir::new(vec![(10.0, 100.0), (12.0, 300.0)], Some(11.0)).unwrap();
        assert_eq!(r.area(9.0), None);
        assert_eq!(r.area(11.0), Some(200.0));
        assert_eq!(r.area(14.0), Some(500.0));
        assert_eq!(r.start_stage(), 11.0);
    }

    #[test]
    fn test_vertical_wall_takes_upper_area() {
        let r = Reservoir::new(vec![(0.0, 10.0), (1.0, 10.0), (1.0, 50.0), (2.0, 50.0)], None)
            .unwrap();
        assert_eq!(r.area(1.0), Some(50.0));
        assert!((r.storage(2.0) - 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_storage_is_zero_at_or_below_bottom() {
        let r = Reservoir::new(vec![(16.0, 4356.0), (21.5, 18295.2)], None).unwrap();
        assert_eq!(r.storage(15.0), 0.0);
        assert_eq!(r.storage(16.0), 0.0);
        assert!(r.storage(16.5) > 0.0);
    }

    #[test]
    fn test_prismatic_storage() {
        let r = Reservoir::new(vec![(0.0, 100.0), (10.0, 100.0)], None).unwrap();
        assert!((r.storage(4.0) - 400.0).abs() < 1e-12);
        assert!((r.stage(250.0).unwrap() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_too_few_contours_rejected() {
        assert!(Reservoir::new(vec![(0.0, 1.0)], None).is_err());
    }

    #[test]
    fn test_deserializing_validates_contours() {
        let err = serde_json::from_str::<Reservoir>(
            r#"{"contours":[[5.0,100.0]],"start_stage":5.0}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("at least two contours"), "got {}", err);

        let r: Reservoir =
            serde_json::from_str(r#"{"contours":[[10.0,400.0],[5.0,100.0]]}"#).unwrap();
        assert_eq!(r.contours(), &[(5.0, 100.0), (10.0, 400.0)]);
        assert_eq!(r.start_stage(), 5.0);
        assert_eq!(r.area(7.5), Some(250.0));

        let back: Reservoir = serde_json::from_str(&serde_json::to_string(&r).unwrap()).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn test_tailwater_interpolates_and_holds() {
        let tw = Tailwater::new(vec![(0.0, 5.0), (2.0, 7.0)]).unwrap();
        assert_eq!(tw.stage_at(1.0), 6.0);
        assert_eq!(tw.stage_at(10.0), 7.0);
        assert_eq!(Tailwater::default().stage_at(3.0), 0.0);
        assert!(Tailwater::new(vec![(-1.0, 5.0)]).is_err());
    }
}
