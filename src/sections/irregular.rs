//! Sections described by surveyed `(station, elevation)` vertices.
//!
//! The boundary is clipped against the waterline into submerged runs. Each
//! run is closed along the waterline to form a polygon whose area comes
//! from the shoelace formula. A boundary can dip below the waterline more
//! than once (a channel with two low points), so every quantity sums over
//! all runs.

use serde::{Deserialize, Serialize};

use super::Geometry;
use crate::model::{HydraulicError, HydraulicResult};

type Point = (f64, f64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IrregularFields")]
pub struct Irregular {
    pub points: Vec<Point>,
    /// Whether the vertices form a ring (a culvert) or an open channel.
    pub closed: bool,
}

#[derive(Deserialize)]
struct IrregularFields {
    points: Vec<Point>,
    closed: bool,
}

impl TryFrom<IrregularFields> for Irregular {
    type Error = HydraulicError;

    fn try_from(fields: IrregularFields) -> HydraulicResult<Self> {
        Irregular::new(fields.points, fields.closed)
    }
}

impl Irregular {
    pub fn new(points: Vec<Point>, closed: bool) -> HydraulicResult<Self> {
        let needed = if closed { 3 } else { 2 };
        if points.len() < needed {
            return Err(HydraulicError::InvalidGeometry(format!(
                "irregular section needs at least {} points, got {}",
                needed,
                points.len()
            )));
        }
        if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(HydraulicError::InvalidGeometry(
                "irregular section points must be finite".to_string(),
            ));
        }
        Ok(Self { points, closed })
    }

    fn lowest(&self) -> f64 {
        self.points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min)
    }

    fn highest(&self) -> f64 {
        self.points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max)
    }

    /// Boundary in walking order. Rings start and end at their highest
    /// vertex so that no submerged run wraps past the end of the list.
    fn boundary(&self) -> Vec<Point> {
        if !self.closed {
            return self.points.clone();
        }
        let top = self
            .points
            .iter()
            .enumerate()
            .fold(0, |best, (i, p)| if p.1 > self.points[best].1 { i } else { best });
        let mut ring: Vec<Point> = self.points[top..]
            .iter()
            .chain(self.points[..top].iter())
            .copied()
            .collect();
        ring.push(self.points[top]);
        ring
    }

    /// Clips the boundary at `lowest + depth` into submerged runs.
    ///
    /// A vertex is submerged when it lies strictly below the waterline.
    /// Runs begin and end on the waterline unless the boundary itself
    /// starts or ends under water. A ring filled to its crown is one run
    /// covering the whole boundary, with no free surface.
    fn runs(&self, depth: f64) -> Vec<Vec<Point>> {
        let boundary = self.boundary();
        if self.rise().is_some_and(|rise| depth >= rise) {
            return vec![boundary];
        }
        let waterline = self.lowest() + depth;
        let crossing = |(x1, y1): Point, (x2, y2): Point| -> Point {
            (x1 + (x2 - x1) * (waterline - y1) / (y2 - y1), waterline)
        };

        let mut runs = Vec::new();
        let mut current: Option<Vec<Point>> =
            (boundary[0].1 < waterline).then(|| vec![boundary[0]]);

        for pair in boundary.windows(2) {
            let (p1, p2) = (pair[0], pair[1]);
            let wet_1 = p1.1 < waterline;
            let wet_2 = p2.1 < waterline;
            match (wet_1, wet_2) {
                (true, true) => {
                    if let Some(run) = current.as_mut() {
                        run.push(p2);
                    }
                }
                (true, false) => {
                    if let Some(mut run) = current.take() {
                        run.push(crossing(p1, p2));
                        runs.push(run);
                    }
                }
                (false, true) => current = Some(vec![crossing(p1, p2), p2]),
                (false, false) => {}
            }
        }
        if let Some(run) = current {
            runs.push(run);
        }
        runs
    }
}

fn shoelace(run: &[Point]) -> f64 {
    let n = run.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let (x1, y1) = run[i];
            let (x2, y2) = run[(i + 1) % n];
            x1 * y2 - x2 * y1
        })
        .sum();
    twice.abs() / 2.0
}

impl Geometry for Irregular {
    fn flow_area(&self, depth: f64) -> f64 {
        self.runs(depth).iter().map(|run| shoelace(run)).sum()
    }

    /// Clipped boundary length. The waterline itself is not wetted.
    fn wet_perimeter(&self, depth: f64) -> f64 {
        self.runs(depth)
            .iter()
            .flat_map(|run| run.windows(2))
            .map(|w| (w[1].0 - w[0].0).hypot(w[1].1 - w[0].1))
            .sum()
    }

    fn surface_width(&self, depth: f64) -> f64 {
        self.runs(depth)
            .iter()
            .filter_map(|run| Some((run.last()?.0 - run.first()?.0).abs()))
            .sum()
    }

    /// Horizontal extent of each submerged run, summed.
    fn projection(&self, depth: f64) -> f64 {
        self.runs(depth)
            .iter()
            .map(|run| {
                let (lo, hi) = run
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                        (lo.min(p.0), hi.max(p.0))
                    });
                if hi > lo { hi - lo } else { 0.0 }
            })
            .sum()
    }

    fn rise(&self) -> Option<f64> {
        self.closed.then(|| self.highest() - self.lowest())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
