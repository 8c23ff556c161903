/// Basin hydrology feeding flow into the network.
///
/// Rational-method basins produce a peak flow from an intensity; NRCS
/// basins synthesize a runoff hydrograph from a rainfall distribution.
/// Both reduce to a [`Hydrograph`] for storage routing.
///
/// Submodules:
/// - `hydrograph`: time series with interpolation and resampling.
/// - `intensity`: rainfall intensity sources.
/// - `rational`: `Q = i·C·A` basins.
/// - `nrcs`: curve-number basins and unit-hydrograph convolution.

pub mod hydrograph;
pub mod intensity;
pub mod nrcs;
pub mod rational;

use serde::{Deserialize, Serialize};

use crate::model::HydraulicResult;

pub use hydrograph::Hydrograph;
pub use intensity::Intensity;
pub use nrcs::NrcsBasin;
pub use rational::RationalBasin;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Basin {
    Rational(RationalBasin),
    Nrcs(NrcsBasin),
}

impl Basin {
    /// Acres.
    pub fn area(&self) -> f64 {
        match self {
            Basin::Rational(b) => b.area,
            Basin::Nrcs(b) => b.area,
        }
    }

    pub fn as_rational(&self) -> Option<&RationalBasin> {
        match self {
            Basin::Rational(b) => Some(b),
            Basin::Nrcs(_) => None,
        }
    }

    /// Merges `(area, parameter)` sub-areas; the parameter is the runoff
    /// coefficient or the curve number.
    pub fn add_shapes(&mut self, shapes: &[(f64, f64)]) {
        match self {
            Basin::Rational(b) => b.add_shapes(shapes),
            Basin::Nrcs(b) => b.add_shapes(shapes),
        }
    }

    pub fn flood_hydrograph(&self, rain: &Hydrograph, interval: f64) -> HydraulicResult<Hydrograph> {
        match self {
            Basin::Rational(b) => b.flood_hydrograph(rain, interval),
            Basin::Nrcs(b) => b.flood_hydrograph(rain, interval),
        }
    }
}

impl From<RationalBasin> for Basin {
    fn from(basin: RationalBasin) -> Self {
        Basin::Rational(basin)
    }
}

impl From<NrcsBasin> for Basin {
    fn from(basin: NrcsBasin) -> Self {
        Basin::Nrcs(basin)
    }
}

/// Area-weighted merge: returns the combined area and parameter.
pub(crate) fn weighted_merge(area: f64, parameter: f64, shapes: &[(f64, f64)]) -> (f64, f64) {
    let added: f64 = shapes.iter().map(|s| s.0).sum();
    let weighted: f64 = shapes.iter().map(|s| s.0 * s.1).sum();
    let total = area + added;
    if total <= 0.0 {
        return (area, parameter);
    }
    (total, (area * parameter + weighted) / total)
}
