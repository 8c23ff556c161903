//! Reach hydraulics: Manning flow, critical and normal depth, and the
//! energy balance between the two ends of a reach.
//!
//! Every iterative quantity goes through the shared [`Bisection`] with an
//! explicit bracket policy: closed sections bracket depth by their rise,
//! open sections scan whole-foot trial depths.
//!
//! Energy losses along the reach are the average of the friction and minor
//! losses evaluated at each end. This is a two-point approximation, not an
//! integration of the gradually varied flow profile.

use std::cell::RefCell;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Conveyance;
use crate::config::SolverConfig;
use crate::model::{HydraulicError, HydraulicResult, G, K_MANNING, SG_WATER};
use crate::sections::{Geometry, Section};
use crate::solver::{Bisection, BracketPolicy, ScanTarget};

// ---------------------------------------------------------------------------
// Shear stress basis
// ---------------------------------------------------------------------------

/// Length scale used for boundary shear stress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShearBasis {
    /// Hydraulic radius: the mean stress over the wetted perimeter.
    Average,
    /// Flow depth: the stress on the channel bed at the deepest point.
    Maximum,
}

impl FromStr for ShearBasis {
    type Err = HydraulicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "average" => Ok(ShearBasis::Average),
            "maximum" => Ok(ShearBasis::Maximum),
            other => Err(HydraulicError::InvalidOption {
                name: "shear stress basis",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ShearBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShearBasis::Average => write!(f, "average"),
            ShearBasis::Maximum => write!(f, "maximum"),
        }
    }
}

// ---------------------------------------------------------------------------
// Reach
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reach {
    /// Upstream invert elevation.
    pub invert_1: f64,
    /// Downstream invert elevation.
    pub invert_2: f64,
    pub length: f64,
    pub section: Arc<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor_loss_coefficient: Option<f64>,
    #[serde(default)]
    pub solver: SolverConfig,
}

impl Reach {
    /// Fails if the section has no Manning roughness or the length is not
    /// positive.
    pub fn new(
        invert_1: f64,
        invert_2: f64,
        length: f64,
        section: Arc<Section>,
    ) -> HydraulicResult<Self> {
        section.roughness()?;
        if !(length.is_finite() && length > 0.0) {
            return Err(HydraulicError::InvalidGeometry(format!(
                "reach length must be positive, got {}",
                length
            )));
        }
        Ok(Self {
            invert_1,
            invert_2,
            length,
            section,
            minor_loss_coefficient: None,
            solver: SolverConfig::default(),
        })
    }

    pub fn with_minor_loss(mut self, coefficient: f64) -> Self {
        self.minor_loss_coefficient = Some(coefficient);
        self
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    // Checked in `new`; NaN makes any later solve fail instead of panicking.
    fn n(&self) -> f64 {
        self.section.roughness.unwrap_or(f64::NAN)
    }

    fn bisection(&self) -> Bisection {
        Bisection::new(self.solver)
    }

    pub fn drop(&self) -> f64 {
        self.invert_1 - self.invert_2
    }

    pub fn slope(&self) -> f64 {
        self.drop() / self.length
    }

    // -----------------------------------------------------------------------
    // Uniform flow
    // -----------------------------------------------------------------------

    /// Manning velocity at `depth`. Zero on flat or adverse slopes.
    pub fn velocity(&self, depth: f64) -> f64 {
        let slope = self.slope();
        if slope <= 0.0 {
            return 0.0;
        }
        K_MANNING * self.section.hydraulic_radius(depth).powf(2.0 / 3.0) * slope.sqrt() / self.n()
    }

    pub fn normal_flow(&self, depth: f64) -> f64 {
        self.section.flow_area(depth) * self.velocity(depth)
    }

    /// `flow / area`, zero for a dry section.
    fn mean_velocity(&self, depth: f64, flow: f64) -> f64 {
        let area = self.section.flow_area(depth);
        if area > 0.0 { flow / area } else { 0.0 }
    }

    pub fn velocity_head(&self, depth: f64, flow: f64) -> f64 {
        self.mean_velocity(depth, flow).powi(2) / 2.0 / G
    }

    pub fn friction_slope(&self, depth: f64, flow: f64) -> f64 {
        let radius = self.section.hydraulic_radius(depth);
        if radius <= 0.0 {
            return 0.0;
        }
        let a = self.mean_velocity(depth, flow) * self.n();
        let b = K_MANNING * radius.powf(2.0 / 3.0);
        (a / b).powi(2).max(0.0)
    }

    pub fn friction_loss(&self, depth: f64, flow: f64) -> f64 {
        self.length * self.friction_slope(depth, flow)
    }

    pub fn minor_loss(&self, depth: f64, flow: f64) -> f64 {
        match self.minor_loss_coefficient {
            Some(k) => k * self.velocity_head(depth, flow),
            None => 0.0,
        }
    }

    /// Froude number on the hydraulic depth `A/W`.
    pub fn froude_number(&self, depth: f64, flow: f64) -> f64 {
        let area = self.section.flow_area(depth);
        let width = self.section.surface_width(depth);
        if area <= 0.0 || width <= 0.0 {
            return 0.0;
        }
        self.mean_velocity(depth, flow) / (G * area / width).sqrt()
    }

    /// Boundary shear stress, in lb/ft².
    pub fn shear_stress(&self, depth: f64, basis: ShearBasis) -> f64 {
        let length_scale = match basis {
            ShearBasis::Average => self.section.hydraulic_radius(depth),
            ShearBasis::Maximum => depth,
        };
        SG_WATER * length_scale * self.slope()
    }

    /// Minutes for `flow` to traverse the reach at `depth`. Zero when
    /// nothing flows.
    pub fn travel_time(&self, depth: f64, flow: f64) -> f64 {
        let velocity = self.mean_velocity(depth, flow);
        if velocity <= 0.0 {
            return 0.0;
        }
        self.length / velocity / 60.0
    }

    // -----------------------------------------------------------------------
    // Critical and normal depth
    // -----------------------------------------------------------------------

    /// Depth bracket for the section: its rise if closed, otherwise a scan
    /// of whole-foot depths against `bracket_threshold`.
    fn depth_policy(&self) -> BracketPolicy {
        match self.section.rise().ok() {
            Some(rise) => BracketPolicy::Fixed {
                lower: self.solver.lower_bound,
                upper: rise,
            },
            None => BracketPolicy::Scan {
                lower: self.solver.lower_bound,
                origin: 0.0,
                step: 1.0,
                first: 1,
                target: ScanTarget::Exceeds(self.solver.bracket_threshold),
            },
        }
    }

    /// Depth minimizing specific energy: the root of `g·A³ − W·Q²`.
    ///
    /// A closed section too small to reach critical flow below its crown
    /// reports the rise.
    pub fn critical_depth(&self, flow: f64) -> HydraulicResult<f64> {
        if flow <= 0.0 {
            return Ok(0.0);
        }
        let objective = |depth: f64| {
            G * self.section.flow_area(depth).powi(3)
                - self.section.surface_width(depth) * flow.powi(2)
        };
        if let Ok(rise) = self.section.rise() {
            if objective(rise) < 0.0 {
                return Ok(rise);
            }
        }
        self.bisection()
            .solve_with("critical_depth", self.depth_policy(), objective)
    }

    /// `√(g·d_c)`.
    pub fn critical_velocity(&self, flow: f64) -> HydraulicResult<f64> {
        Ok((G * self.critical_depth(flow)?).sqrt())
    }

    /// Bed slope that would carry `flow` at critical depth.
    pub fn critical_slope(&self, flow: f64) -> HydraulicResult<f64> {
        let depth = self.critical_depth(flow)?;
        let velocity = (G * depth).sqrt();
        let radius = self.section.hydraulic_radius(depth);
        Ok((velocity * self.n() / (K_MANNING * radius.powf(2.0 / 3.0))).powi(2))
    }

    /// Depth at which Manning flow equals `flow`.
    ///
    /// A closed section asked to carry more than its full-flow capacity
    /// is surcharged; its depth is reported at the crown.
    pub fn normal_depth(&self, flow: f64) -> HydraulicResult<f64> {
        if flow <= 0.0 {
            return Ok(0.0);
        }
        if let Ok(rise) = self.section.rise() {
            if flow > self.normal_flow(rise) {
                return Ok(rise);
            }
        }
        self.bisection().solve_with("normal_depth", self.depth_policy(), |depth| {
            self.normal_flow(depth) - flow
        })
    }

    // -----------------------------------------------------------------------
    // Energy balance
    // -----------------------------------------------------------------------

    /// Total head at the upstream end.
    pub fn energy_upstream(&self, depth: f64, flow: f64) -> f64 {
        self.invert_1 + depth + self.velocity_head(depth, flow)
    }

    /// Total head at the downstream end plus the averaged losses along
    /// the reach.
    pub fn energy_downstream(&self, depth_1: f64, stage_2: f64, flow: f64) -> f64 {
        let depth_2 = stage_2 - self.invert_2;
        let friction = (self.friction_loss(depth_1, flow) + self.friction_loss(depth_2, flow)) / 2.0;
        let minor = (self.minor_loss(depth_1, flow) + self.minor_loss(depth_2, flow)) / 2.0;
        self.invert_2 + depth_2 + self.velocity_head(depth_2, flow) + friction + minor
    }

    /// Upstream minus downstream energy for the given end stages.
    pub fn energy_residual(&self, stage_1: f64, stage_2: f64, flow: f64) -> f64 {
        let depth_1 = stage_1 - self.invert_1;
        self.energy_upstream(depth_1, flow) - self.energy_downstream(depth_1, stage_2, flow)
    }

    /// Upstream stage balancing energy against `stage_2`.
    ///
    /// Of the two candidate brackets (below and above critical depth), the
    /// one consistent with the downstream depth is tried first.
    pub fn headwater(&self, stage_2: f64, flow: f64) -> HydraulicResult<f64> {
        if flow <= 0.0 {
            return Ok(stage_2.max(self.invert_1));
        }
        let residual = |stage_1: f64| self.energy_residual(stage_1, stage_2, flow);
        let bisection = self.bisection();

        let depth_2 = stage_2 - self.invert_2;
        let depth_critical = self.critical_depth(flow)?;
        let unit = self.section.rise().unwrap_or(1.0);

        let bound_a = self.invert_1 + self.solver.lower_bound;
        let bound_b = self.invert_1 + depth_critical;
        let bound_c = bisection
            .scan(
                |k| self.invert_1 + k as f64 * unit,
                &residual,
                1,
                bound_a,
                ScanTarget::Exceeds(self.solver.bracket_threshold),
            )
            .ok_or(HydraulicError::BoundNotFound {
                operation: "headwater",
                trials: self.solver.trial_budget,
            })?;

        let supercritical = (bound_a, bound_b);
        let subcritical = (bound_b, bound_c);
        let (first, second) = if depth_2 < depth_critical {
            (supercritical, subcritical)
        } else {
            (subcritical, supercritical)
        };

        match bisection.solve("headwater", &residual, first.0, first.1) {
            Err(HydraulicError::NoSignChange { .. }) => {
                bisection.solve("headwater", &residual, second.0, second.1)
            }
            result => result,
        }
    }

    /// Controlling stage at the downstream end: the tailwater, or normal
    /// depth if that is higher.
    pub fn hgl_downstream(&self, stage_2: f64, flow: f64) -> HydraulicResult<f64> {
        Ok(stage_2.max(self.invert_2 + self.normal_depth(flow)?))
    }

    /// Controlling stage at the upstream end: normal depth, or the
    /// backwater headwater if that is higher.
    pub fn hgl_upstream(&self, stage_2: f64, flow: f64) -> HydraulicResult<f64> {
        let lower = self.hgl_downstream(stage_2, flow)?;
        let normal = self.invert_1 + self.normal_depth(flow)?;
        Ok(normal.max(self.headwater(lower, flow)?))
    }

    /// Flow passing between the two end stages.
    ///
    /// The higher stage is treated as headwater. The downstream depth is
    /// never taken below critical, so a free outfall is controlled at
    /// critical depth. Negative when `stage_2` is above `stage_1`.
    pub fn flow(&self, stage_1: f64, stage_2: f64) -> HydraulicResult<f64> {
        let (head, tail, sign) = if stage_2 > stage_1 {
            (stage_2, stage_1, -1.0)
        } else {
            (stage_1, stage_2, 1.0)
        };
        let depth_1 = head - self.invert_1;
        if depth_1 <= 0.0 || head == tail {
            return Ok(0.0);
        }

        // Critical depth is evaluated inside the objective; keep the first
        // failure so it can be reported instead of a bracket error.
        let failure: RefCell<Option<HydraulicError>> = RefCell::new(None);
        let residual = |flow: f64| match self.critical_depth(flow) {
            Ok(depth_critical) => {
                let depth_2 = (tail - self.invert_2).max(depth_critical);
                self.energy_residual(head, self.invert_2 + depth_2, flow)
            }
            Err(err) => {
                failure.borrow_mut().get_or_insert(err);
                f64::NAN
            }
        };

        let lower = self.solver.lower_bound;
        let result = if residual(lower) <= 0.0 {
            // Not enough head to drive any flow.
            Ok(0.0)
        } else {
            let unit = self.section.flow_area(depth_1) * (2.0 * G * (head - tail)).sqrt();
            let policy = BracketPolicy::Scan {
                lower,
                origin: 0.0,
                step: unit,
                first: 1,
                target: ScanTarget::SignChange,
            };
            self.bisection().solve_with("flow", policy, residual)
        };

        if let Some(err) = failure.into_inner() {
            return Err(err);
        }
        result.map(|flow| sign * flow)
    }
}

impl Conveyance for Reach {
    fn flow(&self, stage_1: f64, stage_2: f64) -> HydraulicResult<f64> {
        Reach::flow(self, stage_1, stage_2)
    }

    fn control_invert(&self) -> f64 {
        self.invert_1
    }

    fn rise(&self) -> Option<f64> {
        self.section.rise().ok()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
