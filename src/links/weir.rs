//! Weir and orifice control structures.
//!
//! A closed opening runs as an orifice once the upstream stage tops its
//! crown; below that, and for open crests, flow follows the weir equation
//! over the wetted projection of the section.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Conveyance;
use crate::model::{HydraulicResult, G};
use crate::sections::{Geometry, Section};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weir {
    /// Crest or orifice invert elevation.
    pub invert: f64,
    pub orifice_coefficient: f64,
    pub weir_coefficient: f64,
    pub section: Arc<Section>,
}

impl Weir {
    pub fn new(
        invert: f64,
        orifice_coefficient: f64,
        weir_coefficient: f64,
        section: Arc<Section>,
    ) -> Self {
        Self {
            invert,
            orifice_coefficient,
            weir_coefficient,
            section,
        }
    }

    /// `Cd·A·√(2g·h)`, measuring head from the opening's center when the
    /// outlet discharges freely and from the tailwater when submerged.
    fn orifice_flow(&self, rise: f64, stage_1: f64, stage_2: f64) -> f64 {
        let center = self.invert + rise / 2.0;
        let head = if stage_2 < self.invert {
            stage_1 - center
        } else {
            stage_1 - stage_2
        };
        if head <= 0.0 {
            return 0.0;
        }
        let area = self.section.flow_area(rise);
        self.orifice_coefficient * area * (2.0 * G * head).sqrt()
    }

    fn weir_flow(&self, stage_1: f64, stage_2: f64) -> f64 {
        let depth = stage_1 - self.invert;
        let free = self.weir_coefficient * self.section.projection(depth) * depth.powf(1.5);
        if stage_2 > self.invert {
            let ratio = (stage_2 / stage_1).max(0.0);
            let submergence = (1.0 - ratio.powf(1.5).powf(0.385)).max(0.0);
            free * submergence
        } else {
            free
        }
    }

    /// Discharge from `stage_1` to `stage_2`; never fails.
    pub fn flow(&self, stage_1: f64, stage_2: f64) -> HydraulicResult<f64> {
        let flow = match self.section.rise().ok() {
            Some(rise) if stage_1 > self.invert + rise => {
                self.orifice_flow(rise, stage_1, stage_2)
            }
            _ if stage_1 > self.invert => self.weir_flow(stage_1, stage_2),
            _ => 0.0,
        };
        Ok(flow)
    }
}

impl Conveyance for Weir {
    fn flow(&self, stage_1: f64, stage_2: f64) -> HydraulicResult<f64> {
        Weir::flow(self, stage_1, stage_2)
    }

    fn control_invert(&self) -> f64 {
        self.invert
    }

    fn rise(&self) -> Option<f64> {
        Geometry::rise(self.section.as_ref())
    }
}
