//! Closed-form section shapes.

use serde::{Deserialize, Serialize};

use super::Geometry;

// ---------------------------------------------------------------------------
// Circle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub diameter: f64,
}

impl Circle {
    /// Central angle subtended by the water surface.
    fn alpha(&self, depth: f64) -> f64 {
        let d = depth.clamp(0.0, self.diameter);
        2.0 * (1.0 - 2.0 * d / self.diameter).acos()
    }
}

impl Geometry for Circle {
    fn flow_area(&self, depth: f64) -> f64 {
        let alpha = self.alpha(depth);
        self.diameter.powi(2) / 8.0 * (alpha - alpha.sin())
    }

    fn wet_perimeter(&self, depth: f64) -> f64 {
        self.alpha(depth) * self.diameter / 2.0
    }

    fn surface_width(&self, depth: f64) -> f64 {
        self.diameter * (self.alpha(depth) / 2.0).sin()
    }

    fn projection(&self, depth: f64) -> f64 {
        if depth < self.diameter / 2.0 {
            self.surface_width(depth)
        } else {
            self.diameter
        }
    }

    fn rise(&self) -> Option<f64> {
        Some(self.diameter)
    }
}

// ---------------------------------------------------------------------------
// Rectangle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub span: f64,
    pub rise: f64,
}

impl Geometry for Rectangle {
    fn flow_area(&self, depth: f64) -> f64 {
        depth.clamp(0.0, self.rise) * self.span
    }

    /// Three sides while flowing partly full, the whole box once full.
    fn wet_perimeter(&self, depth: f64) -> f64 {
        if depth < self.rise {
            self.span + 2.0 * depth.max(0.0)
        } else {
            2.0 * self.span + 2.0 * self.rise
        }
    }

    fn surface_width(&self, _depth: f64) -> f64 {
        self.span
    }

    fn projection(&self, _depth: f64) -> f64 {
        self.span
    }

    fn rise(&self) -> Option<f64> {
        Some(self.rise)
    }
}

// ---------------------------------------------------------------------------
// Trapezoid
// ---------------------------------------------------------------------------

/// Side slopes are horizontal run per unit of vertical rise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trapezoid {
    pub left_slope: f64,
    pub bottom_width: f64,
    pub right_slope: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rise: Option<f64>,
}

impl Trapezoid {
    fn clamp(&self, depth: f64) -> f64 {
        match self.rise {
            Some(rise) => depth.clamp(0.0, rise),
            None => depth.max(0.0),
        }
    }

    fn side_lengths(&self, depth: f64) -> f64 {
        let d = self.clamp(depth);
        (d.powi(2) * (1.0 + self.left_slope.powi(2))).sqrt()
            + (d.powi(2) * (1.0 + self.right_slope.powi(2))).sqrt()
    }
}

impl Geometry for Trapezoid {
    fn flow_area(&self, depth: f64) -> f64 {
        let d = self.clamp(depth);
        (self.left_slope + self.right_slope) * d.powi(2) / 2.0 + self.bottom_width * d
    }

    fn wet_perimeter(&self, depth: f64) -> f64 {
        let open = self.bottom_width + self.side_lengths(depth);
        match self.rise {
            // A full closed trapezoid also wets its lid.
            Some(rise) if depth >= rise => open + self.surface_width(rise),
            _ => open,
        }
    }

    fn surface_width(&self, depth: f64) -> f64 {
        let d = self.clamp(depth);
        self.left_slope * d + self.bottom_width + self.right_slope * d
    }

    fn projection(&self, depth: f64) -> f64 {
        self.surface_width(depth)
    }

    fn rise(&self) -> Option<f64> {
        self.rise
    }
}
