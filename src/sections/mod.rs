/// Cross-section geometry.
///
/// A [`Section`] is an immutable value: a [`Shape`], the number of parallel
/// identical barrels (`count`), and an optional Manning roughness. Links
/// hold sections through `Arc` so one pipe size can be shared by every
/// reach built from it.
///
/// Every geometric quantity is a function of depth measured from the
/// lowest point of the shape. Closed shapes clamp depth to their rise.
///
/// Submodules:
/// - `shapes`: circle, rectangle and trapezoid formulas.
/// - `irregular`: polyline sections clipped against the waterline.

pub mod irregular;
pub mod shapes;

use serde::{Deserialize, Serialize};

use crate::model::{HydraulicError, HydraulicResult};

pub use irregular::Irregular;
pub use shapes::{Circle, Rectangle, Trapezoid};

// ---------------------------------------------------------------------------
// Geometry capability
// ---------------------------------------------------------------------------

/// Depth-dependent geometry of a single barrel.
pub trait Geometry {
    fn flow_area(&self, depth: f64) -> f64;
    fn wet_perimeter(&self, depth: f64) -> f64;
    fn surface_width(&self, depth: f64) -> f64;
    /// Horizontal projection of the wetted boundary, used as weir crest length.
    fn projection(&self, depth: f64) -> f64;
    /// Full height, or `None` for shapes without a top.
    fn rise(&self) -> Option<f64>;

    /// `flow_area / wet_perimeter`, zero when the perimeter is zero.
    fn hydraulic_radius(&self, depth: f64) -> f64 {
        let perimeter = self.wet_perimeter(depth);
        if perimeter > 0.0 {
            self.flow_area(depth) / perimeter
        } else {
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Shape sum type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    Circle(Circle),
    Rectangle(Rectangle),
    /// Stored as its side; behaves as a rectangle with equal span and rise.
    Square { side: f64 },
    Trapezoid(Trapezoid),
    Irregular(Irregular),
}

impl Shape {
    fn square_as_rectangle(side: f64) -> Rectangle {
        Rectangle { span: side, rise: side }
    }
}

impl Geometry for Shape {
    fn flow_area(&self, depth: f64) -> f64 {
        match self {
            Shape::Circle(s) => s.flow_area(depth),
            Shape::Rectangle(s) => s.flow_area(depth),
            Shape::Square { side } => Self::square_as_rectangle(*side).flow_area(depth),
            Shape::Trapezoid(s) => s.flow_area(depth),
            Shape::Irregular(s) => s.flow_area(depth),
        }
    }

    fn wet_perimeter(&self, depth: f64) -> f64 {
        match self {
            Shape::Circle(s) => s.wet_perimeter(depth),
            Shape::Rectangle(s) => s.wet_perimeter(depth),
            Shape::Square { side } => Self::square_as_rectangle(*side).wet_perimeter(depth),
            Shape::Trapezoid(s) => s.wet_perimeter(depth),
            Shape::Irregular(s) => s.wet_perimeter(depth),
        }
    }

    fn surface_width(&self, depth: f64) -> f64 {
        match self {
            Shape::Circle(s) => s.surface_width(depth),
            Shape::Rectangle(s) => s.surface_width(depth),
            Shape::Square { side } => Self::square_as_rectangle(*side).surface_width(depth),
            Shape::Trapezoid(s) => s.surface_width(depth),
            Shape::Irregular(s) => s.surface_width(depth),
        }
    }

    fn projection(&self, depth: f64) -> f64 {
        match self {
            Shape::Circle(s) => s.projection(depth),
            Shape::Rectangle(s) => s.projection(depth),
            Shape::Square { side } => Self::square_as_rectangle(*side).projection(depth),
            Shape::Trapezoid(s) => s.projection(depth),
            Shape::Irregular(s) => s.projection(depth),
        }
    }

    fn rise(&self) -> Option<f64> {
        match self {
            Shape::Circle(s) => s.rise(),
            Shape::Rectangle(s) => s.rise(),
            Shape::Square { side } => Some(*side),
            Shape::Trapezoid(s) => s.rise(),
            Shape::Irregular(s) => s.rise(),
        }
    }
}

// ---------------------------------------------------------------------------
// Section value
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SectionFields")]
pub struct Section {
    pub shape: Shape,
    /// Parallel identical barrels; scales every quantity.
    pub count: u32,
    /// Manning's n.
    pub roughness: Option<f64>,
}

#[derive(Deserialize)]
struct SectionFields {
    shape: Shape,
    count: u32,
    roughness: Option<f64>,
}

impl TryFrom<SectionFields> for Section {
    type Error = HydraulicError;

    fn try_from(fields: SectionFields) -> HydraulicResult<Self> {
        let section = Section::from_shape(fields.shape).with_count(fields.count)?;
        match fields.roughness {
            Some(n) => section.with_roughness(n),
            None => Ok(section),
        }
    }
}

fn positive(name: &str, value: f64) -> HydraulicResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(HydraulicError::InvalidGeometry(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}

fn non_negative(name: &str, value: f64) -> HydraulicResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(HydraulicError::InvalidGeometry(format!(
            "{} must not be negative, got {}",
            name, value
        )))
    }
}

impl Section {
    fn from_shape(shape: Shape) -> Self {
        Self {
            shape,
            count: 1,
            roughness: None,
        }
    }

    pub fn circle(diameter: f64) -> HydraulicResult<Self> {
        let diameter = positive("diameter", diameter)?;
        Ok(Self::from_shape(Shape::Circle(Circle { diameter })))
    }

    pub fn rectangle(span: f64, rise: f64) -> HydraulicResult<Self> {
        let span = positive("span", span)?;
        let rise = positive("rise", rise)?;
        Ok(Self::from_shape(Shape::Rectangle(Rectangle { span, rise })))
    }

    pub fn square(side: f64) -> HydraulicResult<Self> {
        let side = positive("side", side)?;
        Ok(Self::from_shape(Shape::Square { side }))
    }

    /// Open trapezoidal channel. Slopes are horizontal:vertical.
    pub fn trapezoid(left_slope: f64, bottom_width: f64, right_slope: f64) -> HydraulicResult<Self> {
        Ok(Self::from_shape(Shape::Trapezoid(Trapezoid {
            left_slope: non_negative("left slope", left_slope)?,
            bottom_width: non_negative("bottom width", bottom_width)?,
            right_slope: non_negative("right slope", right_slope)?,
            rise: None,
        })))
    }

    /// Trapezoid with a top at `rise`.
    pub fn closed_trapezoid(
        left_slope: f64,
        bottom_width: f64,
        right_slope: f64,
        rise: f64,
    ) -> HydraulicResult<Self> {
        let mut section = Self::trapezoid(left_slope, bottom_width, right_slope)?;
        if let Shape::Trapezoid(ref mut t) = section.shape {
            t.rise = Some(positive("rise", rise)?);
        }
        Ok(section)
    }

    /// Polyline section from `(horizontal, elevation)` vertices.
    pub fn irregular(points: Vec<(f64, f64)>, closed: bool) -> HydraulicResult<Self> {
        Ok(Self::from_shape(Shape::Irregular(Irregular::new(points, closed)?)))
    }

    pub fn with_roughness(mut self, n: f64) -> HydraulicResult<Self> {
        self.roughness = Some(positive("roughness", n)?);
        Ok(self)
    }

    pub fn with_count(mut self, count: u32) -> HydraulicResult<Self> {
        if count == 0 {
            return Err(HydraulicError::InvalidGeometry(
                "barrel count must be at least 1".to_string(),
            ));
        }
        self.count = count;
        Ok(self)
    }

    /// Full height; fails for open shapes.
    pub fn rise(&self) -> HydraulicResult<f64> {
        self.shape.rise().ok_or(HydraulicError::UndefinedRise)
    }

    pub fn is_closed(&self) -> bool {
        self.shape.rise().is_some()
    }

    /// Flow area at the crown (all barrels).
    pub fn full_area(&self) -> HydraulicResult<f64> {
        Ok(self.flow_area(self.rise()?))
    }

    /// Manning's n, required by every reach computation.
    pub fn roughness(&self) -> HydraulicResult<f64> {
        positive("roughness", self.roughness.ok_or(HydraulicError::MissingRoughness)?)
    }

    fn scale(&self) -> f64 {
        f64::from(self.count)
    }
}

impl Geometry for Section {
    fn flow_area(&self, depth: f64) -> f64 {
        self.scale() * self.shape.flow_area(depth)
    }

    fn wet_perimeter(&self, depth: f64) -> f64 {
        self.scale() * self.shape.wet_perimeter(depth)
    }

    fn surface_width(&self, depth: f64) -> f64 {
        self.scale() * self.shape.surface_width(depth)
    }

    fn projection(&self, depth: f64) -> f64 {
        self.scale() * self.shape.projection(depth)
    }

    fn rise(&self) -> Option<f64> {
        self.shape.rise()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
