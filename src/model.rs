/// Core data types for the drainage hydraulics crate.
///
/// This module defines the shared constants, error types, and result
/// records imported by all other modules. It contains no solver logic.
///
/// All quantities are US customary: feet, seconds, cubic feet per second,
/// acres for drainage area, inches for rainfall depth.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Physical constants
// ---------------------------------------------------------------------------

/// Manning's equation unit constant for US customary units.
pub const K_MANNING: f64 = 1.4859;

/// Gravitational acceleration, in ft/s².
pub const G: f64 = 32.2;

/// Converts acre-inches per hour to cubic feet per second.
pub const K_RATIONAL: f64 = 43560.0 / 12.0 / 60.0 / 60.0;

/// Specific weight of water, in lb/ft³.
pub const SG_WATER: f64 = 62.4;

/// Square feet per acre.
pub const SQFT_PER_ACRE: f64 = 43560.0;

pub const SECONDS_PER_HOUR: f64 = 3600.0;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while building a network or solving its hydraulics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HydraulicError {
    /// A link was given the same node at both ends.
    #[error("link endpoints must differ (node {node})")]
    SameEndpoints { node: usize },

    /// No trial value produced a usable bracket within the trial budget.
    #[error("{operation}: upper bound not found within {trials} trials")]
    BoundNotFound { operation: &'static str, trials: usize },

    /// The bracket handed to the bisection does not straddle a root.
    #[error("{operation}: no sign change between {lower} and {upper}")]
    NoSignChange {
        operation: &'static str,
        lower: f64,
        upper: f64,
    },

    /// Bisection ran out of iterations before meeting its tolerance.
    #[error("{operation}: did not converge after {iterations} iterations")]
    NotConverged {
        operation: &'static str,
        iterations: usize,
    },

    /// An enumerated option was outside its recognized set.
    #[error("invalid value '{value}' for {name}")]
    InvalidOption { name: &'static str, value: String },

    /// `rise` was requested from a section with no top.
    #[error("section only has a defined rise when it is closed")]
    UndefinedRise,

    /// A reach was built on a section without Manning's n.
    #[error("section has no Manning roughness")]
    MissingRoughness,

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("unknown node id {0}")]
    UnknownNode(usize),

    #[error("unknown link id {0}")]
    UnknownLink(usize),

    /// The operation needs a reach but the link is a weir (or the reverse).
    #[error("link {link} does not support {operation}")]
    IncompatibleLink { link: usize, operation: &'static str },

    /// The operation needs a rational-method basin.
    #[error("basin at node {node} does not support {operation}")]
    IncompatibleBasin { node: usize, operation: &'static str },

    /// No link drains into the analysis node.
    #[error("no link drains to node {0}")]
    NoOutlet(usize),

    /// Two routed links draw on the same reservoir.
    #[error("node {0} has a reservoir drained by more than one routed link")]
    SharedReservoir(usize),

    #[error("invalid time series: {0}")]
    InvalidTimeSeries(String),
}

pub type HydraulicResult<T> = Result<T, HydraulicError>;

/// Errors raised by file-backed inputs: tables and settings.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type DataResult<T> = Result<T, DataError>;

// ---------------------------------------------------------------------------
// Result records
// ---------------------------------------------------------------------------

/// Steady-state solution for one link.
///
/// Times of concentration are in minutes, stages in feet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HglRecord {
    /// Cumulative drainage area, in acres.
    pub area: f64,
    /// Area-weighted runoff coefficient.
    pub runoff_coefficient: f64,
    pub flow: f64,
    pub tc_local: f64,
    /// `tc_local` plus travel time through the link.
    pub tc_cumulative: f64,
    pub hgl_upstream: f64,
    pub hgl_downstream: f64,
}

impl HglRecord {
    /// Runoff-weighted area (`C·A`), in acres.
    pub fn runoff_area(&self) -> f64 {
        self.area * self.runoff_coefficient
    }
}

/// One time step of a routed link. Time in hours, flows in cfs,
/// storage in ft³, stage in feet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutingRow {
    pub time: f64,
    pub inflow: f64,
    pub outflow: f64,
    pub storage: f64,
    pub stage: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
