/// Network-wide analyses.
///
/// Both analyses take a built [`Network`](crate::network::Network) and the
/// node it drains to, order the contributing links with the traversal
/// routines, and return per-link result tables without touching the
/// network itself.
///
/// Submodules:
/// - `steady`: rational-method flows and the hydraulic grade line.
/// - `storage`: reservoir stage–storage and tailwater series.
/// - `routing`: time-stepped storage routing.

pub mod routing;
pub mod steady;
pub mod storage;

pub use routing::{Boundary, RoutingAnalysis, RoutingResults, RoutingRun, RunState};
pub use steady::{SteadyAnalysis, SteadyResults, accumulate_runoff};
pub use storage::{Reservoir, Tailwater};
