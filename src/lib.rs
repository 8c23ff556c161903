//! Storm-drainage hydraulics: section geometry, reach and weir hydraulics,
//! drainage networks, steady rational-method grade lines and storage
//! routing.

pub mod analysis;
pub mod config;
pub mod hydrology;
pub mod links;
pub mod logging;
pub mod model;
pub mod network;
pub mod profile;
pub mod sections;
pub mod solver;
pub mod tabular;

pub use model::{DataError, DataResult, HglRecord, HydraulicError, HydraulicResult, RoutingRow};
pub use network::{LinkId, Network, NodeId};
