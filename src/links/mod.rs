/// Conveyance links between network nodes.
///
/// A [`Link`] is a directed edge from `node_1` (upstream) to `node_2`
/// (downstream) carrying either a [`Reach`] (open channel or conduit) or a
/// [`Weir`] (weir/orifice control). Both answer the same question through
/// [`Conveyance::flow`]: given the water surface at each end, how much
/// passes?
///
/// Submodules:
/// - `reach`: Manning and energy-balance hydraulics.
/// - `weir`: weir and orifice discharge.

pub mod reach;
pub mod weir;

use serde::{Deserialize, Serialize};

use crate::model::{HydraulicError, HydraulicResult};
use crate::network::NodeId;

pub use reach::{Reach, ShearBasis};
pub use weir::Weir;

// ---------------------------------------------------------------------------
// Conveyance capability
// ---------------------------------------------------------------------------

pub trait Conveyance {
    /// Flow from `stage_1` (upstream end) to `stage_2` (downstream end), in cfs.
    fn flow(&self, stage_1: f64, stage_2: f64) -> HydraulicResult<f64>;

    /// Lowest elevation water must reach at the upstream end before it moves.
    fn control_invert(&self) -> f64;

    /// Height of the opening, if it has a top.
    fn rise(&self) -> Option<f64>;
}

// ---------------------------------------------------------------------------
// Link
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinkKind {
    Reach(Reach),
    Weir(Weir),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub label: Option<String>,
    node_1: NodeId,
    node_2: NodeId,
    pub kind: LinkKind,
}

impl Link {
    /// Fails if both ends are the same node.
    pub fn new(node_1: NodeId, node_2: NodeId, kind: LinkKind) -> HydraulicResult<Self> {
        if node_1 == node_2 {
            return Err(HydraulicError::SameEndpoints { node: node_1.index() });
        }
        Ok(Self {
            label: None,
            node_1,
            node_2,
            kind,
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn node_1(&self) -> NodeId {
        self.node_1
    }

    pub fn node_2(&self) -> NodeId {
        self.node_2
    }

    /// Re-points the downstream end. The upstream end is fixed by the
    /// node that owns the link.
    pub fn set_node_2(&mut self, node: NodeId) -> HydraulicResult<()> {
        if node == self.node_1 {
            return Err(HydraulicError::SameEndpoints { node: node.index() });
        }
        self.node_2 = node;
        Ok(())
    }

    pub(crate) fn set_node_1(&mut self, node: NodeId) -> HydraulicResult<()> {
        if node == self.node_2 {
            return Err(HydraulicError::SameEndpoints { node: node.index() });
        }
        self.node_1 = node;
        Ok(())
    }

    pub fn as_reach(&self) -> Option<&Reach> {
        match &self.kind {
            LinkKind::Reach(reach) => Some(reach),
            LinkKind::Weir(_) => None,
        }
    }

    pub fn as_weir(&self) -> Option<&Weir> {
        match &self.kind {
            LinkKind::Weir(weir) => Some(weir),
            LinkKind::Reach(_) => None,
        }
    }

    /// Elevation at the downstream end, used when nothing downstream sets
    /// a tailwater.
    pub fn downstream_invert(&self) -> f64 {
        match &self.kind {
            LinkKind::Reach(reach) => reach.invert_2,
            LinkKind::Weir(weir) => weir.invert,
        }
    }

    pub fn label_or_index(&self, index: usize) -> String {
        self.label.clone().unwrap_or_else(|| format!("#{}", index))
    }
}

impl Conveyance for Link {
    fn flow(&self, stage_1: f64, stage_2: f64) -> HydraulicResult<f64> {
        match &self.kind {
            LinkKind::Reach(reach) => reach.flow(stage_1, stage_2),
            LinkKind::Weir(weir) => weir.flow(stage_1, stage_2),
        }
    }

    fn control_invert(&self) -> f64 {
        match &self.kind {
            LinkKind::Reach(reach) => reach.control_invert(),
            LinkKind::Weir(weir) => weir.control_invert(),
        }
    }

    fn rise(&self) -> Option<f64> {
        match &self.kind {
            LinkKind::Reach(reach) => Conveyance::rise(reach),
            LinkKind::Weir(weir) => Conveyance::rise(weir),
        }
    }
}
