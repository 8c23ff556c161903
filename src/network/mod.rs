/// Drainage network topology.
///
/// The [`Network`] is an arena: it owns every [`Node`] and every [`Link`],
/// and both are addressed by typed indices ([`NodeId`], [`LinkId`]). A node
/// lists the links leaving it; a link names its two end nodes. No value
/// holds a reference to another, so the graph can be mutated freely while
/// it is being built.
///
/// Creation order is significant. [`Network::links`] flattens links in node
/// creation order, and the traversals in `traversal` break ties by that
/// order, so repeated runs over the same build produce the same schedule.

pub mod traversal;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::storage::Reservoir;
use crate::config::SolverConfig;
use crate::hydrology::Basin;
use crate::links::{Link, LinkKind, Reach, Weir};
use crate::model::{HydraulicError, HydraulicResult};
use crate::sections::Section;

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node #{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(pub(crate) usize);

impl LinkId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link #{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Node {
    pub label: Option<String>,
    /// Links leaving this node, in attachment order.
    links: Vec<LinkId>,
    pub basin: Option<Basin>,
    pub reservoir: Option<Reservoir>,
}

impl Node {
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Network {
    nodes: Vec<Node>,
    links: Vec<Link>,
    solver: SolverConfig,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the solver settings of this network and of every reach and
    /// reservoir already in it. Reaches and reservoirs added later inherit
    /// them.
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        for link in &mut self.links {
            if let LinkKind::Reach(reach) = &mut link.kind {
                reach.solver = solver;
            }
        }
        for reservoir in self.nodes.iter_mut().filter_map(|n| n.reservoir.as_mut()) {
            reservoir.solver = solver;
        }
        self
    }

    pub fn solver(&self) -> SolverConfig {
        self.solver
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    pub fn create_node(&mut self) -> NodeId {
        self.nodes.push(Node::default());
        NodeId(self.nodes.len() - 1)
    }

    pub fn create_named_node(&mut self, label: impl Into<String>) -> NodeId {
        let id = self.create_node();
        self.nodes[id.0].label = Some(label.into());
        id
    }

    fn attach(&mut self, link: Link) -> LinkId {
        let id = LinkId(self.links.len());
        let owner = link.node_1();
        self.links.push(link);
        self.nodes[owner.0].links.push(id);
        id
    }

    fn check_node(&self, node: NodeId) -> HydraulicResult<()> {
        if node.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(HydraulicError::UnknownNode(node.0))
        }
    }

    /// Adds a reach from `node_1` down to `node_2`.
    pub fn create_reach(
        &mut self,
        node_1: NodeId,
        node_2: NodeId,
        invert_1: f64,
        invert_2: f64,
        length: f64,
        section: Arc<Section>,
    ) -> HydraulicResult<LinkId> {
        self.check_node(node_1)?;
        self.check_node(node_2)?;
        let reach = Reach::new(invert_1, invert_2, length, section)?.with_solver(self.solver);
        let link = Link::new(node_1, node_2, LinkKind::Reach(reach))?;
        Ok(self.attach(link))
    }

    /// Adds a weir or orifice from `node_1` down to `node_2`.
    pub fn create_weir(
        &mut self,
        node_1: NodeId,
        node_2: NodeId,
        invert: f64,
        orifice_coefficient: f64,
        weir_coefficient: f64,
        section: Arc<Section>,
    ) -> HydraulicResult<LinkId> {
        self.check_node(node_1)?;
        self.check_node(node_2)?;
        let weir = Weir::new(invert, orifice_coefficient, weir_coefficient, section);
        let link = Link::new(node_1, node_2, LinkKind::Weir(weir))?;
        Ok(self.attach(link))
    }

    /// Labels a link and hands its id back for chaining.
    pub fn label_link(&mut self, link: LinkId, label: impl Into<String>) -> HydraulicResult<LinkId> {
        self.link_mut(link)?.label = Some(label.into());
        Ok(link)
    }

    /// Re-points the downstream end of `link`.
    pub fn set_downstream(&mut self, link: LinkId, node: NodeId) -> HydraulicResult<()> {
        self.check_node(node)?;
        self.link_mut(link)?.set_node_2(node)
    }

    /// Moves `link` so that it leaves `node`.
    pub fn add_link(&mut self, node: NodeId, link: LinkId) -> HydraulicResult<()> {
        self.check_node(node)?;
        let previous = self.link(link)?.node_1();
        self.link_mut(link)?.set_node_1(node)?;
        self.nodes[previous.0].links.retain(|&id| id != link);
        self.nodes[node.0].links.push(link);
        Ok(())
    }

    pub fn add_basin(&mut self, node: NodeId, basin: impl Into<Basin>) -> HydraulicResult<()> {
        self.node_mut(node)?.basin = Some(basin.into());
        Ok(())
    }

    pub fn add_reservoir(&mut self, node: NodeId, reservoir: Reservoir) -> HydraulicResult<()> {
        let solver = self.solver;
        self.node_mut(node)?.reservoir = Some(reservoir.with_solver(solver));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn node(&self, id: NodeId) -> HydraulicResult<&Node> {
        self.nodes.get(id.0).ok_or(HydraulicError::UnknownNode(id.0))
    }

    pub fn node_mut(&mut self, id: NodeId) -> HydraulicResult<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(HydraulicError::UnknownNode(id.0))
    }

    pub fn link(&self, id: LinkId) -> HydraulicResult<&Link> {
        self.links.get(id.0).ok_or(HydraulicError::UnknownLink(id.0))
    }

    pub fn link_mut(&mut self, id: LinkId) -> HydraulicResult<&mut Link> {
        self.links.get_mut(id.0).ok_or(HydraulicError::UnknownLink(id.0))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Every link, flattened in node creation order.
    pub fn links(&self) -> Vec<LinkId> {
        self.nodes.iter().flat_map(|n| n.links.iter().copied()).collect()
    }

    pub fn reaches(&self) -> Vec<LinkId> {
        self.links()
            .into_iter()
            .filter(|id| self.links[id.0].as_reach().is_some())
            .collect()
    }

    pub fn basins(&self) -> Vec<(NodeId, &Basin)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.basin.as_ref().map(|b| (NodeId(i), b)))
            .collect()
    }

    /// First reach leaving `node`.
    pub fn primary_reach(&self, node: NodeId) -> Option<LinkId> {
        self.nodes
            .get(node.0)?
            .links
            .iter()
            .copied()
            .find(|id| self.links[id.0].as_reach().is_some())
    }

    pub fn label_of(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0)?.label.as_deref()
    }

    pub fn link_label(&self, link: LinkId) -> Option<&str> {
        self.links.get(link.0)?.label.as_deref()
    }

    /// Label for messages: the link's own label or its index.
    pub fn describe_link(&self, link: LinkId) -> String {
        self.links
            .get(link.0)
            .map(|l| l.label_or_index(link.0))
            .unwrap_or_else(|| link.to_string())
    }

    pub fn find_node(&self, label: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.label.as_deref() == Some(label))
            .map(NodeId)
    }

    pub fn find_link(&self, label: &str) -> Option<LinkId> {
        self.links
            .iter()
            .position(|l| l.label.as_deref() == Some(label))
            .map(LinkId)
    }

    // -----------------------------------------------------------------------
    // Traversal
    // -----------------------------------------------------------------------

    pub fn links_up_from_node(&self, node: NodeId) -> Vec<LinkId> {
        traversal::links_up_from_node(self, &self.links(), node)
    }

    pub fn links_down_to_node(&self, node: NodeId) -> Vec<LinkId> {
        traversal::links_down_to_node(self, &self.links(), node)
    }

    pub fn links_down_from_node(&self, node: NodeId) -> Vec<LinkId> {
        traversal::links_down_from_node(self, &self.links(), node)
    }

    pub fn links_up_to_node(&self, node: NodeId) -> Vec<LinkId> {
        traversal::links_up_to_node(self, &self.links(), node)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
