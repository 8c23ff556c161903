//! Ordered walks over a flat list of links.
//!
//! None of these modify the list they are given; they return link ids
//! reordered for the walk.

use super::{LinkId, Network, NodeId};

/// Breadth-first walk upstream from `node`, closest links first.
///
/// Each visited node is checked against the remaining links in list order;
/// a link is taken when it drains into a visited node and its upstream end
/// has not been visited yet.
pub fn links_up_from_node(network: &Network, links: &[LinkId], node: NodeId) -> Vec<LinkId> {
    let mut remaining: Vec<LinkId> = links
        .iter()
        .copied()
        .filter(|&id| network.link(id).is_ok())
        .collect();
    let mut visited = vec![node];
    let mut ordered = Vec::new();

    let mut found = true;
    while found {
        found = false;
        let mut k = 0;
        while k < visited.len() {
            let current = visited[k];
            let mut j = 0;
            while j < remaining.len() {
                let (node_1, node_2) = match network.link(remaining[j]) {
                    Ok(link) => (link.node_1(), link.node_2()),
                    Err(_) => {
                        j += 1;
                        continue;
                    }
                };
                if node_2 == current && !visited.contains(&node_1) {
                    visited.push(node_1);
                    ordered.push(remaining.remove(j));
                    found = true;
                } else {
                    j += 1;
                }
            }
            k += 1;
        }
    }
    ordered
}

/// Upstream-to-downstream order ending at `node`.
pub fn links_down_to_node(network: &Network, links: &[LinkId], node: NodeId) -> Vec<LinkId> {
    let mut ordered = links_up_from_node(network, links, node);
    ordered.reverse();
    ordered
}

/// Follows the single chain of links downstream from `node` until no link
/// leaves the current node.
pub fn links_down_from_node(network: &Network, links: &[LinkId], node: NodeId) -> Vec<LinkId> {
    let mut ordered: Vec<LinkId> = Vec::new();
    let mut current = node;
    while let Some(next) = links.iter().copied().find(|id| {
        !ordered.contains(id)
            && network
                .link(*id)
                .map(|link| link.node_1() == current)
                .unwrap_or(false)
    }) {
        ordered.push(next);
        match network.link(next) {
            Ok(link) => current = link.node_2(),
            Err(_) => break,
        }
    }
    ordered
}

/// Downstream-to-upstream order of the chain leaving `node`.
pub fn links_up_to_node(network: &Network, links: &[LinkId], node: NodeId) -> Vec<LinkId> {
    let mut ordered = links_down_from_node(network, links, node);
    ordered.reverse();
    ordered
}
