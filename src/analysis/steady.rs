//! Steady-state rational-method analysis.
//!
//! Runoff is accumulated from the top of the network down to the analysis
//! node, sizing each link's flow by the rational method at its time of
//! concentration. The hydraulic grade line is then carried back up from
//! the tailwater, with the highest upstream stage winning at confluences.

use serde::Serialize;

use crate::hydrology::{Basin, Intensity};
use crate::links::Reach;
use crate::logging::{self, Component};
use crate::model::{HglRecord, HydraulicError, HydraulicResult, K_RATIONAL};
use crate::network::{LinkId, Network, NodeId};

#[derive(Debug, Clone, PartialEq)]
pub struct SteadyAnalysis {
    /// Node the network drains to.
    pub node: NodeId,
    /// Stage at `node`, in feet.
    pub tailwater: f64,
    pub intensity: Intensity,
}

/// Per-link records in upstream-to-downstream order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SteadyResults {
    pub records: Vec<(LinkId, HglRecord)>,
}

impl SteadyResults {
    pub fn get(&self, link: LinkId) -> Option<&HglRecord> {
        self.records
            .iter()
            .find(|(id, _)| *id == link)
            .map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records keyed by link label (or index), in traversal order.
    pub fn to_json(&self, network: &Network) -> serde_json::Result<String> {
        let rows: Vec<serde_json::Value> = self
            .records
            .iter()
            .map(|(id, record)| {
                serde_json::json!({
                    "link": network.describe_link(*id),
                    "record": record,
                })
            })
            .collect();
        serde_json::to_string_pretty(&rows)
    }
}

/// Drainage area and runoff coefficient accumulated above one link.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Accumulated {
    area: f64,
    runoff_area: f64,
    tc: f64,
}

impl SteadyAnalysis {
    pub fn new(node: NodeId, tailwater: f64, intensity: Intensity) -> Self {
        Self {
            node,
            tailwater,
            intensity,
        }
    }

    pub fn run(&self, network: &Network) -> HydraulicResult<SteadyResults> {
        let order = network.links_down_to_node(self.node);
        if order.is_empty() {
            return Err(HydraulicError::NoOutlet(self.node.index()));
        }
        logging::debug(
            Component::Steady,
            network.label_of(self.node),
            &format!("solving {} links", order.len()),
        );

        let mut records: Vec<(LinkId, HglRecord)> = Vec::with_capacity(order.len());
        for &id in &order {
            match self.size_link(network, id, &records) {
                Ok(record) => records.push((id, record)),
                Err(err) => {
                    return Err(self.fail(network, id, "runoff", err, order.len(), records.len()));
                }
            }
        }

        for position in (0..records.len()).rev() {
            let id = records[position].0;
            match self.grade_link(network, id, &records) {
                Ok((upstream, downstream)) => {
                    records[position].1.hgl_upstream = upstream;
                    records[position].1.hgl_downstream = downstream;
                }
                Err(err) => {
                    let solved = records.len() - position - 1;
                    return Err(self.fail(network, id, "hgl", err, order.len(), solved));
                }
            }
        }

        logging::log_run_summary(Component::Steady, order.len(), order.len(), 0);
        Ok(SteadyResults { records })
    }

    fn fail(
        &self,
        network: &Network,
        link: LinkId,
        operation: &str,
        err: HydraulicError,
        total: usize,
        solved: usize,
    ) -> HydraulicError {
        let label = network.describe_link(link);
        logging::log_solver_failure(Component::Steady, Some(&label), operation, &err);
        logging::log_run_summary(Component::Steady, total, solved, 1);
        err
    }

    /// Top-down pass for one link: contributing area, time of
    /// concentration, flow, and travel time through the reach.
    fn size_link(
        &self,
        network: &Network,
        id: LinkId,
        upstream: &[(LinkId, HglRecord)],
    ) -> HydraulicResult<HglRecord> {
        let reach = steady_reach(network, id)?;
        let totals = contributing(network, id, upstream)?;

        let flow = if totals.runoff_area > 0.0 {
            self.intensity.at(totals.tc)? * totals.runoff_area * K_RATIONAL
        } else {
            0.0
        };
        let depth = reach.normal_depth(flow)?;

        Ok(HglRecord {
            area: totals.area,
            runoff_coefficient: if totals.area > 0.0 {
                totals.runoff_area / totals.area
            } else {
                0.0
            },
            flow,
            tc_local: totals.tc,
            tc_cumulative: totals.tc + reach.travel_time(depth, flow),
            hgl_upstream: 0.0,
            hgl_downstream: 0.0,
        })
    }

    /// Bottom-up pass for one link. Returns `(upstream, downstream)` HGL.
    fn grade_link(
        &self,
        network: &Network,
        id: LinkId,
        solved: &[(LinkId, HglRecord)],
    ) -> HydraulicResult<(f64, f64)> {
        let link = network.link(id)?;
        let reach = steady_reach(network, id)?;
        let flow = solved
            .iter()
            .find(|(other, _)| *other == id)
            .map(|(_, record)| record.flow)
            .unwrap_or(0.0);

        let mut stage_2 = if link.node_2() == self.node {
            self.tailwater
        } else {
            f64::NEG_INFINITY
        };
        for (other, record) in solved {
            if network.link(*other)?.node_1() == link.node_2() {
                stage_2 = stage_2.max(record.hgl_upstream);
            }
        }
        if !stage_2.is_finite() {
            stage_2 = reach.invert_2;
        }

        Ok((
            reach.hgl_upstream(stage_2, flow)?,
            reach.hgl_downstream(stage_2, flow)?,
        ))
    }
}

fn steady_reach(network: &Network, id: LinkId) -> HydraulicResult<&Reach> {
    network
        .link(id)?
        .as_reach()
        .ok_or(HydraulicError::IncompatibleLink {
            link: id.index(),
            operation: "steady_analysis",
        })
}

/// Own basin plus every already-sized link draining into this link's
/// upstream node.
fn contributing(
    network: &Network,
    id: LinkId,
    upstream: &[(LinkId, HglRecord)],
) -> HydraulicResult<Accumulated> {
    let node_1 = network.link(id)?.node_1();
    let mut totals = match &network.node(node_1)?.basin {
        Some(Basin::Rational(basin)) => Accumulated {
            area: basin.area,
            runoff_area: basin.runoff_area(),
            tc: basin.tc,
        },
        Some(Basin::Nrcs(_)) => {
            return Err(HydraulicError::IncompatibleBasin {
                node: node_1.index(),
                operation: "steady_analysis",
            });
        }
        None => Accumulated::default(),
    };
    for (other, record) in upstream {
        if network.link(*other)?.node_2() == node_1 {
            totals.area += record.area;
            totals.runoff_area += record.runoff_area();
            totals.tc = totals.tc.max(record.tc_cumulative);
        }
    }
    Ok(totals)
}

/// Area and runoff coefficient accumulated to every link draining to
/// `node`, without any hydraulics.
pub fn accumulate_runoff(
    network: &Network,
    node: NodeId,
) -> HydraulicResult<Vec<(LinkId, f64, f64)>> {
    let order = network.links_down_to_node(node);
    let mut records: Vec<(LinkId, HglRecord)> = Vec::with_capacity(order.len());
    for id in order {
        let totals = contributing(network, id, &records)?;
        let record = HglRecord {
            area: totals.area,
            runoff_coefficient: if totals.area > 0.0 {
                totals.runoff_area / totals.area
            } else {
                0.0
            },
            flow: 0.0,
            tc_local: totals.tc,
            tc_cumulative: totals.tc,
            hgl_upstream: 0.0,
            hgl_downstream: 0.0,
        };
        records.push((id, record));
    }
    Ok(records
        .into_iter()
        .map(|(id, r)| (id, r.area, r.runoff_coefficient))
        .collect())
}
