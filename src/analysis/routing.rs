//! Storage routing through reservoirs and conduits.
//!
//! Each step runs in two phases. First every link's tailwater is taken
//! from the previous row of whatever lies below it, so no link reads a
//! value solved earlier in the same step. Then links are solved from the
//! top of the network down, and each outflow joins the inflow of the links
//! leaving its downstream node within the same step.
//!
//! A link leaving a reservoir satisfies continuity over the step:
//!
//! ```text
//! S(h) − S_prev = ((I_prev + I)/2 − (O_prev + O(h))/2) · Δt
//! ```
//!
//! A link without storage passes its inflow straight through; its stage is
//! the one that carries that flow against the tailwater.

use std::cell::RefCell;

use serde::Serialize;

use super::storage::{Reservoir, Tailwater};
use crate::config::SolverConfig;
use crate::hydrology::Hydrograph;
use crate::links::{Conveyance, Link};
use crate::logging::{self, Component};
use crate::model::{HydraulicError, HydraulicResult, RoutingRow, SECONDS_PER_HOUR};
use crate::network::{LinkId, Network, NodeId};
use crate::solver::{Bisection, BracketPolicy, ScanTarget};

// ---------------------------------------------------------------------------
// Boundary
// ---------------------------------------------------------------------------

/// Stage at the analysis node.
#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    Fixed(f64),
    Series(Tailwater),
}

impl Boundary {
    pub fn stage_at(&self, time: f64) -> f64 {
        match self {
            Boundary::Fixed(stage) => *stage,
            Boundary::Series(tailwater) => tailwater.stage_at(time),
        }
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RoutingAnalysis {
    pub node: NodeId,
    pub boundary: Boundary,
    /// Hours.
    pub duration: f64,
    /// Hours.
    pub interval: f64,
    /// Cumulative rainfall (hours, inches) applied to every basin.
    pub rain: Option<Hydrograph>,
}

impl RoutingAnalysis {
    pub fn new(node: NodeId, boundary: Boundary, duration: f64, interval: f64) -> Self {
        Self {
            node,
            boundary,
            duration,
            interval,
            rain: None,
        }
    }

    pub fn with_rain(mut self, rain: Hydrograph) -> Self {
        self.rain = Some(rain);
        self
    }

    /// Number of steps after the initial row.
    ///
    /// Only whole intervals are routed: a trailing partial interval is
    /// dropped, so 1.0 h at 0.4 h gives two steps ending at 0.8 h.
    pub fn steps(&self) -> usize {
        (self.duration / self.interval + 1e-9).floor().max(0.0) as usize
    }

    /// Validates the network and prepares a run at its initial state.
    pub fn start<'a>(&'a self, network: &'a Network) -> HydraulicResult<RoutingRun<'a>> {
        if !(self.interval > 0.0) || !(self.duration >= 0.0) {
            return Err(HydraulicError::InvalidTimeSeries(format!(
                "routing needs a positive interval and a non-negative duration, got {} and {}",
                self.interval, self.duration
            )));
        }
        let order = network.links_down_to_node(self.node);
        if order.is_empty() {
            return Err(HydraulicError::NoOutlet(self.node.index()));
        }

        let mut links: Vec<&Link> = Vec::with_capacity(order.len());
        for &id in &order {
            links.push(network.link(id)?);
        }
        // A second outlet from a routed reservoir would drain it unseen.
        for id in network.links() {
            if order.contains(&id) {
                continue;
            }
            let node_1 = network.link(id)?.node_1();
            let routed = links.iter().any(|link| link.node_1() == node_1);
            if routed && network.node(node_1)?.reservoir.is_some() {
                return Err(HydraulicError::SharedReservoir(node_1.index()));
            }
        }

        let mut tracks = Vec::with_capacity(order.len());
        for (i, link) in links.iter().enumerate() {
            let node = network.node(link.node_1())?;
            let inflow = match (&self.rain, &node.basin) {
                (Some(rain), Some(basin)) => basin.flood_hydrograph(rain, self.interval)?,
                _ => Hydrograph::default(),
            };
            tracks.push(Track {
                id: order[i],
                link: *link,
                reservoir: node.reservoir.as_ref(),
                inflow,
                upstream: positions(&links, |other| other.node_2() == link.node_1()),
                downstream: positions(&links, |other| other.node_1() == link.node_2()),
                rows: Vec::with_capacity(self.steps() + 1),
            });
        }

        Ok(RoutingRun {
            analysis: self,
            network,
            tracks,
            state: RunState::Init,
        })
    }

    /// Runs to completion.
    pub fn run(&self, network: &Network) -> HydraulicResult<RoutingResults> {
        let mut run = self.start(network)?;
        while run.advance()? {}
        Ok(run.finish())
    }
}

fn positions<F>(links: &[&Link], predicate: F) -> Vec<usize>
where
    F: Fn(&Link) -> bool,
{
    links
        .iter()
        .enumerate()
        .filter(|(_, link)| predicate(link))
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    /// The next step to solve.
    Stepping(usize),
    Done,
}

/// One routed link and its accumulated rows.
#[derive(Debug)]
struct Track<'a> {
    id: LinkId,
    link: &'a Link,
    reservoir: Option<&'a Reservoir>,
    /// Runoff from the basin at the upstream node.
    inflow: Hydrograph,
    /// Positions of tracked links draining into this link's upstream node.
    upstream: Vec<usize>,
    /// Positions of tracked links leaving this link's downstream node.
    downstream: Vec<usize>,
    rows: Vec<RoutingRow>,
}

impl Track<'_> {
    fn last(&self) -> RoutingRow {
        self.rows.last().copied().unwrap_or(RoutingRow {
            time: 0.0,
            inflow: 0.0,
            outflow: 0.0,
            storage: 0.0,
            stage: self.link.downstream_invert(),
        })
    }

    fn runoff_at(&self, time: f64) -> f64 {
        match self.inflow.end() {
            Some(end) if time <= end + 1e-9 => self.inflow.value_at(time),
            _ => 0.0,
        }
    }
}

/// A routing run in progress. Links are held in upstream-to-downstream
/// order.
#[derive(Debug)]
pub struct RoutingRun<'a> {
    analysis: &'a RoutingAnalysis,
    network: &'a Network,
    tracks: Vec<Track<'a>>,
    state: RunState,
}

impl<'a> RoutingRun<'a> {
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Moves the run forward by one state: the initial row, then one step
    /// at a time. Returns `false` once the run is done.
    pub fn advance(&mut self) -> HydraulicResult<bool> {
        let steps = self.analysis.steps();
        match self.state {
            RunState::Init => {
                self.initialize();
                self.state = if steps == 0 {
                    RunState::Done
                } else {
                    RunState::Stepping(1)
                };
            }
            RunState::Stepping(step) => {
                if let Err((position, err)) = self.step(step) {
                    let label = self.network.describe_link(self.tracks[position].id);
                    logging::log_solver_failure(Component::Routing, Some(&label), "routing", &err);
                    logging::log_run_summary(Component::Routing, self.tracks.len(), position, 1);
                    return Err(err);
                }
                self.state = if step >= steps {
                    logging::log_run_summary(
                        Component::Routing,
                        self.tracks.len(),
                        self.tracks.len(),
                        0,
                    );
                    RunState::Done
                } else {
                    RunState::Stepping(step + 1)
                };
            }
            RunState::Done => {}
        }
        Ok(self.state != RunState::Done)
    }

    pub fn finish(self) -> RoutingResults {
        RoutingResults {
            tables: self.tracks.into_iter().map(|t| (t.id, t.rows)).collect(),
        }
    }

    fn initialize(&mut self) {
        let boundary = self.analysis.boundary.stage_at(0.0);
        for track in &mut self.tracks {
            let (stage, storage) = match track.reservoir {
                Some(reservoir) => {
                    let start = reservoir.start_stage();
                    (start, reservoir.storage(start))
                }
                None => (boundary, 0.0),
            };
            track.rows.push(RoutingRow {
                time: 0.0,
                inflow: 0.0,
                outflow: 0.0,
                storage,
                stage,
            });
        }
    }

    /// Solves every link for `step`. On failure, returns the position of
    /// the link that failed.
    fn step(&mut self, step: usize) -> Result<(), (usize, HydraulicError)> {
        let interval = self.analysis.interval;
        let time = step as f64 * interval;

        // Phase 1: tailwater from the previous row.
        let boundary = self.analysis.boundary.stage_at(time);
        let tailwaters: Vec<f64> = self
            .tracks
            .iter()
            .map(|track| {
                if track.link.node_2() == self.analysis.node {
                    boundary
                } else if track.downstream.is_empty() {
                    track.link.downstream_invert()
                } else {
                    track
                        .downstream
                        .iter()
                        .map(|&j| self.tracks[j].last().stage)
                        .fold(f64::NEG_INFINITY, f64::max)
                }
            })
            .collect();

        // Phase 2: solve top down, carrying outflow into the next links.
        let mut outflows: Vec<f64> = vec![0.0; self.tracks.len()];
        for position in 0..self.tracks.len() {
            let track = &self.tracks[position];
            let inflow = track.runoff_at(time)
                + track.upstream.iter().map(|&j| outflows[j]).sum::<f64>();
            let previous = track.last();
            let tailwater = tailwaters[position];
            let solver = self.network.solver();

            let row = match track.reservoir {
                Some(reservoir) => route_reservoir(
                    track.link,
                    reservoir,
                    &previous,
                    inflow,
                    tailwater,
                    interval,
                ),
                None => pass_through(track.link, solver, inflow, tailwater),
            }
            .map(|(stage, storage, outflow)| RoutingRow {
                time,
                inflow,
                outflow,
                storage,
                stage,
            })
            .map_err(|err| (position, err))?;

            outflows[position] = row.outflow;
            self.tracks[position].rows.push(row);
        }
        Ok(())
    }
}

/// Mass balance over one step for a link draining a reservoir. Returns
/// `(stage, storage, outflow)`.
fn route_reservoir(
    link: &Link,
    reservoir: &Reservoir,
    previous: &RoutingRow,
    inflow: f64,
    tailwater: f64,
    interval: f64,
) -> HydraulicResult<(f64, f64, f64)> {
    let seconds = interval * SECONDS_PER_HOUR;
    let failure: RefCell<Option<HydraulicError>> = RefCell::new(None);
    let outflow_at = |stage: f64| match link.flow(stage, tailwater) {
        Ok(flow) => flow,
        Err(err) => {
            failure.borrow_mut().get_or_insert(err);
            f64::NAN
        }
    };
    let balance = |stage: f64| {
        let average_in = (previous.inflow + inflow) / 2.0;
        let average_out = (previous.outflow + outflow_at(stage)) / 2.0;
        reservoir.storage(stage) - previous.storage - (average_in - average_out) * seconds
    };

    let lower = reservoir.min_stage();
    let range = reservoir.max_stage() - lower;
    let stage = if balance(lower) >= 0.0 {
        // Drained to the bottom contour.
        Ok(lower)
    } else {
        let policy = BracketPolicy::Scan {
            lower,
            origin: lower,
            step: range,
            first: 1,
            target: ScanTarget::SignChange,
        };
        Bisection::new(reservoir.solver).solve_with("routing_stage", policy, balance)
    };
    if let Some(err) = failure.into_inner() {
        return Err(err);
    }
    let stage = stage?;
    Ok((stage, reservoir.storage(stage), link.flow(stage, tailwater)?))
}

/// Stage passing `inflow` through a link with no storage. Returns
/// `(stage, storage, outflow)`.
fn pass_through(
    link: &Link,
    solver: SolverConfig,
    inflow: f64,
    tailwater: f64,
) -> HydraulicResult<(f64, f64, f64)> {
    let base = link.control_invert().max(tailwater);
    if inflow <= 0.0 {
        return Ok((base, 0.0, inflow.max(0.0)));
    }
    let failure: RefCell<Option<HydraulicError>> = RefCell::new(None);
    let excess = |stage: f64| match link.flow(stage, tailwater) {
        Ok(flow) => flow - inflow,
        Err(err) => {
            failure.borrow_mut().get_or_insert(err);
            f64::NAN
        }
    };
    let policy = BracketPolicy::Scan {
        lower: base,
        origin: base,
        step: link.rise().unwrap_or(1.0),
        first: 1,
        target: ScanTarget::SignChange,
    };
    let stage = Bisection::new(solver).solve_with("pass_through_stage", policy, excess);
    if let Some(err) = failure.into_inner() {
        return Err(err);
    }
    Ok((stage?, 0.0, inflow))
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Rows per routed link, in upstream-to-downstream order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoutingResults {
    pub tables: Vec<(LinkId, Vec<RoutingRow>)>,
}

impl RoutingResults {
    pub fn get(&self, link: LinkId) -> Option<&[RoutingRow]> {
        self.tables
            .iter()
            .find(|(id, _)| *id == link)
            .map(|(_, rows)| rows.as_slice())
    }

    pub fn to_json(&self, network: &Network) -> serde_json::Result<String> {
        let tables: Vec<serde_json::Value> = self
            .tables
            .iter()
            .map(|(id, rows)| {
                serde_json::json!({
                    "link": network.describe_link(*id),
                    "rows": rows,
                })
            })
            .collect();
        serde_json::to_string_pretty(&tables)
    }
}
