/// Integration tests for storage routing
///
/// Tests verify:
/// 1. Stage–storage round trip on a surveyed pond
/// 2. Orifice bleed-down of a detention pond with no inflow
/// 3. Mass balance while an NRCS storm fills and drains a pond
/// 4. Pass-through conduits under a rising tailwater
///
/// Run with: cargo test --test storage_routing

use std::sync::Arc;

use drainflo::analysis::{Boundary, Reservoir, RoutingAnalysis, Tailwater};
use drainflo::hydrology::{Hydrograph, NrcsBasin, RationalBasin};
use drainflo::model::{SECONDS_PER_HOUR, SQFT_PER_ACRE};
use drainflo::sections::Section;
use drainflo::{LinkId, Network, NodeId, RoutingRow};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn acres(a: f64) -> f64 {
    a * SQFT_PER_ACRE
}

fn detention_pond(start: f64) -> Reservoir {
    Reservoir::new(
        vec![
            (16.0, acres(0.10)),
            (21.5, acres(0.42)),
            (23.5, acres(0.61)),
            (29.8, acres(1.25)),
        ],
        Some(start),
    )
    .unwrap()
}

/// A pond at `start` draining through a 3.25-inch orifice to an outfall.
fn pond_with_orifice(start: f64) -> (Network, NodeId, NodeId, LinkId) {
    let mut net = Network::new();
    let pond = net.create_named_node("pond");
    let outfall = net.create_named_node("outfall");
    let orifice = Arc::new(Section::circle(3.25 / 12.0).unwrap());
    let link = net.create_weir(pond, outfall, 23.5, 0.6, 3.2, orifice).unwrap();
    net.add_reservoir(pond, detention_pond(start)).unwrap();
    (net, pond, outfall, link)
}

/// Net volume entering over the run, by the same trapezoid rule the
/// routing uses.
fn net_inflow_volume(rows: &[RoutingRow]) -> f64 {
    rows.windows(2)
        .map(|w| {
            let dt = (w[1].time - w[0].time) * SECONDS_PER_HOUR;
            ((w[0].inflow + w[1].inflow) / 2.0 - (w[0].outflow + w[1].outflow) / 2.0) * dt
        })
        .sum()
}

// ---------------------------------------------------------------------------
// Reservoir
// ---------------------------------------------------------------------------

#[test]
fn test_surveyed_pond_round_trip() {
    let pond = Reservoir::new(
        vec![
            (1.5, acres(6.07)),
            (14.0, acres(0.75)),
            (17.0, acres(0.81)),
            (17.0, acres(2.95)),
            (26.0, acres(4.46)),
            (30.5, acres(5.10)),
        ],
        None,
    )
    .unwrap();

    let stages: Vec<f64> = pond.contours().iter().map(|c| c.0).collect();
    assert!(stages.windows(2).all(|w| w[0] <= w[1]), "contours sorted: {:?}", stages);

    let volume = pond.storage(20.0);
    let stage = pond.stage(volume).unwrap();
    assert!((stage - 20.0).abs() < 1e-6, "recovered stage {}", stage);
}

// ---------------------------------------------------------------------------
// Bleed-down
// ---------------------------------------------------------------------------

#[test]
fn test_orifice_bleed_down_over_two_hours() {
    let (net, _, outfall, link) = pond_with_orifice(25.35);
    let analysis = RoutingAnalysis::new(outfall, Boundary::Fixed(0.0), 2.0, 5.0 / 60.0);
    let results = analysis.run(&net).unwrap();
    let rows = results.get(link).unwrap();

    assert_eq!(rows.len(), 25);
    let last = rows.last().unwrap();
    assert!((last.time - 2.0).abs() < 1e-9);
    assert!(
        (last.stage - 25.27678).abs() < 0.005,
        "final stage {:.5}",
        last.stage
    );
    assert!(rows.iter().all(|r| r.inflow == 0.0));
}

#[test]
fn test_bleed_down_conserves_volume() {
    let (net, _, outfall, link) = pond_with_orifice(25.35);
    let analysis = RoutingAnalysis::new(outfall, Boundary::Fixed(0.0), 2.0, 5.0 / 60.0);
    let results = analysis.run(&net).unwrap();
    let rows = results.get(link).unwrap();

    let released = -net_inflow_volume(rows);
    let lost = rows[0].storage - rows[rows.len() - 1].storage;
    assert!(
        (released - lost).abs() < 1e-6 * lost,
        "released {} vs storage lost {}",
        released,
        lost
    );
}

#[test]
fn test_pond_below_orifice_holds_still() {
    let (net, _, outfall, link) = pond_with_orifice(22.0);
    let analysis = RoutingAnalysis::new(outfall, Boundary::Fixed(0.0), 1.0, 0.25);
    let results = analysis.run(&net).unwrap();
    for row in results.get(link).unwrap() {
        assert_eq!(row.outflow, 0.0);
        assert!((row.stage - 22.0).abs() < 1e-9, "stage {}", row.stage);
    }
}

// ---------------------------------------------------------------------------
// Storm inflow
// ---------------------------------------------------------------------------

#[test]
fn test_nrcs_storm_fills_then_drains_pond() {
    let (mut net, pond, outfall, link) = pond_with_orifice(23.5);
    let unit = Hydrograph::new(vec![(0.0, 0.0), (1.0, 1.0), (2.67, 0.0)]).unwrap();
    net.add_basin(pond, NrcsBasin::new(4.6, 85.0, 2.3, unit, 484.0)).unwrap();
    let rain = Hydrograph::new(vec![(0.0, 0.0), (2.0, 0.8), (3.0, 3.2), (6.0, 4.0)]).unwrap();

    let analysis =
        RoutingAnalysis::new(outfall, Boundary::Fixed(0.0), 12.0, 0.1).with_rain(rain);
    let results = analysis.run(&net).unwrap();
    let rows = results.get(link).unwrap();

    let peak = rows.iter().map(|r| r.stage).fold(f64::NEG_INFINITY, f64::max);
    assert!(peak > 24.0, "storm raises the pond: peak {}", peak);
    assert!(rows.last().unwrap().stage < peak, "pond is draining by the end");
    assert!(rows.iter().all(|r| r.outflow >= 0.0));

    let stored = rows[rows.len() - 1].storage - rows[0].storage;
    let net_in = net_inflow_volume(rows);
    assert!(
        (stored - net_in).abs() < 1e-6 * stored.abs().max(1.0),
        "stored {} vs net inflow {}",
        stored,
        net_in
    );
}

// ---------------------------------------------------------------------------
// Pass-through conduits
// ---------------------------------------------------------------------------

#[test]
fn test_conduit_passes_inflow_under_rising_tailwater() {
    let mut net = Network::new();
    let inlet = net.create_named_node("inlet");
    let outfall = net.create_named_node("outfall");
    let pipe = Arc::new(Section::circle(1.5).unwrap().with_roughness(0.012).unwrap());
    let link = net.create_reach(inlet, outfall, 4.1, 4.0, 65.76, pipe).unwrap();
    net.add_basin(inlet, RationalBasin::new(1.58, 0.276, 10.0)).unwrap();

    let rain = Hydrograph::new(vec![(0.0, 0.0), (1.0, 1.5)]).unwrap();
    let tailwater = Tailwater::new(vec![(0.0, 4.0), (1.0, 5.0)]).unwrap();
    let analysis = RoutingAnalysis::new(outfall, Boundary::Series(tailwater.clone()), 1.0, 0.25)
        .with_rain(rain);
    let results = analysis.run(&net).unwrap();
    let rows = results.get(link).unwrap();

    assert_eq!(rows.len(), 5);
    for row in &rows[1..] {
        assert_eq!(row.outflow, row.inflow, "no storage in a conduit");
        assert_eq!(row.storage, 0.0);
        assert!(row.stage >= tailwater.stage_at(row.time));
        assert!(row.stage > 4.1);
    }
}

#[test]
fn test_outflow_joins_downstream_inflow_in_same_step() {
    let (mut net, _, outfall, orifice) = pond_with_orifice(25.35);
    let river = net.create_named_node("river");
    let pipe = Arc::new(Section::circle(1.0).unwrap().with_roughness(0.013).unwrap());
    let outlet_pipe = net.create_reach(outfall, river, 10.0, 9.5, 50.0, pipe).unwrap();

    let analysis = RoutingAnalysis::new(river, Boundary::Fixed(0.0), 0.5, 0.1);
    let results = analysis.run(&net).unwrap();
    let upper = results.get(orifice).unwrap();
    let lower = results.get(outlet_pipe).unwrap();

    for (a, b) in upper.iter().zip(lower.iter()).skip(1) {
        assert!((b.inflow - a.outflow).abs() < 1e-12);
        assert!((b.outflow - b.inflow).abs() < 1e-12);
    }
}
