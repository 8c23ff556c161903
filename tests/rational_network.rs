/// Integration tests for steady rational-method analysis
///
/// Tests verify:
/// 1. A single culvert sized from one basin and an IDF fit
/// 2. Runoff accumulation and grade lines through a branching storm sewer
/// 3. Traversal order on a branching network
/// 4. Rejection of weirs in a steady flow path
///
/// Run with: cargo test --test rational_network

use std::sync::Arc;

use drainflo::analysis::{SteadyAnalysis, accumulate_runoff};
use drainflo::hydrology::{Intensity, RationalBasin};
use drainflo::sections::Section;
use drainflo::{HydraulicError, LinkId, Network, NodeId};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn idf() -> Intensity {
    Intensity::LogPolynomial(vec![11.32916, -1.38557, -0.36672, 0.05012])
}

fn pipe(diameter: f64) -> Arc<Section> {
    Arc::new(Section::circle(diameter).unwrap().with_roughness(0.012).unwrap())
}

fn assert_close(label: &str, got: f64, expected: f64, tolerance: f64) {
    assert!(
        (got - expected).abs() <= tolerance,
        "{}: got {:.4}, expected {} (±{})",
        label,
        got,
        expected,
        tolerance
    );
}

/// Five reaches draining two branches to an outfall:
///
/// s202 → s204 → s203 → s203a → out
/// s201 ────────↗
fn storm_sewer() -> (Network, NodeId) {
    let mut net = Network::new();
    let s201 = net.create_named_node("s201");
    let s202 = net.create_named_node("s202");
    let s203 = net.create_named_node("s203");
    let s204 = net.create_named_node("s204");
    let s203a = net.create_named_node("s203a");
    let out = net.create_named_node("out");

    let reaches = [
        ("201", s201, s203, 25.5, 20.3, 642.35, 1.5),
        ("202", s202, s204, 25.4, 20.3, 625.32, 1.5),
        ("203", s203, s203a, -1.0, -1.2, 85.82, 2.0),
        ("204", s204, s203, 19.5, 19.3, 81.26, 1.5),
        ("203a", s203a, out, -1.2, -1.3, 23.0, 2.0),
    ];
    for (label, a, b, i1, i2, length, diameter) in reaches {
        let id = net.create_reach(a, b, i1, i2, length, pipe(diameter)).unwrap();
        net.label_link(id, label).unwrap();
    }

    for (node, area) in [(s201, 1.0), (s202, 0.99), (s203, 0.71), (s204, 0.70)] {
        net.add_basin(node, RationalBasin::new(area, 0.95, 10.0)).unwrap();
    }
    (net, out)
}

// ---------------------------------------------------------------------------
// Single culvert
// ---------------------------------------------------------------------------

#[test]
fn test_single_culvert_flow_and_grade_line() {
    let mut net = Network::new();
    let inlet = net.create_node();
    let outfall = net.create_node();
    let link = net.create_reach(inlet, outfall, 4.1, 4.0, 65.76, pipe(1.5)).unwrap();
    net.add_basin(inlet, RationalBasin::new(1.58, 0.276, 10.0)).unwrap();

    let results = SteadyAnalysis::new(outfall, 4.85, idf()).run(&net).unwrap();
    let record = results.get(link).unwrap();

    assert_eq!((record.flow * 10.0).round() / 10.0, 3.0);
    assert_eq!((record.hgl_upstream * 10.0).round() / 10.0, 5.0);
    assert_eq!((record.hgl_downstream * 10.0).round() / 10.0, 4.9);
}

// ---------------------------------------------------------------------------
// Branching storm sewer
// ---------------------------------------------------------------------------

#[test]
fn test_storm_sewer_accumulates_and_grades() {
    let (net, out) = storm_sewer();
    let results = SteadyAnalysis::new(out, 6.10, idf()).run(&net).unwrap();
    assert_eq!(results.len(), 5);

    // (label, C·A, flow, upstream HGL, downstream HGL)
    let expected = [
        ("202", 0.94, 6.5, 26.3, 21.5),
        ("204", 1.61, 10.4, 21.5, 20.8),
        ("201", 0.95, 6.5, 26.4, 21.2),
        ("203", 3.23, 20.9, 6.9, 6.3),
        ("203a", 3.23, 20.7, 6.3, 6.1),
    ];
    for (label, runoff_area, flow, upstream, downstream) in expected {
        let id = net.find_link(label).unwrap();
        let record = results.get(id).unwrap();
        assert_close(&format!("{} C·A", label), record.runoff_area(), runoff_area, 0.006);
        assert_close(&format!("{} flow", label), record.flow, flow, 0.06);
        assert_close(&format!("{} HGL up", label), record.hgl_upstream, upstream, 0.06);
        assert_close(&format!("{} HGL down", label), record.hgl_downstream, downstream, 0.06);
    }
}

#[test]
fn test_time_of_concentration_grows_downstream() {
    let (net, out) = storm_sewer();
    let results = SteadyAnalysis::new(out, 6.10, idf()).run(&net).unwrap();
    let tc = |label: &str| results.get(net.find_link(label).unwrap()).unwrap().tc_local;

    assert_eq!(tc("202"), 10.0);
    assert!(tc("204") > tc("202"));
    assert!(tc("203") >= tc("204"));
    assert!(tc("203a") > tc("203"));
}

#[test]
fn test_confluence_takes_highest_downstream_stage() {
    let (net, out) = storm_sewer();
    let results = SteadyAnalysis::new(out, 6.10, idf()).run(&net).unwrap();
    let record = |label: &str| *results.get(net.find_link(label).unwrap()).unwrap();

    // s203 is joined by 201 and 204; each sees 203's upstream grade line
    // unless its own normal depth sits higher.
    let below = record("203").hgl_upstream;
    assert!(record("201").hgl_downstream >= below);
    assert!(record("204").hgl_downstream >= below);
    assert_close("203a tailwater", record("203a").hgl_downstream, 6.10, 0.06);
}

#[test]
fn test_accumulate_runoff_without_hydraulics() {
    let (net, out) = storm_sewer();
    let totals = accumulate_runoff(&net, out).unwrap();
    let last: &(LinkId, f64, f64) = totals.last().unwrap();
    assert_eq!(net.describe_link(last.0), "203a");
    assert_close("area", last.1, 3.40, 1e-9);
    assert_close("runoff coefficient", last.2, 0.95, 1e-9);
}

#[test]
fn test_results_keep_traversal_order() {
    let (net, out) = storm_sewer();
    let results = SteadyAnalysis::new(out, 6.10, idf()).run(&net).unwrap();
    let order: Vec<LinkId> = results.records.iter().map(|(id, _)| *id).collect();
    assert_eq!(order, net.links_down_to_node(out));
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

#[test]
fn test_branching_traversal_order() {
    let mut net = Network::new();
    let n6 = net.create_named_node("S-6 inlet");
    let n8 = net.create_named_node("S-8 inlet");
    let n4 = net.create_named_node("S-4 inlet");
    let n7 = net.create_named_node("S-7 inlet");
    let n5 = net.create_named_node("S-5 inlet");
    let out = net.create_named_node("OUT");
    for (label, a, b) in [
        ("S-6", n6, n8),
        ("S-8", n8, out),
        ("S-4", n4, n7),
        ("S-7", n7, n8),
        ("S-5", n5, n7),
    ] {
        let id = net.create_reach(a, b, 10.0, 9.0, 100.0, pipe(1.5)).unwrap();
        net.label_link(id, label).unwrap();
    }

    let order: Vec<String> = net
        .links_up_from_node(out)
        .into_iter()
        .map(|id| net.describe_link(id))
        .collect();
    assert_eq!(order, ["S-8", "S-6", "S-7", "S-4", "S-5"]);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn test_weir_in_steady_path_is_incompatible() {
    let mut net = Network::new();
    let a = net.create_node();
    let b = net.create_node();
    let weir = net
        .create_weir(a, b, 10.0, 0.6, 3.2, Arc::new(Section::rectangle(2.0, 1.0).unwrap()))
        .unwrap();
    let result = SteadyAnalysis::new(b, 9.0, Intensity::Constant(4.0)).run(&net);
    assert_eq!(
        result,
        Err(HydraulicError::IncompatibleLink {
            link: weir.index(),
            operation: "steady_analysis"
        })
    );
}
