//! Section Geometry Integration Tests
//!
//! These tests check properties every section variant must share: closed
//! shapes fill monotonically up to their full area, dry sections have no
//! hydraulic radius, and barrel counts scale every quantity.

use std::f64::consts::PI;

use drainflo::sections::{Geometry, Section};

fn closed_sections() -> Vec<(&'static str, Section, f64)> {
    vec![
        ("circle", Section::circle(2.0).unwrap(), PI * 4.0 / 4.0),
        ("rectangle", Section::rectangle(3.0, 2.0).unwrap(), 6.0),
        ("square", Section::square(1.5).unwrap(), 2.25),
        (
            "closed trapezoid",
            Section::closed_trapezoid(1.0, 2.0, 1.0, 1.0).unwrap(),
            3.0,
        ),
        (
            "irregular box",
            Section::irregular(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 1.0), (0.0, 1.0)], true)
                .unwrap(),
            4.0,
        ),
    ]
}

#[test]
fn test_closed_sections_fill_monotonically_to_full_area() {
    for (name, section, full) in closed_sections() {
        let rise = section.rise().unwrap();
        let mut previous = 0.0;
        for i in 0..=50 {
            let depth = rise * i as f64 / 50.0;
            let area = section.flow_area(depth);
            assert!(
                area + 1e-12 >= previous,
                "{}: area fell from {} to {} at depth {}",
                name,
                previous,
                area,
                depth
            );
            previous = area;
        }
        assert!(
            (section.flow_area(rise) - full).abs() < 1e-9,
            "{}: full area {} vs {}",
            name,
            section.flow_area(rise),
            full
        );
        assert!((section.full_area().unwrap() - full).abs() < 1e-9);
    }
}

#[test]
fn test_closed_sections_are_full_at_the_crown() {
    for (name, section, _) in closed_sections() {
        let rise = section.rise().unwrap();
        let at_crown = section.wet_perimeter(rise);
        assert!(
            (at_crown - section.wet_perimeter(rise + 1.0)).abs() < 1e-9,
            "{}: perimeter {} at the crown, {} above it",
            name,
            at_crown,
            section.wet_perimeter(rise + 1.0)
        );
        assert!(
            (section.hydraulic_radius(rise) - section.hydraulic_radius(rise + 1.0)).abs() < 1e-9,
            "{}: hydraulic radius jumps at the crown",
            name
        );
    }
}

#[test]
fn test_dry_sections_have_zero_hydraulic_radius() {
    let mut sections: Vec<(&str, Section)> = closed_sections()
        .into_iter()
        .map(|(name, section, _)| (name, section))
        .collect();
    sections.push(("open trapezoid", Section::trapezoid(2.0, 4.0, 2.0).unwrap()));
    sections.push((
        "open channel",
        Section::irregular(vec![(0.0, 3.0), (2.0, 0.0), (6.0, 0.0), (8.0, 3.0)], false).unwrap(),
    ));
    for (name, section) in sections {
        assert_eq!(section.flow_area(0.0), 0.0, "{}", name);
        assert_eq!(section.hydraulic_radius(0.0), 0.0, "{}", name);
    }
}

#[test]
fn test_barrel_count_scales_geometry() {
    let single = Section::circle(1.5).unwrap();
    let triple = Section::circle(1.5).unwrap().with_count(3).unwrap();
    let depth = 0.9;
    assert!((triple.flow_area(depth) - 3.0 * single.flow_area(depth)).abs() < 1e-12);
    assert!((triple.wet_perimeter(depth) - 3.0 * single.wet_perimeter(depth)).abs() < 1e-12);
    assert!((triple.hydraulic_radius(depth) - single.hydraulic_radius(depth)).abs() < 1e-12);
}

#[test]
fn test_open_sections_have_no_rise() {
    assert!(Section::trapezoid(2.0, 4.0, 2.0).unwrap().rise().is_err());
    assert!(!Section::trapezoid(2.0, 4.0, 2.0).unwrap().is_closed());
}
