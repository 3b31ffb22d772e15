use geo::{Area, LineString, MultiPolygon, Polygon};
use rubout::*;

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
        vec![],
    )
}

#[test]
fn test_itself_hull_spans_separate_pads() {
    let copper = MultiPolygon(vec![rect(0.0, 0.0, 10.0, 10.0), rect(20.0, 0.0, 30.0, 10.0)]);
    let hull = resolve_boundary(&SelectionMode::Itself, &copper).unwrap();
    // The hull bridges the gap between the pads.
    assert!((hull.unsigned_area() - 300.0).abs() < 1e-6);
}

#[test]
fn test_empty_copper_has_no_boundary() {
    let copper = MultiPolygon(vec![]);
    let err = resolve_boundary(&SelectionMode::Itself, &copper).unwrap_err();
    assert_eq!(err, ClearError::NoGeometry);
}

#[test]
fn test_area_selection_drops_degenerate_shapes() {
    let bowtie = Polygon::new(
        LineString::from(vec![
            (0.0, 0.0),
            (4.0, 4.0),
            (4.0, 0.0),
            (0.0, 4.0),
            (0.0, 0.0),
        ]),
        vec![],
    );
    let selection = SelectionMode::AreaSelection(vec![bowtie, rect(10.0, 0.0, 14.0, 4.0)]);
    let copper = MultiPolygon(vec![rect(11.0, 1.0, 13.0, 3.0)]);
    let boundary = resolve_boundary(&selection, &copper).unwrap();
    assert!((boundary.unsigned_area() - 16.0).abs() < 1e-6);
}

#[test]
fn test_reference_copper_takes_the_hull_intersection() {
    let copper = MultiPolygon(vec![rect(0.0, 0.0, 10.0, 10.0)]);
    let reference = Reference {
        kind: ReferenceKind::Copper,
        geometry: MultiPolygon(vec![rect(6.0, 6.0, 16.0, 16.0)]),
    };
    let boundary = resolve_boundary(&SelectionMode::ReferenceObject(reference), &copper).unwrap();
    assert!((boundary.unsigned_area() - 16.0).abs() < 1e-6);
}

#[test]
fn test_expansion_merges_touching_constituents() {
    // Two selection rectangles 4mm apart merge once each is grown by 2.5mm.
    let selection =
        SelectionMode::AreaSelection(vec![rect(0.0, 0.0, 10.0, 10.0), rect(14.0, 0.0, 24.0, 10.0)]);
    let copper = MultiPolygon(vec![rect(2.0, 2.0, 8.0, 8.0)]);
    let boundary = resolve_boundary(&selection, &copper).unwrap();
    assert_eq!(boundary.0.len(), 2);

    let expanded = expand_boundary(&boundary, 2.5, &selection);
    assert_eq!(expanded.0.len(), 1, "grown constituents should merge");
    assert!(expanded.unsigned_area() > boundary.unsigned_area());
}

#[test]
fn test_negative_margin_shrinks_the_boundary() {
    let copper = MultiPolygon(vec![rect(0.0, 0.0, 10.0, 10.0)]);
    let hull = resolve_boundary(&SelectionMode::Itself, &copper).unwrap();
    let shrunk = expand_boundary(&hull, -2.0, &SelectionMode::Itself);
    assert!((shrunk.unsigned_area() - 36.0).abs() < 1e-3);
}
