use crate::error::ClearError;
use crate::geometry::{grow_miter, union_all, AREA_EPSILON};
use crate::types::{Reference, ReferenceKind, SelectionMode};
use geo::line_intersection::line_intersection;
use geo::{Area, BooleanOps, ConvexHull, Line, LineString, MultiPolygon, Polygon};
use tracing::debug;

/// Compute the region that bounds the clearing operation.
///
/// `Itself` takes the convex hull of the copper; `AreaSelection` unions the
/// user-drawn shapes, silently dropping self-intersecting or degenerate ones;
/// `ReferenceObject` uses another object's geometry (or, for a copper-kind
/// reference, the intersection of the two convex hulls).
pub fn resolve_boundary(
    selection: &SelectionMode,
    copper: &MultiPolygon<f64>,
) -> Result<MultiPolygon<f64>, ClearError> {
    match selection {
        SelectionMode::Itself => {
            if copper.0.is_empty() {
                return Err(ClearError::NoGeometry);
            }
            Ok(MultiPolygon(vec![copper.convex_hull()]))
        }
        SelectionMode::AreaSelection(shapes) => {
            let valid: Vec<MultiPolygon<f64>> = shapes
                .iter()
                .filter(|s| is_simple_polygon(s))
                .map(|s| MultiPolygon(vec![s.clone()]))
                .collect();
            if valid.len() < shapes.len() {
                debug!(
                    dropped = shapes.len() - valid.len(),
                    "dropped invalid selection shapes"
                );
            }
            let merged = union_all(valid);
            if merged.0.is_empty() {
                return Err(ClearError::NoGeometry);
            }
            Ok(merged)
        }
        SelectionMode::ReferenceObject(reference) => resolve_reference(reference, copper),
    }
}

fn resolve_reference(
    reference: &Reference,
    copper: &MultiPolygon<f64>,
) -> Result<MultiPolygon<f64>, ClearError> {
    match reference.kind {
        ReferenceKind::Geometry => {
            let parts: Vec<MultiPolygon<f64>> = reference
                .geometry
                .0
                .iter()
                .map(|p| MultiPolygon(vec![p.clone()]))
                .collect();
            let merged = union_all(parts);
            if merged.0.is_empty() {
                return Err(ClearError::NoGeometry);
            }
            Ok(merged)
        }
        ReferenceKind::Copper => {
            if copper.0.is_empty() || reference.geometry.0.is_empty() {
                return Err(ClearError::NoGeometry);
            }
            let target_hull = MultiPolygon(vec![copper.convex_hull()]);
            let reference_hull = MultiPolygon(vec![reference.geometry.convex_hull()]);
            let bounded = target_hull.intersection(&reference_hull);
            if bounded.0.is_empty() {
                return Err(ClearError::NoGeometry);
            }
            Ok(bounded)
        }
        ReferenceKind::Drill => Err(ClearError::UnsupportedReferenceKind("drill".to_string())),
    }
}

/// Grow the bounding region outward by `margin` with mitred corners.
///
/// Combined regions (Itself, copper-kind references) are buffered in one
/// pass; drawn selections and geometry-kind references buffer each
/// constituent polygon and re-union, so touching shapes merge the way the
/// operator drew them. Negative margins shrink; the caller keeps the result
/// non-empty.
pub fn expand_boundary(
    boundary: &MultiPolygon<f64>,
    margin: f64,
    selection: &SelectionMode,
) -> MultiPolygon<f64> {
    let per_constituent = matches!(
        selection,
        SelectionMode::AreaSelection(_)
            | SelectionMode::ReferenceObject(Reference {
                kind: ReferenceKind::Geometry,
                ..
            })
    );
    if per_constituent {
        let parts: Vec<MultiPolygon<f64>> = boundary
            .0
            .iter()
            .map(|p| grow_miter(&MultiPolygon(vec![p.clone()]), margin))
            .collect();
        union_all(parts)
    } else {
        grow_miter(boundary, margin)
    }
}

/// A drawn shape is usable when it has real area and no self-intersection.
fn is_simple_polygon(poly: &Polygon<f64>) -> bool {
    if poly.unsigned_area() < AREA_EPSILON {
        return false;
    }
    if !ring_is_simple(poly.exterior()) {
        return false;
    }
    poly.interiors().iter().all(ring_is_simple)
}

fn ring_is_simple(ring: &LineString<f64>) -> bool {
    let lines: Vec<Line<f64>> = ring.lines().collect();
    let n = lines.len();
    for i in 0..n {
        for j in (i + 1)..n {
            // Adjacent edges legitimately share an endpoint.
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            if line_intersection(lines[i], lines[j]).is_some() {
                return false;
            }
        }
    }
    true
}
