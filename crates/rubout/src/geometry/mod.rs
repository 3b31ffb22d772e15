use clipper2::{
    difference, inflate, EndType, JoinType, Path as ClipperPath, PathType,
    Polygon as ClipperPolygon, Polygons, Vertex,
};
use geo::winding_order::Winding;
use geo::{Area, BooleanOps, Centroid, Contains, Coord, LineString, MultiPolygon, Point, Polygon};
use std::cmp::Ordering;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

pub mod ids;

pub use ids::ToolId;

/// Components with less area than this are treated as zero-width slivers and
/// dropped after boolean operations.
pub const AREA_EPSILON: f64 = 1e-10;

/// Divisor applied to the tool diameter when computing the area a path has
/// swept. A hair over the true radius: exact-radius buffers leave unreachable
/// slivers between adjacent passes after rounding. Tunable.
pub const SWEEP_DIVISOR: f64 = 1.9999999;

/// Miter limit for sharp-cornered offsets.
pub const MITER_LIMIT: f64 = 2.0;

/// Max deviation of tessellated offset arcs from the true curve. Units are
/// board units (millimetres); PCB pads need a much finer setting than large
/// decorative work.
pub const ARC_TOLERANCE: f64 = 0.01;

/// Coordinate resolution of the offset backend, which maps model units onto
/// an integer grid at 100 units per millimetre. Offset distances below this
/// value move nothing at all.
pub const OFFSET_RESOLUTION: f64 = 0.01;

/// Segment count used when tessellating full circles.
pub const CIRCLE_SEGMENTS: usize = 64;

use crate::types::ClearPath;

fn clipper_path(ring: &LineString<f64>) -> ClipperPath {
    let vertices: Vec<Vertex> = ring.0.iter().map(|c| Vertex::new(c.x, c.y)).collect();
    ClipperPath::new(vertices, true)
}

/// Convert a geo region into clipper2 polygons. Holes are carved out with a
/// difference pass so the result carries correct fill semantics regardless of
/// input winding.
pub(crate) fn clipper_region(region: &MultiPolygon<f64>) -> Polygons {
    let mut subjects = Vec::new();
    let mut clips = Vec::new();
    for poly in &region.0 {
        if poly.exterior().0.len() < 4 {
            continue;
        }
        subjects.push(ClipperPolygon::new(
            vec![clipper_path(poly.exterior())],
            PathType::Subject,
        ));
        for hole in poly.interiors() {
            if hole.0.len() < 4 {
                continue;
            }
            clips.push(ClipperPolygon::new(vec![clipper_path(hole)], PathType::Clip));
        }
    }
    let subject = Polygons::new(subjects);
    if clips.is_empty() {
        subject
    } else {
        difference(subject, Polygons::new(clips))
    }
}

/// Convert a single geo polygon (with holes) into clipper2 polygons.
pub(crate) fn clipper_of_polygon(poly: &Polygon<f64>) -> Polygons {
    clipper_region(&MultiPolygon(vec![poly.clone()]))
}

fn inflate_once(region: Polygons, delta: f64, join: JoinType) -> Polygons {
    inflate(
        region,
        delta,
        join,
        EndType::ClosedPolygon,
        MITER_LIMIT,
        ARC_TOLERANCE,
    )
}

/// Shrink with an empty-result retry. The backend drops its entire output
/// once the shrink distance gets close to the region's inradius, even when a
/// core survives. Erosion composes, so an empty answer is only believed after
/// two successive half-distance shrinks agree; the split is snapped to the
/// backend grid so the halves add up to the full distance exactly.
fn shrink_retry(region: Polygons, distance: f64, join: JoinType) -> Polygons {
    let shrunk = inflate_once(region.clone(), -distance, join.clone());
    if !region_empty(&shrunk) {
        return shrunk;
    }
    let first = (distance / 2.0 / OFFSET_RESOLUTION).round() * OFFSET_RESOLUTION;
    let second = distance - first;
    if first < OFFSET_RESOLUTION || second < OFFSET_RESOLUTION {
        return shrunk;
    }
    let half = shrink_retry(region, first, join.clone());
    if region_empty(&half) {
        return half;
    }
    let composed = shrink_retry(half, second, join);
    // Grid rounding across composed passes can leave resolution-scale dust
    // where the true erosion is empty.
    if region_area(&composed) < OFFSET_RESOLUTION * OFFSET_RESOLUTION {
        return Polygons::new(vec![]);
    }
    composed
}

/// Shrink a clipper region inward by `distance` (round joins).
pub(crate) fn clipper_shrink(region: Polygons, distance: f64) -> Polygons {
    shrink_retry(region, distance, JoinType::Round)
}

pub(crate) fn region_empty(region: &Polygons) -> bool {
    region.polygons().is_empty()
}

/// Net shoelace area of a clipper region. Holes are wound opposite to their
/// outers and subtract themselves; the absolute value covers backends that
/// flip the whole output.
pub(crate) fn region_area(region: &Polygons) -> f64 {
    let mut total = 0.0;
    for polygon in region.polygons() {
        for path in polygon.paths() {
            let vertices = path.vertices();
            if vertices.len() < 3 {
                continue;
            }
            let mut twice = 0.0;
            for (i, a) in vertices.iter().enumerate() {
                let b = &vertices[(i + 1) % vertices.len()];
                twice += a.x() * b.y() - b.x() * a.y();
            }
            total += twice / 2.0;
        }
    }
    total.abs()
}

/// Extract every boundary ring of a clipper region as a closed LineString.
/// Degenerate paths (fewer than three distinct vertices) are dropped.
pub(crate) fn region_rings(region: &Polygons) -> Vec<LineString<f64>> {
    let mut rings = Vec::new();
    for polygon in region.polygons() {
        for path in polygon.paths() {
            let mut coords: Vec<Coord<f64>> = path
                .vertices()
                .iter()
                .map(|v| Coord { x: v.x(), y: v.y() })
                .collect();
            if coords.len() < 3 {
                continue;
            }
            if coords.first() != coords.last() {
                coords.push(coords[0]);
            }
            rings.push(LineString::new(coords));
        }
    }
    rings
}

/// Rebuild a geo multipolygon from clipper output. Positive-area paths become
/// outer boundaries, negative-area paths become holes matched to the smallest
/// outer that contains them.
pub(crate) fn multipolygon_from(region: &Polygons) -> MultiPolygon<f64> {
    let mut outers: Vec<(LineString<f64>, f64)> = Vec::new();
    let mut holes: Vec<LineString<f64>> = Vec::new();

    for polygon in region.polygons() {
        for path in polygon.paths() {
            let mut coords: Vec<Coord<f64>> = path
                .vertices()
                .iter()
                .map(|v| Coord { x: v.x(), y: v.y() })
                .collect();
            if coords.len() < 3 {
                continue;
            }
            if coords.first() != coords.last() {
                coords.push(coords[0]);
            }
            let ring = LineString::new(coords);
            let area = Polygon::new(ring.clone(), vec![]).signed_area();
            if area.abs() < AREA_EPSILON {
                continue;
            }
            if area > 0.0 {
                outers.push((ring, area));
            } else {
                holes.push(ring);
            }
        }
    }

    if outers.is_empty() && !holes.is_empty() {
        // Backend wound everything the other way; flip the interpretation.
        outers = holes
            .drain(..)
            .map(|mut ring| {
                ring.0.reverse();
                let area = Polygon::new(ring.clone(), vec![]).signed_area();
                (ring, area)
            })
            .collect();
    }

    let mut polys: Vec<(Polygon<f64>, f64)> = outers
        .into_iter()
        .map(|(ring, area)| (Polygon::new(ring, vec![]), area))
        .collect();
    // Smallest outer first so a hole lands in its innermost container.
    polys.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    for hole in holes {
        let probe = Point::new(hole.0[0].x, hole.0[0].y);
        if let Some((poly, _)) = polys.iter_mut().find(|(p, _)| p.contains(&probe)) {
            poly.interiors_push(hole);
        }
    }

    MultiPolygon(polys.into_iter().map(|(p, _)| p).collect())
}

fn offset_region(region: &MultiPolygon<f64>, delta: f64, join: JoinType) -> MultiPolygon<f64> {
    if region.0.is_empty() {
        return MultiPolygon(vec![]);
    }
    if delta == 0.0 {
        return region.clone();
    }
    let offset = if delta < 0.0 {
        shrink_retry(clipper_region(region), -delta, join)
    } else {
        inflate_once(clipper_region(region), delta, join)
    };
    multipolygon_from(&offset)
}

/// Offset a region with sharp mitred corners. Negative deltas shrink.
pub fn grow_miter(region: &MultiPolygon<f64>, delta: f64) -> MultiPolygon<f64> {
    offset_region(region, delta, JoinType::Miter)
}

/// Offset a region with rounded corners. Negative deltas shrink.
pub fn grow_round(region: &MultiPolygon<f64>, delta: f64) -> MultiPolygon<f64> {
    offset_region(region, delta, JoinType::Round)
}

/// Drop sliver components left behind by boolean operations.
pub fn drop_slivers(region: MultiPolygon<f64>) -> MultiPolygon<f64> {
    MultiPolygon(
        region
            .0
            .into_iter()
            .filter(|p| p.unsigned_area() >= AREA_EPSILON)
            .collect(),
    )
}

/// Union an arbitrary collection of regions, folding pairwise so large path
/// sets do not degrade into a linear chain of ever-bigger operands.
pub fn union_all(mut parts: Vec<MultiPolygon<f64>>) -> MultiPolygon<f64> {
    parts.retain(|p| !p.0.is_empty());
    if parts.is_empty() {
        return MultiPolygon(vec![]);
    }
    while parts.len() > 1 {
        let mut next = Vec::with_capacity(parts.len() / 2 + 1);
        let mut iter = parts.into_iter();
        while let Some(a) = iter.next() {
            match iter.next() {
                Some(b) => next.push(a.union(&b)),
                None => next.push(a),
            }
        }
        parts = next;
    }
    parts.pop().unwrap_or_else(|| MultiPolygon(vec![]))
}

/// A point that identifies a polygon in log output: the centroid when it lies
/// inside, otherwise the first boundary vertex.
pub fn representative_point(poly: &Polygon<f64>) -> Point<f64> {
    if let Some(c) = poly.centroid() {
        if poly.contains(&c) {
            return c;
        }
    }
    poly.exterior()
        .0
        .first()
        .map(|c| Point::new(c.x, c.y))
        .unwrap_or_else(|| Point::new(0.0, 0.0))
}

/// Closed circle approximation around `center`. Fewer than three segments
/// cannot close a ring, so the count is clamped.
pub fn circle_ring(center: Coord<f64>, radius: f64, segments: usize) -> LineString<f64> {
    let segments = segments.max(3);
    let mut coords = Vec::with_capacity(segments + 1);
    for i in 0..segments {
        let theta = TAU * i as f64 / segments as f64;
        coords.push(Coord {
            x: center.x + radius * theta.cos(),
            y: center.y + radius * theta.sin(),
        });
    }
    coords.push(coords[0]);
    LineString::new(coords)
}

/// Stadium-shaped polygon covering every point within `radius` of the segment
/// from `a` to `b`.
pub(crate) fn capsule(a: Coord<f64>, b: Coord<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    if (dx * dx + dy * dy).sqrt() < AREA_EPSILON {
        return Polygon::new(circle_ring(a, radius, segments), vec![]);
    }
    let heading = dy.atan2(dx);
    let cap_steps = (segments / 2).max(4);
    let mut coords = Vec::with_capacity(segments + 3);
    for i in 0..=cap_steps {
        let theta = heading - FRAC_PI_2 + PI * i as f64 / cap_steps as f64;
        coords.push(Coord {
            x: b.x + radius * theta.cos(),
            y: b.y + radius * theta.sin(),
        });
    }
    for i in 0..=cap_steps {
        let theta = heading + FRAC_PI_2 + PI * i as f64 / cap_steps as f64;
        coords.push(Coord {
            x: a.x + radius * theta.cos(),
            y: a.y + radius * theta.sin(),
        });
    }
    coords.push(coords[0]);
    Polygon::new(LineString::new(coords), vec![])
}

/// Region swept by a set of tool paths.
///
/// Closed rings sweep an annulus (the enclosed region grown by the sweep
/// radius minus the same region shrunk by it); open segments sweep a chain of
/// capsules. The sweep radius is `diameter / SWEEP_DIVISOR`.
pub fn swept_area(paths: &[ClearPath], diameter: f64) -> MultiPolygon<f64> {
    let width = diameter / SWEEP_DIVISOR;
    let mut parts: Vec<MultiPolygon<f64>> = Vec::new();
    for path in paths {
        match path {
            ClearPath::Ring(ring) => {
                // Hole rings arrive wound clockwise; the sweep only cares
                // about the enclosed region.
                let mut ring = ring.clone();
                ring.make_ccw_winding();
                let region = MultiPolygon(vec![Polygon::new(ring, vec![])]);
                let outer = grow_round(&region, width);
                let inner = grow_round(&region, -width);
                if inner.0.is_empty() {
                    parts.push(outer);
                } else {
                    parts.push(outer.difference(&inner));
                }
            }
            ClearPath::Segment(line) => {
                if line.0.len() == 1 {
                    parts.push(MultiPolygon(vec![Polygon::new(
                        circle_ring(line.0[0], width, CIRCLE_SEGMENTS),
                        vec![],
                    )]));
                    continue;
                }
                for pair in line.0.windows(2) {
                    parts.push(MultiPolygon(vec![capsule(
                        pair[0],
                        pair[1],
                        width,
                        CIRCLE_SEGMENTS,
                    )]));
                }
            }
        }
    }
    union_all(parts)
}
