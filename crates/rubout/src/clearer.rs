use crate::geometry::{
    circle_ring, clipper_of_polygon, clipper_shrink, grow_round, multipolygon_from, region_area,
    region_empty, region_rings, representative_point, CIRCLE_SEGMENTS, OFFSET_RESOLUTION,
};
use crate::types::{ClearMethod, ClearPath, Tool};
use geo::{
    BooleanOps, BoundingRect, Contains, Coord, EuclideanDistance, Line, LineString,
    MultiLineString, MultiPolygon, Point, Polygon,
};
use tracing::debug;

/// Tolerance for the raster-connect containment test. Traversal segments hug
/// the region boundary exactly, so the test region is grown by one backend
/// resolution unit; anything smaller would leave the region unchanged.
const CONNECT_TOLERANCE: f64 = OFFSET_RESOLUTION;

/// Fill one polygon with tool paths using the tool's configured strategy.
///
/// Combo tries Lines, then Seed, then Standard, keeping the first non-empty
/// result. With `contour` set, the tool-radius perimeter rings are appended
/// unless the paths came from Standard, whose outermost ring already traces
/// that perimeter. Returns `None` when every strategy in the chain produced
/// nothing; the caller reports the polygon's representative point.
pub fn clear_polygon(poly: &Polygon<f64>, tool: &Tool) -> Option<Vec<ClearPath>> {
    if !(tool.diameter > 0.0) || !(tool.step() > 0.0) {
        debug!(diameter = tool.diameter, "tool cannot clear anything");
        return None;
    }

    let (mut paths, from_standard) = match tool.method {
        ClearMethod::Standard => (standard_rings(poly, tool), true),
        ClearMethod::Seed => (seed_rings(poly, tool), false),
        ClearMethod::Lines => (raster_lines(poly, tool), false),
        ClearMethod::Combo => {
            let lines = raster_lines(poly, tool);
            if !lines.is_empty() {
                (lines, false)
            } else {
                let seed = seed_rings(poly, tool);
                if !seed.is_empty() {
                    (seed, false)
                } else {
                    (standard_rings(poly, tool), true)
                }
            }
        }
    };

    if paths.is_empty() {
        let at = representative_point(poly);
        debug!(x = at.x(), y = at.y(), "no strategy cleared this polygon");
        return None;
    }

    if tool.contour && !from_standard {
        paths.extend(perimeter_pass(poly, tool));
    }
    Some(paths)
}

/// Concentric inward offset rings: the first at the tool radius, then one per
/// `step` until the core collapses.
fn standard_rings(poly: &Polygon<f64>, tool: &Tool) -> Vec<ClearPath> {
    let step = tool.step();
    let mut paths = Vec::new();
    let mut core = clipper_shrink(clipper_of_polygon(poly), tool.radius());
    if region_empty(&core) {
        return paths;
    }
    let mut core_area = region_area(&core);
    loop {
        for ring in region_rings(&core) {
            paths.push(ClearPath::Ring(ring));
        }
        let next = clipper_shrink(core, step);
        if region_empty(&next) {
            break;
        }
        // Shrinking past the inradius can hand back corner slivers instead
        // of an empty set. A real erosion keeps losing area and never leaves
        // less than a step-sized patch.
        let next_area = region_area(&next);
        if next_area >= core_area || next_area < step * step {
            break;
        }
        core = next;
        core_area = next_area;
    }
    paths
}

/// Circles of growing radius around the seed point, clipped to the
/// tool-radius inset of the polygon.
fn seed_rings(poly: &Polygon<f64>, tool: &Tool) -> Vec<ClearPath> {
    let inset = multipolygon_from(&clipper_shrink(clipper_of_polygon(poly), tool.radius()));
    if inset.0.is_empty() {
        return Vec::new();
    }
    let rect = match inset.bounding_rect() {
        Some(rect) => rect,
        None => return Vec::new(),
    };
    let seed = representative_point(poly);

    // Growth stops once the circle has swept past the farthest corner; the
    // seed does not have to lie inside a concave polygon for full coverage.
    let corners = [
        (rect.min().x, rect.min().y),
        (rect.min().x, rect.max().y),
        (rect.max().x, rect.min().y),
        (rect.max().x, rect.max().y),
    ];
    let reach = corners
        .iter()
        .map(|&(x, y)| seed.euclidean_distance(&Point::new(x, y)))
        .fold(0.0_f64, f64::max);

    let step = tool.step();
    let center = Coord {
        x: seed.x(),
        y: seed.y(),
    };
    let mut paths = Vec::new();
    let mut radius = tool.radius();
    while radius <= reach + step {
        let circle = circle_ring(center, radius, CIRCLE_SEGMENTS);
        let clipped = inset.clip(&MultiLineString::new(vec![circle]), false);
        for piece in clipped.0 {
            if piece.0.len() < 2 {
                continue;
            }
            if piece.0.first() == piece.0.last() {
                paths.push(ClearPath::Ring(piece));
            } else {
                paths.push(ClearPath::Segment(piece));
            }
        }
        radius += step;
    }
    paths
}

/// Horizontal raster rows clipped to the tool-radius inset, optionally
/// chained into serpentine runs.
fn raster_lines(poly: &Polygon<f64>, tool: &Tool) -> Vec<ClearPath> {
    let inset = multipolygon_from(&clipper_shrink(clipper_of_polygon(poly), tool.radius()));
    if inset.0.is_empty() {
        return Vec::new();
    }
    let rect = match inset.bounding_rect() {
        Some(rect) => rect,
        None => return Vec::new(),
    };

    let step = tool.step();
    let x0 = rect.min().x - 1.0;
    let x1 = rect.max().x + 1.0;
    let first_row = rect.min().y + step / 2.0;

    let mut rows = Vec::new();
    let mut y = first_row;
    while y < rect.max().y {
        rows.push(LineString::from(vec![(x0, y), (x1, y)]));
        y += step;
    }
    if rows.is_empty() {
        return Vec::new();
    }

    let clipped = inset.clip(&MultiLineString::new(rows), false);
    let segments: Vec<LineString<f64>> =
        clipped.0.into_iter().filter(|ls| ls.0.len() >= 2).collect();
    if segments.is_empty() {
        return Vec::new();
    }

    if tool.connect {
        connect_rows(segments, &inset, step, first_row)
    } else {
        segments.into_iter().map(ClearPath::Segment).collect()
    }
}

/// Chain raster rows into serpentine runs, joining adjacent row ends whenever
/// the traversal segment stays inside the region.
fn connect_rows(
    segments: Vec<LineString<f64>>,
    inset: &MultiPolygon<f64>,
    step: f64,
    first_row: f64,
) -> Vec<ClearPath> {
    let reach = grow_round(inset, CONNECT_TOLERANCE);

    let mut keyed: Vec<(i64, LineString<f64>)> = segments
        .into_iter()
        .map(|ls| {
            let row = ((ls.0[0].y - first_row) / step).round() as i64;
            (row, ls)
        })
        .collect();
    keyed.sort_by(|a, b| {
        a.0.cmp(&b.0).then_with(|| {
            let ord = a.1 .0[0]
                .x
                .partial_cmp(&b.1 .0[0].x)
                .unwrap_or(std::cmp::Ordering::Equal);
            // Odd rows are traversed right to left, so visit their pieces in
            // reverse as well.
            if a.0 % 2 == 0 {
                ord
            } else {
                ord.reverse()
            }
        })
    });

    let mut out: Vec<ClearPath> = Vec::new();
    let mut chain: Vec<Coord<f64>> = Vec::new();
    for (row, mut segment) in keyed {
        // Even rows run left to right, odd rows right to left.
        let ascending = row % 2 == 0;
        let starts_left = segment.0[0].x <= segment.0[segment.0.len() - 1].x;
        if ascending != starts_left {
            segment.0.reverse();
        }

        if chain.is_empty() {
            chain.extend(segment.0);
            continue;
        }

        let connector = Line::new(chain[chain.len() - 1], segment.0[0]);
        let joinable = reach.0.iter().any(|p| p.contains(&connector));
        if joinable {
            chain.extend(segment.0);
        } else {
            out.push(ClearPath::Segment(LineString::new(std::mem::take(
                &mut chain,
            ))));
            chain.extend(segment.0);
        }
    }
    if !chain.is_empty() {
        out.push(ClearPath::Segment(LineString::new(chain)));
    }
    out
}

/// Perimeter-following pass at the tool radius inside the polygon boundary.
fn perimeter_pass(poly: &Polygon<f64>, tool: &Tool) -> Vec<ClearPath> {
    region_rings(&clipper_shrink(clipper_of_polygon(poly), tool.radius()))
        .into_iter()
        .map(ClearPath::Ring)
        .collect()
}
