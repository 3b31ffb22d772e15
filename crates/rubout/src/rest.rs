use crate::clearer::clear_polygon;
use crate::empty_area::empty_area;
use crate::error::ClearError;
use crate::geometry::ids::ToolId;
use crate::geometry::{
    clipper_of_polygon, clipper_shrink, drop_slivers, grow_round, region_empty,
    representative_point, swept_area,
};
use crate::isolation::isolation_envelope;
use crate::types::{ClearPath, JobProgress, JobWarnings, ProgressFn, Tool, ToolRole};
use geo::{Area, BooleanOps, MultiPolygon, Point, Polygon};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

enum PolygonOutcome {
    Cleared(Vec<ClearPath>),
    Failed(Point<f64>),
    Aborted,
}

/// Drive the tool pool from largest to smallest diameter, handing each tool
/// only the area its predecessors left behind.
///
/// Per tool: polygons the tool cannot fit into are skipped and stay in the
/// remaining area for a smaller tool; the swept area of the paths it did
/// produce is subtracted before the next tool runs. Stops early once nothing
/// remains. Tools with empty output are left out of the result map.
pub(crate) fn clear_rest(
    tools: &[Tool],
    boundary: &MultiPolygon<f64>,
    copper: &MultiPolygon<f64>,
    cancel: &AtomicBool,
    progress: Option<&ProgressFn>,
    warnings: &mut JobWarnings,
) -> Result<BTreeMap<ToolId, Vec<ClearPath>>, ClearError> {
    let mut remaining = empty_area(boundary, copper, None)?;
    let mut tool_paths = BTreeMap::new();

    for (index, tool) in tools.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            return Err(ClearError::Cancelled);
        }
        if remaining.0.is_empty() {
            debug!(tools_used = index, "remaining area exhausted");
            break;
        }

        let mut examined = 0;
        let mut done = 0;
        let paths = if matches!(tool.role, ToolRole::Isolation) {
            match isolation_envelope(copper, tool.radius(), tool.direction) {
                Ok(envelope) => envelope.rings,
                Err(err) => {
                    warn!(tool = %tool.name, %err, "isolation envelope failed");
                    continue;
                }
            }
        } else {
            // A stand-off tool works at a distance from copper; the extra gap
            // is carved out of this tool's work area only.
            let work = match tool.offset {
                Some(stand_off) => {
                    drop_slivers(remaining.difference(&grow_round(copper, stand_off)))
                }
                None => remaining.clone(),
            };
            let fitting: Vec<Polygon<f64>> = work
                .0
                .iter()
                .filter(|poly| tool_fits(poly, tool.radius()))
                .cloned()
                .collect();
            examined = fitting.len();
            let failures_before = warnings.failed_polygons.len();
            let paths =
                clear_polygon_set(&fitting, tool, cancel, &mut warnings.failed_polygons)?;
            done = examined - (warnings.failed_polygons.len() - failures_before);
            paths
        };

        if let Some(callback) = progress {
            callback(JobProgress {
                tool_index: index,
                tool_count: tools.len(),
                polygons_done: done,
                polygon_count: examined,
            });
        }

        if paths.is_empty() {
            debug!(tool = %tool.name, "tool produced no paths");
            continue;
        }

        let swept = swept_area(&paths, tool.diameter);
        remaining = drop_slivers(remaining.difference(&swept));
        debug!(
            tool = %tool.name,
            paths = paths.len(),
            left = remaining.unsigned_area(),
            "rest pass complete"
        );
        tool_paths.insert(tool.id, paths);
    }

    Ok(tool_paths)
}

/// Necessary condition for a tool to cut anything inside a polygon: the
/// tool-radius inset must not collapse.
fn tool_fits(poly: &Polygon<f64>, radius: f64) -> bool {
    !region_empty(&clipper_shrink(clipper_of_polygon(poly), radius))
}

/// Fan one tool out across a polygon set on the rayon pool.
///
/// Results merge back in input order regardless of scheduling. Per-polygon
/// failures are recorded and logged, not fatal; a cancellation observed by
/// any task aborts the whole set.
pub(crate) fn clear_polygon_set(
    polys: &[Polygon<f64>],
    tool: &Tool,
    cancel: &AtomicBool,
    failed: &mut Vec<Point<f64>>,
) -> Result<Vec<ClearPath>, ClearError> {
    let outcomes: Vec<PolygonOutcome> = polys
        .par_iter()
        .map(|poly| {
            if cancel.load(Ordering::Relaxed) {
                return PolygonOutcome::Aborted;
            }
            match clear_polygon(poly, tool) {
                Some(paths) => PolygonOutcome::Cleared(paths),
                None => PolygonOutcome::Failed(representative_point(poly)),
            }
        })
        .collect();

    let mut merged = Vec::new();
    for outcome in outcomes {
        match outcome {
            PolygonOutcome::Cleared(paths) => merged.extend(paths),
            PolygonOutcome::Failed(at) => {
                warn!(tool = %tool.name, x = at.x(), y = at.y(), "could not clear polygon");
                failed.push(at);
            }
            PolygonOutcome::Aborted => return Err(ClearError::Cancelled),
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClearMethod;
    use geo::{Contains, EuclideanDistance, LineString};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
            vec![],
        )
    }

    /// Copper plate with a slot too narrow for the big tool but wide enough
    /// for the small one.
    fn slotted_copper() -> MultiPolygon<f64> {
        let left = rect(0.0, 0.0, 4.4, 10.0);
        let right = rect(5.6, 0.0, 10.0, 10.0);
        let bridge = rect(0.0, 0.0, 10.0, 3.0);
        crate::geometry::union_all(vec![
            MultiPolygon(vec![left]),
            MultiPolygon(vec![right]),
            MultiPolygon(vec![bridge]),
        ])
    }

    fn boundary_for(copper: &MultiPolygon<f64>, margin: f64) -> MultiPolygon<f64> {
        let hull = crate::boundary::resolve_boundary(
            &crate::types::SelectionMode::Itself,
            copper,
        )
        .unwrap();
        crate::boundary::expand_boundary(&hull, margin, &crate::types::SelectionMode::Itself)
    }

    #[test]
    fn test_smaller_tool_takes_the_slot() {
        let copper = slotted_copper();
        let boundary = boundary_for(&copper, 3.0);
        let tools = crate::planner::plan_tool_order(
            &[
                Tool::new("fine", 0.5).with_overlap(0.4),
                Tool::new("coarse", 2.0).with_overlap(0.4),
            ],
            crate::types::ToolOrder::Default,
            true,
        );
        assert_eq!(tools[0].diameter, 2.0);

        let cancel = AtomicBool::new(false);
        let mut warnings = JobWarnings::default();
        let map = clear_rest(&tools, &boundary, &copper, &cancel, None, &mut warnings).unwrap();
        assert_eq!(map.len(), 2, "both tools should produce paths");

        let coarse = &map[&tools[0].id];
        let fine = &map[&tools[1].id];

        // The slot interior is reachable only by the fine tool.
        let slot_probe = Point::new(5.0, 8.0);
        for path in coarse {
            for c in &path.points().0 {
                let d = slot_probe.euclidean_distance(&Point::new(c.x, c.y));
                assert!(d > 0.55, "coarse tool entered the slot near {:?}", c);
            }
        }
        let fine_sweep = swept_area(fine, 0.5);
        assert!(
            fine_sweep.iter().any(|p| p.contains(&slot_probe)),
            "fine tool never cleared the slot"
        );

        // Passes overlap only within tolerance of each other.
        let coarse_sweep = swept_area(coarse, 2.0);
        let overlap = coarse_sweep.intersection(&fine_sweep).unsigned_area();
        let smaller = fine_sweep.unsigned_area().min(coarse_sweep.unsigned_area());
        assert!(
            overlap < smaller * 0.02,
            "tool sweeps overlap too much: {overlap}"
        );
    }

    #[test]
    fn test_large_tool_exhausts_simple_area() {
        let copper = MultiPolygon(vec![rect(-1.0, -1.0, 1.0, 1.0)]);
        let boundary = boundary_for(&copper, 4.0);
        let tools = crate::planner::plan_tool_order(
            &[
                Tool::new("coarse", 1.0).with_method(ClearMethod::Combo),
                Tool::new("fine", 0.2).with_method(ClearMethod::Combo),
            ],
            crate::types::ToolOrder::Default,
            true,
        );
        let cancel = AtomicBool::new(false);
        let mut warnings = JobWarnings::default();
        let map = clear_rest(&tools, &boundary, &copper, &cancel, None, &mut warnings).unwrap();
        let coarse_paths = map.get(&tools[0].id).map(Vec::len).unwrap_or(0);
        assert!(coarse_paths > 0);
        if let Some(fine) = map.get(&tools[1].id) {
            let fine_area = swept_area(fine, 0.2).unsigned_area();
            let coarse_area = swept_area(&map[&tools[0].id], 1.0).unsigned_area();
            assert!(
                fine_area < coarse_area * 0.25,
                "the fine tool should only pick up leftovers"
            );
        }
    }

    #[test]
    fn test_cancel_aborts_mid_run() {
        let copper = MultiPolygon(vec![rect(-1.0, -1.0, 1.0, 1.0)]);
        let boundary = boundary_for(&copper, 4.0);
        let tools = vec![Tool::new("coarse", 1.0)];
        let cancel = AtomicBool::new(true);
        let mut warnings = JobWarnings::default();
        let err = clear_rest(&tools, &boundary, &copper, &cancel, None, &mut warnings)
            .unwrap_err();
        assert_eq!(err, ClearError::Cancelled);
    }

    #[test]
    fn test_tool_fits_tight_pocket() {
        // The inset of a 2.2 pocket under a 0.9 radius is a 0.4-wide core;
        // the fit check must see it rather than drop the pocket.
        let pocket = rect(0.0, 0.0, 2.2, 2.2);
        assert!(tool_fits(&pocket, 0.9));
        assert!(!tool_fits(&rect(0.0, 0.0, 1.0, 1.0), 0.9));
    }

    #[test]
    fn test_polygon_set_records_failures_in_order() {
        let polys = vec![
            rect(0.0, 0.0, 5.0, 5.0),
            rect(10.0, 0.0, 10.3, 0.3),
            rect(20.0, 0.0, 25.0, 5.0),
        ];
        let tool = Tool::new("1mm", 1.0);
        let cancel = AtomicBool::new(false);
        let mut failed = Vec::new();
        let paths = clear_polygon_set(&polys, &tool, &cancel, &mut failed).unwrap();
        assert!(!paths.is_empty());
        assert_eq!(failed.len(), 1);
        assert!(failed[0].x() >= 10.0 && failed[0].x() <= 10.3);
    }
}
