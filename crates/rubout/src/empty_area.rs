use crate::error::ClearError;
use crate::geometry::{drop_slivers, grow_round, OFFSET_RESOLUTION};
use geo::{BooleanOps, MultiPolygon};
use tracing::{debug, warn};

/// Subtract the obstacle geometry (copper, or an isolation envelope) from the
/// bounding region to get the area to clear.
///
/// With a stand-off the obstacles are first grown by that distance, keeping
/// all clearing at arm's length from copper. A stand-off below the offset
/// backend's coordinate resolution cannot move anything and is ignored with a
/// warning. The result is always a multi-polygon with sliver components
/// dropped; an empty result is an error, not a silent no-op, because fully
/// covered boards need operator attention.
pub fn empty_area(
    boundary: &MultiPolygon<f64>,
    obstacles: &MultiPolygon<f64>,
    stand_off: Option<f64>,
) -> Result<MultiPolygon<f64>, ClearError> {
    if boundary.0.is_empty() {
        return Err(ClearError::NoGeometry);
    }

    let grown;
    let obstacles = match stand_off {
        Some(d) if d.abs() >= OFFSET_RESOLUTION => {
            grown = grow_round(obstacles, d);
            &grown
        }
        Some(d) if d != 0.0 => {
            warn!(
                stand_off = d,
                resolution = OFFSET_RESOLUTION,
                "stand-off is below the offset resolution and was ignored"
            );
            obstacles
        }
        _ => obstacles,
    };

    let area = if obstacles.0.is_empty() {
        boundary.clone()
    } else {
        drop_slivers(boundary.difference(obstacles))
    };

    if area.0.is_empty() {
        return Err(ClearError::EmptyExtentNotFound);
    }
    debug!(components = area.0.len(), "computed area to clear");
    Ok(area)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, LineString, Polygon};

    fn square(cx: f64, cy: f64, side: f64) -> Polygon<f64> {
        let h = side / 2.0;
        Polygon::new(
            LineString::from(vec![
                (cx - h, cy - h),
                (cx + h, cy - h),
                (cx + h, cy + h),
                (cx - h, cy + h),
                (cx - h, cy - h),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_pad_leaves_annulus() {
        let boundary = MultiPolygon(vec![square(0.0, 0.0, 14.0)]);
        let copper = MultiPolygon(vec![square(0.0, 0.0, 10.0)]);
        let area = empty_area(&boundary, &copper, None).unwrap();
        assert!((area.unsigned_area() - 96.0).abs() < 1e-6);
        assert_eq!(area.0.len(), 1);
        assert_eq!(area.0[0].interiors().len(), 1);
    }

    #[test]
    fn test_idempotent_and_pure() {
        let boundary = MultiPolygon(vec![square(0.0, 0.0, 14.0)]);
        let copper = MultiPolygon(vec![square(1.0, 2.0, 6.0)]);
        let first = empty_area(&boundary, &copper, None).unwrap();
        let second = empty_area(&boundary, &copper, None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_stand_off_grows_obstacles() {
        let boundary = MultiPolygon(vec![square(0.0, 0.0, 14.0)]);
        let copper = MultiPolygon(vec![square(0.0, 0.0, 10.0)]);
        let tight = empty_area(&boundary, &copper, None).unwrap();
        let standoff = empty_area(&boundary, &copper, Some(1.0)).unwrap();
        assert!(standoff.unsigned_area() < tight.unsigned_area());
    }

    #[test]
    fn test_sub_resolution_stand_off_is_ignored() {
        let boundary = MultiPolygon(vec![square(0.0, 0.0, 14.0)]);
        let copper = MultiPolygon(vec![square(0.0, 0.0, 10.0)]);
        let tight = empty_area(&boundary, &copper, None).unwrap();
        let ignored = empty_area(&boundary, &copper, Some(0.004)).unwrap();
        assert_eq!(ignored, tight);
    }

    #[test]
    fn test_full_coverage_is_an_error() {
        let boundary = MultiPolygon(vec![square(0.0, 0.0, 10.0)]);
        let copper = MultiPolygon(vec![square(0.0, 0.0, 12.0)]);
        assert_eq!(
            empty_area(&boundary, &copper, None),
            Err(ClearError::EmptyExtentNotFound)
        );
    }

    #[test]
    fn test_no_obstacles_keeps_boundary() {
        let boundary = MultiPolygon(vec![square(0.0, 0.0, 10.0)]);
        let area = empty_area(&boundary, &MultiPolygon(vec![]), None).unwrap();
        assert_eq!(area, boundary);
    }
}
