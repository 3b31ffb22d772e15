use crate::error::ClearError;
use crate::geometry::grow_round;
use crate::types::{ClearPath, MillingDirection};
use geo::winding_order::Winding;
use geo::MultiPolygon;

/// Isolation pass around the copper outline: the copper grown by the tool
/// radius, plus the boundary rings of that region as tool paths.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Copper grown by the tool radius. Subtracting this from the bounding
    /// region keeps clearing tools a full tool radius away from copper.
    pub region: MultiPolygon<f64>,
    /// Centerline rings the isolation tool follows, wound per the milling
    /// direction.
    pub rings: Vec<ClearPath>,
}

/// Generate the isolation envelope at `tool_radius` from the copper edges.
///
/// The milling direction fixes ring winding (climb: exteriors
/// counter-clockwise, holes clockwise; conventional: reversed) so tool motion
/// relative to the copper boundary is deterministic. Whether the configured
/// margin leaves room for the tool is the caller's concern; generation is
/// best-effort either way.
pub fn isolation_envelope(
    copper: &MultiPolygon<f64>,
    tool_radius: f64,
    direction: MillingDirection,
) -> Result<Envelope, ClearError> {
    if copper.0.is_empty() {
        return Err(ClearError::NoGeometry);
    }
    let region = grow_round(copper, tool_radius);
    if region.0.is_empty() {
        return Err(ClearError::NoGeometry);
    }

    let mut rings = Vec::new();
    for poly in &region.0 {
        let mut outer = poly.exterior().clone();
        match direction {
            MillingDirection::Climb => outer.make_ccw_winding(),
            MillingDirection::Conventional => outer.make_cw_winding(),
        }
        rings.push(ClearPath::Ring(outer));

        for hole in poly.interiors() {
            let mut ring = hole.clone();
            match direction {
                MillingDirection::Climb => ring.make_cw_winding(),
                MillingDirection::Conventional => ring.make_ccw_winding(),
            }
            rings.push(ClearPath::Ring(ring));
        }
    }

    Ok(Envelope { region, rings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::winding_order::WindingOrder;
    use geo::{Area, EuclideanDistance, LineString, Point, Polygon};

    fn pad(side: f64) -> Polygon<f64> {
        let h = side / 2.0;
        Polygon::new(
            LineString::from(vec![
                (-h, -h),
                (h, -h),
                (h, h),
                (-h, h),
                (-h, -h),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_envelope_empty_copper_fails() {
        let copper = MultiPolygon(vec![]);
        let err = isolation_envelope(&copper, 0.5, MillingDirection::Climb).unwrap_err();
        assert_eq!(err, ClearError::NoGeometry);
    }

    #[test]
    fn test_envelope_ring_keeps_tool_radius() {
        let copper = MultiPolygon(vec![pad(10.0)]);
        let envelope = isolation_envelope(&copper, 0.5, MillingDirection::Climb).unwrap();
        assert_eq!(envelope.rings.len(), 1);
        for path in &envelope.rings {
            for coord in &path.points().0 {
                let d = Point::new(coord.x, coord.y).euclidean_distance(&copper.0[0]);
                assert!(
                    d >= 0.5 - 0.02,
                    "ring point closer than the tool radius: {d}"
                );
            }
        }
    }

    #[test]
    fn test_envelope_winding_follows_direction() {
        let copper = MultiPolygon(vec![pad(10.0)]);
        let climb = isolation_envelope(&copper, 0.5, MillingDirection::Climb).unwrap();
        let conventional =
            isolation_envelope(&copper, 0.5, MillingDirection::Conventional).unwrap();
        let climb_ring = climb.rings[0].points();
        let conventional_ring = conventional.rings[0].points();
        assert_eq!(
            climb_ring.winding_order(),
            Some(WindingOrder::CounterClockwise)
        );
        assert_eq!(
            conventional_ring.winding_order(),
            Some(WindingOrder::Clockwise)
        );
    }

    #[test]
    fn test_envelope_with_hole_emits_both_rings() {
        let outer = pad(12.0);
        let inner = pad(6.0);
        let copper = MultiPolygon(vec![Polygon::new(
            outer.exterior().clone(),
            vec![inner.exterior().clone()],
        )]);
        let envelope = isolation_envelope(&copper, 0.5, MillingDirection::Climb).unwrap();
        assert_eq!(envelope.rings.len(), 2);
        // Envelope grows outward on both sides of the copper band.
        assert!(envelope.region.unsigned_area() > copper.unsigned_area());
        let hole_ring = envelope
            .rings
            .iter()
            .map(|p| p.points())
            .find(|ls| Polygon::new((*ls).clone(), vec![]).unsigned_area() < 40.0)
            .expect("hole ring present");
        assert_eq!(hole_ring.winding_order(), Some(WindingOrder::Clockwise));
    }
}
