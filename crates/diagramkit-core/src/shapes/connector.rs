//! Directed links between entities.

use crate::geometry::point_to_polyline_dist;
use crate::id::EntityId;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// A directed link from `source` to `target`, optionally routed through waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub(crate) id: EntityId,
    pub(crate) source: EntityId,
    pub(crate) target: EntityId,
    /// Intermediate routing points, in order.
    pub waypoints: Vec<Point>,
}

impl Connector {
    pub(crate) fn new(id: EntityId, source: EntityId, target: EntityId, waypoints: Vec<Point>) -> Self {
        Self {
            id,
            source,
            target,
            waypoints,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn source(&self) -> EntityId {
        self.source
    }

    pub fn target(&self) -> EntityId {
        self.target
    }

    /// Check if either endpoint is `id`.
    pub fn touches(&self, id: EntityId) -> bool {
        self.source == id || self.target == id
    }

    /// Full routed path given the endpoint anchor points.
    pub fn path(&self, from: Point, to: Point) -> Vec<Point> {
        let mut points = Vec::with_capacity(self.waypoints.len() + 2);
        points.push(from);
        points.extend(self.waypoints.iter().copied());
        points.push(to);
        points
    }

    /// Bounding box of the routed path.
    pub fn bounds(&self, from: Point, to: Point) -> Rect {
        self.path(from, to)
            .iter()
            .fold(Rect::from_points(from, from), |r, p| r.union_pt(*p))
    }

    /// Check if a point lies within `tolerance` of the routed path.
    pub fn hit_test(&self, from: Point, to: Point, point: Point, tolerance: f64) -> bool {
        point_to_polyline_dist(point, &self.path(from, to)) <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn id(n: u128) -> EntityId {
        EntityId(Uuid::from_u128(n))
    }

    #[test]
    fn test_path_includes_waypoints() {
        let c = Connector::new(id(3), id(1), id(2), vec![Point::new(50.0, 0.0)]);
        let path = c.path(Point::new(0.0, 0.0), Point::new(50.0, 50.0));
        assert_eq!(path.len(), 3);
        assert_eq!(path[1], Point::new(50.0, 0.0));
    }

    #[test]
    fn test_touches() {
        let c = Connector::new(id(3), id(1), id(2), Vec::new());
        assert!(c.touches(id(1)));
        assert!(c.touches(id(2)));
        assert!(!c.touches(id(3)));
    }

    #[test]
    fn test_hit_test_and_bounds() {
        let c = Connector::new(id(3), id(1), id(2), vec![Point::new(100.0, 0.0)]);
        let (from, to) = (Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        assert!(c.hit_test(from, to, Point::new(50.0, 2.0), 3.0));
        assert!(!c.hit_test(from, to, Point::new(20.0, 80.0), 3.0));
        assert_eq!(c.bounds(from, to), Rect::new(0.0, 0.0, 100.0, 100.0));
    }
}
