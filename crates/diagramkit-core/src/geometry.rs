//! Grid settings, snapping and the boolean geometry predicates used for
//! hit-testing and container membership.

use crate::error::{DiagramError, DiagramResult};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Default grid cell size (matches the visual grid).
pub const GRID_SIZE: f64 = 20.0;

/// Grid display and snapping settings for one diagram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Whether the grid overlay is drawn.
    pub visible: bool,
    /// Whether pointer positions are snapped to grid intersections.
    pub snap_enabled: bool,
    /// Distance between grid lines, always positive.
    pub cell_size: f64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            visible: true,
            snap_enabled: false,
            cell_size: GRID_SIZE,
        }
    }
}

impl GridSettings {
    /// Create validated grid settings.
    pub fn new(visible: bool, snap_enabled: bool, cell_size: f64) -> DiagramResult<Self> {
        check_cell_size(cell_size)?;
        Ok(Self {
            visible,
            snap_enabled,
            cell_size,
        })
    }

    /// Snap a point with these settings.
    pub fn snap(&self, point: Point) -> Point {
        snap(point, self)
    }
}

pub(crate) fn check_cell_size(cell_size: f64) -> DiagramResult<()> {
    if cell_size.is_finite() && cell_size > 0.0 {
        Ok(())
    } else {
        Err(DiagramError::InvalidGeometry(format!(
            "grid cell size must be positive, got {cell_size}"
        )))
    }
}

/// Snap a point to the nearest grid intersection.
///
/// Halves round away from zero.
pub fn snap_to_grid(point: Point, cell_size: f64) -> Point {
    Point::new(
        (point.x / cell_size).round() * cell_size,
        (point.y / cell_size).round() * cell_size,
    )
}

/// Snap a point according to the grid settings.
///
/// Returns the point unchanged when snapping is disabled.
pub fn snap(point: Point, grid: &GridSettings) -> Point {
    if grid.snap_enabled {
        snap_to_grid(point, grid.cell_size)
    } else {
        point
    }
}

/// Check if a point lies inside a rectangle (edges included).
pub fn is_point_in_rect(point: Point, rect: Rect) -> bool {
    let rect = rect.abs();
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Check if two rectangles overlap. Touching edges count as overlap.
pub fn do_rects_overlap(a: Rect, b: Rect) -> bool {
    let (a, b) = (a.abs(), b.abs());
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Check if `inner` lies entirely within `outer`. Coinciding edges are allowed.
pub fn rect_contains_rect(outer: Rect, inner: Rect) -> bool {
    let (outer, inner) = (outer.abs(), inner.abs());
    inner.x0 >= outer.x0 && inner.x1 <= outer.x1 && inner.y0 >= outer.y0 && inner.y1 <= outer.y1
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => (point - *only).hypot(),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Translate a rectangle by a delta.
pub fn translate_rect(rect: Rect, delta: Vec2) -> Rect {
    rect + delta
}

/// Most grid lines drawn along one axis; a denser axis gets none.
pub const MAX_GRID_LINES: usize = 4096;

/// Coordinates of the vertical (x) and horizontal (y) grid lines covering a viewport.
pub fn grid_lines(viewport: Rect, cell_size: f64) -> (Vec<f64>, Vec<f64>) {
    if check_cell_size(cell_size).is_err() {
        return (Vec::new(), Vec::new());
    }
    let viewport = viewport.abs();
    let axis = |lo: f64, hi: f64| {
        let first = (lo / cell_size).ceil();
        let last = (hi / cell_size).floor();
        let count = last - first + 1.0;
        if !count.is_finite() || count > MAX_GRID_LINES as f64 {
            log::debug!("grid too dense to draw: {count} lines of {cell_size}");
            return Vec::new();
        }
        (first as i64..=last as i64)
            .map(|i| i as f64 * cell_size)
            .collect::<Vec<_>>()
    };
    (axis(viewport.x0, viewport.x1), axis(viewport.y0, viewport.y1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_to_grid() {
        assert_eq!(snap_to_grid(Point::new(14.0, 27.0), 10.0), Point::new(10.0, 30.0));
        assert_eq!(snap_to_grid(Point::new(23.0, 47.0), 20.0), Point::new(20.0, 40.0));
    }

    #[test]
    fn test_snap_to_grid_exact() {
        assert_eq!(snap_to_grid(Point::new(40.0, 60.0), 20.0), Point::new(40.0, 60.0));
    }

    #[test]
    fn test_snap_halves_round_away_from_zero() {
        assert_eq!(snap_to_grid(Point::new(15.0, -15.0), 10.0), Point::new(20.0, -20.0));
    }

    #[test]
    fn test_snap_disabled() {
        let grid = GridSettings::default();
        assert!(!grid.snap_enabled);
        assert_eq!(snap(Point::new(14.0, 27.0), &grid), Point::new(14.0, 27.0));
    }

    #[test]
    fn test_snap_enabled() {
        let grid = GridSettings::new(true, true, 10.0).unwrap();
        assert_eq!(grid.snap(Point::new(14.0, 27.0)), Point::new(10.0, 30.0));
    }

    #[test]
    fn test_grid_settings_rejects_bad_cell_size() {
        assert!(GridSettings::new(true, true, 0.0).is_err());
        assert!(GridSettings::new(true, true, -5.0).is_err());
        assert!(GridSettings::new(true, true, f64::NAN).is_err());
    }

    #[test]
    fn test_point_in_rect() {
        let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
        assert!(is_point_in_rect(Point::new(50.0, 25.0), rect));
        assert!(is_point_in_rect(Point::new(100.0, 50.0), rect));
        assert!(!is_point_in_rect(Point::new(100.1, 25.0), rect));
    }

    #[test]
    fn test_rects_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(do_rects_overlap(a, Rect::new(5.0, 5.0, 15.0, 15.0)));
        assert!(do_rects_overlap(a, Rect::new(10.0, 0.0, 20.0, 10.0)));
        assert!(!do_rects_overlap(a, Rect::new(11.0, 0.0, 20.0, 10.0)));
    }

    #[test]
    fn test_rect_contains_rect() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(rect_contains_rect(outer, Rect::new(10.0, 10.0, 50.0, 50.0)));
        assert!(rect_contains_rect(outer, outer));
        assert!(!rect_contains_rect(outer, Rect::new(90.0, 90.0, 110.0, 100.0)));
    }

    #[test]
    fn test_point_to_polyline_dist() {
        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
        assert!((point_to_polyline_dist(Point::new(5.0, 3.0), &pts) - 3.0).abs() < 1e-9);
        assert!((point_to_polyline_dist(Point::new(12.0, 5.0), &pts) - 2.0).abs() < 1e-9);
        assert_eq!(point_to_polyline_dist(Point::ZERO, &[]), f64::INFINITY);
    }

    #[test]
    fn test_grid_lines() {
        let (xs, ys) = grid_lines(Rect::new(-5.0, 0.0, 25.0, 10.0), 10.0);
        assert_eq!(xs, vec![0.0, 10.0, 20.0]);
        assert_eq!(ys, vec![0.0, 10.0]);
        assert_eq!(grid_lines(Rect::new(0.0, 0.0, 10.0, 10.0), 0.0), (Vec::new(), Vec::new()));
    }

    #[test]
    fn test_grid_lines_skips_dense_axis() {
        let (xs, ys) = grid_lines(Rect::new(0.0, 0.0, 1.0e12, 10.0), 1.0);
        assert!(xs.is_empty());
        assert_eq!(ys.len(), 11);
        let (xs, ys) = grid_lines(Rect::new(0.0, 0.0, f64::INFINITY, 10.0), 1.0);
        assert!(xs.is_empty());
        assert_eq!(ys.len(), 11);
    }
}
