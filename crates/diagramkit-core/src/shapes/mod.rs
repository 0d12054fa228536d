//! Entity definitions for the diagram: shapes, containers and connectors.

mod connector;
mod container;

pub use connector::Connector;
pub use container::Container;

use crate::geometry::{is_point_in_rect, point_to_segment_dist};
use crate::id::EntityId;
use kurbo::{Point, Rect};
use peniko::Color;
use peniko::color::{Srgb, parse_color};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse a CSS color string (`#rrggbb`, `#rgb`, `rgb(...)`, named colors).
    pub fn parse(input: &str) -> Option<Self> {
        parse_color(input.trim())
            .ok()
            .map(|c| c.to_alpha_color::<Srgb>().into())
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Fill and stroke of a shape or container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Fill color (None = no fill).
    pub fill: Option<SerializableColor>,
    /// Stroke color.
    pub stroke: SerializableColor,
    /// Stroke width.
    pub stroke_width: f64,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill: Some(SerializableColor::white()),
            stroke: SerializableColor::black(),
            stroke_width: 1.0,
        }
    }
}

impl ShapeStyle {
    /// Default style with the given fill.
    pub fn filled(fill: SerializableColor) -> Self {
        Self {
            fill: Some(fill),
            ..Self::default()
        }
    }

    /// Get the fill color as a peniko Color.
    pub fn fill_color(&self) -> Option<Color> {
        self.fill.map(Into::into)
    }

    /// Get the stroke color as a peniko Color.
    pub fn stroke_color(&self) -> Color {
        self.stroke.into()
    }
}

/// Primitive shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Ellipse,
    Line,
}

impl ShapeKind {
    /// All shape kinds.
    pub const ALL: [ShapeKind; 3] = [ShapeKind::Rectangle, ShapeKind::Ellipse, ShapeKind::Line];

    /// Canonical user-facing name.
    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rect",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Line => "line",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rect" | "rectangle" => Ok(ShapeKind::Rectangle),
            "ellipse" | "circle" => Ok(ShapeKind::Ellipse),
            "line" => Ok(ShapeKind::Line),
            other => Err(format!("unknown shape kind '{other}'")),
        }
    }
}

/// The kind of a diagram entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Shape,
    Container,
    Connector,
}

/// A primitive diagram element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub(crate) id: EntityId,
    /// Primitive kind.
    pub kind: ShapeKind,
    /// Top-left corner position.
    pub position: Point,
    /// Width of the bounding box.
    pub width: f64,
    /// Height of the bounding box.
    pub height: f64,
    /// Style properties.
    pub style: ShapeStyle,
    pub(crate) parent: Option<EntityId>,
    pub(crate) selected: bool,
}

impl Shape {
    pub(crate) fn new(
        id: EntityId,
        kind: ShapeKind,
        position: Point,
        width: f64,
        height: f64,
        style: ShapeStyle,
    ) -> Self {
        Self {
            id,
            kind,
            position,
            width,
            height,
            style,
            parent: None,
            selected: false,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The container this shape belongs to, if any.
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Bounding box in canvas coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, (self.width, self.height))
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Line endpoints (top-left to bottom-right of the bounding box).
    pub fn line_endpoints(&self) -> (Point, Point) {
        let b = self.bounds();
        (Point::new(b.x0, b.y0), Point::new(b.x1, b.y1))
    }

    /// Check if a point hits this shape.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let bounds = self.bounds();
        match self.kind {
            ShapeKind::Rectangle => is_point_in_rect(point, bounds.inflate(tolerance, tolerance)),
            ShapeKind::Ellipse => {
                let rx = self.width / 2.0 + tolerance;
                let ry = self.height / 2.0 + tolerance;
                let c = bounds.center();
                let nx = (point.x - c.x) / rx;
                let ny = (point.y - c.y) / ry;
                nx * nx + ny * ny <= 1.0
            }
            ShapeKind::Line => {
                let (a, b) = self.line_endpoints();
                point_to_segment_dist(point, a, b) <= tolerance + self.style.stroke_width / 2.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn shape(kind: ShapeKind) -> Shape {
        Shape::new(
            EntityId(Uuid::from_u128(1)),
            kind,
            Point::new(0.0, 0.0),
            100.0,
            50.0,
            ShapeStyle::default(),
        )
    }

    #[test]
    fn test_shape_kind_from_str() {
        assert_eq!("rect".parse::<ShapeKind>(), Ok(ShapeKind::Rectangle));
        assert_eq!(" Rectangle ".parse::<ShapeKind>(), Ok(ShapeKind::Rectangle));
        assert_eq!("circle".parse::<ShapeKind>(), Ok(ShapeKind::Ellipse));
        assert_eq!("line".parse::<ShapeKind>(), Ok(ShapeKind::Line));
        assert!("hexagon".parse::<ShapeKind>().is_err());
    }

    #[test]
    fn test_bounds() {
        let s = shape(ShapeKind::Rectangle);
        assert_eq!(s.bounds(), Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(s.center(), Point::new(50.0, 25.0));
    }

    #[test]
    fn test_rectangle_hit_test() {
        let s = shape(ShapeKind::Rectangle);
        assert!(s.hit_test(Point::new(50.0, 25.0), 0.0));
        assert!(!s.hit_test(Point::new(150.0, 25.0), 0.0));
        assert!(s.hit_test(Point::new(105.0, 25.0), 10.0));
    }

    #[test]
    fn test_ellipse_hit_test() {
        let s = shape(ShapeKind::Ellipse);
        assert!(s.hit_test(Point::new(50.0, 25.0), 0.0));
        // Bounding-box corner is outside the ellipse.
        assert!(!s.hit_test(Point::new(2.0, 2.0), 0.0));
    }

    #[test]
    fn test_line_hit_test() {
        let s = shape(ShapeKind::Line);
        assert!(s.hit_test(Point::new(50.0, 25.0), 1.0));
        assert!(!s.hit_test(Point::new(100.0, 0.0), 1.0));
    }

    #[test]
    fn test_color_parse() {
        assert_eq!(
            SerializableColor::parse("#ff0000"),
            Some(SerializableColor::new(255, 0, 0, 255))
        );
        assert_eq!(SerializableColor::parse("white"), Some(SerializableColor::white()));
        assert_eq!(SerializableColor::parse("not a color"), None);
    }

    #[test]
    fn test_color_roundtrip_through_peniko() {
        let c = SerializableColor::new(12, 34, 56, 255);
        let p: Color = c.into();
        assert_eq!(SerializableColor::from(p), c);
    }
}
