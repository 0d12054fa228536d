//! Shape factories: turn model entities into render object descriptions.
//!
//! Each primitive [`ShapeKind`] has a [`ShapeFactory`] registered in a
//! [`FactoryRegistry`]. Containers and connectors are drawn by fixed builders.

use crate::renderer::{RenderHandle, RenderObject, RenderResult, RenderSurface};
use diagramkit_core::shapes::{Connector, Container, EntityKind, SerializableColor, Shape, ShapeKind};
use kurbo::{BezPath, Ellipse, Point, Shape as KurboShape};
use std::collections::HashMap;
use std::fmt;

/// Flattening tolerance used when converting curves to paths.
const PATH_TOLERANCE: f64 = 0.1;

/// Creates render objects for one primitive shape kind.
pub trait ShapeFactory: fmt::Debug {
    /// The kind this factory builds.
    fn kind(&self) -> ShapeKind;

    /// Outline of the shape in canvas coordinates.
    fn path(&self, shape: &Shape) -> BezPath;

    /// Full render description of the shape.
    fn describe(&self, shape: &Shape, z_index: usize) -> RenderObject {
        RenderObject {
            path: self.path(shape),
            fill: shape.style.fill,
            stroke: shape.style.stroke,
            stroke_width: shape.style.stroke_width,
            selected: shape.is_selected(),
            z_index,
            kind: EntityKind::Shape,
        }
    }

    /// Create the shape's render object on a surface.
    fn create(&self, surface: &mut dyn RenderSurface, shape: &Shape, z_index: usize) -> RenderResult<RenderHandle> {
        surface.create_render_object(&self.describe(shape, z_index))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RectangleFactory;

impl ShapeFactory for RectangleFactory {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Rectangle
    }

    fn path(&self, shape: &Shape) -> BezPath {
        shape.bounds().to_path(PATH_TOLERANCE)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EllipseFactory;

impl ShapeFactory for EllipseFactory {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Ellipse
    }

    fn path(&self, shape: &Shape) -> BezPath {
        Ellipse::from_rect(shape.bounds()).to_path(PATH_TOLERANCE)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LineFactory;

impl ShapeFactory for LineFactory {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Line
    }

    fn path(&self, shape: &Shape) -> BezPath {
        let (start, end) = shape.line_endpoints();
        polyline(&[start, end])
    }

    /// Lines are never filled.
    fn describe(&self, shape: &Shape, z_index: usize) -> RenderObject {
        RenderObject {
            path: self.path(shape),
            fill: None,
            stroke: shape.style.stroke,
            stroke_width: shape.style.stroke_width,
            selected: shape.is_selected(),
            z_index,
            kind: EntityKind::Shape,
        }
    }
}

/// Factories keyed by shape kind.
#[derive(Debug, Default)]
pub struct FactoryRegistry {
    factories: HashMap<ShapeKind, Box<dyn ShapeFactory>>,
}

impl FactoryRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with factories for every built-in kind.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(RectangleFactory);
        registry.register(EllipseFactory);
        registry.register(LineFactory);
        registry
    }

    /// Register a factory, replacing any previous one for the same kind.
    pub fn register(&mut self, factory: impl ShapeFactory + 'static) {
        self.factories.insert(factory.kind(), Box::new(factory));
    }

    pub fn get(&self, kind: ShapeKind) -> Option<&dyn ShapeFactory> {
        self.factories.get(&kind).map(|f| f.as_ref())
    }

    pub fn contains(&self, kind: ShapeKind) -> bool {
        self.factories.contains_key(&kind)
    }
}

/// Render description of a container frame.
pub fn container_object(container: &Container, selected: bool, z_index: usize) -> RenderObject {
    RenderObject {
        path: container.bounds().to_path(PATH_TOLERANCE),
        fill: container.style.fill,
        stroke: container.style.stroke,
        stroke_width: container.style.stroke_width,
        selected,
        z_index,
        kind: EntityKind::Container,
    }
}

/// Render description of a connector routed between two anchors.
pub fn connector_object(connector: &Connector, from: Point, to: Point, selected: bool, z_index: usize) -> RenderObject {
    RenderObject {
        path: polyline(&connector.path(from, to)),
        fill: None,
        stroke: SerializableColor::black(),
        stroke_width: 1.5,
        selected,
        z_index,
        kind: EntityKind::Connector,
    }
}

/// Open path through the given points.
pub fn polyline(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if let Some((first, rest)) = points.split_first() {
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
    }
    path
}
