//! Render surface trait abstraction.

use diagramkit_core::geometry::grid_lines;
use diagramkit_core::shapes::{EntityKind, SerializableColor};
use kurbo::{BezPath, Point, Rect};
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Unknown render handle {0:?}")]
    UnknownHandle(RenderHandle),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Opaque identifier of a render object owned by a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderHandle(pub u64);

/// Backend-neutral description of something to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderObject {
    /// Outline in canvas coordinates.
    pub path: BezPath,
    /// Fill color (None = no fill).
    pub fill: Option<SerializableColor>,
    pub stroke: SerializableColor,
    pub stroke_width: f64,
    /// Drawn with the selection highlight.
    pub selected: bool,
    /// Stacking position; higher draws on top.
    pub z_index: usize,
    /// What kind of entity this object mirrors.
    pub kind: EntityKind,
}

impl RenderObject {
    /// Get the fill color as a peniko Color.
    pub fn fill_color(&self) -> Option<Color> {
        self.fill.map(Into::into)
    }

    /// Get the stroke color as a peniko Color.
    pub fn stroke_color(&self) -> Color {
        self.stroke.into()
    }
}

/// Grid overlay parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridOverlay {
    pub cell_size: f64,
    pub color: SerializableColor,
}

impl GridOverlay {
    /// Light grey grid with the given spacing.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            color: SerializableColor::new(220, 220, 220, 255),
        }
    }

    /// Vertical and horizontal line positions covering a viewport.
    pub fn lines(&self, viewport: Rect) -> (Vec<f64>, Vec<f64>) {
        grid_lines(viewport, self.cell_size)
    }
}

/// A drawing backend that owns render objects addressed by handles.
///
/// Implementations only draw. Which objects exist, and what they look like,
/// is decided by [`crate::CanvasSync`].
pub trait RenderSurface {
    /// Create a render object and return its handle.
    fn create_render_object(&mut self, object: &RenderObject) -> RenderResult<RenderHandle>;

    /// Replace the description of an existing object.
    fn update_render_object(&mut self, handle: RenderHandle, object: &RenderObject) -> RenderResult<()>;

    /// Destroy an object.
    fn remove_render_object(&mut self, handle: RenderHandle) -> RenderResult<()>;

    /// Mark one object as the active (primary selected) one, or none.
    fn set_active(&mut self, handle: Option<RenderHandle>);

    /// Show the grid overlay, or hide it with `None`.
    fn set_grid_overlay(&mut self, overlay: Option<&GridOverlay>);

    /// Present pending changes.
    fn redraw(&mut self);

    /// Show a transient path (e.g. a connector being drawn), or hide it.
    fn set_preview(&mut self, _path: Option<&BezPath>) {}

    /// Topmost object under a canvas point.
    fn hit_test(&self, _point: Point) -> Option<RenderHandle> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_overlay_lines() {
        let overlay = GridOverlay::new(50.0);
        let (xs, ys) = overlay.lines(Rect::new(0.0, 0.0, 100.0, 60.0));
        assert_eq!(xs, vec![0.0, 50.0, 100.0]);
        assert_eq!(ys, vec![0.0, 50.0]);
    }
}
