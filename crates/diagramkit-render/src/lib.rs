//! DiagramKit Render Library
//!
//! Render surface abstraction and the synchronization layer that mirrors a
//! diagram onto a surface. [`RecordingSurface`] is an in-memory backend for
//! headless use and tests.

mod factory;
mod recording;
mod renderer;
mod sync;

pub use factory::{
    EllipseFactory, FactoryRegistry, LineFactory, RectangleFactory, ShapeFactory, connector_object,
    container_object, polyline,
};
pub use recording::RecordingSurface;
pub use renderer::{GridOverlay, RenderHandle, RenderObject, RenderResult, RenderSurface, RendererError};
pub use sync::CanvasSync;
