//! In-memory render surface.
//!
//! Keeps every render object in a map instead of drawing it. Used headless
//! and in tests to observe exactly what a backend would have been asked to do.

use crate::renderer::{GridOverlay, RenderHandle, RenderObject, RenderResult, RenderSurface, RendererError};
use kurbo::{BezPath, Point, Shape as KurboShape};
use std::collections::BTreeMap;

/// Extra hit slack around object outlines.
const HIT_SLACK: f64 = 4.0;

/// A render surface that records its state.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    objects: BTreeMap<RenderHandle, RenderObject>,
    next_handle: u64,
    active: Option<RenderHandle>,
    grid: Option<GridOverlay>,
    preview: Option<BezPath>,
    redraws: usize,
    failures: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` object creations fail.
    pub fn fail_next_create(&mut self, count: usize) {
        self.failures = count;
    }

    pub fn objects(&self) -> &BTreeMap<RenderHandle, RenderObject> {
        &self.objects
    }

    pub fn object(&self, handle: RenderHandle) -> Option<&RenderObject> {
        self.objects.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn active(&self) -> Option<RenderHandle> {
        self.active
    }

    pub fn grid(&self) -> Option<&GridOverlay> {
        self.grid.as_ref()
    }

    pub fn preview(&self) -> Option<&BezPath> {
        self.preview.as_ref()
    }

    /// Number of redraws requested so far.
    pub fn redraw_count(&self) -> usize {
        self.redraws
    }
}

impl RenderSurface for RecordingSurface {
    fn create_render_object(&mut self, object: &RenderObject) -> RenderResult<RenderHandle> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(RendererError::RenderFailed("injected creation failure".to_string()));
        }
        self.next_handle += 1;
        let handle = RenderHandle(self.next_handle);
        self.objects.insert(handle, object.clone());
        Ok(handle)
    }

    fn update_render_object(&mut self, handle: RenderHandle, object: &RenderObject) -> RenderResult<()> {
        let slot = self
            .objects
            .get_mut(&handle)
            .ok_or(RendererError::UnknownHandle(handle))?;
        *slot = object.clone();
        Ok(())
    }

    fn remove_render_object(&mut self, handle: RenderHandle) -> RenderResult<()> {
        if self.active == Some(handle) {
            self.active = None;
        }
        self.objects
            .remove(&handle)
            .map(|_| ())
            .ok_or(RendererError::UnknownHandle(handle))
    }

    fn set_active(&mut self, handle: Option<RenderHandle>) {
        self.active = handle;
    }

    fn set_grid_overlay(&mut self, overlay: Option<&GridOverlay>) {
        self.grid = overlay.copied();
    }

    fn redraw(&mut self) {
        self.redraws += 1;
    }

    fn set_preview(&mut self, path: Option<&BezPath>) {
        self.preview = path.cloned();
    }

    fn hit_test(&self, point: Point) -> Option<RenderHandle> {
        self.objects
            .iter()
            .filter(|(_, o)| {
                o.path
                    .bounding_box()
                    .inflate(HIT_SLACK, HIT_SLACK)
                    .contains(point)
            })
            .max_by_key(|(_, o)| o.z_index)
            .map(|(h, _)| *h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagramkit_core::shapes::{EntityKind, SerializableColor};
    use kurbo::Rect;

    fn object(rect: Rect, z_index: usize) -> RenderObject {
        RenderObject {
            path: rect.to_path(0.1),
            fill: None,
            stroke: SerializableColor::black(),
            stroke_width: 1.0,
            selected: false,
            z_index,
            kind: EntityKind::Shape,
        }
    }

    #[test]
    fn test_create_update_remove() {
        let mut surface = RecordingSurface::new();
        let h = surface
            .create_render_object(&object(Rect::new(0.0, 0.0, 10.0, 10.0), 0))
            .unwrap();
        assert_eq!(surface.len(), 1);
        surface
            .update_render_object(h, &object(Rect::new(5.0, 5.0, 10.0, 10.0), 1))
            .unwrap();
        assert_eq!(surface.object(h).map(|o| o.z_index), Some(1));
        surface.remove_render_object(h).unwrap();
        assert!(surface.is_empty());
        assert_eq!(surface.remove_render_object(h), Err(RendererError::UnknownHandle(h)));
    }

    #[test]
    fn test_fail_next_create() {
        let mut surface = RecordingSurface::new();
        surface.fail_next_create(1);
        let o = object(Rect::new(0.0, 0.0, 10.0, 10.0), 0);
        assert!(surface.create_render_object(&o).is_err());
        assert!(surface.create_render_object(&o).is_ok());
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let mut surface = RecordingSurface::new();
        let low = object(Rect::new(0.0, 0.0, 100.0, 100.0), 0);
        let high = object(Rect::new(10.0, 10.0, 30.0, 30.0), 1);
        surface.create_render_object(&low).unwrap();
        let top = surface.create_render_object(&high).unwrap();
        assert_eq!(surface.hit_test(Point::new(20.0, 20.0)), Some(top));
        assert_eq!(surface.hit_test(Point::new(500.0, 500.0)), None);
    }
}
