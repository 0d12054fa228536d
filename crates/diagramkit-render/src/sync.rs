//! Keeps a render surface in step with a diagram.
//!
//! [`CanvasSync`] owns the mapping between entity ids and render handles. It
//! drains the diagram's event queue, in order, and turns each event into
//! create/update/remove calls on the surface. Nothing else writes to the
//! surface, so after every [`CanvasSync::flush`] the set of mapped entities
//! equals the set of entities in the diagram (minus any whose creation failed).

use crate::factory::{FactoryRegistry, connector_object, container_object, polyline};
use crate::renderer::{GridOverlay, RenderHandle, RenderObject, RenderSurface, RendererError};
use diagramkit_core::diagram::{Diagram, DiagramEvent};
use diagramkit_core::geometry::GridSettings;
use diagramkit_core::id::EntityId;
use diagramkit_core::shapes::EntityKind;
use kurbo::Point;
use std::collections::{BTreeSet, HashMap};

/// Mirror of a diagram on a render surface.
#[derive(Debug)]
pub struct CanvasSync<S: RenderSurface> {
    surface: S,
    registry: FactoryRegistry,
    handles: HashMap<EntityId, RenderHandle>,
    entities: HashMap<RenderHandle, EntityId>,
}

impl<S: RenderSurface> CanvasSync<S> {
    /// Attach to a surface. Nothing is mirrored until the next flush or resync.
    pub fn attach(surface: S, registry: FactoryRegistry) -> Self {
        Self {
            surface,
            registry,
            handles: HashMap::new(),
            entities: HashMap::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn registry_mut(&mut self) -> &mut FactoryRegistry {
        &mut self.registry
    }

    /// Detach from the surface and return it.
    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn handle_of(&self, id: EntityId) -> Option<RenderHandle> {
        self.handles.get(&id).copied()
    }

    pub fn entity_of(&self, handle: RenderHandle) -> Option<EntityId> {
        self.entities.get(&handle).copied()
    }

    /// Entities that currently have a render object.
    pub fn live_ids(&self) -> BTreeSet<EntityId> {
        self.handles.keys().copied().collect()
    }

    /// Entity whose render object is topmost under a canvas point.
    pub fn hit_test(&self, point: Point) -> Option<EntityId> {
        self.surface.hit_test(point).and_then(|h| self.entity_of(h))
    }

    /// Apply all pending diagram events. Returns how many were applied.
    pub fn flush(&mut self, diagram: &mut Diagram) -> usize {
        let events = diagram.take_events();
        let mut changed = false;
        for event in &events {
            changed |= self.apply(diagram, event);
        }
        if changed {
            self.surface.redraw();
        }
        events.len()
    }

    /// Drop every render object and rebuild the mirror from scratch.
    pub fn resync(&mut self, diagram: &Diagram) {
        self.remove_all();
        for id in diagram.entity_ids() {
            self.upsert(diagram, *id);
        }
        self.show_grid(diagram.grid());
        let active = diagram.primary_selection().and_then(|id| self.handle_of(id));
        self.surface.set_active(active);
        self.surface.redraw();
        log::debug!("resynced {} of {} entities", self.handles.len(), diagram.len());
    }

    /// Show or hide the transient preview path.
    pub fn sync_preview(&mut self, path: Option<&[Point]>) {
        let path = path.map(polyline);
        self.surface.set_preview(path.as_ref());
        self.surface.redraw();
    }

    fn apply(&mut self, diagram: &Diagram, event: &DiagramEvent) -> bool {
        match event {
            DiagramEvent::Added(id) | DiagramEvent::Updated(id) => self.upsert(diagram, *id),
            DiagramEvent::Removed(id) => self.remove(*id),
            DiagramEvent::SelectionChanged { previous, current } => {
                let touched: BTreeSet<EntityId> = previous.iter().chain(current).copied().collect();
                for id in touched {
                    if self.handles.contains_key(&id) {
                        self.upsert(diagram, id);
                    }
                }
                let active = current.last().and_then(|id| self.handle_of(*id));
                self.surface.set_active(active);
                true
            }
            DiagramEvent::GridChanged(grid) => {
                self.show_grid(grid);
                true
            }
            DiagramEvent::Cleared => {
                self.remove_all();
                true
            }
        }
    }

    /// Update an entity's render object, creating it when missing.
    fn upsert(&mut self, diagram: &Diagram, id: EntityId) -> bool {
        let Some(handle) = self.handle_of(id) else {
            return self.create(diagram, id);
        };
        let Some(object) = self.describe(diagram, id) else {
            return false;
        };
        if let Err(err) = self.surface.update_render_object(handle, &object) {
            log::warn!("failed to update render object for {id}: {err}");
        }
        true
    }

    fn create(&mut self, diagram: &Diagram, id: EntityId) -> bool {
        let Some(z_index) = diagram.z_index(id) else {
            return false;
        };
        let result = match diagram.shape(id) {
            Some(shape) => match self.registry.get(shape.kind) {
                Some(factory) => factory.create(&mut self.surface, shape, z_index),
                None => Err(RendererError::RenderFailed(format!(
                    "no factory registered for {}",
                    shape.kind
                ))),
            },
            None => match self.describe(diagram, id) {
                Some(object) => self.surface.create_render_object(&object),
                None => return false,
            },
        };
        match result {
            Ok(handle) => {
                self.handles.insert(id, handle);
                self.entities.insert(handle, id);
                true
            }
            Err(err) => {
                log::warn!("failed to create render object for {id}: {err}");
                false
            }
        }
    }

    fn remove(&mut self, id: EntityId) -> bool {
        let Some(handle) = self.handles.remove(&id) else {
            return false;
        };
        self.entities.remove(&handle);
        if let Err(err) = self.surface.remove_render_object(handle) {
            log::warn!("failed to remove render object for {id}: {err}");
        }
        true
    }

    fn remove_all(&mut self) {
        for (id, handle) in self.handles.drain() {
            if let Err(err) = self.surface.remove_render_object(handle) {
                log::warn!("failed to remove render object for {id}: {err}");
            }
        }
        self.entities.clear();
        self.surface.set_active(None);
    }

    fn show_grid(&mut self, grid: &GridSettings) {
        let overlay = grid.visible.then(|| GridOverlay::new(grid.cell_size));
        self.surface.set_grid_overlay(overlay.as_ref());
    }

    /// Render description of an entity as it currently stands.
    fn describe(&self, diagram: &Diagram, id: EntityId) -> Option<RenderObject> {
        let z_index = diagram.z_index(id)?;
        let selected = diagram.is_selected(id);
        match diagram.entity_kind(id)? {
            EntityKind::Shape => {
                let shape = diagram.shape(id)?;
                self.registry.get(shape.kind).map(|f| f.describe(shape, z_index))
            }
            EntityKind::Container => diagram
                .container(id)
                .map(|c| container_object(c, selected, z_index)),
            EntityKind::Connector => {
                let connector = diagram.connector(id)?;
                let (from, to) = diagram.connector_endpoints(id)?;
                Some(connector_object(connector, from, to, selected, z_index))
            }
        }
    }
}
