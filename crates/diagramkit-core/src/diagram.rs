//! The diagram model: the authoritative store of shapes, containers and
//! connectors, plus selection and grid settings.
//!
//! Every mutation validates its inputs before touching any state and, once
//! committed, appends [`DiagramEvent`]s to an internal queue. Consumers drain
//! the queue with [`Diagram::take_events`] and see the events in the exact
//! order the mutations completed.

use crate::error::{DiagramError, DiagramResult, check_size};
use crate::geometry::{GridSettings, check_cell_size, is_point_in_rect, rect_contains_rect};
use crate::id::{EntityId, IdSource, SequentialIds};
use crate::shapes::{Connector, Container, EntityKind, Shape, ShapeKind, ShapeStyle};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};
use uuid::Uuid;

/// What happens to a container's children when the container is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerDeletePolicy {
    /// Children survive at the root (no parent).
    #[default]
    PromoteChildren,
    /// Children are deleted together with the container.
    Cascade,
}

/// Per-diagram settings.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramSettings {
    pub grid: GridSettings,
    pub delete_policy: ContainerDeletePolicy,
}

/// Mutation notifications, in commit order.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagramEvent {
    /// An entity was inserted.
    Added(EntityId),
    /// An entity was deleted.
    Removed(EntityId),
    /// An entity's geometry, style or membership changed.
    Updated(EntityId),
    /// The selection changed from `previous` to `current`.
    SelectionChanged {
        previous: Vec<EntityId>,
        current: Vec<EntityId>,
    },
    /// Grid visibility, snapping or cell size changed.
    GridChanged(GridSettings),
    /// Every entity was removed at once.
    Cleared,
}

/// Positions, parents and waypoints captured before a gesture, so the
/// gesture can be undone exactly.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutSnapshot {
    shapes: Vec<(EntityId, Point, Option<EntityId>)>,
    containers: Vec<(EntityId, Point)>,
    connectors: Vec<(EntityId, Vec<Point>)>,
}

impl LayoutSnapshot {
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.containers.is_empty() && self.connectors.is_empty()
    }
}

/// Entities translated by one group move.
#[derive(Debug, Default)]
struct MoveSet {
    /// Shapes moving on their own; their membership is re-evaluated.
    free: Vec<EntityId>,
    /// Moved containers and their children.
    carried: Vec<EntityId>,
    /// Connectors whose waypoints shift.
    connectors: Vec<EntityId>,
}

/// A diagram document.
#[derive(Debug)]
pub struct Diagram {
    /// Unique document identifier.
    id: Uuid,
    /// Document name.
    pub name: String,
    shapes: HashMap<EntityId, Shape>,
    containers: HashMap<EntityId, Container>,
    connectors: HashMap<EntityId, Connector>,
    /// Creation order of all entities (back to front).
    z_order: Vec<EntityId>,
    /// Selected entities; the last one is the primary selection.
    selection: Vec<EntityId>,
    settings: DiagramSettings,
    ids: Box<dyn IdSource>,
    events: VecDeque<DiagramEvent>,
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagram {
    /// Create an empty diagram with sequential ids and default settings.
    pub fn new() -> Self {
        Self::with_settings(DiagramSettings::default())
    }

    /// Create an empty diagram with the given settings.
    pub fn with_settings(settings: DiagramSettings) -> Self {
        Self::with_id_source(settings, Box::new(SequentialIds::new()))
    }

    /// Create an empty diagram with an injected id source.
    pub fn with_id_source(settings: DiagramSettings, ids: Box<dyn IdSource>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: "Untitled".to_string(),
            shapes: HashMap::new(),
            containers: HashMap::new(),
            connectors: HashMap::new(),
            z_order: Vec::new(),
            selection: Vec::new(),
            settings,
            ids,
            events: VecDeque::new(),
        }
    }

    /// Document id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &DiagramSettings {
        &self.settings
    }

    pub fn grid(&self) -> &GridSettings {
        &self.settings.grid
    }

    pub fn delete_policy(&self) -> ContainerDeletePolicy {
        self.settings.delete_policy
    }

    pub fn set_delete_policy(&mut self, policy: ContainerDeletePolicy) {
        self.settings.delete_policy = policy;
    }

    // ─── Notifications ───────────────────────────────────────────────────

    fn emit(&mut self, event: DiagramEvent) {
        self.events.push_back(event);
    }

    /// Drain all pending notifications in commit order.
    pub fn take_events(&mut self) -> Vec<DiagramEvent> {
        self.events.drain(..).collect()
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    // ─── Creation ────────────────────────────────────────────────────────

    /// Insert a new shape and return a snapshot of it.
    pub fn add_shape(
        &mut self,
        kind: ShapeKind,
        position: Point,
        width: f64,
        height: f64,
        style: ShapeStyle,
    ) -> DiagramResult<Shape> {
        check_point(position)?;
        check_size(width, height)?;

        let id = self.ids.next_id();
        let mut shape = Shape::new(id, kind, position, width, height, style);
        shape.parent = self.find_parent(shape.bounds());
        if let Some(parent) = shape.parent {
            if let Some(container) = self.containers.get_mut(&parent) {
                container.children.insert(id);
            }
        }
        log::debug!("add {kind} {id} at ({}, {}) parent={:?}", position.x, position.y, shape.parent);

        self.shapes.insert(id, shape.clone());
        self.z_order.push(id);
        self.emit(DiagramEvent::Added(id));
        Ok(shape)
    }

    /// Insert a new container; root shapes lying fully inside it become its children.
    pub fn add_container(
        &mut self,
        name: impl Into<String>,
        position: Point,
        width: f64,
        height: f64,
        style: ShapeStyle,
    ) -> DiagramResult<Container> {
        check_point(position)?;
        check_size(width, height)?;

        let id = self.ids.next_id();
        let mut container = Container::new(id, name.into(), position, width, height, style);
        let bounds = container.bounds();
        let adopted: Vec<EntityId> = self
            .z_order
            .iter()
            .filter_map(|sid| self.shapes.get(sid))
            .filter(|s| s.parent.is_none() && rect_contains_rect(bounds, s.bounds()))
            .map(|s| s.id)
            .collect();
        for sid in &adopted {
            if let Some(shape) = self.shapes.get_mut(sid) {
                shape.parent = Some(id);
            }
            container.children.insert(*sid);
        }
        log::debug!("add container {id} '{}' adopting {} shapes", container.name, adopted.len());

        self.containers.insert(id, container.clone());
        self.z_order.push(id);
        self.emit(DiagramEvent::Added(id));
        for sid in adopted {
            self.emit(DiagramEvent::Updated(sid));
        }
        Ok(container)
    }

    /// Insert a connector between two existing shapes or containers.
    pub fn add_connector(
        &mut self,
        source: EntityId,
        target: EntityId,
        waypoints: Vec<Point>,
    ) -> DiagramResult<Connector> {
        self.check_endpoint(source)?;
        self.check_endpoint(target)?;
        if source == target {
            return Err(DiagramError::InvalidConnector(format!(
                "connector cannot link {source} to itself"
            )));
        }
        waypoints.iter().try_for_each(|p| check_point(*p))?;

        let id = self.ids.next_id();
        let connector = Connector::new(id, source, target, waypoints);
        log::debug!("add connector {id}: {source} -> {target}");

        self.connectors.insert(id, connector.clone());
        self.z_order.push(id);
        self.emit(DiagramEvent::Added(id));
        Ok(connector)
    }

    fn check_endpoint(&self, id: EntityId) -> DiagramResult<()> {
        match self.entity_kind(id) {
            Some(EntityKind::Shape | EntityKind::Container) => Ok(()),
            Some(EntityKind::Connector) => Err(DiagramError::InvalidConnector(format!(
                "{id} is a connector and cannot be an endpoint"
            ))),
            None => Err(DiagramError::NotFound(id)),
        }
    }

    // ─── Removal ─────────────────────────────────────────────────────────

    /// Remove an entity, its dependent connectors and, under
    /// [`ContainerDeletePolicy::Cascade`], a container's children.
    pub fn remove_entity(&mut self, id: EntityId) -> DiagramResult<()> {
        let kind = self.entity_kind(id).ok_or(DiagramError::NotFound(id))?;

        // Work out the full removal set before mutating anything.
        let mut doomed: Vec<EntityId> = Vec::new();
        let mut promoted: Vec<EntityId> = Vec::new();
        match kind {
            EntityKind::Connector => {}
            EntityKind::Shape => {}
            EntityKind::Container => {
                let children: Vec<EntityId> = self
                    .containers
                    .get(&id)
                    .map(|c| c.children.iter().copied().collect())
                    .unwrap_or_default();
                match self.settings.delete_policy {
                    ContainerDeletePolicy::Cascade => doomed.extend(children),
                    ContainerDeletePolicy::PromoteChildren => promoted = children,
                }
            }
        }
        doomed.push(id);
        let dangling: Vec<EntityId> = self
            .z_order
            .iter()
            .filter_map(|cid| self.connectors.get(cid))
            .filter(|c| c.id != id && doomed.iter().any(|d| c.touches(*d)))
            .map(|c| c.id)
            .collect();

        for cid in dangling.iter().chain(doomed.iter()) {
            self.detach(*cid);
        }
        for sid in &promoted {
            if let Some(shape) = self.shapes.get_mut(sid) {
                shape.parent = None;
            }
        }
        log::debug!(
            "removed {id} ({kind:?}) with {} connectors, {} cascaded, {} promoted",
            dangling.len(),
            doomed.len() - 1,
            promoted.len()
        );

        for cid in dangling.iter().chain(doomed.iter()) {
            self.emit(DiagramEvent::Removed(*cid));
        }
        for sid in promoted {
            self.emit(DiagramEvent::Updated(sid));
        }
        self.prune_selection();
        Ok(())
    }

    /// Remove every listed entity that still exists; returns how many of the
    /// listed ids were removed directly.
    pub fn remove_entities(&mut self, ids: &[EntityId]) -> usize {
        ids.iter()
            .filter(|id| self.remove_entity(**id).is_ok())
            .count()
    }

    /// Remove all entities and clear the selection. Grid settings are kept.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.containers.clear();
        self.connectors.clear();
        self.z_order.clear();
        self.selection.clear();
        log::debug!("diagram {} cleared", self.id);
        self.emit(DiagramEvent::Cleared);
    }

    /// Drop an entity from the maps, z-order and its parent's child set.
    fn detach(&mut self, id: EntityId) {
        if let Some(shape) = self.shapes.remove(&id) {
            if let Some(container) = shape.parent.and_then(|p| self.containers.get_mut(&p)) {
                container.children.remove(&id);
            }
        }
        self.containers.remove(&id);
        self.connectors.remove(&id);
        self.z_order.retain(|z| *z != id);
    }

    fn prune_selection(&mut self) {
        let previous = self.selection.clone();
        let (shapes, containers, connectors) = (&self.shapes, &self.containers, &self.connectors);
        self.selection.retain(|id| {
            shapes.contains_key(id) || containers.contains_key(id) || connectors.contains_key(id)
        });
        if self.selection != previous {
            let current = self.selection.clone();
            self.emit(DiagramEvent::SelectionChanged { previous, current });
        }
    }

    // ─── Geometry mutations ──────────────────────────────────────────────

    /// Translate an entity by `delta`.
    ///
    /// Moving a shape re-evaluates its container membership. Moving a
    /// container carries its children along (they keep their membership)
    /// and shifts the waypoints of connectors running entirely between
    /// moved entities.
    pub fn move_entity(&mut self, id: EntityId, delta: Vec2) -> DiagramResult<()> {
        self.move_entities(&[id], delta)
    }

    /// Translate several entities by the same `delta` as one step.
    ///
    /// Every entity moves at most once, whatever the overlap between the
    /// listed ids and the children of listed containers. Membership of the
    /// shapes that moved on their own is re-evaluated after everything has
    /// been translated.
    pub fn move_entities(&mut self, ids: &[EntityId], delta: Vec2) -> DiagramResult<()> {
        if let Some(missing) = ids.iter().find(|id| !self.contains(**id)) {
            return Err(DiagramError::NotFound(*missing));
        }
        if !(delta.x.is_finite() && delta.y.is_finite()) {
            return Err(DiagramError::InvalidGeometry(format!("non-finite move delta {delta:?}")));
        }

        let set = self.move_set(ids);
        let moved: Vec<EntityId> = set.free.iter().chain(&set.carried).copied().collect();
        for id in &moved {
            if let Some(shape) = self.shapes.get_mut(id) {
                shape.position += delta;
            } else if let Some(container) = self.containers.get_mut(id) {
                container.position += delta;
            }
        }
        for id in &set.connectors {
            if let Some(connector) = self.connectors.get_mut(id) {
                connector.waypoints.iter_mut().for_each(|p| *p += delta);
            }
        }

        let mut updated = moved.clone();
        for id in &set.free {
            if let Some(changed) = self.reevaluate_membership(*id) {
                updated.extend(changed);
            }
        }
        updated.extend(self.connectors_touching(&moved));
        updated.extend(set.connectors);
        log::debug!("moved {} entities by ({}, {})", ids.len(), delta.x, delta.y);
        self.emit_updates(updated);
        Ok(())
    }

    /// Capture the geometry a [`Diagram::move_entities`] call on `ids` can change.
    pub fn capture_layout(&self, ids: &[EntityId]) -> LayoutSnapshot {
        let set = self.move_set(ids);
        let mut snapshot = LayoutSnapshot::default();
        let moved: Vec<EntityId> = set.free.iter().chain(&set.carried).copied().collect();
        for id in &moved {
            if let Some(shape) = self.shapes.get(id) {
                snapshot.shapes.push((*id, shape.position, shape.parent));
            } else if let Some(container) = self.containers.get(id) {
                snapshot.containers.push((*id, container.position));
            }
        }
        // Shapes can join a moving container mid-gesture, so keep every
        // connector that touches a moved entity.
        let mut linked = self.connectors_touching(&moved);
        linked.extend(set.connectors);
        for id in linked {
            if snapshot.connectors.iter().any(|(c, _)| *c == id) {
                continue;
            }
            if let Some(connector) = self.connectors.get(&id) {
                snapshot.connectors.push((id, connector.waypoints.clone()));
            }
        }
        snapshot
    }

    /// Put captured entities back exactly where they were, with their
    /// original parents. Entities removed since the capture are skipped.
    pub fn restore_layout(&mut self, snapshot: &LayoutSnapshot) {
        let mut updated = Vec::new();
        for (id, position) in &snapshot.containers {
            if let Some(container) = self.containers.get_mut(id) {
                container.position = *position;
                updated.push(*id);
            }
        }
        for (id, position, parent) in &snapshot.shapes {
            let Some(shape) = self.shapes.get_mut(id) else {
                continue;
            };
            shape.position = *position;
            let old = shape.parent;
            updated.push(*id);
            let parent = parent.filter(|p| self.containers.contains_key(p));
            if old != parent {
                self.set_parent(*id, parent);
                updated.extend(old.into_iter().chain(parent));
            }
        }
        let moved = updated.clone();
        for (id, waypoints) in &snapshot.connectors {
            if let Some(connector) = self.connectors.get_mut(id) {
                connector.waypoints.clone_from(waypoints);
                updated.push(*id);
            }
        }
        updated.extend(self.connectors_touching(&moved));
        log::debug!("restored layout of {} entities", moved.len());
        self.emit_updates(updated);
    }

    /// Split a group move into the entities it translates.
    fn move_set(&self, ids: &[EntityId]) -> MoveSet {
        let mut set = MoveSet::default();
        for id in ids {
            let Some(container) = self.containers.get(id) else {
                continue;
            };
            for member in std::iter::once(*id).chain(container.children.iter().copied()) {
                if !set.carried.contains(&member) {
                    set.carried.push(member);
                }
            }
        }
        for id in ids {
            if self.shapes.contains_key(id) && !set.carried.contains(id) && !set.free.contains(id) {
                set.free.push(*id);
            }
        }
        set.connectors = self
            .z_order
            .iter()
            .filter_map(|id| self.connectors.get(id))
            .filter(|c| {
                ids.contains(&c.id) || (set.carried.contains(&c.source) && set.carried.contains(&c.target))
            })
            .map(|c| c.id)
            .collect();
        set
    }

    /// Resize a shape or container.
    pub fn resize_entity(&mut self, id: EntityId, width: f64, height: f64) -> DiagramResult<()> {
        let kind = self.entity_kind(id).ok_or(DiagramError::NotFound(id))?;
        check_size(width, height)?;

        let mut updated = vec![id];
        match kind {
            EntityKind::Shape => {
                if let Some(shape) = self.shapes.get_mut(&id) {
                    shape.width = width;
                    shape.height = height;
                }
                if let Some(changed) = self.reevaluate_membership(id) {
                    updated.extend(changed);
                }
                updated.extend(self.connectors_touching(&[id]));
            }
            EntityKind::Container => {
                let Some(container) = self.containers.get_mut(&id) else {
                    return Err(DiagramError::NotFound(id));
                };
                container.width = width;
                container.height = height;
                let bounds = container.bounds();
                let children: Vec<EntityId> = container.children.iter().copied().collect();

                // Release children that no longer fit.
                let released: Vec<EntityId> = children
                    .into_iter()
                    .filter(|sid| {
                        self.shapes
                            .get(sid)
                            .is_some_and(|s| !rect_contains_rect(bounds, s.bounds()))
                    })
                    .collect();
                for sid in &released {
                    if let Some(changed) = self.reevaluate_membership(*sid) {
                        updated.extend(changed);
                    }
                }

                // Adopt root shapes that now fit.
                let adopted: Vec<EntityId> = self
                    .z_order
                    .iter()
                    .filter_map(|sid| self.shapes.get(sid))
                    .filter(|s| s.parent.is_none() && rect_contains_rect(bounds, s.bounds()))
                    .map(|s| s.id)
                    .collect();
                for sid in &adopted {
                    self.set_parent(*sid, Some(id));
                }
                updated.extend(adopted);
                updated.extend(self.connectors_touching(&[id]));
            }
            EntityKind::Connector => {
                return Err(DiagramError::InvalidGeometry(format!(
                    "connector {id} has no size"
                )));
            }
        }
        log::debug!("resized {id} to {width}x{height}");
        self.emit_updates(updated);
        Ok(())
    }

    /// Replace the style of a shape or container.
    pub fn set_style(&mut self, id: EntityId, style: ShapeStyle) -> DiagramResult<()> {
        if let Some(shape) = self.shapes.get_mut(&id) {
            shape.style = style;
        } else if let Some(container) = self.containers.get_mut(&id) {
            container.style = style;
        } else if self.connectors.contains_key(&id) {
            return Err(DiagramError::InvalidConnector(format!(
                "connector {id} has no fill or stroke style"
            )));
        } else {
            return Err(DiagramError::NotFound(id));
        }
        self.emit(DiagramEvent::Updated(id));
        Ok(())
    }

    /// Replace the waypoints of a connector.
    pub fn set_waypoints(&mut self, id: EntityId, waypoints: Vec<Point>) -> DiagramResult<()> {
        waypoints.iter().try_for_each(|p| check_point(*p))?;
        let connector = self.connectors.get_mut(&id).ok_or(DiagramError::NotFound(id))?;
        connector.waypoints = waypoints;
        self.emit(DiagramEvent::Updated(id));
        Ok(())
    }

    fn emit_updates(&mut self, ids: Vec<EntityId>) {
        let mut seen = BTreeSet::new();
        for id in ids {
            if seen.insert(id) {
                self.emit(DiagramEvent::Updated(id));
            }
        }
    }

    /// The smallest container fully containing `bounds` (ties: earliest created).
    fn find_parent(&self, bounds: Rect) -> Option<EntityId> {
        self.z_order
            .iter()
            .filter_map(|id| self.containers.get(id))
            .filter(|c| rect_contains_rect(c.bounds(), bounds))
            .fold(None::<&Container>, |best, c| match best {
                Some(b) if b.area() <= c.area() => Some(b),
                _ => Some(c),
            })
            .map(|c| c.id)
    }

    /// Recompute a shape's parent from its geometry. Returns the containers
    /// whose child sets changed, or `None` if membership is unchanged.
    fn reevaluate_membership(&mut self, shape_id: EntityId) -> Option<Vec<EntityId>> {
        let shape = self.shapes.get(&shape_id)?;
        let old = shape.parent;
        let new = self.find_parent(shape.bounds());
        if old == new {
            return None;
        }
        self.set_parent(shape_id, new);
        Some(old.into_iter().chain(new).collect())
    }

    /// Update both sides of the parent/child relation.
    fn set_parent(&mut self, shape_id: EntityId, parent: Option<EntityId>) {
        let Some(shape) = self.shapes.get_mut(&shape_id) else {
            return;
        };
        let old = std::mem::replace(&mut shape.parent, parent);
        if let Some(container) = old.and_then(|p| self.containers.get_mut(&p)) {
            container.children.remove(&shape_id);
        }
        if let Some(container) = parent.and_then(|p| self.containers.get_mut(&p)) {
            container.children.insert(shape_id);
        }
        log::debug!("shape {shape_id} parent {old:?} -> {parent:?}");
    }

    fn connectors_touching(&self, ids: &[EntityId]) -> Vec<EntityId> {
        self.z_order
            .iter()
            .filter_map(|id| self.connectors.get(id))
            .filter(|c| ids.iter().any(|id| c.touches(*id)))
            .map(|c| c.id)
            .collect()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Replace the selection. Unknown ids are silently dropped.
    pub fn set_selection(&mut self, ids: &[EntityId]) {
        let mut next: Vec<EntityId> = Vec::with_capacity(ids.len());
        for id in ids {
            if self.contains(*id) && !next.contains(id) {
                next.push(*id);
            }
        }
        self.apply_selection(next);
    }

    /// Add an entity to the selection (it becomes the primary selection).
    pub fn add_to_selection(&mut self, id: EntityId) {
        if !self.contains(id) {
            return;
        }
        let mut next = self.selection.clone();
        next.retain(|s| *s != id);
        next.push(id);
        self.apply_selection(next);
    }

    /// Add the entity if unselected, remove it otherwise.
    pub fn toggle_selection(&mut self, id: EntityId) {
        if self.is_selected(id) {
            let mut next = self.selection.clone();
            next.retain(|s| *s != id);
            self.apply_selection(next);
        } else {
            self.add_to_selection(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.apply_selection(Vec::new());
    }

    /// Select every entity in z-order.
    pub fn select_all(&mut self) {
        let all = self.z_order.clone();
        self.apply_selection(all);
    }

    fn apply_selection(&mut self, next: Vec<EntityId>) {
        if next == self.selection {
            return;
        }
        for id in &self.selection {
            if let Some(shape) = self.shapes.get_mut(id) {
                shape.selected = false;
            }
        }
        for id in &next {
            if let Some(shape) = self.shapes.get_mut(id) {
                shape.selected = true;
            }
        }
        let previous = std::mem::replace(&mut self.selection, next);
        let current = self.selection.clone();
        self.emit(DiagramEvent::SelectionChanged { previous, current });
    }

    pub fn is_selected(&self, id: EntityId) -> bool {
        self.selection.contains(&id)
    }

    /// Snapshot of the selection, primary last.
    pub fn get_selection(&self) -> Vec<EntityId> {
        self.selection.clone()
    }

    /// The most recently selected entity.
    pub fn primary_selection(&self) -> Option<EntityId> {
        self.selection.last().copied()
    }

    // ─── Grid ────────────────────────────────────────────────────────────

    /// Flip grid visibility; returns the new value.
    pub fn toggle_grid(&mut self) -> bool {
        let visible = !self.settings.grid.visible;
        self.set_grid_visible(visible);
        visible
    }

    /// Flip snapping; returns the new value.
    pub fn toggle_snap(&mut self) -> bool {
        let enabled = !self.settings.grid.snap_enabled;
        self.set_snap_enabled(enabled);
        enabled
    }

    pub fn set_grid_visible(&mut self, visible: bool) {
        if self.settings.grid.visible != visible {
            self.settings.grid.visible = visible;
            self.emit(DiagramEvent::GridChanged(self.settings.grid));
        }
    }

    pub fn set_snap_enabled(&mut self, enabled: bool) {
        if self.settings.grid.snap_enabled != enabled {
            self.settings.grid.snap_enabled = enabled;
            self.emit(DiagramEvent::GridChanged(self.settings.grid));
        }
    }

    pub fn set_cell_size(&mut self, cell_size: f64) -> DiagramResult<()> {
        check_cell_size(cell_size)?;
        if self.settings.grid.cell_size != cell_size {
            self.settings.grid.cell_size = cell_size;
            self.emit(DiagramEvent::GridChanged(self.settings.grid));
        }
        Ok(())
    }

    /// Snap a point with the diagram's grid settings.
    pub fn snap(&self, point: Point) -> Point {
        self.settings.grid.snap(point)
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn contains(&self, id: EntityId) -> bool {
        self.entity_kind(id).is_some()
    }

    pub fn entity_kind(&self, id: EntityId) -> Option<EntityKind> {
        if self.shapes.contains_key(&id) {
            Some(EntityKind::Shape)
        } else if self.containers.contains_key(&id) {
            Some(EntityKind::Container)
        } else if self.connectors.contains_key(&id) {
            Some(EntityKind::Connector)
        } else {
            None
        }
    }

    pub fn shape(&self, id: EntityId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    pub fn container(&self, id: EntityId) -> Option<&Container> {
        self.containers.get(&id)
    }

    pub fn connector(&self, id: EntityId) -> Option<&Connector> {
        self.connectors.get(&id)
    }

    pub fn get_shape(&self, id: EntityId) -> Option<Shape> {
        self.shapes.get(&id).cloned()
    }

    pub fn get_container(&self, id: EntityId) -> Option<Container> {
        self.containers.get(&id).cloned()
    }

    pub fn get_connector(&self, id: EntityId) -> Option<Connector> {
        self.connectors.get(&id).cloned()
    }

    /// Snapshot of all shapes in z-order.
    pub fn get_shapes(&self) -> Vec<Shape> {
        self.z_order
            .iter()
            .filter_map(|id| self.shapes.get(id))
            .cloned()
            .collect()
    }

    /// Snapshot of all containers in z-order.
    pub fn get_containers(&self) -> Vec<Container> {
        self.z_order
            .iter()
            .filter_map(|id| self.containers.get(id))
            .cloned()
            .collect()
    }

    /// Snapshot of all connectors in z-order.
    pub fn get_connectors(&self) -> Vec<Connector> {
        self.z_order
            .iter()
            .filter_map(|id| self.connectors.get(id))
            .cloned()
            .collect()
    }

    /// All entity ids, back to front.
    pub fn entity_ids(&self) -> &[EntityId] {
        &self.z_order
    }

    /// Position of an entity in the z-order.
    pub fn z_index(&self, id: EntityId) -> Option<usize> {
        self.z_order.iter().position(|z| *z == id)
    }

    pub fn len(&self) -> usize {
        self.z_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z_order.is_empty()
    }

    /// Anchor point of a shape or container (its center).
    pub fn anchor(&self, id: EntityId) -> Option<Point> {
        self.shapes
            .get(&id)
            .map(Shape::center)
            .or_else(|| self.containers.get(&id).map(|c| c.bounds().center()))
    }

    /// Start and end anchors of a connector.
    pub fn connector_endpoints(&self, id: EntityId) -> Option<(Point, Point)> {
        let connector = self.connectors.get(&id)?;
        Some((self.anchor(connector.source)?, self.anchor(connector.target)?))
    }

    /// Top-left corner of a shape or container, or the first waypoint of a
    /// connector (its source anchor when it has none).
    pub fn entity_origin(&self, id: EntityId) -> Option<Point> {
        if let Some(shape) = self.shapes.get(&id) {
            return Some(shape.position);
        }
        if let Some(container) = self.containers.get(&id) {
            return Some(container.position);
        }
        let connector = self.connectors.get(&id)?;
        connector
            .waypoints
            .first()
            .copied()
            .or_else(|| self.anchor(connector.source))
    }

    pub fn entity_bounds(&self, id: EntityId) -> Option<Rect> {
        if let Some(shape) = self.shapes.get(&id) {
            return Some(shape.bounds());
        }
        if let Some(container) = self.containers.get(&id) {
            return Some(container.bounds());
        }
        let (from, to) = self.connector_endpoints(id)?;
        self.connectors.get(&id).map(|c| c.bounds(from, to))
    }

    /// Bounding box of every entity.
    pub fn bounds(&self) -> Option<Rect> {
        self.z_order
            .iter()
            .filter_map(|id| self.entity_bounds(*id))
            .reduce(|a, b| a.union(b))
    }

    /// The topmost entity under a point: connectors first, then shapes, then
    /// containers, each front to back.
    pub fn entity_at(&self, point: Point, tolerance: f64) -> Option<EntityId> {
        let front_to_back = || self.z_order.iter().rev().copied();
        front_to_back()
            .find(|id| {
                self.connectors.get(id).is_some_and(|c| {
                    self.connector_endpoints(c.id)
                        .is_some_and(|(from, to)| c.hit_test(from, to, point, tolerance))
                })
            })
            .or_else(|| {
                front_to_back().find(|id| {
                    self.shapes
                        .get(id)
                        .is_some_and(|s| s.hit_test(point, tolerance))
                })
            })
            .or_else(|| {
                front_to_back().find(|id| {
                    self.containers
                        .get(id)
                        .is_some_and(|c| is_point_in_rect(point, c.bounds().inflate(tolerance, tolerance)))
                })
            })
    }

    /// Verify the model's structural invariants.
    ///
    /// Checks bidirectional container membership, connector endpoints,
    /// selection references and the shape `selected` flags.
    pub fn check_invariants(&self) -> Result<(), String> {
        for container in self.containers.values() {
            for child in &container.children {
                match self.shapes.get(child) {
                    Some(shape) if shape.parent == Some(container.id) => {}
                    Some(shape) => {
                        return Err(format!(
                            "container {} lists {child} whose parent is {:?}",
                            container.id, shape.parent
                        ));
                    }
                    None => return Err(format!("container {} lists missing shape {child}", container.id)),
                }
            }
        }
        for shape in self.shapes.values() {
            if let Some(parent) = shape.parent {
                let listed = self
                    .containers
                    .get(&parent)
                    .is_some_and(|c| c.children.contains(&shape.id));
                if !listed {
                    return Err(format!("shape {} claims unlisted parent {parent}", shape.id));
                }
            }
            if shape.selected != self.selection.contains(&shape.id) {
                return Err(format!("shape {} selected flag out of sync", shape.id));
            }
        }
        for connector in self.connectors.values() {
            for end in [connector.source, connector.target] {
                if !(self.shapes.contains_key(&end) || self.containers.contains_key(&end)) {
                    return Err(format!("connector {} references missing {end}", connector.id));
                }
            }
        }
        if let Some(missing) = self.selection.iter().find(|id| !self.contains(**id)) {
            return Err(format!("selection references missing {missing}"));
        }
        let total = self.shapes.len() + self.containers.len() + self.connectors.len();
        if total != self.z_order.len() {
            return Err(format!("z-order has {} ids for {total} entities", self.z_order.len()));
        }
        Ok(())
    }
}

fn check_point(point: Point) -> DiagramResult<()> {
    if point.x.is_finite() && point.y.is_finite() {
        Ok(())
    } else {
        Err(DiagramError::InvalidGeometry(format!("non-finite position {point:?}")))
    }
}
