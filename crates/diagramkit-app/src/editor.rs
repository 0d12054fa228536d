//! The editor façade: the single entry point a host UI talks to.
//!
//! Commands translate user-facing names (shape kinds, colors, language
//! keys) into model operations, then flush the resulting diagram events to
//! the canvas. Queries return snapshots.

use crate::config::EditorConfig;
use crate::i18n::{I18nError, Translator};
use crate::shortcuts::{Command, ShortcutRegistry};
use diagramkit_core::diagram::Diagram;
use diagramkit_core::error::{DiagramError, DiagramResult};
use diagramkit_core::geometry::GridSettings;
use diagramkit_core::id::EntityId;
use diagramkit_core::input::{Key, PointerEvent};
use diagramkit_core::modes::{InteractionController, Mode, Outcome};
use diagramkit_core::shapes::{Connector, Container, SerializableColor, Shape, ShapeKind, ShapeStyle};
use diagramkit_render::{CanvasSync, RenderSurface};
use thiserror::Error;

/// Errors reported to the user.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Diagram(#[from] DiagramError),
    #[error("Unknown shape kind: {0}")]
    UnknownShapeKind(String),
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error(transparent)]
    Language(#[from] I18nError),
}

pub type EditorResult<T> = Result<T, EditorError>;

/// Stale ids are expected when the host acts on an out-of-date view, so a
/// missing entity is logged and treated as a no-op.
fn tolerate_missing<T>(result: DiagramResult<T>, fallback: T) -> EditorResult<T> {
    match result {
        Err(DiagramError::NotFound(id)) => {
            log::warn!("ignoring operation on missing entity {id}");
            Ok(fallback)
        }
        other => Ok(other?),
    }
}

/// Diagram editor bound to a render surface and a translator.
pub struct Editor<S: RenderSurface, T: Translator> {
    config: EditorConfig,
    diagram: Diagram,
    controller: InteractionController,
    sync: CanvasSync<S>,
    translator: T,
}

impl<S: RenderSurface, T: Translator> Editor<S, T> {
    /// Build an editor with an empty diagram and mirror it onto `sync`.
    pub fn new(config: EditorConfig, mut sync: CanvasSync<S>, mut translator: T) -> EditorResult<Self> {
        let grid = config.diagram.grid;
        GridSettings::new(grid.visible, grid.snap_enabled, grid.cell_size)?;
        translator.use_language(&config.language)?;

        let diagram = Diagram::with_id_source(config.diagram, config.ids.source());
        sync.resync(&diagram);
        log::info!("editor '{}' ready (language {})", config.title, translator.language());
        Ok(Self {
            config,
            diagram,
            controller: InteractionController::new(),
            sync,
            translator,
        })
    }

    /// Push pending model changes and the connector preview to the canvas.
    fn flush(&mut self) {
        self.sync.flush(&mut self.diagram);
        let preview = self.controller.preview_path().map(<[_]>::to_vec);
        self.sync.sync_preview(preview.as_deref());
    }

    fn parse_fill(fill: &str) -> EditorResult<SerializableColor> {
        SerializableColor::parse(fill).ok_or_else(|| EditorError::InvalidColor(fill.to_string()))
    }

    // ─── Commands ────────────────────────────────────────────────────────

    /// Create a shape by kind name ("rect", "ellipse", "line") and fill color.
    ///
    /// The new shape is placed at the next cascade position and selected.
    /// A gesture in progress is cancelled first.
    pub fn new_shape(&mut self, kind_name: &str, fill: &str) -> EditorResult<EntityId> {
        let kind: ShapeKind = kind_name.parse().map_err(EditorError::UnknownShapeKind)?;
        let style = ShapeStyle::filled(Self::parse_fill(fill)?);
        self.controller.cancel(&mut self.diagram)?;
        let placement = self.config.placement;
        let position = self
            .diagram
            .snap(placement.position(self.diagram.get_shapes().len()));

        let shape = self.diagram.add_shape(
            kind,
            position,
            placement.shape_width,
            placement.shape_height,
            style,
        )?;
        self.diagram.set_selection(&[shape.id()]);
        log::info!("new {kind} {} at ({}, {})", shape.id(), position.x, position.y);
        self.flush();
        Ok(shape.id())
    }

    /// Create a named container with a fill color.
    pub fn new_container(&mut self, name: &str, fill: &str) -> EditorResult<EntityId> {
        let style = ShapeStyle::filled(Self::parse_fill(fill)?);
        self.controller.cancel(&mut self.diagram)?;
        let placement = self.config.placement;
        let position = self
            .diagram
            .snap(placement.position(self.diagram.get_containers().len()));

        let container = self.diagram.add_container(
            name,
            position,
            placement.container_width,
            placement.container_height,
            style,
        )?;
        self.diagram.set_selection(&[container.id()]);
        log::info!("new container {} '{name}'", container.id());
        self.flush();
        Ok(container.id())
    }

    /// Discard the current diagram.
    pub fn file_new(&mut self) -> EditorResult<()> {
        self.controller.cancel(&mut self.diagram)?;
        self.diagram.clear();
        log::info!("new diagram");
        self.flush();
        Ok(())
    }

    /// Delete the selected entities. Returns how many were removed.
    pub fn edit_delete(&mut self) -> EditorResult<usize> {
        self.controller.cancel(&mut self.diagram)?;
        let selection = self.diagram.get_selection();
        let removed = self.diagram.remove_entities(&selection);
        log::info!("deleted {removed} entities");
        self.flush();
        Ok(removed)
    }

    /// Toggle grid visibility; returns the new state.
    pub fn toggle_grid(&mut self) -> bool {
        let visible = self.diagram.toggle_grid();
        self.flush();
        visible
    }

    /// Toggle snap-to-grid; returns the new state.
    pub fn toggle_snap(&mut self) -> bool {
        let enabled = self.diagram.toggle_snap();
        self.flush();
        enabled
    }

    pub fn set_pointer_mode(&mut self) -> EditorResult<()> {
        self.set_mode(Mode::Pointer)
    }

    pub fn set_connector_mode(&mut self) -> EditorResult<()> {
        self.set_mode(Mode::Connector)
    }

    fn set_mode(&mut self, mode: Mode) -> EditorResult<()> {
        let result = self.controller.set_mode(&mut self.diagram, mode);
        self.flush();
        tolerate_missing(result, ())
    }

    /// Switch the UI language.
    pub fn switch_language(&mut self, language: &str) -> EditorResult<()> {
        self.translator.use_language(language)?;
        Ok(())
    }

    /// Replace the diagram with the start-up scene: two rectangles, the
    /// second one selected.
    pub fn load_sample(&mut self) -> EditorResult<()> {
        self.file_new()?;
        let style = ShapeStyle::default();
        let mut last = None;
        for origin in [(100.0, 100.0), (200.0, 200.0)] {
            let shape = self
                .diagram
                .add_shape(ShapeKind::Rectangle, origin.into(), 100.0, 100.0, style.clone())?;
            last = Some(shape.id());
        }
        if let Some(id) = last {
            self.diagram.set_selection(&[id]);
        }
        self.flush();
        Ok(())
    }

    /// Route a pointer event through the interaction controller.
    pub fn pointer(&mut self, event: &PointerEvent) -> EditorResult<Outcome> {
        let result = self.controller.handle_pointer_at(&mut self.diagram, event);
        self.flush();
        tolerate_missing(result, Outcome::Ignored)
    }

    /// Handle a key press: shortcuts first, then the interaction controller.
    pub fn key(&mut self, key: Key) -> EditorResult<()> {
        let key = match key {
            Key::Char(c) => Key::Char(c.to_ascii_uppercase()),
            other => other,
        };
        match ShortcutRegistry::lookup(key) {
            Some(command) if !self.controller.is_active() => self.execute(command),
            _ => {
                let result = self.controller.handle_key(&mut self.diagram, key);
                self.flush();
                tolerate_missing(result, Outcome::Ignored).map(|_| ())
            }
        }
    }

    /// Run a shortcut command.
    pub fn execute(&mut self, command: Command) -> EditorResult<()> {
        log::debug!("command {command:?}");
        match command {
            Command::PointerMode => self.set_pointer_mode(),
            Command::ConnectorMode => self.set_connector_mode(),
            Command::ToggleGrid => {
                self.toggle_grid();
                Ok(())
            }
            Command::ToggleSnap => {
                self.toggle_snap();
                Ok(())
            }
            Command::NewRectangle => self.new_shape(ShapeKind::Rectangle.name(), "white").map(|_| ()),
            Command::SelectAll => {
                self.controller.cancel(&mut self.diagram)?;
                self.diagram.select_all();
                self.flush();
                Ok(())
            }
            Command::DeleteSelection => {
                let result = self.controller.handle_key(&mut self.diagram, Key::Delete);
                self.flush();
                tolerate_missing(result, Outcome::Ignored).map(|_| ())
            }
            Command::Cancel => {
                let result = self.controller.cancel(&mut self.diagram);
                self.flush();
                tolerate_missing(result, Outcome::Ignored).map(|_| ())
            }
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn shapes(&self) -> Vec<Shape> {
        self.diagram.get_shapes()
    }

    pub fn containers(&self) -> Vec<Container> {
        self.diagram.get_containers()
    }

    pub fn connectors(&self) -> Vec<Connector> {
        self.diagram.get_connectors()
    }

    pub fn selection(&self) -> Vec<EntityId> {
        self.diagram.get_selection()
    }

    pub fn mode(&self) -> Mode {
        self.controller.mode()
    }

    pub fn grid(&self) -> GridSettings {
        *self.diagram.grid()
    }

    pub fn language(&self) -> &str {
        self.translator.language()
    }

    /// Translated UI label.
    pub fn tr(&self, key: &str) -> String {
        self.translator.translate(key)
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn canvas(&self) -> &CanvasSync<S> {
        &self.sync
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Catalog;
    use diagramkit_core::input::{Modifiers, MouseButton};
    use diagramkit_render::{FactoryRegistry, RecordingSurface};
    use kurbo::Point;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn editor() -> Editor<RecordingSurface, Catalog> {
        editor_with(EditorConfig::default())
    }

    fn editor_with(config: EditorConfig) -> Editor<RecordingSurface, Catalog> {
        let sync = CanvasSync::attach(RecordingSurface::new(), FactoryRegistry::with_builtins());
        Editor::new(config, sync, Catalog::builtin()).unwrap()
    }

    fn assert_mirrored(editor: &Editor<RecordingSurface, Catalog>) {
        let model: BTreeSet<EntityId> = editor.diagram().entity_ids().iter().copied().collect();
        assert_eq!(editor.canvas().live_ids(), model);
    }

    #[test]
    fn test_new_editor_shows_grid() {
        let e = editor();
        assert!(e.canvas().surface().grid().is_some());
        assert_eq!(e.mode(), Mode::Pointer);
        assert_eq!(e.language(), "en");
    }

    #[test]
    fn test_invalid_language_rejected() {
        let config = EditorConfig {
            language: "xx".to_string(),
            ..EditorConfig::default()
        };
        let sync = CanvasSync::attach(RecordingSurface::new(), FactoryRegistry::with_builtins());
        assert!(matches!(
            Editor::new(config, sync, Catalog::builtin()),
            Err(EditorError::Language(_))
        ));
    }

    #[test]
    fn test_new_shape_cascades() {
        let mut e = editor();
        let a = e.new_shape("rect", "red").unwrap();
        let b = e.new_shape("ellipse", "#00ff00").unwrap();
        let shapes = e.shapes();
        assert_eq!(shapes[0].position, Point::new(100.0, 100.0));
        assert_eq!(shapes[1].position, Point::new(120.0, 120.0));
        assert_eq!(shapes[1].kind, ShapeKind::Ellipse);
        assert_eq!(shapes[0].style.fill, Some(SerializableColor::new(255, 0, 0, 255)));
        assert_eq!(e.selection(), vec![b]);
        assert!(e.diagram().contains(a));
        assert_mirrored(&e);
    }

    #[test]
    fn test_new_shape_rejects_bad_input() {
        let mut e = editor();
        assert!(matches!(e.new_shape("hexagon", "red"), Err(EditorError::UnknownShapeKind(_))));
        assert!(matches!(e.new_shape("rect", "not-a-color"), Err(EditorError::InvalidColor(_))));
        assert!(e.shapes().is_empty());
    }

    #[test]
    fn test_new_shape_inside_container_joins_it() {
        let mut e = editor();
        let c = e.new_container("Group", "#eeeeee").unwrap();
        assert_eq!(e.containers().len(), 1);
        assert_eq!(e.containers()[0].name, "Group");
        let s = e.new_shape("rect", "white").unwrap();
        // First shape lands at the origin, inside the container.
        assert_eq!(e.diagram().shape(s).and_then(|s| s.parent()), Some(c));
    }

    #[test]
    fn test_toggle_grid_and_snap() {
        let mut e = editor();
        assert!(!e.toggle_grid());
        assert!(e.canvas().surface().grid().is_none());
        assert!(e.toggle_grid());
        assert!(e.toggle_snap());
        assert!(e.grid().snap_enabled);
    }

    #[test]
    fn test_load_sample() {
        let mut e = editor();
        e.new_shape("ellipse", "blue").unwrap();
        e.load_sample().unwrap();
        let shapes = e.shapes();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].position, Point::new(100.0, 100.0));
        assert_eq!(shapes[1].position, Point::new(200.0, 200.0));
        assert_eq!(e.selection(), vec![shapes[1].id()]);
        assert_eq!(e.canvas().surface().active(), e.canvas().handle_of(shapes[1].id()));
        assert_mirrored(&e);
    }

    #[test]
    fn test_connect_two_shapes_through_facade() {
        let mut e = editor();
        e.load_sample().unwrap();
        let ids: Vec<EntityId> = e.shapes().iter().map(Shape::id).collect();

        e.set_connector_mode().unwrap();
        e.pointer(&PointerEvent::down(150.0, 150.0)).unwrap();
        e.pointer(&PointerEvent::moved(200.0, 180.0)).unwrap();
        assert!(e.canvas().surface().preview().is_some());
        let out = e.pointer(&PointerEvent::up(260.0, 260.0)).unwrap();

        assert!(matches!(out, Outcome::ConnectorCreated(_)));
        let connectors = e.connectors();
        assert_eq!(connectors.len(), 1);
        assert_eq!((connectors[0].source(), connectors[0].target()), (ids[0], ids[1]));
        assert!(e.canvas().surface().preview().is_none());
        assert_mirrored(&e);
    }

    #[test]
    fn test_escape_cancels_connector() {
        let mut e = editor();
        e.load_sample().unwrap();
        e.key(Key::Char('c')).unwrap();
        assert_eq!(e.mode(), Mode::Connector);
        e.pointer(&PointerEvent::down(150.0, 150.0)).unwrap();
        e.pointer(&PointerEvent::moved(170.0, 150.0)).unwrap();
        e.key(Key::Escape).unwrap();
        assert!(e.connectors().is_empty());
        assert!(e.canvas().surface().preview().is_none());
    }

    #[test]
    fn test_drag_then_delete() {
        let mut e = editor();
        e.load_sample().unwrap();
        let first = e.shapes()[0].id();

        e.pointer(&PointerEvent::Down {
            position: Point::new(110.0, 110.0),
            button: MouseButton::Left,
            modifiers: Modifiers::default(),
        })
        .unwrap();
        e.pointer(&PointerEvent::moved(120.0, 130.0)).unwrap();
        e.pointer(&PointerEvent::up(120.0, 130.0)).unwrap();
        assert_eq!(e.diagram().shape(first).unwrap().position, Point::new(110.0, 120.0));

        assert_eq!(e.edit_delete().unwrap(), 1);
        assert_eq!(e.shapes().len(), 1);
        assert_mirrored(&e);
    }

    #[test]
    fn test_new_shape_mid_drag_cancels_drag() {
        let mut e = editor();
        e.load_sample().unwrap();
        let first = e.shapes()[0].id();

        e.pointer(&PointerEvent::down(110.0, 110.0)).unwrap();
        e.pointer(&PointerEvent::moved(150.0, 110.0)).unwrap();
        assert_eq!(e.diagram().shape(first).unwrap().position, Point::new(140.0, 100.0));

        let id = e.new_shape("ellipse", "red").unwrap();
        assert!(!e.controller.is_active());
        assert_eq!(e.diagram().shape(first).unwrap().position, Point::new(100.0, 100.0));
        assert_eq!(e.selection(), vec![id]);

        // The stale drag no longer reacts to pointer motion.
        assert_eq!(e.pointer(&PointerEvent::moved(300.0, 300.0)).unwrap(), Outcome::Ignored);
        assert_eq!(e.diagram().shape(id).unwrap().position, Point::new(140.0, 140.0));
        e.diagram().check_invariants().unwrap();
        assert_mirrored(&e);
    }

    #[test]
    fn test_new_container_mid_drag_cancels_drag() {
        let mut e = editor();
        e.load_sample().unwrap();
        let second = e.shapes()[1].id();

        e.pointer(&PointerEvent::down(210.0, 210.0)).unwrap();
        e.pointer(&PointerEvent::moved(230.0, 210.0)).unwrap();
        e.new_container("group", "blue").unwrap();
        assert!(!e.controller.is_active());
        assert_eq!(e.diagram().shape(second).unwrap().position, Point::new(200.0, 200.0));
        e.diagram().check_invariants().unwrap();
    }

    #[test]
    fn test_file_new_clears_canvas() {
        let mut e = editor();
        e.load_sample().unwrap();
        e.file_new().unwrap();
        assert!(e.shapes().is_empty());
        assert!(e.canvas().surface().is_empty());
    }

    #[test]
    fn test_switch_language() {
        let mut e = editor();
        assert_eq!(e.tr("MODE_CONNECTOR"), "Connector");
        e.switch_language("fr").unwrap();
        assert_eq!(e.language(), "fr");
        assert_eq!(e.tr("MODE_CONNECTOR"), "Connecteur");
        assert!(e.switch_language("xx").is_err());
        assert_eq!(e.language(), "fr");
    }

    #[test]
    fn test_shortcuts() {
        let mut e = editor();
        e.key(Key::Char('n')).unwrap();
        assert_eq!(e.shapes().len(), 1);
        e.key(Key::Char('g')).unwrap();
        assert!(!e.grid().visible);
        e.key(Key::Delete).unwrap();
        assert!(e.shapes().is_empty());
    }

    #[test]
    fn test_render_faults_do_not_reach_facade() {
        let mut e = editor();
        e.sync.surface_mut().fail_next_create(1);
        let id = e.new_shape("rect", "white").unwrap();
        assert_eq!(e.canvas().handle_of(id), None);
        e.diagram.move_entity(id, kurbo::Vec2::new(20.0, 0.0)).unwrap();
        e.flush();
        assert!(e.canvas().handle_of(id).is_some());
    }
}
