//! Interaction modes and the gesture state machine that turns pointer and
//! keyboard input into diagram mutations.

use crate::diagram::{Diagram, LayoutSnapshot};
use crate::error::{DiagramError, DiagramResult};
use crate::id::EntityId;
use crate::input::{Key, Modifiers, MouseButton, PointerEvent};
use crate::shapes::EntityKind;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Hit tolerance in canvas units for model-side hit-testing.
pub const HIT_TOLERANCE: f64 = 4.0;

/// Available interaction modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Select and drag entities.
    #[default]
    Pointer,
    /// Draw connectors between entities.
    Connector,
}

/// State of the gesture in progress.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    /// Waiting for a pointer-down.
    #[default]
    Idle,
    /// Dragging the selection in pointer mode.
    Dragging {
        /// Entity under the pointer when the drag started.
        anchor: EntityId,
        /// Pointer position at pointer-down.
        pointer_start: Point,
        /// Origin of the anchor entity at pointer-down.
        anchor_start: Point,
        /// Entities translated by the drag.
        movers: Vec<EntityId>,
        /// Total translation committed so far.
        applied: Vec2,
        /// Layout at pointer-down, restored on cancel.
        origin: LayoutSnapshot,
        /// Whether any step has been applied.
        moved: bool,
    },
    /// Drawing a connector in connector mode.
    Connecting {
        source: EntityId,
        /// Transient path: source anchor followed by the snapped move samples.
        preview: Vec<Point>,
    },
}

/// What a single input event did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The event had no meaning in the current state.
    Ignored,
    Selected(EntityId),
    SelectionCleared,
    /// The selection was translated by this step.
    Moved(Vec2),
    DragEnded,
    ConnectorStarted(EntityId),
    PreviewUpdated,
    ConnectorCreated(EntityId),
    /// The active gesture was abandoned and its effects reverted.
    Cancelled,
    /// This many selected entities were deleted.
    Deleted(usize),
}

/// Interprets input according to the current mode.
///
/// Only [`InteractionController::set_mode`] changes the mode; input events
/// never do.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    mode: Mode,
    gesture: Gesture,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Check if a gesture is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    /// Path of the pending connector, if one is being drawn.
    pub fn preview_path(&self) -> Option<&[Point]> {
        match &self.gesture {
            Gesture::Connecting { preview, .. } => Some(preview),
            _ => None,
        }
    }

    /// Switch modes, cancelling any gesture in progress.
    pub fn set_mode(&mut self, diagram: &mut Diagram, mode: Mode) -> DiagramResult<()> {
        if self.mode == mode {
            return Ok(());
        }
        self.cancel(diagram)?;
        log::info!("interaction mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        Ok(())
    }

    /// Handle a pointer event, hit-testing against the model.
    pub fn handle_pointer_at(&mut self, diagram: &mut Diagram, event: &PointerEvent) -> DiagramResult<Outcome> {
        let target = event
            .position()
            .and_then(|p| diagram.entity_at(p, HIT_TOLERANCE));
        self.handle_pointer(diagram, event, target)
    }

    /// Handle a pointer event whose hit target was already resolved.
    pub fn handle_pointer(
        &mut self,
        diagram: &mut Diagram,
        event: &PointerEvent,
        target: Option<EntityId>,
    ) -> DiagramResult<Outcome> {
        match *event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => {
                if button != MouseButton::Left {
                    return Ok(Outcome::Ignored);
                }
                if self.is_active() {
                    // A missed pointer-up must not leave a stale gesture.
                    self.cancel(diagram)?;
                }
                match self.mode {
                    Mode::Pointer => self.pointer_down(diagram, position, modifiers, target),
                    Mode::Connector => Ok(self.connector_down(diagram, position, target)),
                }
            }
            PointerEvent::Move { position } => self.pointer_move(diagram, position),
            PointerEvent::Up { button, .. } => {
                if button != MouseButton::Left {
                    return Ok(Outcome::Ignored);
                }
                self.pointer_up(diagram, target)
            }
            PointerEvent::Leave => self.cancel(diagram),
        }
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, diagram: &mut Diagram, key: Key) -> DiagramResult<Outcome> {
        match key {
            Key::Escape => self.cancel(diagram),
            Key::Delete | Key::Backspace if self.mode == Mode::Pointer && !self.is_active() => {
                let selection = diagram.get_selection();
                if selection.is_empty() {
                    return Ok(Outcome::Ignored);
                }
                let removed = diagram.remove_entities(&selection);
                log::debug!("deleted {removed} selected entities");
                Ok(Outcome::Deleted(removed))
            }
            _ => Ok(Outcome::Ignored),
        }
    }

    /// Abandon the active gesture, reverting any drag translation.
    ///
    /// Cancelling while idle is a no-op.
    pub fn cancel(&mut self, diagram: &mut Diagram) -> DiagramResult<Outcome> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => Ok(Outcome::Ignored),
            Gesture::Dragging { applied, origin, moved, .. } => {
                if moved {
                    diagram.restore_layout(&origin);
                }
                log::debug!("drag cancelled, reverted ({}, {})", applied.x, applied.y);
                Ok(Outcome::Cancelled)
            }
            Gesture::Connecting { source, .. } => {
                log::debug!("connector from {source} cancelled");
                Ok(Outcome::Cancelled)
            }
        }
    }

    fn pointer_down(
        &mut self,
        diagram: &mut Diagram,
        position: Point,
        modifiers: Modifiers,
        target: Option<EntityId>,
    ) -> DiagramResult<Outcome> {
        let Some(id) = target.filter(|id| diagram.contains(*id)) else {
            diagram.clear_selection();
            return Ok(Outcome::SelectionCleared);
        };

        if modifiers.extends_selection() {
            diagram.toggle_selection(id);
        } else if !diagram.is_selected(id) {
            diagram.set_selection(&[id]);
        }

        if diagram.is_selected(id) {
            let anchor_start = diagram.entity_origin(id).ok_or(DiagramError::NotFound(id))?;
            let movers = diagram.get_selection();
            self.gesture = Gesture::Dragging {
                anchor: id,
                pointer_start: position,
                anchor_start,
                origin: diagram.capture_layout(&movers),
                movers,
                applied: Vec2::ZERO,
                moved: false,
            };
        }
        Ok(Outcome::Selected(id))
    }

    fn connector_down(&mut self, diagram: &Diagram, position: Point, target: Option<EntityId>) -> Outcome {
        let source = target.filter(|id| {
            matches!(
                diagram.entity_kind(*id),
                Some(EntityKind::Shape | EntityKind::Container)
            )
        });
        let Some(source) = source else {
            return Outcome::Ignored;
        };
        let start = diagram.anchor(source).unwrap_or(position);
        log::debug!("connector gesture started on {source}");
        self.gesture = Gesture::Connecting {
            source,
            preview: vec![start, diagram.snap(position)],
        };
        Outcome::ConnectorStarted(source)
    }

    fn pointer_move(&mut self, diagram: &mut Diagram, position: Point) -> DiagramResult<Outcome> {
        match &mut self.gesture {
            Gesture::Idle => Ok(Outcome::Ignored),
            Gesture::Connecting { preview, .. } => {
                preview.push(diagram.snap(position));
                Ok(Outcome::PreviewUpdated)
            }
            Gesture::Dragging {
                pointer_start,
                anchor_start,
                movers,
                applied,
                moved,
                ..
            } => {
                let target = diagram.snap(*anchor_start + (position - *pointer_start));
                let total = target - *anchor_start;
                let step = total - *applied;
                if step == Vec2::ZERO {
                    return Ok(Outcome::Ignored);
                }
                movers.retain(|id| diagram.contains(*id));
                diagram.move_entities(movers, step)?;
                *applied = total;
                *moved = true;
                Ok(Outcome::Moved(step))
            }
        }
    }

    fn pointer_up(&mut self, diagram: &mut Diagram, target: Option<EntityId>) -> DiagramResult<Outcome> {
        match &self.gesture {
            Gesture::Idle => Ok(Outcome::Ignored),
            Gesture::Dragging { .. } => {
                self.gesture = Gesture::Idle;
                Ok(Outcome::DragEnded)
            }
            Gesture::Connecting { source, .. } => {
                let source = *source;
                let valid_target = target.filter(|t| {
                    *t != source
                        && matches!(
                            diagram.entity_kind(*t),
                            Some(EntityKind::Shape | EntityKind::Container)
                        )
                });
                match valid_target {
                    Some(t) => {
                        self.gesture = Gesture::Idle;
                        let id = self.commit_connector(diagram, source, t)?;
                        Ok(Outcome::ConnectorCreated(id))
                    }
                    None => self.cancel(diagram),
                }
            }
        }
    }

    fn commit_connector(
        &self,
        diagram: &mut Diagram,
        source: EntityId,
        target: EntityId,
    ) -> DiagramResult<EntityId> {
        if self.mode != Mode::Connector {
            log::error!("connector commit attempted in {:?} mode", self.mode);
            return Err(DiagramError::InvalidTransition(format!(
                "cannot commit a connector in {:?} mode",
                self.mode
            )));
        }
        let connector = diagram.add_connector(source, target, Vec::new())?;
        log::debug!("connector {} committed: {source} -> {target}", connector.id());
        Ok(connector.id())
    }
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use crate::shapes::{Connector, Container, Shape, ShapeKind, ShapeStyle};
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Item {
        Shape(f64, f64, f64, f64),
        Container(f64, f64, f64, f64),
        Link(usize, usize, Vec<(f64, f64)>),
    }

    #[derive(Debug, Clone)]
    enum Step {
        Down(usize, bool),
        Move(f64, f64),
        Up(usize),
        Leave,
        Key(Key),
        SwitchMode(bool),
    }

    fn item_strategy() -> impl Strategy<Value = Item> {
        let coord = -200.0f64..200.0;
        prop_oneof![
            3 => (coord.clone(), coord.clone(), 10.0f64..120.0, 10.0f64..120.0)
                .prop_map(|(x, y, w, h)| Item::Shape(x, y, w, h)),
            2 => (coord.clone(), coord.clone(), 80.0f64..400.0, 80.0f64..400.0)
                .prop_map(|(x, y, w, h)| Item::Container(x, y, w, h)),
            1 => (
                any::<usize>(),
                any::<usize>(),
                prop::collection::vec((coord.clone(), coord), 0..3),
            )
                .prop_map(|(a, b, w)| Item::Link(a, b, w)),
        ]
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        let coord = -300.0f64..300.0;
        prop_oneof![
            3 => (any::<usize>(), any::<bool>()).prop_map(|(i, shift)| Step::Down(i, shift)),
            4 => (coord.clone(), coord).prop_map(|(x, y)| Step::Move(x, y)),
            2 => any::<usize>().prop_map(Step::Up),
            1 => Just(Step::Leave),
            1 => prop_oneof![Just(Key::Escape), Just(Key::Delete)].prop_map(Step::Key),
            1 => any::<bool>().prop_map(Step::SwitchMode),
        ]
    }

    fn pick(d: &Diagram, i: usize) -> Option<EntityId> {
        let ids = d.entity_ids();
        (!ids.is_empty()).then(|| ids[i % ids.len()])
    }

    /// Point to press for an entity: its center, or the first waypoint of a connector.
    fn press_point(d: &Diagram, i: usize) -> Point {
        pick(d, i)
            .and_then(|id| d.anchor(id).or_else(|| d.entity_origin(id)))
            .unwrap_or(Point::ZERO)
    }

    fn build(items: &[Item], snap: bool) -> Diagram {
        let mut d = Diagram::new();
        d.set_snap_enabled(snap);
        for item in items {
            match item {
                Item::Shape(x, y, w, h) => {
                    d.add_shape(ShapeKind::Rectangle, Point::new(*x, *y), *w, *h, ShapeStyle::default())
                        .unwrap();
                }
                Item::Container(x, y, w, h) => {
                    d.add_container("c", Point::new(*x, *y), *w, *h, ShapeStyle::default())
                        .unwrap();
                }
                Item::Link(a, b, waypoints) => {
                    if let (Some(a), Some(b)) = (pick(&d, *a), pick(&d, *b)) {
                        let waypoints = waypoints.iter().map(|(x, y)| Point::new(*x, *y)).collect();
                        // Self links and connector endpoints are rejected; skip them.
                        let _ = d.add_connector(a, b, waypoints);
                    }
                }
            }
        }
        d.take_events();
        d
    }

    fn layout(d: &Diagram) -> (Vec<Shape>, Vec<Container>, Vec<Connector>) {
        (d.get_shapes(), d.get_containers(), d.get_connectors())
    }

    proptest! {
        #[test]
        fn gestures_keep_invariants(
            items in prop::collection::vec(item_strategy(), 1..12),
            steps in prop::collection::vec(step_strategy(), 0..40),
            snap in any::<bool>(),
        ) {
            let mut d = build(&items, snap);
            let mut ic = InteractionController::new();
            for step in &steps {
                match step {
                    Step::Down(i, shift) => {
                        let at = press_point(&d, *i);
                        let modifiers = if *shift { Modifiers::SHIFT } else { Modifiers::default() };
                        let down = PointerEvent::Down { position: at, button: MouseButton::Left, modifiers };
                        ic.handle_pointer_at(&mut d, &down).unwrap();
                    }
                    Step::Move(x, y) => {
                        ic.handle_pointer_at(&mut d, &PointerEvent::moved(*x, *y)).unwrap();
                    }
                    Step::Up(i) => {
                        let at = press_point(&d, *i);
                        ic.handle_pointer_at(&mut d, &PointerEvent::up(at.x, at.y)).unwrap();
                    }
                    Step::Leave => {
                        ic.handle_pointer_at(&mut d, &PointerEvent::Leave).unwrap();
                    }
                    Step::Key(key) => {
                        ic.handle_key(&mut d, *key).unwrap();
                    }
                    Step::SwitchMode(connector) => {
                        let mode = if *connector { Mode::Connector } else { Mode::Pointer };
                        ic.set_mode(&mut d, mode).unwrap();
                    }
                }
                prop_assert_eq!(d.check_invariants(), Ok(()));
            }
        }

        #[test]
        fn cancelled_gesture_restores_layout(
            items in prop::collection::vec(item_strategy(), 1..12),
            picks in prop::collection::vec(any::<usize>(), 0..4),
            press in any::<usize>(),
            moves in prop::collection::vec((-300.0f64..300.0, -300.0f64..300.0), 1..8),
            connector_mode in any::<bool>(),
            snap in any::<bool>(),
            how in 0u8..3,
        ) {
            let mut d = build(&items, snap);
            let selection: Vec<EntityId> = picks.iter().filter_map(|i| pick(&d, *i)).collect();
            d.set_selection(&selection);
            let mut ic = InteractionController::new();
            if connector_mode {
                ic.set_mode(&mut d, Mode::Connector).unwrap();
            }

            let at = press_point(&d, press);
            ic.handle_pointer_at(&mut d, &PointerEvent::down(at.x, at.y)).unwrap();
            let before = layout(&d);
            for (x, y) in &moves {
                ic.handle_pointer_at(&mut d, &PointerEvent::moved(*x, *y)).unwrap();
            }
            match how {
                0 => ic.handle_pointer_at(&mut d, &PointerEvent::Leave).unwrap(),
                1 => ic.handle_key(&mut d, Key::Escape).unwrap(),
                _ => ic.cancel(&mut d).unwrap(),
            };

            prop_assert!(!ic.is_active());
            prop_assert!(ic.preview_path().is_none());
            prop_assert_eq!(layout(&d), before);
            prop_assert_eq!(d.check_invariants(), Ok(()));
        }
    }
}
