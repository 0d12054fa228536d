//! DiagramKit Core Library
//!
//! Platform-agnostic data model and interaction logic for the DiagramKit editor.

pub mod diagram;
pub mod error;
pub mod geometry;
pub mod id;
pub mod input;
pub mod modes;
pub mod shapes;

pub use diagram::{ContainerDeletePolicy, Diagram, DiagramEvent, DiagramSettings, LayoutSnapshot};
pub use error::{DiagramError, DiagramResult};
pub use geometry::{GRID_SIZE, GridSettings, MAX_GRID_LINES, snap, snap_to_grid};
pub use id::{EntityId, IdSource, RandomIds, SequentialIds};
pub use input::{Key, Modifiers, MouseButton, PointerEvent};
pub use modes::{Gesture, InteractionController, Mode, Outcome};
pub use shapes::{Connector, Container, EntityKind, SerializableColor, Shape, ShapeKind, ShapeStyle};
