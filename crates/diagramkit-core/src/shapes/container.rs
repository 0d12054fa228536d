//! Container entity that groups shapes.

use super::ShapeStyle;
use crate::id::EntityId;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A rectangular region that owns the shapes lying fully inside it.
///
/// `children` mirrors the `parent` field of each member shape; the diagram
/// keeps both sides consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub(crate) id: EntityId,
    /// Display name.
    pub name: String,
    /// Top-left corner position.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub style: ShapeStyle,
    pub(crate) children: BTreeSet<EntityId>,
}

impl Container {
    pub(crate) fn new(
        id: EntityId,
        name: String,
        position: Point,
        width: f64,
        height: f64,
        style: ShapeStyle,
    ) -> Self {
        Self {
            id,
            name,
            position,
            width,
            height,
            style,
            children: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Ids of the member shapes.
    pub fn children(&self) -> &BTreeSet<EntityId> {
        &self.children
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, (self.width, self.height))
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}
