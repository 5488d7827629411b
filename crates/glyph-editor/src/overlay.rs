//! Tool overlay draw list.
//!
//! Tools describe their transient UI (marquee, handles, snap indicators,
//! shape previews) as plain items; the host renderer paints them. Item
//! geometry is in scene space.

use kurbo::{Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayStyle {
    Marquee,
    Selection,
    Preview,
    Snap,
    Guide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleShape {
    Square,
    Circle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayItem {
    Rect {
        rect: Rect,
        style: OverlayStyle,
    },
    Line {
        from: Point,
        to: Point,
        style: OverlayStyle,
    },
    Handle {
        at: Point,
        shape: HandleShape,
        active: bool,
    },
    /// Snap indicator or similar point marker.
    Marker {
        at: Point,
        style: OverlayStyle,
    },
    Text {
        at: Point,
        text: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    items: Vec<OverlayItem>,
}

impl Overlay {
    pub fn push(&mut self, item: OverlayItem) {
        self.items.push(item);
    }

    pub fn rect(&mut self, rect: Rect, style: OverlayStyle) {
        self.push(OverlayItem::Rect { rect, style });
    }

    pub fn line(&mut self, from: Point, to: Point, style: OverlayStyle) {
        self.push(OverlayItem::Line { from, to, style });
    }

    pub fn handle(&mut self, at: Point, shape: HandleShape, active: bool) {
        self.push(OverlayItem::Handle { at, shape, active });
    }

    pub fn marker(&mut self, at: Point, style: OverlayStyle) {
        self.push(OverlayItem::Marker { at, style });
    }

    pub fn items(&self) -> &[OverlayItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
