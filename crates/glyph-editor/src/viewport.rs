//! Screen ↔ scene coordinate mapping.
//!
//! `screen = scene * zoom + offset`. Hit radii are specified in screen
//! pixels and converted to scene units here, so hit-testing stays the same
//! visual size at every zoom level.

use crate::config::ZoomConfig;
use kurbo::{Point, Size, Vec2};

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    zoom: f64,
    offset: Vec2,
    size: Size,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Size::new(800.0, 600.0))
    }
}

impl Viewport {
    pub fn new(size: Size) -> Self {
        Self {
            zoom: 1.0,
            offset: Vec2::ZERO,
            size,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }

    pub fn screen_to_scene(&self, screen: Point) -> Point {
        ((screen.to_vec2() - self.offset) / self.zoom).to_point()
    }

    pub fn scene_to_screen(&self, scene: Point) -> Point {
        (scene.to_vec2() * self.zoom + self.offset).to_point()
    }

    /// Scene-space length of `px` screen pixels.
    pub fn scene_distance(&self, px: f64) -> f64 {
        px / self.zoom
    }

    /// Scene-space hit radius for a radius given in screen pixels.
    pub fn hit_radius(&self, px: f64) -> f64 {
        self.scene_distance(px)
    }

    /// Pan by a screen-space delta.
    pub fn pan_by(&mut self, screen_delta: Vec2) {
        self.offset += screen_delta;
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    /// Zoom by `factor`, keeping the scene point under `anchor` fixed on
    /// screen. The result is clamped to the configured range.
    pub fn zoom_at(&mut self, factor: f64, anchor: Point, limits: &ZoomConfig) {
        let scene = self.screen_to_scene(anchor);
        self.zoom = (self.zoom * factor).clamp(limits.min, limits.max);
        self.offset = anchor.to_vec2() - scene.to_vec2() * self.zoom;
    }

    /// Zoom about the centre of the view.
    pub fn zoom_by(&mut self, factor: f64, limits: &ZoomConfig) {
        let centre = Point::new(self.size.width / 2.0, self.size.height / 2.0);
        self.zoom_at(factor, centre, limits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_zoom_and_pan() {
        let mut vp = Viewport::default();
        vp.pan_by(Vec2::new(40.0, -20.0));
        vp.zoom_at(2.0, Point::new(100.0, 100.0), &ZoomConfig::default());
        let scene = Point::new(12.5, 99.0);
        let back = vp.screen_to_scene(vp.scene_to_screen(scene));
        assert!((back - scene).hypot() < 1e-9);
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut vp = Viewport::default();
        let anchor = Point::new(300.0, 200.0);
        let before = vp.screen_to_scene(anchor);
        vp.zoom_at(4.0, anchor, &ZoomConfig::default());
        let after = vp.screen_to_scene(anchor);
        assert!((after - before).hypot() < 1e-9);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = Viewport::default();
        let limits = ZoomConfig::default();
        vp.zoom_by(1_000.0, &limits);
        assert_eq!(vp.zoom(), limits.max);
        vp.zoom_by(1e-9, &limits);
        assert_eq!(vp.zoom(), limits.min);
    }

    #[test]
    fn hit_radius_shrinks_when_zoomed_in() {
        let mut vp = Viewport::default();
        assert_eq!(vp.hit_radius(6.0), 6.0);
        vp.zoom_by(2.0, &ZoomConfig::default());
        assert_eq!(vp.hit_radius(6.0), 3.0);
    }
}
