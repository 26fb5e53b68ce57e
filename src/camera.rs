//! Pan/zoom camera. Screen space is pixels with Y down, world space has Y up.

use crate::geometry::{Rect, ViewBoundaries};
use glam::{Mat4, Vec2, Vec3};
use std::ops::RangeInclusive;

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// World position shown at the center of the viewport.
    pan: Vec2,
    /// Screen pixels per world unit.
    zoom: f32,
    viewport: Vec2,
    zoom_limits: RangeInclusive<f32>,
}

impl Camera {
    pub fn new(viewport_width: f32, viewport_height: f32, zoom_limits: RangeInclusive<f32>) -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            viewport: Vec2::new(viewport_width.max(1.0), viewport_height.max(1.0)),
            zoom_limits,
        }
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width.max(1.0), height.max(1.0));
    }

    fn screen_center(&self) -> Vec2 {
        self.viewport / 2.0
    }

    /// Converts screen-space pixel coordinates (Y-down) to world-space coordinates (Y-up)
    pub fn screen_to_world(&self, screen_pos: Vec2) -> Vec2 {
        let screen_offset_px = screen_pos - self.screen_center();
        let world_rel_zoomed = Vec2::new(screen_offset_px.x, -screen_offset_px.y);
        world_rel_zoomed / self.zoom + self.pan
    }

    /// Converts world-space coordinates (Y-up) to screen-space pixel coordinates (Y-down)
    pub fn world_to_screen(&self, world_pos: Vec2) -> Vec2 {
        let world_rel = world_pos - self.pan;
        let screen_offset_px = Vec2::new(world_rel.x, -world_rel.y) * self.zoom;
        self.screen_center() + screen_offset_px
    }

    /// Moves the view by a screen-space delta, so the world follows the cursor.
    pub fn pan_by(&mut self, screen_delta: Vec2) {
        self.pan -= Vec2::new(screen_delta.x, -screen_delta.y) / self.zoom;
    }

    /// Multiplies the zoom by `factor` while keeping the world point under
    /// `anchor` (screen space) fixed.
    pub fn zoom_at(&mut self, factor: f32, anchor: Vec2) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }

        // 1. Get world pos under the anchor before zoom
        let world_pos_before = self.screen_to_world(anchor);

        // 2. Calculate new zoom
        self.zoom = (self.zoom * factor).clamp(*self.zoom_limits.start(), *self.zoom_limits.end());

        // 3. Find the new pan that keeps world_pos_before under the anchor.
        //    P_new = W_before - (S_anchor - C) / Z_new
        let screen_offset = anchor - self.screen_center();
        let world_rel_zoomed = Vec2::new(screen_offset.x, -screen_offset.y);
        self.pan = world_pos_before - world_rel_zoomed / self.zoom;
    }

    /// Zooms and pans so that `bounds` fills the viewport with some padding.
    /// Degenerate bounds leave the camera unchanged.
    pub fn fit(&mut self, bounds: &Rect) {
        let (width, height) = (bounds.width(), bounds.height());
        if width <= f32::EPSILON && height <= f32::EPSILON {
            return;
        }

        let padding_factor = 0.90;
        let zoom_x = self.viewport.x / width.max(f32::EPSILON);
        let zoom_y = self.viewport.y / height.max(f32::EPSILON);
        self.zoom = (zoom_x.min(zoom_y) * padding_factor)
            .clamp(*self.zoom_limits.start(), *self.zoom_limits.end());
        self.pan = bounds.center();
    }

    /// World-space rectangle currently visible.
    pub fn view_boundaries(&self) -> ViewBoundaries {
        Rect::from_corners(
            self.screen_to_world(Vec2::ZERO),
            self.screen_to_world(self.viewport),
        )
    }

    /// Orthographic model-view-projection matrix mapping world space to clip space.
    pub fn model_view_projection(&self) -> Mat4 {
        let scale = Vec3::new(2.0 * self.zoom / self.viewport.x, 2.0 * self.zoom / self.viewport.y, 1.0);
        Mat4::from_scale(scale) * Mat4::from_translation(-self.pan.extend(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(800.0, 600.0, 0.05..=4.0)
    }

    fn assert_close(a: Vec2, b: Vec2) {
        let tolerance = 1e-4 * b.length().max(1.0);
        assert!(a.distance(b) < tolerance, "{a} != {b}");
    }

    #[test]
    fn screen_world_round_trip() {
        let mut cam = camera();
        cam.pan_by(Vec2::new(30.0, -12.0));
        cam.zoom_at(1.7, Vec2::new(100.0, 50.0));
        let p = Vec2::new(123.0, 456.0);
        assert_close(cam.world_to_screen(cam.screen_to_world(p)), p);
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut cam = camera();
        cam.pan_by(Vec2::new(-40.0, 25.0));
        for (factor, anchor) in [
            (1.5, Vec2::new(10.0, 20.0)),
            (0.3, Vec2::new(790.0, 590.0)),
            (100.0, Vec2::new(400.0, 0.0)),
            (0.0001, Vec2::new(0.0, 300.0)),
        ] {
            let before = cam.screen_to_world(anchor);
            cam.zoom_at(factor, anchor);
            assert_close(cam.screen_to_world(anchor), before);
        }
        assert_eq!(cam.zoom(), 0.05);
    }

    #[test]
    fn pan_follows_the_cursor() {
        let mut cam = camera();
        cam.zoom_at(2.0, Vec2::new(400.0, 300.0));
        let grabbed = cam.screen_to_world(Vec2::new(200.0, 200.0));
        cam.pan_by(Vec2::new(50.0, 40.0));
        assert_close(cam.world_to_screen(grabbed), Vec2::new(250.0, 240.0));
    }

    #[test]
    fn view_boundaries_match_viewport() {
        let mut cam = camera();
        cam.zoom_at(2.0, Vec2::new(400.0, 300.0));
        let view = cam.view_boundaries();
        assert!((view.width() - 400.0).abs() < 1e-3);
        assert!((view.height() - 300.0).abs() < 1e-3);
    }

    #[test]
    fn mvp_maps_view_corners_to_clip_corners() {
        let mut cam = camera();
        cam.pan_by(Vec2::new(13.0, 7.0));
        let view = cam.view_boundaries();
        let mvp = cam.model_view_projection();
        let min = mvp.project_point3(view.min.extend(0.0));
        let max = mvp.project_point3(view.max.extend(0.0));
        assert!((min.x + 1.0).abs() < 1e-4 && (min.y + 1.0).abs() < 1e-4);
        assert!((max.x - 1.0).abs() < 1e-4 && (max.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn fit_centers_bounds() {
        let mut cam = camera();
        cam.fit(&Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(cam.pan(), Vec2::new(50.0, 25.0));
        // 0.9 * min(800 / 100, 600 / 50) = 7.2, clamped to the upper limit
        assert_eq!(cam.zoom(), 4.0);

        let before = cam.clone();
        cam.fit(&Rect::ZERO);
        assert_eq!(cam, before);
    }
}
