//! Pan and zoom for the top-down flat map camera

use bevy::prelude::*;

use crate::core::coordinates::{FLAT_HALF_HEIGHT, FLAT_HALF_WIDTH};

pub const FLAT_ZOOM_DEFAULT: f32 = 45.0;
pub const FLAT_ZOOM_MIN: f32 = 10.0;
pub const FLAT_ZOOM_MAX: f32 = 200.0;
/// Zoom factor per wheel line.
const ZOOM_STEP: f32 = 1.1;
/// Height of the orthographic camera above the plane.
pub const FLAT_CAMERA_HEIGHT: f32 = 10.0;

/// Flat map view: orthographic zoom (pixels per world unit) and the ground point
/// under the screen centre (`x`, `z`).
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct FlatView {
    pub zoom: f32,
    pub pan: Vec2,
}

impl Default for FlatView {
    fn default() -> Self {
        Self {
            zoom: FLAT_ZOOM_DEFAULT,
            pan: Vec2::ZERO,
        }
    }
}

impl FlatView {
    /// Move the map with the cursor; screen y grows downwards which is +Z (south).
    pub fn pan_by_pixels(&mut self, delta_px: Vec2) {
        let pan = self.pan - delta_px / self.zoom;
        self.pan = Vec2::new(
            pan.x.clamp(-FLAT_HALF_WIDTH as f32, FLAT_HALF_WIDTH as f32),
            pan.y.clamp(-FLAT_HALF_HEIGHT as f32, FLAT_HALF_HEIGHT as f32),
        );
    }

    /// Positive lines zoom in.
    pub fn zoom_by_lines(&mut self, lines: f32) {
        self.zoom = (self.zoom * ZOOM_STEP.powf(lines)).clamp(FLAT_ZOOM_MIN, FLAT_ZOOM_MAX);
    }

    /// Camera transform looking straight down, north (-Z) at the top of the screen.
    pub fn camera_transform(&self) -> Transform {
        Transform::from_xyz(self.pan.x, FLAT_CAMERA_HEIGHT, self.pan.y)
            .looking_at(Vec3::new(self.pan.x, 0.0, self.pan.y), Vec3::NEG_Z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_is_clamped() {
        let mut view = FlatView::default();
        view.zoom_by_lines(100.0);
        assert_eq!(view.zoom, FLAT_ZOOM_MAX);
        view.zoom_by_lines(-100.0);
        assert_eq!(view.zoom, FLAT_ZOOM_MIN);
    }

    #[test]
    fn drag_moves_map_with_cursor() {
        let mut view = FlatView::default();
        view.pan_by_pixels(Vec2::new(90.0, -45.0));
        assert!((view.pan - Vec2::new(-2.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn pan_stays_over_the_plane() {
        let mut view = FlatView { zoom: 10.0, pan: Vec2::ZERO };
        view.pan_by_pixels(Vec2::new(-10_000.0, 10_000.0));
        assert_eq!(view.pan, Vec2::new(18.0, -9.0));
    }

    #[test]
    fn camera_looks_down_with_north_up() {
        let t = FlatView::default().camera_transform();
        assert!((t.forward().as_vec3() - Vec3::NEG_Y).length() < 1e-5);
        assert!((t.up().as_vec3() - Vec3::NEG_Z).length() < 1e-5);
    }
}
