//! Scripted camera fly-to for globe selections

use bevy::prelude::*;

/// Distance from the globe centre the camera settles at.
pub const FOCUS_DISTANCE: f32 = 9.0;
/// Sideways shift along the surface tangent, leaves room for the detail panel.
pub const LATERAL_SHIFT: f32 = 0.9;
pub const FLY_DURATION_SECS: f32 = 1.15;
const MIN_DURATION_SECS: f32 = 0.1;
pub const EASE_POWER: i32 = 3;

/// Camera position and orientation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl CameraPose {
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            translation: transform.translation,
            rotation: transform.rotation,
        }
    }

    pub fn apply(&self, transform: &mut Transform) {
        transform.translation = self.translation;
        transform.rotation = self.rotation;
    }
}

/// `1 - (1 - t)^power`, with `t` clamped to `[0, 1]`.
pub fn ease_out(t: f32, power: i32) -> f32 {
    1.0 - (1.0 - t.clamp(0.0, 1.0)).powi(power)
}

/// Target pose for looking at `surface` (a point on the globe, world space).
///
/// The camera sits `FOCUS_DISTANCE` out along the surface normal, shifted by
/// `LATERAL_SHIFT` along world +X projected onto the tangent plane (or `normal x up` when
/// that projection degenerates), and looks back at the surface point with +Y up.
pub fn focus_pose(surface: Vec3) -> CameraPose {
    let normal = surface.try_normalize().unwrap_or(Vec3::Z);
    let mut side = Vec3::X - normal * Vec3::X.dot(normal);
    if side.length_squared() < 1e-6 {
        side = normal.cross(Vec3::Y);
    }
    let side = side.try_normalize().unwrap_or(Vec3::Z);
    let translation = normal * FOCUS_DISTANCE + side * LATERAL_SHIFT;
    let rotation = Transform::from_translation(translation)
        .looking_at(surface, Vec3::Y)
        .rotation;
    CameraPose { translation, rotation }
}

/// Fly-to in progress, sampled once per frame.
#[derive(Clone, Debug)]
pub struct FlyTo {
    start: CameraPose,
    target: CameraPose,
    progress: f32,
    duration: f32,
}

impl FlyTo {
    pub fn new(start: CameraPose, target: CameraPose) -> Self {
        Self::with_duration(start, target, FLY_DURATION_SECS)
    }

    pub fn with_duration(start: CameraPose, target: CameraPose, duration: f32) -> Self {
        Self {
            start,
            target,
            progress: 0.0,
            duration: duration.max(MIN_DURATION_SECS),
        }
    }

    /// Advance by `dt` seconds. Returns the pose to apply and whether the flight is done;
    /// the final pose is exactly the target.
    pub fn step(&mut self, dt: f32) -> (CameraPose, bool) {
        self.progress = (self.progress + dt / self.duration).min(1.0);
        if self.progress >= 1.0 {
            return (self.target, true);
        }
        let eased = ease_out(self.progress, EASE_POWER);
        let pose = CameraPose {
            translation: self.start.translation.lerp(self.target.translation, eased),
            rotation: self.start.rotation.slerp(self.target.rotation, eased),
        };
        (pose, false)
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }
}
