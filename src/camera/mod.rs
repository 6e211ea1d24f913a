//! Camera rig
//!
//! Globe mode uses a perspective camera driven by `PanOrbitCamera` (orbit and zoom, no
//! pan). Flat mode swaps the same entity to a top-down orthographic projection with
//! pan/zoom only. Selecting a dot on the globe starts a scripted fly-to; orbit input is
//! disabled until it completes, is cancelled, or the safety timeout fires.

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit};
use bevy::prelude::*;
use bevy_panorbit_camera::PanOrbitCamera;
use std::time::Duration;

pub mod fly_to;
pub mod map_controls;
pub mod offset;

pub use fly_to::{CameraPose, FlyTo, focus_pose};
pub use map_controls::FlatView;
pub use offset::{ease_offset, panel_offset_target};

use crate::api::PlatformId;
use crate::core::coordinates::{DOT_RADIUS, ProjectionMode, project};
use crate::floats::SelectionState;
use crate::picking::{FloatSelected, SelectionInput};
use crate::scene::{SceneRoot, ViewMode};

pub const GLOBE_FOV_DEG: f32 = 45.0;
pub const GLOBE_START_DISTANCE: f32 = 12.0;
pub const GLOBE_ROTATE_SPEED: f32 = 2.5;
pub const GLOBE_ZOOM_MIN: f32 = 6.0;
pub const GLOBE_ZOOM_MAX: f32 = 50.0;
/// Focus is force-cleared if a fly-to has not completed after this long.
pub const FOCUS_TIMEOUT_SECS: f32 = 3.0;
/// Pixels per wheel line for pixel-based scroll devices.
const PIXELS_PER_LINE: f32 = 100.0;

/// Marker for the main 3D camera
#[derive(Component)]
pub struct MainCamera;

/// Active fly-to, if any
#[derive(Resource, Default)]
pub struct FocusState {
    pub platform: Option<PlatformId>,
    flight: Option<FlyTo>,
    timeout: Option<Timer>,
}

/// What one frame of focus handling asks of the camera
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FocusStep {
    /// No flight in progress.
    Idle,
    /// Apply the pose; orbit input stays disabled.
    Flying(CameraPose),
    /// Apply the final pose and hand control back.
    Arrived(CameraPose),
    /// The safety timeout fired first; apply the pose and hand control back.
    TimedOut(CameraPose),
    /// The selection was cleared or moved elsewhere; hand control back where the camera is.
    Cancelled,
}

impl FocusState {
    pub fn is_focusing(&self) -> bool {
        self.flight.is_some()
    }

    /// Begin flying to `platform`, replacing any flight in progress and restarting the
    /// safety timeout.
    pub fn start(&mut self, platform: PlatformId, flight: FlyTo) {
        self.platform = Some(platform);
        self.flight = Some(flight);
        self.timeout = Some(Timer::from_seconds(FOCUS_TIMEOUT_SECS, TimerMode::Once));
    }

    fn clear(&mut self) {
        self.flight = None;
        self.timeout = None;
    }

    /// Advance the flight by one frame given the current selection.
    pub fn advance(&mut self, delta: Duration, selected: Option<PlatformId>) -> FocusStep {
        if !self.is_focusing() {
            return FocusStep::Idle;
        }
        if selected != self.platform {
            self.clear();
            self.platform = None;
            return FocusStep::Cancelled;
        }
        let Some(flight) = self.flight.as_mut() else {
            return FocusStep::Idle;
        };
        let (pose, done) = flight.step(delta.as_secs_f32());
        let timed_out = self
            .timeout
            .as_mut()
            .is_some_and(|t| t.tick(delta).is_finished());
        if done {
            self.clear();
            FocusStep::Arrived(pose)
        } else if timed_out {
            self.clear();
            FocusStep::TimedOut(pose)
        } else {
            FocusStep::Flying(pose)
        }
    }
}

pub struct CameraRigPlugin;

impl Plugin for CameraRigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FlatView>()
            .init_resource::<FocusState>()
            .add_systems(Startup, spawn_main_camera)
            .add_systems(
                Update,
                (
                    apply_view_mode_to_camera,
                    flat_map_controls,
                    apply_flat_view,
                    start_fly_to,
                    step_fly_to,
                )
                    .chain()
                    .after(SelectionInput),
            );
    }
}

/// Orbit control for globe mode.
pub fn globe_orbit_camera() -> PanOrbitCamera {
    PanOrbitCamera {
        focus: Vec3::ZERO,
        radius: Some(GLOBE_START_DISTANCE),
        yaw: Some(0.0),
        pitch: Some(0.0),
        orbit_sensitivity: GLOBE_ROTATE_SPEED,
        pan_sensitivity: 0.0,
        zoom_lower_limit: GLOBE_ZOOM_MIN,
        zoom_upper_limit: Some(GLOBE_ZOOM_MAX),
        force_update: true,
        ..default()
    }
}

fn globe_projection() -> Projection {
    Projection::Perspective(PerspectiveProjection {
        fov: GLOBE_FOV_DEG.to_radians(),
        ..default()
    })
}

fn flat_projection(zoom: f32) -> Projection {
    Projection::Orthographic(OrthographicProjection {
        scale: 1.0 / zoom,
        ..OrthographicProjection::default_3d()
    })
}

fn spawn_main_camera(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        globe_projection(),
        Camera {
            order: 0,
            clear_color: ClearColorConfig::Custom(Color::BLACK),
            ..default()
        },
        globe_orbit_camera(),
        MainCamera,
        Transform::from_xyz(0.0, 0.0, GLOBE_START_DISTANCE).looking_at(Vec3::ZERO, Vec3::Y),
        Name::new("Main Camera"),
    ));
}

/// Swap projection and controls when the view mode changes.
fn apply_view_mode_to_camera(
    mut commands: Commands,
    view: Res<ViewMode>,
    flat: Res<FlatView>,
    mut focus: ResMut<FocusState>,
    camera: Single<Entity, With<MainCamera>>,
) {
    if !view.is_changed() || view.is_added() {
        return;
    }
    focus.clear();
    let mut entity = commands.entity(*camera);
    match view.mode {
        ProjectionMode::Globe => {
            entity.insert((
                globe_projection(),
                globe_orbit_camera(),
                Transform::from_xyz(0.0, 0.0, GLOBE_START_DISTANCE).looking_at(Vec3::ZERO, Vec3::Y),
            ));
        }
        ProjectionMode::Flat => {
            entity
                .remove::<PanOrbitCamera>()
                .insert((flat_projection(flat.zoom), flat.camera_transform()));
        }
    }
    info!("[CAMERA] switched to {}", view.mode.label());
}

fn flat_map_controls(
    view: Res<ViewMode>,
    mouse: Res<ButtonInput<MouseButton>>,
    motion: Res<AccumulatedMouseMotion>,
    scroll: Res<AccumulatedMouseScroll>,
    mut flat: ResMut<FlatView>,
) {
    if view.mode != ProjectionMode::Flat {
        return;
    }
    let mut next = *flat;
    if mouse.pressed(MouseButton::Left) && motion.delta != Vec2::ZERO {
        next.pan_by_pixels(motion.delta);
    }
    if scroll.delta.y != 0.0 {
        let lines = match scroll.unit {
            MouseScrollUnit::Line => scroll.delta.y,
            MouseScrollUnit::Pixel => scroll.delta.y / PIXELS_PER_LINE,
        };
        next.zoom_by_lines(lines);
    }
    flat.set_if_neq(next);
}

fn apply_flat_view(
    view: Res<ViewMode>,
    flat: Res<FlatView>,
    camera: Single<(&mut Projection, &mut Transform), With<MainCamera>>,
) {
    if view.mode != ProjectionMode::Flat || !flat.is_changed() {
        return;
    }
    let (mut projection, mut transform) = camera.into_inner();
    if let Projection::Orthographic(ortho) = projection.as_mut() {
        ortho.scale = 1.0 / flat.zoom;
    }
    *transform = flat.camera_transform();
}

fn start_fly_to(
    mut selections: MessageReader<FloatSelected>,
    view: Res<ViewMode>,
    mut focus: ResMut<FocusState>,
    root: Single<&GlobalTransform, With<SceneRoot>>,
    camera: Single<(&Transform, Option<&mut PanOrbitCamera>), With<MainCamera>>,
) {
    let Some(selected) = selections.read().last().copied() else {
        return;
    };
    if !view.mode.is_globe() {
        return;
    }
    let (transform, orbit) = camera.into_inner();
    let surface = root.transform_point(project(selected.coord, DOT_RADIUS, ProjectionMode::Globe));
    let flight = FlyTo::new(CameraPose::from_transform(transform), focus_pose(surface));
    if let Some(mut orbit) = orbit {
        orbit.enabled = false;
    }
    focus.start(selected.platform_id, flight);
    info!("[CAMERA] flying to platform {}", selected.platform_id);
}

/// Move the camera along the active flight. Clearing or changing the selection halts it
/// the same frame.
fn step_fly_to(
    time: Res<Time>,
    selection: Res<SelectionState>,
    mut focus: ResMut<FocusState>,
    camera: Single<(&mut Transform, Option<&mut PanOrbitCamera>), With<MainCamera>>,
) {
    if !focus.is_focusing() {
        return;
    }
    let (mut transform, orbit) = camera.into_inner();
    let pose = match focus.advance(time.delta(), selection.selected()) {
        FocusStep::Idle => return,
        FocusStep::Flying(pose) => {
            pose.apply(&mut transform);
            return;
        }
        FocusStep::Arrived(pose) => Some(pose),
        FocusStep::TimedOut(pose) => {
            warn!("[CAMERA] fly-to did not complete in {}s, releasing controls", FOCUS_TIMEOUT_SECS);
            Some(pose)
        }
        FocusStep::Cancelled => {
            debug!("[CAMERA] focus cancelled");
            None
        }
    };
    if let Some(pose) = pose {
        pose.apply(&mut transform);
    }
    if let Some(mut orbit) = orbit {
        sync_orbit_to_transform(&mut orbit, &transform);
        orbit.enabled = true;
    }
}

/// Point the orbit control at the current camera transform so it resumes from there.
///
/// The orbit focus is the point of the view ray closest to the globe centre.
pub fn sync_orbit_to_transform(orbit: &mut PanOrbitCamera, transform: &Transform) {
    let position = transform.translation;
    let forward = transform.forward().as_vec3();
    let focus = position + forward * (-position.dot(forward)).max(0.0);
    let offset = position - focus;
    let radius = offset.length().max(GLOBE_ZOOM_MIN);
    let direction = offset.try_normalize().unwrap_or(Vec3::Z);
    let pitch = direction.y.clamp(-1.0, 1.0).asin();
    let yaw = direction.x.atan2(direction.z);

    orbit.focus = focus;
    orbit.target_focus = focus;
    orbit.radius = Some(radius);
    orbit.target_radius = radius;
    orbit.yaw = Some(yaw);
    orbit.target_yaw = yaw;
    orbit.pitch = Some(pitch);
    orbit.target_pitch = pitch;
    orbit.force_update = true;
}
