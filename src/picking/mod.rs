//! Dot picking and hover
//!
//! Every frame a ray is cast from the cursor through the main camera and tested against
//! the three dot buffers in scene-root space. Hover follows the nearest hit unless the
//! left button is held; a press that stays within the drag threshold selects the dot it
//! started on. The dot is resolved to its reading at press time, so buffers rebuilt while
//! the button is held cannot change what gets selected.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

pub mod gesture;
pub mod hit;

pub use gesture::{GestureOutcome, PressGesture};
pub use hit::{DotHit, pick_nearest};

use crate::api::PlatformId;
use crate::camera::{FlatView, MainCamera};
use crate::config::AppConfig;
use crate::core::coordinates::{GeoCoord, ProjectionMode};
use crate::floats::{DotBuffers, DotCategory, SelectionState, dot_size};
use crate::scene::SceneRoot;

/// Minimum pick distance from the ray, world units.
pub const PICK_THRESHOLD_GLOBE: f32 = 0.05;
pub const PICK_THRESHOLD_FLAT: f32 = 0.1;

/// A dot was clicked.
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct FloatSelected {
    pub platform_id: PlatformId,
    pub coord: GeoCoord,
}

pub struct PickingPlugin;

impl Plugin for PickingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PressGesture>()
            .add_message::<FloatSelected>()
            .add_systems(Update, (pick_dots, clear_selection_on_escape).in_set(SelectionInput));
    }
}

/// Systems that change the selection from user input. Selection consumers run after it.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionInput;

/// Platform and position of the reading behind a hit, looked up in the same buffers the
/// hit came from.
pub fn resolve_hit(buffers: &DotBuffers, hit: DotHit) -> Option<FloatSelected> {
    buffers.reading(hit.category, hit.index).map(|reading| FloatSelected {
        platform_id: reading.platform_id,
        coord: reading.coord,
    })
}

/// Ray distance under which a dot counts as hit; never smaller than the drawn dot.
pub fn pick_threshold(mode: ProjectionMode, dot_world_size: f32) -> f32 {
    let base = match mode {
        ProjectionMode::Globe => PICK_THRESHOLD_GLOBE,
        ProjectionMode::Flat => PICK_THRESHOLD_FLAT,
    };
    base.max(dot_world_size * 0.5)
}

#[allow(clippy::too_many_arguments)]
fn pick_dots(
    mouse: Res<ButtonInput<MouseButton>>,
    window: Single<&Window, With<PrimaryWindow>>,
    camera: Single<(&Camera, &GlobalTransform), With<MainCamera>>,
    root: Single<&GlobalTransform, With<SceneRoot>>,
    buffers: Res<DotBuffers>,
    flat: Res<FlatView>,
    config: Res<AppConfig>,
    mut gesture: ResMut<PressGesture>,
    mut selection: ResMut<SelectionState>,
    mut selected_writer: MessageWriter<FloatSelected>,
) {
    let Some(cursor) = window.cursor_position() else {
        if mouse.just_released(MouseButton::Left) {
            *gesture = PressGesture::Idle;
        }
        let mut next = *selection;
        next.hover(None);
        selection.set_if_neq(next);
        return;
    };

    let (cam, cam_transform) = *camera;
    let size = dot_size(
        config.dot_size_globe,
        config.dot_size_flat_px,
        buffers.mode,
        flat.zoom,
        DotCategory::Unselected,
    );
    let threshold = pick_threshold(buffers.mode, size);
    let hit_under_cursor = || -> Option<FloatSelected> {
        let ray = cam.viewport_to_world(cam_transform, cursor).ok()?;
        let to_local = root.affine().inverse();
        let origin = to_local.transform_point3(ray.origin);
        let direction = to_local.transform_vector3(*ray.direction).try_normalize()?;
        pick_nearest(origin, direction, &buffers, threshold).and_then(|hit| resolve_hit(&buffers, hit))
    };

    if mouse.just_pressed(MouseButton::Left) {
        gesture.press(cursor, hit_under_cursor());
    } else if mouse.just_released(MouseButton::Left) {
        if let GestureOutcome::Click(picked) = gesture.release(cursor) {
            info!(
                "[PICK] selected platform {} at ({:.3}, {:.3})",
                picked.platform_id, picked.coord.latitude, picked.coord.longitude
            );
            selection.select(picked.platform_id);
            selected_writer.write(picked);
        }
    } else {
        gesture.moved(cursor);
    }

    // hover is frozen while the button is held
    if gesture.is_pressed() {
        return;
    }
    let candidate = hit_under_cursor().map(|picked| picked.platform_id);
    let mut next = *selection;
    next.hover(candidate);
    if selection.set_if_neq(next) {
        debug!("[PICK] hover {:?}", next.hovered());
    }
}

fn clear_selection_on_escape(keys: Res<ButtonInput<KeyCode>>, mut selection: ResMut<SelectionState>) {
    if keys.just_pressed(KeyCode::Escape) && selection.selected().is_some() {
        info!("[PICK] selection cleared");
        selection.clear_selection();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiCommand;
    use crate::floats::{FloatQuery, FloatStore};
    use crate::floats::store::tests::reading;

    fn snapshot(store: &mut FloatStore, year: i32, readings: Vec<crate::api::SensorReading>) {
        let ApiCommand::Snapshot { generation, .. } = store.issue(FloatQuery::Snapshot { year, limit: 10 }) else {
            panic!("expected snapshot command");
        };
        assert!(store.apply(generation, Ok(readings)));
    }

    /// Straight down onto the flat map at `lon` on the equator.
    fn pick_flat(buffers: &DotBuffers, lon: f32) -> Option<FloatSelected> {
        let origin = Vec3::new(lon / 180.0 * 18.0, 10.0, 0.0);
        pick_nearest(origin, Vec3::NEG_Y, buffers, PICK_THRESHOLD_FLAT).and_then(|hit| resolve_hit(buffers, hit))
    }

    #[test]
    fn click_selects_the_platform_under_the_cursor() {
        let mut store = FloatStore::default();
        snapshot(&mut store, 2023, vec![reading(1, 10.0, 0.0), reading(2, 20.0, 0.0), reading(3, 30.0, 0.0)]);
        let buffers = DotBuffers::rebuild(&store, &SelectionState::default(), ProjectionMode::Flat);

        let mut gesture = PressGesture::default();
        gesture.press(Vec2::new(200.0, 150.0), pick_flat(&buffers, 30.0));
        let GestureOutcome::Click(picked) = gesture.release(Vec2::new(201.0, 150.0)) else {
            panic!("expected a click");
        };
        assert_eq!(picked.platform_id, 3);
        assert_eq!(picked.coord, GeoCoord::new(30.0, 0.0));
    }

    #[test]
    fn buffers_rebuilt_during_a_press_do_not_change_the_pick() {
        let mut store = FloatStore::default();
        snapshot(&mut store, 2023, vec![reading(1, 10.0, 0.0), reading(2, 20.0, 0.0), reading(3, 30.0, 0.0)]);
        let buffers = DotBuffers::rebuild(&store, &SelectionState::default(), ProjectionMode::Flat);

        let mut gesture = PressGesture::default();
        gesture.press(Vec2::ZERO, pick_flat(&buffers, 30.0));

        // a new year lands while the button is held
        snapshot(&mut store, 2024, vec![reading(7, -100.0, 0.0), reading(8, -80.0, 0.0), reading(9, -60.0, 0.0)]);
        let rebuilt = DotBuffers::rebuild(&store, &SelectionState::default(), ProjectionMode::Flat);
        assert_eq!(rebuilt.reading(DotCategory::Unselected, 2).map(|r| r.platform_id), Some(9));

        let GestureOutcome::Click(picked) = gesture.release(Vec2::ZERO) else {
            panic!("expected a click");
        };
        assert_eq!(picked.platform_id, 3);
    }

    #[test]
    fn pressing_empty_space_selects_nothing() {
        let mut store = FloatStore::default();
        snapshot(&mut store, 2023, vec![reading(1, 10.0, 0.0)]);
        let buffers = DotBuffers::rebuild(&store, &SelectionState::default(), ProjectionMode::Flat);
        let mut gesture = PressGesture::default();
        gesture.press(Vec2::ZERO, pick_flat(&buffers, 90.0));
        assert_eq!(gesture.release(Vec2::ZERO), GestureOutcome::Tap);
    }

    #[test]
    fn threshold_covers_the_drawn_dot() {
        assert_eq!(pick_threshold(ProjectionMode::Globe, 0.08), PICK_THRESHOLD_GLOBE);
        assert_eq!(pick_threshold(ProjectionMode::Flat, 0.1), PICK_THRESHOLD_FLAT);
        assert!((pick_threshold(ProjectionMode::Flat, 0.5) - 0.25).abs() < 1e-6);
    }
}
