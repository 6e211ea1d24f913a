//! Scene composition
//!
//! One root entity carries every projected layer (coastline, dots). The root spins
//! slowly on the globe when idle, snaps back to identity when leaving globe mode, and
//! slides sideways on the flat map while the detail panel is open.

use bevy::asset::RenderAssetUsages;
use bevy::input::mouse::AccumulatedMouseScroll;
use bevy::light::GlobalAmbientLight;
use bevy::mesh::PrimitiveTopology;
use bevy::prelude::*;
use std::time::Duration;

use crate::camera::{FocusState, ease_offset, panel_offset_target};
use crate::core::coordinates::{
    FLAT_HALF_HEIGHT, FLAT_HALF_WIDTH, FLAT_PLANE_Y, GRATICULE_RADIUS, GeoCoord, OCEAN_RADIUS, ProjectionMode,
    project,
};
use crate::floats::SelectionState;

/// Globe spin speed while idle, radians per second.
pub const AUTO_ROTATE_SPEED: f32 = 0.05;
/// Idle time after the last input before spinning resumes.
pub const IDLE_RESUME_SECS: f32 = 10.0;
const GRATICULE_STEP_DEG: i32 = 30;

/// Active projection
#[derive(Resource, Default, Debug)]
pub struct ViewMode {
    pub mode: ProjectionMode,
}

/// Parent of all projected layers
#[derive(Component)]
pub struct SceneRoot;

/// Visible only on the globe
#[derive(Component)]
pub struct GlobeOnly;

/// Visible only on the flat map
#[derive(Component)]
pub struct FlatOnly;

/// Idle auto-rotation with a single resume timer.
#[derive(Resource, Debug)]
pub struct AutoRotate {
    spinning: bool,
    idle: Option<Timer>,
}

impl Default for AutoRotate {
    fn default() -> Self {
        Self {
            spinning: true,
            idle: None,
        }
    }
}

impl AutoRotate {
    /// User input started: stop spinning and forget any pending resume.
    pub fn interrupt(&mut self) {
        self.spinning = false;
        self.idle = None;
    }

    /// User input ended: (re)start the one resume timer.
    pub fn release(&mut self) {
        self.idle = Some(Timer::from_seconds(IDLE_RESUME_SECS, TimerMode::Once));
    }

    /// Advance the resume timer; returns whether the globe should spin.
    pub fn tick(&mut self, delta: Duration) -> bool {
        if let Some(timer) = self.idle.as_mut()
            && timer.tick(delta).just_finished()
        {
            self.spinning = true;
            self.idle = None;
        }
        self.spinning
    }

    pub fn is_waiting(&self) -> bool {
        self.idle.is_some()
    }
}

/// Horizontal offset of the scene root
#[derive(Resource, Default, Debug)]
pub struct PanelOffset {
    pub current: f32,
}

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewMode>()
            .init_resource::<AutoRotate>()
            .init_resource::<PanelOffset>()
            .add_systems(PreStartup, spawn_scene_root)
            .add_systems(Startup, spawn_backdrop)
            .add_systems(
                Update,
                (
                    toggle_view_on_key,
                    apply_view_visibility,
                    reset_rotation_on_flat,
                    track_user_input,
                    auto_rotate,
                    ease_panel_offset,
                )
                    .chain(),
            );
    }
}

fn spawn_scene_root(mut commands: Commands) {
    commands.spawn((SceneRoot, Transform::default(), Visibility::default(), Name::new("Scene Root")));
}

fn spawn_backdrop(
    mut commands: Commands,
    root: Single<Entity, With<SceneRoot>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.insert_resource(GlobalAmbientLight {
        brightness: 400.0,
        ..default()
    });
    commands.spawn((
        DirectionalLight {
            illuminance: 6_000.0,
            ..default()
        },
        Transform::from_xyz(10.0, 10.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(OCEAN_RADIUS).mesh().uv(64, 32))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.02, 0.09, 0.2),
            perceptual_roughness: 0.9,
            ..default()
        })),
        Transform::default(),
        GlobeOnly,
        Name::new("Ocean"),
        ChildOf(*root),
    ));
    commands.spawn((
        Mesh3d(meshes.add(graticule_mesh(GRATICULE_STEP_DEG))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgba(0.4, 0.6, 0.8, 0.25),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            ..default()
        })),
        Transform::default(),
        GlobeOnly,
        Name::new("Graticule"),
        ChildOf(*root),
    ));
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(
            (FLAT_HALF_WIDTH * 2.0) as f32,
            (FLAT_HALF_HEIGHT * 2.0) as f32,
        ))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.02, 0.09, 0.2),
            unlit: true,
            ..default()
        })),
        Transform::from_xyz(0.0, FLAT_PLANE_Y, 0.0),
        Visibility::Hidden,
        FlatOnly,
        Name::new("Flat Plane"),
        ChildOf(*root),
    ));
}

/// Meridians and parallels every `step` degrees as a line list on the globe.
pub fn graticule_mesh(step: i32) -> Mesh {
    let radius = f64::from(GRATICULE_RADIUS);
    let mut lines = Vec::new();
    let mut push_path = |coords: Vec<GeoCoord>| {
        for pair in coords.windows(2) {
            lines.push(project(pair[0], radius, ProjectionMode::Globe));
            lines.push(project(pair[1], radius, ProjectionMode::Globe));
        }
    };
    for lon in (-180..180).step_by(step as usize) {
        push_path((-90..=90).step_by(5).map(|lat| GeoCoord::new(lon.into(), lat.into())).collect());
    }
    for lat in (-90 + step..90).step_by(step as usize) {
        push_path((-180..=180).step_by(5).map(|lon| GeoCoord::new(lon.into(), lat.into())).collect());
    }
    Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, lines)
}

fn toggle_view_on_key(keys: Res<ButtonInput<KeyCode>>, mut view: ResMut<ViewMode>) {
    if keys.just_pressed(KeyCode::Tab) {
        view.mode = view.mode.toggled();
        info!("[SCENE] view {}", view.mode.label());
    }
}

fn apply_view_visibility(
    view: Res<ViewMode>,
    mut globe: Query<&mut Visibility, (With<GlobeOnly>, Without<FlatOnly>)>,
    mut flat: Query<&mut Visibility, (With<FlatOnly>, Without<GlobeOnly>)>,
) {
    if !view.is_changed() {
        return;
    }
    let (on_globe, on_flat) = if view.mode.is_globe() {
        (Visibility::Inherited, Visibility::Hidden)
    } else {
        (Visibility::Hidden, Visibility::Inherited)
    };
    for mut v in &mut globe {
        *v = on_globe;
    }
    for mut v in &mut flat {
        *v = on_flat;
    }
}

/// Leaving the globe drops any accumulated spin at once.
fn reset_rotation_on_flat(view: Res<ViewMode>, mut root: Single<&mut Transform, With<SceneRoot>>) {
    if view.is_changed() && !view.mode.is_globe() {
        root.rotation = Quat::IDENTITY;
    }
}

fn track_user_input(
    mouse: Res<ButtonInput<MouseButton>>,
    scroll: Res<AccumulatedMouseScroll>,
    mut auto: ResMut<AutoRotate>,
) {
    if mouse.any_just_pressed([MouseButton::Left, MouseButton::Right, MouseButton::Middle]) {
        auto.interrupt();
    }
    if scroll.delta != Vec2::ZERO {
        auto.interrupt();
        auto.release();
    }
    let any_held = mouse.any_pressed([MouseButton::Left, MouseButton::Right, MouseButton::Middle]);
    if mouse.any_just_released([MouseButton::Left, MouseButton::Right, MouseButton::Middle]) && !any_held {
        auto.release();
    }
}

fn auto_rotate(
    time: Res<Time>,
    view: Res<ViewMode>,
    selection: Res<SelectionState>,
    focus: Res<FocusState>,
    mut auto: ResMut<AutoRotate>,
    mut root: Single<&mut Transform, With<SceneRoot>>,
) {
    let spinning = auto.tick(time.delta());
    if !spinning || !view.mode.is_globe() || selection.selected().is_some() || focus.is_focusing() {
        return;
    }
    root.rotate_y(AUTO_ROTATE_SPEED * time.delta_secs());
}

fn ease_panel_offset(
    time: Res<Time>,
    view: Res<ViewMode>,
    selection: Res<SelectionState>,
    mut offset: ResMut<PanelOffset>,
    mut root: Single<&mut Transform, With<SceneRoot>>,
) {
    let target = panel_offset_target(selection.selected().is_some(), view.mode.is_globe());
    if offset.current == target {
        return;
    }
    offset.current = ease_offset(offset.current, target, time.delta_secs());
    root.translation.x = offset.current;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_timer_resumes_spin() {
        let mut auto = AutoRotate::default();
        assert!(auto.tick(Duration::from_millis(16)));

        auto.interrupt();
        assert!(!auto.tick(Duration::from_secs(60)), "held input never resumes");

        auto.release();
        assert!(!auto.tick(Duration::from_secs(9)));
        assert!(auto.tick(Duration::from_secs(1)));
        assert!(!auto.is_waiting());
    }

    #[test]
    fn new_input_restarts_the_single_timer() {
        let mut auto = AutoRotate::default();
        auto.interrupt();
        auto.release();
        auto.tick(Duration::from_secs(8));
        auto.interrupt();
        auto.release();
        assert!(!auto.tick(Duration::from_secs(8)));
        assert!(auto.tick(Duration::from_secs(2)));
    }

    #[test]
    fn graticule_is_on_its_sphere() {
        let mesh = graticule_mesh(30);
        let Some(bevy::mesh::VertexAttributeValues::Float32x3(verts)) = mesh.attribute(Mesh::ATTRIBUTE_POSITION) else {
            panic!("missing positions");
        };
        assert!(!verts.is_empty());
        assert_eq!(verts.len() % 2, 0);
        for v in verts {
            assert!((Vec3::from_array(*v).length() - GRATICULE_RADIUS).abs() < 1e-4);
        }
    }
}
