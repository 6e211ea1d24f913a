//! Float dots
//!
//! Holds the sensor position store and selection state, classifies the working set into
//! selected/hovered/unselected buffers and keeps one dot mesh per category under the
//! scene root.

use bevy::prelude::*;

pub mod classify;
pub mod geometry;
pub mod store;

pub use classify::{DotCategory, SelectionState, classify, dot_size};
pub use geometry::{build_dot_mesh, dot_positions};
pub use store::{FloatQuery, FloatStore};

use crate::api::SensorReading;
use crate::camera::FlatView;
use crate::config::AppConfig;
use crate::core::coordinates::ProjectionMode;
use crate::scene::{SceneRoot, ViewMode};

/// Readings of one category and their projected positions, index-aligned.
#[derive(Default, Debug)]
pub struct CategoryBuffer {
    pub readings: Vec<SensorReading>,
    pub positions: Vec<Vec3>,
}

/// Render buffers rebuilt from the store, the selection and the projection.
#[derive(Resource, Default, Debug)]
pub struct DotBuffers {
    pub selected: CategoryBuffer,
    pub hovered: CategoryBuffer,
    pub unselected: CategoryBuffer,
    pub mode: ProjectionMode,
}

impl DotBuffers {
    pub fn get(&self, category: DotCategory) -> &CategoryBuffer {
        match category {
            DotCategory::Selected => &self.selected,
            DotCategory::Hovered => &self.hovered,
            DotCategory::Unselected => &self.unselected,
        }
    }

    pub fn rebuild(store: &FloatStore, selection: &SelectionState, mode: ProjectionMode) -> Self {
        let classified = classify(store, selection);
        let buffer = |readings: Vec<SensorReading>| CategoryBuffer {
            positions: dot_positions(&readings, mode),
            readings,
        };
        DotBuffers {
            selected: buffer(classified.selected),
            hovered: buffer(classified.hovered),
            unselected: buffer(classified.unselected),
            mode,
        }
    }

    /// Reading at `index` of a category buffer.
    pub fn reading(&self, category: DotCategory, index: usize) -> Option<&SensorReading> {
        self.get(category).readings.get(index)
    }

    pub fn total(&self) -> usize {
        DotCategory::ALL.iter().map(|c| self.get(*c).readings.len()).sum()
    }
}

/// One dot mesh entity per category
#[derive(Component)]
pub struct DotLayer(pub DotCategory);

pub struct FloatsPlugin;

impl Plugin for FloatsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FloatStore>()
            .init_resource::<SelectionState>()
            .init_resource::<DotBuffers>()
            .add_systems(Startup, spawn_dot_layers)
            .add_systems(PostUpdate, (rebuild_dot_buffers, rebuild_dot_meshes).chain());
    }
}

fn spawn_dot_layers(
    mut commands: Commands,
    root: Single<Entity, With<SceneRoot>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for category in DotCategory::ALL {
        commands.spawn((
            Mesh3d(meshes.add(build_dot_mesh(&[], 0.0))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: category.color(),
                unlit: true,
                ..default()
            })),
            Transform::default(),
            DotLayer(category),
            Name::new(format!("Dots {category:?}")),
            ChildOf(*root),
        ));
    }
}

/// Classification is redone only when its inputs change.
fn rebuild_dot_buffers(
    store: Res<FloatStore>,
    selection: Res<SelectionState>,
    view: Res<ViewMode>,
    mut buffers: ResMut<DotBuffers>,
) {
    if !(store.is_changed() || selection.is_changed() || view.is_changed()) {
        return;
    }
    *buffers = DotBuffers::rebuild(&store, &selection, view.mode);
}

/// Regenerate dot meshes when the buffers change, or when the flat zoom changes the size.
fn rebuild_dot_meshes(
    buffers: Res<DotBuffers>,
    flat: Res<FlatView>,
    config: Res<AppConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut layers: Query<(&DotLayer, &mut Mesh3d)>,
) {
    let zoom_changed = flat.is_changed() && buffers.mode == ProjectionMode::Flat;
    if !(buffers.is_changed() || zoom_changed) {
        return;
    }
    for (layer, mut mesh) in &mut layers {
        let size = dot_size(
            config.dot_size_globe,
            config.dot_size_flat_px,
            buffers.mode,
            flat.zoom,
            layer.0,
        );
        mesh.0 = meshes.add(build_dot_mesh(&buffers.get(layer.0).positions, size));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiCommand;
    use crate::floats::store::tests::reading;

    #[test]
    fn buffers_stay_index_aligned() {
        let mut store = FloatStore::default();
        let ApiCommand::Snapshot { generation, .. } = store.issue(FloatQuery::Snapshot { year: 2023, limit: 10 }) else {
            panic!("expected snapshot command");
        };
        store.apply(
            generation,
            Ok(vec![reading(1, 10.0, 0.0), reading(2, 20.0, 0.0), reading(3, 30.0, 0.0)]),
        );
        let mut selection = SelectionState::default();
        selection.select(2);

        let buffers = DotBuffers::rebuild(&store, &selection, ProjectionMode::Flat);
        assert_eq!(buffers.total(), 3);
        for category in DotCategory::ALL {
            let b = buffers.get(category);
            assert_eq!(b.readings.len(), b.positions.len());
        }
        assert_eq!(buffers.reading(DotCategory::Selected, 0).map(|r| r.platform_id), Some(2));
        assert!((buffers.selected.positions[0].x - 2.0).abs() < 1e-5);
    }
}
