//! Coastline layer
//!
//! The boundary dataset is fetched once through the API worker and turned into a point
//! cloud for the active projection. Points are regenerated on every mode switch or fill
//! toggle; the dataset itself is kept.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::PrimitiveTopology;
use bevy::prelude::*;

pub mod points;
pub mod types;

pub use points::{CoastlineSettings, generate_points};
pub use types::{BoundaryDataset, parse_boundary_geojson};

use crate::api::{ApiChannels, ApiCommand};
use crate::config::AppConfig;
use crate::scene::{SceneRoot, ViewMode};

pub const COAST_COLOR: Color = Color::srgb(0.0, 1.0, 0.0);

/// Fetch state of the boundary dataset
#[derive(Resource, Default)]
pub struct BoundaryState {
    pub dataset: Option<BoundaryDataset>,
    pub loading: bool,
    pub error: Option<String>,
}

impl BoundaryState {
    /// Mark a fetch as started. Returns false while another is still in flight.
    pub fn begin(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        self.error = None;
        true
    }

    pub fn apply(&mut self, result: Result<BoundaryDataset, String>) {
        self.loading = false;
        match result {
            Ok(dataset) => {
                info!("[COAST] boundary dataset ready: {} features", dataset.features.len());
                self.dataset = Some(dataset);
                self.error = None;
            }
            Err(err) => {
                warn!("[COAST] boundary fetch failed: {}", err);
                self.error = Some(err);
            }
        }
    }

    /// A retry only makes sense after a failure.
    pub fn needs_retry(&self) -> bool {
        self.error.is_some() && !self.loading
    }
}

/// Marker for the coastline point cloud entity
#[derive(Component)]
pub struct CoastlinePoints;

pub struct CoastlinePlugin;

impl Plugin for CoastlinePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BoundaryState>()
            .add_systems(Startup, (spawn_coastline_entity, request_boundary))
            .add_systems(
                Update,
                (toggle_fill_on_key, retry_boundary_on_key, rebuild_coastline_points).chain(),
            );
    }
}

fn settings_from_config(config: &AppConfig) -> CoastlineSettings {
    CoastlineSettings {
        line_steps: config.coast_line_steps,
        multiline_steps: config.coast_multiline_steps,
        fill_interiors: config.fill_interiors,
        fill_grid_deg: config.fill_grid_deg,
    }
}

fn spawn_coastline_entity(
    mut commands: Commands,
    config: Res<AppConfig>,
    root: Single<Entity, With<SceneRoot>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.insert_resource(settings_from_config(&config));
    commands.spawn((
        Mesh3d(meshes.add(point_cloud_mesh(Vec::new()))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: COAST_COLOR,
            unlit: true,
            ..default()
        })),
        Transform::default(),
        CoastlinePoints,
        Name::new("Coastline"),
        ChildOf(*root),
    ));
}

fn request_boundary(channels: Res<ApiChannels>, config: Res<AppConfig>, mut state: ResMut<BoundaryState>) {
    if state.begin() {
        channels.send(ApiCommand::Boundary {
            source: config.boundary_source.clone(),
        });
    }
}

fn retry_boundary_on_key(
    keys: Res<ButtonInput<KeyCode>>,
    channels: Res<ApiChannels>,
    config: Res<AppConfig>,
    mut state: ResMut<BoundaryState>,
) {
    if keys.just_pressed(KeyCode::KeyR) && state.needs_retry() && state.begin() {
        info!("[COAST] retrying boundary fetch");
        channels.send(ApiCommand::Boundary {
            source: config.boundary_source.clone(),
        });
    }
}

fn toggle_fill_on_key(keys: Res<ButtonInput<KeyCode>>, mut settings: ResMut<CoastlineSettings>) {
    if keys.just_pressed(KeyCode::KeyF) {
        settings.fill_interiors = !settings.fill_interiors;
        info!("[COAST] interior fill {}", if settings.fill_interiors { "on" } else { "off" });
    }
}

/// Regenerate the point cloud when the dataset, projection or fill setting changes.
fn rebuild_coastline_points(
    mut commands: Commands,
    state: Res<BoundaryState>,
    view: Res<ViewMode>,
    settings: Res<CoastlineSettings>,
    mut meshes: ResMut<Assets<Mesh>>,
    entity: Single<Entity, With<CoastlinePoints>>,
) {
    if !(state.is_changed() || view.is_changed() || settings.is_changed()) {
        return;
    }
    let points = match &state.dataset {
        Some(dataset) => generate_points(dataset, view.mode, &settings),
        None => Vec::new(),
    };
    debug!("[COAST] {} points for {}", points.len(), view.mode.label());
    commands.entity(*entity).insert(Mesh3d(meshes.add(point_cloud_mesh(points))));
}

fn point_cloud_mesh(points: Vec<Vec3>) -> Mesh {
    Mesh::new(PrimitiveTopology::PointList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_fetch_can_be_retried_once() {
        let mut state = BoundaryState::default();
        assert!(state.begin());
        assert!(!state.begin());
        state.apply(Err("HTTP 503".into()));
        assert!(state.needs_retry());
        assert!(state.dataset.is_none());

        assert!(state.begin());
        assert!(!state.needs_retry());
        state.apply(Ok(BoundaryDataset::default()));
        assert!(state.dataset.is_some());
        assert!(state.error.is_none());
        assert!(!state.needs_retry());
    }
}
