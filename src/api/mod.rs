//! Float data API integration
//!
//! Fetches float positions, per-float dossiers/paths and the boundary dataset on a
//! background worker, and routes the results into the owning resources.

use bevy::prelude::*;

pub mod client;
pub mod parse;
pub mod types;
pub mod worker;

pub use types::{
    ApiChannels, ApiCommand, ApiResult, DossierRow, FloatDetail, PathPoint, PlatformId,
    SensorReading, TimeWindow,
};
pub use worker::start_api_worker;

use crate::coastline::BoundaryState;
use crate::config::AppConfig;
use crate::detail::DetailState;
use crate::floats::FloatStore;

/// Plugin owning the API worker and its result dispatch
pub struct ApiPlugin;

impl Plugin for ApiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PreStartup, setup_api_worker)
            .add_systems(PreUpdate, apply_api_results);
    }
}

fn setup_api_worker(mut commands: Commands, config: Res<AppConfig>) {
    let channels = start_api_worker(config.api_base_url.clone());
    info!("[INIT] API worker started for {}", config.api_base_url);
    commands.insert_resource(channels);
}

/// Drain worker results into the float store, the detail panel and the boundary layer.
pub fn apply_api_results(
    channels: Option<Res<ApiChannels>>,
    mut store: ResMut<FloatStore>,
    mut detail: ResMut<DetailState>,
    mut boundary: ResMut<BoundaryState>,
) {
    let Some(channels) = channels else { return };
    for msg in channels.drain() {
        match msg {
            ApiResult::Positions { generation, result } => {
                if !store.apply(generation, result) {
                    debug!("[API] dropped stale positions gen={}", generation);
                }
            }
            ApiResult::Detail {
                generation,
                platform_id,
                result,
            } => {
                if !detail.apply(generation, platform_id, result) {
                    debug!("[API] dropped stale detail gen={} platform={}", generation, platform_id);
                }
            }
            ApiResult::Boundary { result } => boundary.apply(result),
        }
    }
}
