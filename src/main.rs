use bevy::prelude::*;
use bevy::render::RenderPlugin;
use bevy::render::settings::{RenderCreation, WgpuSettings};
use bevy::window::{PresentMode, Window, WindowPlugin};
use bevy_panorbit_camera::PanOrbitCameraPlugin;

#[cfg(feature = "dev")]
use bevy::dev_tools::fps_overlay::FpsOverlayPlugin;

mod api;
mod camera;
mod coastline;
mod config;
mod core;
mod detail;
mod floats;
mod picking;
mod playback;
mod scene;
mod ui;

use api::ApiPlugin;
use camera::CameraRigPlugin;
use coastline::CoastlinePlugin;
use config::AppConfig;
use detail::DetailPlugin;
use floats::FloatsPlugin;
use picking::PickingPlugin;
use playback::PlaybackPlugin;
use scene::ScenePlugin;
use ui::UiPlugin;

fn main() {
    let mut app = App::new();

    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Float Globe".to_string(),
                    present_mode: PresentMode::AutoVsync,
                    ..default()
                }),
                ..default()
            })
            .set(RenderPlugin {
                render_creation: RenderCreation::Automatic(WgpuSettings { ..default() }),
                ..default()
            }),
    );

    #[cfg(feature = "dev")]
    app.add_plugins(FpsOverlayPlugin::default());

    // Read once, before any plugin's startup systems run.
    app.insert_resource(AppConfig::load());

    app.add_plugins(PanOrbitCameraPlugin)
        .add_plugins((
            ApiPlugin,
            ScenePlugin,
            CameraRigPlugin,
            CoastlinePlugin,
            FloatsPlugin,
            PickingPlugin,
            PlaybackPlugin,
            DetailPlugin,
            UiPlugin,
        ))
        .run();
}
