//! Heads-up display
//!
//! Two text overlays: the status panel on the left and the float detail panel on the
//! right, hidden while nothing is selected.

use bevy::prelude::*;

pub mod panels;

pub use panels::{StatusView, detail_text, status_text};

use crate::coastline::BoundaryState;
use crate::detail::DetailState;
use crate::floats::{FloatStore, SelectionState};
use crate::playback::{PlaybackController, RecentActivity};
use crate::scene::ViewMode;

const HUD_FONT_SIZE: f32 = 14.0;
const HUD_MARGIN_PX: f32 = 10.0;
const DETAIL_WIDTH_PX: f32 = 300.0;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_hud)
            .add_systems(PostUpdate, (update_status_panel, update_detail_panel));
    }
}

#[derive(Component)]
struct StatusText;

#[derive(Component)]
struct DetailText;

fn setup_hud(mut commands: Commands) {
    commands.spawn((
        Text::new("Loading..."),
        TextFont {
            font_size: HUD_FONT_SIZE,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(HUD_MARGIN_PX),
            left: Val::Px(HUD_MARGIN_PX),
            ..default()
        },
        StatusText,
    ));

    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: HUD_FONT_SIZE,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(HUD_MARGIN_PX),
            right: Val::Px(HUD_MARGIN_PX),
            width: Val::Px(DETAIL_WIDTH_PX),
            padding: UiRect::all(Val::Px(8.0)),
            ..default()
        },
        BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)),
        Visibility::Hidden,
        DetailText,
    ));
}

fn update_status_panel(
    view: Res<ViewMode>,
    controller: Res<PlaybackController>,
    store: Res<FloatStore>,
    boundary: Res<BoundaryState>,
    selection: Res<SelectionState>,
    recent: Res<RecentActivity>,
    mut text: Single<&mut Text, With<StatusText>>,
) {
    let changed = view.is_changed()
        || controller.is_changed()
        || store.is_changed()
        || boundary.is_changed()
        || selection.is_changed()
        || recent.is_changed();
    if !changed {
        return;
    }
    ***text = status_text(&StatusView {
        mode: view.mode,
        controller: &controller,
        store: &store,
        boundary: &boundary,
        selection: &selection,
        recent: &recent,
    });
}

fn update_detail_panel(
    detail: Res<DetailState>,
    panel: Single<(&mut Text, &mut Visibility), With<DetailText>>,
) {
    if !detail.is_changed() {
        return;
    }
    let (mut text, mut visibility) = panel.into_inner();
    match detail_text(&detail) {
        Some(body) => {
            **text = body;
            *visibility = Visibility::Inherited;
        }
        None => *visibility = Visibility::Hidden,
    }
}
