//! Time and playback control
//!
//! Keyboard-driven Year/Range selection. The controller's query is mirrored into the
//! float store, and while playing a single timer steps the range sequence one reading at
//! a time.

use bevy::prelude::*;

pub mod controller;

pub use controller::{PlaybackController, RecentActivity, TimeMode};

use crate::api::ApiChannels;
use crate::config::AppConfig;
use crate::floats::FloatStore;

pub struct PlaybackPlugin;

impl Plugin for PlaybackPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RecentActivity>()
            .add_systems(Startup, init_playback)
            .add_systems(
                Update,
                (playback_keys, sync_float_query, retry_float_query, tick_playback).chain(),
            );
    }
}

fn init_playback(mut commands: Commands, config: Res<AppConfig>) {
    commands.insert_resource(PlaybackController::from_config(&config));
}

fn playback_keys(
    keys: Res<ButtonInput<KeyCode>>,
    mut controller: ResMut<PlaybackController>,
    mut recent: ResMut<RecentActivity>,
) {
    if keys.just_pressed(KeyCode::KeyM) {
        controller.toggle_mode();
        recent.clear();
        info!("[PLAYBACK] mode {:?}", controller.mode());
    }
    let range = controller.mode().is_range();
    if keys.just_pressed(KeyCode::ArrowLeft) {
        if range {
            controller.shift_start(-1);
        } else {
            controller.step_year(-1);
        }
    }
    if keys.just_pressed(KeyCode::ArrowRight) {
        if range {
            controller.shift_start(1);
        } else {
            controller.step_year(1);
        }
    }
    if range && keys.just_pressed(KeyCode::ArrowDown) {
        controller.shift_end(-1);
    }
    if range && keys.just_pressed(KeyCode::ArrowUp) {
        controller.shift_end(1);
    }
    if keys.just_pressed(KeyCode::Space) {
        controller.toggle_play();
        info!("[PLAYBACK] playing={}", controller.is_playing());
    }
    if keys.any_just_pressed([KeyCode::Equal, KeyCode::NumpadAdd]) {
        controller.change_speed(true);
        info!("[PLAYBACK] frame period {:?}", controller.frame_period());
    }
    if keys.any_just_pressed([KeyCode::Minus, KeyCode::NumpadSubtract]) {
        controller.change_speed(false);
        info!("[PLAYBACK] frame period {:?}", controller.frame_period());
    }
}

/// Issue a new float query whenever the controller's parameters differ from the store's.
fn sync_float_query(controller: Res<PlaybackController>, mut store: ResMut<FloatStore>, channels: Res<ApiChannels>) {
    let wanted = controller.query();
    if store.query() == Some(wanted) {
        return;
    }
    let cmd = store.issue(wanted);
    info!("[PLAYBACK] query {:?} gen={}", wanted, store.generation());
    channels.send(cmd);
}

fn retry_float_query(keys: Res<ButtonInput<KeyCode>>, mut store: ResMut<FloatStore>, channels: Res<ApiChannels>) {
    if !keys.just_pressed(KeyCode::KeyR) || store.error.is_none() || store.loading {
        return;
    }
    if let Some(cmd) = store.reissue() {
        info!("[PLAYBACK] retrying float query gen={}", store.generation());
        channels.send(cmd);
    }
}

fn tick_playback(
    time: Res<Time>,
    mut controller: ResMut<PlaybackController>,
    mut store: ResMut<FloatStore>,
    mut recent: ResMut<RecentActivity>,
) {
    if !controller.is_playing() || !controller.tick(time.delta()) {
        return;
    }
    if let Some(reading) = store.advance_frame() {
        recent.push(reading.clone());
    }
}
