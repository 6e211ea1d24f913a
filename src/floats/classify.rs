//! Selection state, dot categories and sizing

use bevy::prelude::*;

use crate::api::{PlatformId, SensorReading};
use crate::core::coordinates::ProjectionMode;
use crate::floats::store::FloatStore;

/// Hovered and selected platform. Selection takes precedence: the hovered id is never
/// equal to the selected id.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: Option<PlatformId>,
    hovered: Option<PlatformId>,
}

impl SelectionState {
    pub fn selected(&self) -> Option<PlatformId> {
        self.selected
    }

    pub fn hovered(&self) -> Option<PlatformId> {
        self.hovered
    }

    pub fn select(&mut self, platform_id: PlatformId) {
        self.selected = Some(platform_id);
        if self.hovered == Some(platform_id) {
            self.hovered = None;
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Apply a hover candidate from picking. Hitting the selected platform leaves the
    /// hover untouched, hitting nothing clears it.
    pub fn hover(&mut self, candidate: Option<PlatformId>) {
        match candidate {
            None => self.hovered = None,
            Some(id) if Some(id) == self.selected => {}
            Some(id) => self.hovered = Some(id),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DotCategory {
    Selected,
    Hovered,
    Unselected,
}

impl DotCategory {
    pub const ALL: [DotCategory; 3] = [DotCategory::Selected, DotCategory::Hovered, DotCategory::Unselected];

    pub fn color(self) -> Color {
        match self {
            DotCategory::Selected => Color::srgb_u8(0x8a, 0x2b, 0xe2),
            DotCategory::Hovered => Color::srgb_u8(0xff, 0x66, 0x00),
            DotCategory::Unselected => Color::srgb_u8(0xff, 0xff, 0x00),
        }
    }
}

/// The working set split by category
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Classified {
    pub selected: Vec<SensorReading>,
    pub hovered: Vec<SensorReading>,
    pub unselected: Vec<SensorReading>,
}

impl Classified {
    pub fn len(&self) -> usize {
        self.selected.len() + self.hovered.len() + self.unselected.len()
    }
}

/// Partition the visible readings.
///
/// With a selection in range mode the whole range track of the selected platform is
/// returned as `selected`, ignoring the playback frame, and the other buckets are empty.
pub fn classify(store: &FloatStore, selection: &SelectionState) -> Classified {
    if store.is_range()
        && let Some(selected) = selection.selected()
    {
        return Classified {
            selected: store.platform_track(selected).cloned().collect(),
            ..default()
        };
    }

    let mut out = Classified::default();
    for reading in store.visible() {
        let id = Some(reading.platform_id);
        if id == selection.selected() {
            out.selected.push(reading.clone());
        } else if id == selection.hovered() {
            out.hovered.push(reading.clone());
        } else {
            out.unselected.push(reading.clone());
        }
    }
    out
}

/// Flat-map dot size limits, pixels.
pub const FLAT_MIN_PX: f32 = 2.0;
pub const FLAT_MAX_PX: f32 = 14.0;
/// Orthographic zoom at which the flat base size applies unscaled.
pub const FLAT_ZOOM_REFERENCE: f32 = 120.0;

/// World-space size of one dot.
///
/// Globe: `globe_base`, hovered 1.3x, selected 1.5x. Flat: `flat_base_px` scaled with the
/// orthographic zoom and clamped in pixels, hovered not enlarged, selected 1.5x; then
/// divided by the zoom to get world units.
pub fn dot_size(globe_base: f32, flat_base_px: f32, mode: ProjectionMode, zoom: f32, category: DotCategory) -> f32 {
    match mode {
        ProjectionMode::Globe => {
            globe_base
                * match category {
                    DotCategory::Selected => 1.5,
                    DotCategory::Hovered => 1.3,
                    DotCategory::Unselected => 1.0,
                }
        }
        ProjectionMode::Flat => {
            let zoom = zoom.max(f32::EPSILON);
            let px = (flat_base_px * zoom / FLAT_ZOOM_REFERENCE).clamp(FLAT_MIN_PX, FLAT_MAX_PX);
            let px = match category {
                DotCategory::Selected => px * 1.5,
                DotCategory::Hovered | DotCategory::Unselected => px,
            };
            px / zoom
        }
    }
}
