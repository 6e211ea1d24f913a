//! Click versus drag discrimination for one pointer

use bevy::prelude::*;

use crate::picking::FloatSelected;

/// Screen-space movement, in logical pixels, beyond which a press becomes a drag.
pub const DRAG_THRESHOLD_PX: f32 = 6.0;

/// Press state of the primary mouse button.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub enum PressGesture {
    #[default]
    Idle,
    Pressed {
        start: Vec2,
        /// Dot under the cursor when the button went down.
        hit: Option<FloatSelected>,
        dragged: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureOutcome {
    /// Released without moving, over a dot.
    Click(FloatSelected),
    /// Released without moving over empty space.
    Tap,
    /// The press turned into a camera drag.
    Drag,
    /// Release without a matching press.
    Ignored,
}

impl PressGesture {
    pub fn press(&mut self, position: Vec2, hit: Option<FloatSelected>) {
        *self = PressGesture::Pressed {
            start: position,
            hit,
            dragged: false,
        };
    }

    pub fn moved(&mut self, position: Vec2) {
        if let PressGesture::Pressed { start, dragged, .. } = self
            && start.distance(position) > DRAG_THRESHOLD_PX
        {
            *dragged = true;
        }
    }

    pub fn release(&mut self, position: Vec2) -> GestureOutcome {
        self.moved(position);
        let outcome = match *self {
            PressGesture::Idle => GestureOutcome::Ignored,
            PressGesture::Pressed { dragged: true, .. } => GestureOutcome::Drag,
            PressGesture::Pressed { hit: Some(hit), .. } => GestureOutcome::Click(hit),
            PressGesture::Pressed { hit: None, .. } => GestureOutcome::Tap,
        };
        *self = PressGesture::Idle;
        outcome
    }

    pub fn is_pressed(&self) -> bool {
        matches!(self, PressGesture::Pressed { .. })
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, PressGesture::Pressed { dragged: true, .. })
    }
}
