//! Horizontal scene offset that makes room for the detail panel

/// Offset of the scene root on the flat map while the panel is open, towards -X.
pub const FLAT_PANEL_OFFSET: f32 = 6.0;
/// Convergence rate of the offset tween, per second.
pub const OFFSET_RATE: f32 = 6.0;

/// Target x offset of the scene root. The globe relies on the fly-to side shift instead.
pub fn panel_offset_target(panel_open: bool, globe: bool) -> f32 {
    if panel_open && !globe { -FLAT_PANEL_OFFSET } else { 0.0 }
}

/// Exponential approach of `current` towards `target`, frame-rate independent.
pub fn ease_offset(current: f32, target: f32, dt: f32) -> f32 {
    let next = current + (target - current) * (1.0 - (-OFFSET_RATE * dt).exp());
    if (target - next).abs() < 1e-4 { target } else { next }
}
