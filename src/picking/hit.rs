//! Ray to point hit-testing

use bevy::prelude::*;

use crate::floats::{DotBuffers, DotCategory};

/// Nearest dot under a ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DotHit {
    pub category: DotCategory,
    pub index: usize,
    /// Distance along the ray.
    pub t: f32,
}

/// Closest point of `positions` to the ray, if any lies within `threshold` of it and in
/// front of the origin. `direction` must be normalized.
pub fn nearest_on_ray(origin: Vec3, direction: Vec3, positions: &[Vec3], threshold: f32) -> Option<(usize, f32)> {
    let threshold_sq = threshold * threshold;
    let mut best: Option<(usize, f32)> = None;
    for (index, p) in positions.iter().enumerate() {
        let v = *p - origin;
        let t = v.dot(direction);
        if t < 0.0 {
            continue;
        }
        let dist_sq = v.length_squared() - t * t;
        if dist_sq <= threshold_sq && best.is_none_or(|(_, best_t)| t < best_t) {
            best = Some((index, t));
        }
    }
    best
}

/// Nearest hit across all three category buffers combined, by ray distance.
pub fn pick_nearest(origin: Vec3, direction: Vec3, buffers: &DotBuffers, threshold: f32) -> Option<DotHit> {
    DotCategory::ALL
        .iter()
        .filter_map(|&category| {
            nearest_on_ray(origin, direction, &buffers.get(category).positions, threshold)
                .map(|(index, t)| DotHit { category, index, t })
        })
        .min_by(|a, b| a.t.total_cmp(&b.t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::floats::CategoryBuffer;

    fn buffers(selected: Vec<Vec3>, hovered: Vec<Vec3>, unselected: Vec<Vec3>) -> DotBuffers {
        let buffer = |positions: Vec<Vec3>| CategoryBuffer {
            readings: Vec::new(),
            positions,
        };
        DotBuffers {
            selected: buffer(selected),
            hovered: buffer(hovered),
            unselected: buffer(unselected),
            ..default()
        }
    }

    #[test]
    fn misses_outside_threshold() {
        let hit = nearest_on_ray(Vec3::ZERO, Vec3::Z, &[Vec3::new(0.2, 0.0, 5.0)], 0.1);
        assert!(hit.is_none());
    }

    #[test]
    fn ignores_points_behind_the_origin() {
        let hit = nearest_on_ray(Vec3::ZERO, Vec3::Z, &[Vec3::new(0.0, 0.0, -1.0)], 0.1);
        assert!(hit.is_none());
    }

    #[test]
    fn nearest_wins_across_categories() {
        let b = buffers(
            vec![Vec3::new(0.0, 0.0, 8.0)],
            vec![Vec3::new(0.01, 0.0, 6.0)],
            vec![Vec3::new(0.0, 0.02, 7.0), Vec3::new(0.0, 0.0, 3.0)],
        );
        let hit = pick_nearest(Vec3::ZERO, Vec3::Z, &b, 0.05).unwrap();
        assert_eq!(hit.category, DotCategory::Unselected);
        assert_eq!(hit.index, 1);
        assert!((hit.t - 3.0).abs() < 1e-6);
    }

    #[test]
    fn no_points_no_hit() {
        assert!(pick_nearest(Vec3::ZERO, Vec3::Z, &DotBuffers::default(), 1.0).is_none());
    }
}
