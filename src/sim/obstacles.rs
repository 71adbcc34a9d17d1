//! Pipe pair generation

use rand::Rng;

use super::state::{EntityId, Obstacle};
use crate::sample_range;
use crate::tuning::Tuning;

/// Gap before jitter: shrinks with score down to `gap_min`
pub fn gap_floor(score: u32, tuning: &Tuning) -> f32 {
    (tuning.gap_base - tuning.gap_reduction * score as f32).max(tuning.gap_min)
}

/// Gap for a new pair. The floor is applied first, then jitter, so the
/// result can dip up to `gap_jitter` below `gap_min`.
pub fn roll_gap<R: Rng + ?Sized>(score: u32, tuning: &Tuning, rng: &mut R) -> f32 {
    gap_floor(score, tuning) + sample_range(rng, (-tuning.gap_jitter, tuning.gap_jitter))
}

/// New pair at the right edge, gap centered near mid-screen
pub fn spawn_obstacle<R: Rng + ?Sized>(
    id: EntityId,
    score: u32,
    tuning: &Tuning,
    rng: &mut R,
) -> Obstacle {
    let offset = sample_range(rng, (-tuning.gap_offset_jitter, tuning.gap_offset_jitter));
    let gap = roll_gap(score, tuning, rng);
    Obstacle {
        id,
        x: tuning.screen_width,
        width: tuning.obstacle_width,
        gap_center_y: tuning.center_y() + offset,
        gap,
        passed: false,
        touching: false,
    }
}
