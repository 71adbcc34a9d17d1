//! Modifier table and pickup spawning
//!
//! A pickup carries one [`ModifierKind`], chosen by weight when it spawns.
//! Activation and expiry mutate the session, so they live with the run state
//! machine in `tick.rs`; this module only describes what each kind does.

use glam::Vec2;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};

use super::hazards::HazardKind;
use super::state::{EntityId, Pickup, ScoreMultiplier};
use crate::sample_range;
use crate::tuning::Tuning;

/// Every rule change a pickup can grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModifierKind {
    QuarterSpeed,
    HalfSpeed,
    Immunity,
    DoubleSpeed,
    SpawnLasers,
    SpawnBullets,
    DoubleScore,
    TripleScore,
}

/// What activating a modifier does
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModifierEffect {
    /// Multiply scroll speed by the factor
    ScaleSpeed(f32),
    /// Refill immunity charges (no timer)
    Immunity,
    /// Force a hazard spawner on
    EnableHazard(HazardKind),
    /// Replace the score multiplier
    ScoreMultiplier(ScoreMultiplier),
}

/// How to undo one activation when its timer fires.
///
/// Stored in the expiry timer so each activation reverses exactly what it did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Reversal {
    DivideSpeed(f32),
    DisableHazard(HazardKind),
    ResetMultiplier,
}

impl ModifierKind {
    pub const ALL: [ModifierKind; 8] = [
        ModifierKind::QuarterSpeed,
        ModifierKind::HalfSpeed,
        ModifierKind::Immunity,
        ModifierKind::DoubleSpeed,
        ModifierKind::SpawnLasers,
        ModifierKind::SpawnBullets,
        ModifierKind::DoubleScore,
        ModifierKind::TripleScore,
    ];

    /// Relative selection weight (proportional, need not sum to 1)
    pub fn weight(&self) -> f32 {
        match self {
            ModifierKind::QuarterSpeed => 0.25,
            ModifierKind::HalfSpeed => 0.25,
            ModifierKind::Immunity => 0.10,
            ModifierKind::DoubleSpeed => 0.25,
            ModifierKind::SpawnLasers => 0.23,
            ModifierKind::SpawnBullets => 0.23,
            ModifierKind::DoubleScore => 0.10,
            ModifierKind::TripleScore => 0.05,
        }
    }

    /// Seconds until expiry (0 = charge-based, never expires on time)
    pub fn duration(&self) -> f32 {
        match self {
            ModifierKind::QuarterSpeed => 15.0,
            ModifierKind::HalfSpeed => 10.0,
            ModifierKind::Immunity => 0.0,
            ModifierKind::DoubleSpeed => 7.0,
            ModifierKind::SpawnLasers => 5.0,
            ModifierKind::SpawnBullets => 5.0,
            ModifierKind::DoubleScore => 10.0,
            ModifierKind::TripleScore => 10.0,
        }
    }

    pub fn effect(&self) -> ModifierEffect {
        match self {
            ModifierKind::QuarterSpeed => ModifierEffect::ScaleSpeed(0.25),
            ModifierKind::HalfSpeed => ModifierEffect::ScaleSpeed(0.5),
            ModifierKind::Immunity => ModifierEffect::Immunity,
            ModifierKind::DoubleSpeed => ModifierEffect::ScaleSpeed(2.0),
            ModifierKind::SpawnLasers => ModifierEffect::EnableHazard(HazardKind::Laser),
            ModifierKind::SpawnBullets => ModifierEffect::EnableHazard(HazardKind::Bullet),
            ModifierKind::DoubleScore => ModifierEffect::ScoreMultiplier(ScoreMultiplier::Double),
            ModifierKind::TripleScore => ModifierEffect::ScoreMultiplier(ScoreMultiplier::Triple),
        }
    }

    /// Banner text shown on activation
    pub fn label(&self) -> &'static str {
        match self {
            ModifierKind::QuarterSpeed => "QUARTER SPEED!",
            ModifierKind::HalfSpeed => "HALF SPEED!",
            ModifierKind::Immunity => "IMMUNITY",
            ModifierKind::DoubleSpeed => "DOUBLE SPEED!",
            ModifierKind::SpawnLasers => "LASERS ACTIVE!",
            ModifierKind::SpawnBullets => "BULLETS ACTIVE!",
            ModifierKind::DoubleScore => "DOUBLE SCORE!",
            ModifierKind::TripleScore => "TRIPLE SCORE!",
        }
    }
}

/// Build a weighted index, or `None` if the weights are empty, negative or all zero
pub fn weighted_index(weights: &[f32]) -> Option<WeightedIndex<f32>> {
    WeightedIndex::new(weights.iter().copied()).ok()
}

/// Weighted chooser over [`ModifierKind::ALL`]
#[derive(Debug, Clone)]
pub struct ModifierTable {
    index: WeightedIndex<f32>,
}

impl Default for ModifierTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ModifierTable {
    /// # Panics
    ///
    /// If the built-in weight table is malformed.
    pub fn new() -> Self {
        let weights = ModifierKind::ALL.map(|kind| kind.weight());
        let Some(index) = weighted_index(&weights) else {
            panic!("modifier weight table is malformed: {weights:?}");
        };
        Self { index }
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> ModifierKind {
        ModifierKind::ALL[self.index.sample(rng)]
    }
}

/// Create a pickup at the right screen edge, inside the pickup band
pub fn spawn_pickup<R: Rng + ?Sized>(
    id: EntityId,
    kind: ModifierKind,
    speed: f32,
    tuning: &Tuning,
    rng: &mut R,
) -> Pickup {
    let band = (
        tuning.pickup_band_top,
        tuning.screen_height - tuning.pickup_band_bottom,
    );
    let y = sample_range(rng, band);
    let drift_dir = rng.random_range(-1..=1) as f32;

    Pickup {
        id,
        kind,
        pos: Vec2::new(tuning.screen_width, y),
        // Fixed at spawn: later speed changes do not affect live pickups
        speed_x: speed * tuning.pickup_speed_factor,
        drift_dir,
        size: tuning.pickup_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_only_immunity_is_untimed() {
        for kind in ModifierKind::ALL {
            if kind == ModifierKind::Immunity {
                assert_eq!(kind.duration(), 0.0);
            } else {
                assert!(kind.duration() > 0.0, "{kind:?} should expire");
            }
        }
    }

    #[test]
    fn test_speed_factors_are_exactly_invertible() {
        for kind in ModifierKind::ALL {
            if let ModifierEffect::ScaleSpeed(factor) = kind.effect() {
                let speed = 187.0_f32;
                assert_eq!(speed * factor / factor, speed);
            }
        }
    }

    #[test]
    fn test_malformed_weights_rejected() {
        assert!(weighted_index(&[]).is_none());
        assert!(weighted_index(&[0.0, 0.0]).is_none());
        assert!(weighted_index(&[1.0, -0.5]).is_none());
        assert!(weighted_index(&[0.25, 0.1]).is_some());
    }

    #[test]
    fn test_choice_frequencies_follow_weights() {
        let table = ModifierTable::new();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut counts = [0u32; 8];
        let draws = 20_000;
        for _ in 0..draws {
            let kind = table.choose(&mut rng);
            let slot = ModifierKind::ALL.iter().position(|k| *k == kind).unwrap();
            counts[slot] += 1;
        }
        let total_weight: f32 = ModifierKind::ALL.iter().map(|k| k.weight()).sum();
        for (slot, kind) in ModifierKind::ALL.iter().enumerate() {
            let expected = kind.weight() / total_weight;
            let observed = counts[slot] as f32 / draws as f32;
            assert!(
                (observed - expected).abs() < 0.02,
                "{kind:?}: observed {observed}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_pickup_speed_fixed_at_spawn() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let pickup = spawn_pickup(9, ModifierKind::HalfSpeed, 160.0, &tuning, &mut rng);
        assert!((pickup.speed_x - 352.0).abs() < 1e-3);
        assert_eq!(pickup.pos.x, tuning.screen_width);
        assert_eq!(pickup.kind, ModifierKind::HalfSpeed);
    }

    proptest! {
        #[test]
        fn prop_pickup_spawns_inside_band(seed in any::<u64>()) {
            let tuning = Tuning::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let pickup = spawn_pickup(1, ModifierKind::Immunity, 200.0, &tuning, &mut rng);
            prop_assert!(pickup.pos.y >= tuning.pickup_band_top);
            let band_bottom = tuning.screen_height - tuning.pickup_band_bottom;
            prop_assert!(pickup.pos.y <= band_bottom);
            prop_assert!([-1.0, 0.0, 1.0].contains(&pickup.drift_dir));
        }
    }
}
