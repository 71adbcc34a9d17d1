//! Laser and bullet spawners
//!
//! A spawner is active while any of its sources holds it on:
//! - score engagement (bullets: forever; lasers: during the firing phase of the
//!   duty cycle)
//! - one or more live modifier boosts
//!
//! While active the run state machine keeps exactly one emission chain
//! pending per spawner (see `GameState::fire_hazard`).

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{EntityId, Hazard};
use super::timer::TimerId;
use crate::sample_range;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardKind {
    /// Falls from the top edge
    Laser,
    /// Flies in from the right edge
    Bullet,
}

/// Phase of the score-driven laser cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DutyPhase {
    /// Threshold not reached yet
    Dormant,
    Firing,
    Resting,
}

/// Alternating fire/rest windows; the fire window grows after every rest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyCycle {
    pub phase: DutyPhase,
    /// Length of the current (or next) firing window, seconds
    pub firing_duration: f32,
    pub break_duration: f32,
    /// Completed rests
    pub cycles: u32,
}

#[derive(Debug, Clone)]
pub struct HazardSpawner {
    kind: HazardKind,
    threshold: u32,
    score_engaged: bool,
    boosts: u32,
    duty: Option<DutyCycle>,
    chain: Option<TimerId>,
}

impl HazardSpawner {
    /// Create an idle spawner with a freshly rolled score threshold
    pub fn new<R: Rng + ?Sized>(kind: HazardKind, tuning: &Tuning, rng: &mut R) -> Self {
        let (min, max) = match kind {
            HazardKind::Laser => tuning.laser_threshold,
            HazardKind::Bullet => tuning.bullet_threshold,
        };
        let duty = match kind {
            HazardKind::Laser => Some(DutyCycle {
                phase: DutyPhase::Dormant,
                firing_duration: tuning.laser_duration,
                break_duration: tuning.laser_break_duration,
                cycles: 0,
            }),
            HazardKind::Bullet => None,
        };
        Self {
            kind,
            threshold: rng.random_range(min..=max),
            score_engaged: false,
            boosts: 0,
            duty,
            chain: None,
        }
    }

    /// Score at which this spawner engages on its own
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn is_score_engaged(&self) -> bool {
        self.score_engaged
    }

    pub fn duty(&self) -> Option<&DutyCycle> {
        self.duty.as_ref()
    }

    pub fn is_active(&self) -> bool {
        if self.boosts > 0 {
            return true;
        }
        match &self.duty {
            Some(duty) => duty.phase == DutyPhase::Firing,
            None => self.score_engaged,
        }
    }

    /// True the first time `score` reaches the threshold
    pub fn crosses_threshold(&self, score: u32) -> bool {
        !self.score_engaged && score >= self.threshold
    }

    /// Engage from score. Returns the first firing window for cycled spawners.
    pub fn engage_by_score(&mut self) -> Option<f32> {
        self.score_engaged = true;
        self.duty.as_mut().map(|duty| {
            duty.phase = DutyPhase::Firing;
            duty.firing_duration
        })
    }

    /// Hold the spawner on for one modifier activation
    pub fn boost(&mut self) {
        self.boosts += 1;
    }

    /// Release one modifier hold
    pub fn release_boost(&mut self) {
        self.boosts = self.boosts.saturating_sub(1);
    }

    /// Close the firing window. Returns the rest length.
    pub fn begin_rest(&mut self) -> Option<f32> {
        let duty = self.duty.as_mut()?;
        if duty.phase != DutyPhase::Firing {
            return None;
        }
        duty.phase = DutyPhase::Resting;
        duty.cycles += 1;
        Some(duty.break_duration)
    }

    /// Reopen firing with a longer window. Returns the new window length.
    pub fn resume<R: Rng + ?Sized>(&mut self, growth: (f32, f32), rng: &mut R) -> Option<f32> {
        let duty = self.duty.as_mut()?;
        if duty.phase != DutyPhase::Resting {
            return None;
        }
        duty.firing_duration += sample_range(rng, growth);
        duty.phase = DutyPhase::Firing;
        Some(duty.firing_duration)
    }

    /// Pending emission timer, if a chain is running
    pub fn chain(&self) -> Option<TimerId> {
        self.chain
    }

    pub(super) fn set_chain(&mut self, timer: Option<TimerId>) -> Option<TimerId> {
        std::mem::replace(&mut self.chain, timer)
    }

    /// Seconds until the next emission
    pub fn next_interval<R: Rng + ?Sized>(&self, tuning: &Tuning, rng: &mut R) -> f32 {
        match self.kind {
            HazardKind::Laser => sample_range(rng, tuning.laser_interval),
            HazardKind::Bullet => sample_range(rng, tuning.bullet_interval),
        }
    }

    /// Create one hazard at its entry edge
    pub fn spawn<R: Rng + ?Sized>(&self, id: EntityId, tuning: &Tuning, rng: &mut R) -> Hazard {
        match self.kind {
            HazardKind::Laser => Hazard {
                id,
                kind: HazardKind::Laser,
                pos: Vec2::new(sample_range(rng, (0.0, tuning.screen_width)), 0.0),
                vel: Vec2::new(0.0, tuning.laser_speed),
                size: Vec2::from(tuning.laser_size),
            },
            HazardKind::Bullet => {
                let band = (tuning.bullet_margin, tuning.screen_height - tuning.bullet_margin);
                Hazard {
                    id,
                    kind: HazardKind::Bullet,
                    pos: Vec2::new(tuning.screen_width, sample_range(rng, band)),
                    vel: Vec2::new(-tuning.bullet_speed, 0.0),
                    size: Vec2::splat(tuning.bullet_size),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn spawner(kind: HazardKind) -> HazardSpawner {
        HazardSpawner::new(kind, &Tuning::default(), &mut Pcg32::seed_from_u64(3))
    }

    #[test]
    fn test_starts_inactive() {
        assert!(!spawner(HazardKind::Laser).is_active());
        assert!(!spawner(HazardKind::Bullet).is_active());
    }

    #[test]
    fn test_bullets_stay_on_after_score_engagement() {
        let mut bullets = spawner(HazardKind::Bullet);
        assert!(bullets.crosses_threshold(bullets.threshold()));
        assert_eq!(bullets.engage_by_score(), None);
        assert!(bullets.is_active());
        assert!(!bullets.crosses_threshold(1000));
        assert_eq!(bullets.begin_rest(), None);
        assert!(bullets.is_active());
    }

    #[test]
    fn test_laser_duty_cycle_grows() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let mut lasers = HazardSpawner::new(HazardKind::Laser, &tuning, &mut rng);

        assert_eq!(lasers.engage_by_score(), Some(25.0));
        assert!(lasers.is_active());

        assert_eq!(lasers.begin_rest(), Some(20.0));
        assert!(!lasers.is_active());
        assert_eq!(lasers.begin_rest(), None);

        let growth = tuning.laser_duration_growth;
        let window = lasers.resume(growth, &mut rng).unwrap();
        assert!((35.0..=55.0).contains(&window), "window {window}");
        assert!(lasers.is_active());
        assert_eq!(lasers.duty().unwrap().cycles, 1);

        lasers.begin_rest();
        let longer = lasers.resume(growth, &mut rng).unwrap();
        assert!(longer >= window + 10.0);
    }

    #[test]
    fn test_boost_holds_laser_on_during_rest() {
        let mut lasers = spawner(HazardKind::Laser);
        lasers.engage_by_score();
        lasers.begin_rest();
        lasers.boost();
        assert!(lasers.is_active());
        lasers.release_boost();
        assert!(!lasers.is_active());
        lasers.release_boost();
        assert!(!lasers.is_active());
    }

    #[test]
    fn test_hazards_enter_from_their_edge() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(5);
        let laser = spawner(HazardKind::Laser).spawn(1, &tuning, &mut rng);
        assert_eq!(laser.pos.y, 0.0);
        assert!(laser.vel.y > 0.0 && laser.vel.x == 0.0);

        let bullet = spawner(HazardKind::Bullet).spawn(2, &tuning, &mut rng);
        assert_eq!(bullet.pos.x, tuning.screen_width);
        assert!(bullet.vel.x < 0.0 && bullet.vel.y == 0.0);
    }

    proptest! {
        #[test]
        fn prop_thresholds_within_range(seed in any::<u64>()) {
            let tuning = Tuning::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let lasers = HazardSpawner::new(HazardKind::Laser, &tuning, &mut rng);
            let bullets = HazardSpawner::new(HazardKind::Bullet, &tuning, &mut rng);
            prop_assert!((20..=35).contains(&lasers.threshold()));
            prop_assert!((35..=55).contains(&bullets.threshold()));
        }

        #[test]
        fn prop_intervals_within_range(seed in any::<u64>()) {
            let tuning = Tuning::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let lasers = HazardSpawner::new(HazardKind::Laser, &tuning, &mut rng);
            let bullets = HazardSpawner::new(HazardKind::Bullet, &tuning, &mut rng);
            let l = lasers.next_interval(&tuning, &mut rng);
            let b = bullets.next_interval(&tuning, &mut rng);
            prop_assert!((1.0..=3.0).contains(&l));
            prop_assert!((1.5..=4.0).contains(&b));
        }
    }
}
