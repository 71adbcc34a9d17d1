//! Game state and core simulation types
//!
//! `GameState` is the run state machine's storage. Its transitions live in
//! `tick.rs`; the `Session` inside it is only mutated from there.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::banner::{Banner, BannerText};
use super::collision::Aabb;
use super::hazards::{HazardKind, HazardSpawner};
use super::modifiers::{ModifierKind, ModifierTable, Reversal};
use super::timer::TimerQueue;
use crate::audio::SoundCue;
use crate::highscores::HighScoreStore;
use crate::tuning::Tuning;

/// Entity identifier. Allocated in spawn order, so ids also order contacts.
pub type EntityId = u32;

/// Run lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Player hovers, nothing spawns, waiting for the first flap
    Idle,
    /// Full simulation
    Active,
    /// Terminal until restart
    Ended,
}

/// Score multiplier; only these three values exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScoreMultiplier {
    #[default]
    Single,
    Double,
    Triple,
}

impl ScoreMultiplier {
    pub fn factor(&self) -> u32 {
        match self {
            ScoreMultiplier::Single => 1,
            ScoreMultiplier::Double => 2,
            ScoreMultiplier::Triple => 3,
        }
    }
}

/// Mutable per-run record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub(super) generation: u32,
    pub(super) state: RunState,
    pub(super) score: u32,
    pub(super) speed: f32,
    pub(super) base_speed: f32,
    pub(super) score_multiplier: ScoreMultiplier,
    pub(super) immunity_charges: u32,
    /// Live activations per kind (the same kind may be picked up twice)
    pub(super) active_modifiers: BTreeMap<ModifierKind, u32>,
}

impl Session {
    pub fn new(generation: u32, base_speed: f32) -> Self {
        Self {
            generation,
            state: RunState::Idle,
            score: 0,
            speed: base_speed,
            base_speed,
            score_multiplier: ScoreMultiplier::Single,
            immunity_charges: 0,
            active_modifiers: BTreeMap::new(),
        }
    }

    /// Run counter for this process, bumped on every restart
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Current scroll speed (pixels/s)
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn base_speed(&self) -> f32 {
        self.base_speed
    }

    pub fn score_multiplier(&self) -> ScoreMultiplier {
        self.score_multiplier
    }

    pub fn immunity_charges(&self) -> u32 {
        self.immunity_charges
    }

    pub fn is_modifier_active(&self, kind: ModifierKind) -> bool {
        self.active_modifiers.contains_key(&kind)
    }

    pub fn has_active_modifiers(&self) -> bool {
        !self.active_modifiers.is_empty()
    }

    /// Active kinds in declaration order
    pub fn active_modifiers(&self) -> impl Iterator<Item = ModifierKind> + '_ {
        self.active_modifiers.keys().copied()
    }

    pub(super) fn add_modifier(&mut self, kind: ModifierKind) {
        *self.active_modifiers.entry(kind).or_insert(0) += 1;
    }

    pub(super) fn remove_modifier(&mut self, kind: ModifierKind) {
        if let Some(count) = self.active_modifiers.get_mut(&kind) {
            *count -= 1;
            if *count == 0 {
                self.active_modifiers.remove(&kind);
            }
        }
    }

    /// Overwrite (not add to) the immunity charges
    pub(super) fn grant_immunity(&mut self, charges: u32) {
        self.immunity_charges = charges;
        if charges > 0 {
            self.active_modifiers.insert(ModifierKind::Immunity, 1);
        } else {
            self.active_modifiers.remove(&ModifierKind::Immunity);
        }
    }

    /// Spend one charge. Returns false if there was none.
    pub(super) fn consume_immunity_charge(&mut self) -> bool {
        if self.immunity_charges == 0 {
            return false;
        }
        self.immunity_charges -= 1;
        if self.immunity_charges == 0 {
            self.active_modifiers.remove(&ModifierKind::Immunity);
        }
        true
    }
}

/// The player-controlled flapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Fixed horizontal position (center)
    pub x: f32,
    /// Vertical position (center, screen y grows downward)
    pub y: f32,
    pub velocity_y: f32,
    /// Clock time of the last accepted flap
    pub last_flap_time: Option<f64>,
    pub size: Vec2,
}

impl Player {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            x: tuning.player_x,
            y: tuning.player_start_y,
            velocity_y: 0.0,
            last_flap_time: None,
            size: Vec2::from(tuning.player_size),
        }
    }

    /// Semi-implicit Euler step. No clamping: leaving the screen ends the run.
    pub fn integrate(&mut self, dt: f32, gravity: f32) {
        self.velocity_y += gravity * dt;
        self.y += self.velocity_y * dt;
    }

    /// Unconditional flap (used for the run-starting flap)
    pub fn flap(&mut self, now: f64, impulse: f32) {
        self.velocity_y = -impulse;
        self.last_flap_time = Some(now);
    }

    /// Flap unless still cooling down from the last accepted flap
    pub fn try_flap(&mut self, now: f64, impulse: f32, cooldown: f32) -> bool {
        if let Some(last) = self.last_flap_time {
            if now - last < cooldown as f64 {
                return false;
            }
        }
        self.flap(now, impulse);
        true
    }

    pub fn hitbox(&self) -> Aabb {
        Aabb::from_center(Vec2::new(self.x, self.y), self.size)
    }

    pub fn is_out_of_bounds(&self, screen_height: f32, margin: f32) -> bool {
        self.y > screen_height + margin || self.y < -margin
    }
}

/// A pipe pair sharing one x and one vertical gap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: EntityId,
    /// Left edge
    pub x: f32,
    pub width: f32,
    pub gap_center_y: f32,
    pub gap: f32,
    /// Scoring latch, flips once
    pub passed: bool,
    /// Player overlapped this pair last tick
    pub touching: bool,
}

impl Obstacle {
    /// Upper edge of the gap (bottom of the upper piece)
    pub fn gap_min_y(&self) -> f32 {
        self.gap_center_y - self.gap / 2.0
    }

    /// Lower edge of the gap (top of the lower piece)
    pub fn gap_max_y(&self) -> f32 {
        self.gap_center_y + self.gap / 2.0
    }
}

/// A lethal moving entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hazard {
    pub id: EntityId,
    pub kind: HazardKind,
    /// Center
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
}

/// A floating modifier pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: EntityId,
    pub kind: ModifierKind,
    /// Center
    pub pos: Vec2,
    /// Leftward speed, fixed at spawn
    pub speed_x: f32,
    /// Vertical drift direction: -1, 0 or 1
    pub drift_dir: f32,
    pub size: f32,
}

/// Everything the host needs to react to, drained once per frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RunStarted { generation: u32 },
    /// Accepted flap (hosts tilt the sprite)
    Flapped,
    Sound(SoundCue),
    ObstaclePassed { id: EntityId, score: u32 },
    PickupSpawned { id: EntityId, kind: ModifierKind },
    ModifierActivated(ModifierKind),
    ModifierExpired(ModifierKind),
    HazardEngaged(HazardKind),
    ImmunityAbsorbed { remaining: u32 },
    /// Scene transition: show the game-over screen
    RunEnded {
        score: u32,
        high_score: u32,
        new_best: bool,
    },
}

/// Timer payloads
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    SpawnObstacle,
    SpawnPickup,
    EmitHazard(HazardKind),
    LaserDutyEnd,
    LaserDutyResume,
    ModifierExpired {
        kind: ModifierKind,
        reversal: Reversal,
    },
    HideBanner(BannerText),
}

/// Complete game state (deterministic for a given seed and input sequence)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed the RNG was created from
    pub seed: u64,
    pub(super) tuning: Tuning,
    pub(super) session: Session,
    pub(super) high_score: HighScoreStore,
    pub(super) player: Player,
    /// Live entities, each sorted by id
    pub(super) obstacles: Vec<Obstacle>,
    pub(super) hazards: Vec<Hazard>,
    pub(super) pickups: Vec<Pickup>,
    pub(super) lasers: HazardSpawner,
    pub(super) bullets: HazardSpawner,
    pub(super) modifier_table: ModifierTable,
    pub(super) banner: Banner,
    pub(super) timers: TimerQueue<TimerEvent>,
    pub(super) rng: Pcg32,
    pub(super) events: Vec<GameEvent>,
    next_id: EntityId,
}

impl GameState {
    /// Create a new game state in `Idle` with the given seed.
    ///
    /// Tuning that fails validation is replaced by the defaults.
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let tuning = match tuning.validate() {
            Ok(()) => tuning,
            Err(e) => {
                log::warn!("Rejected tuning ({}), using defaults", e);
                Tuning::default()
            }
        };
        let mut rng = Pcg32::seed_from_u64(seed);
        let lasers = HazardSpawner::new(HazardKind::Laser, &tuning, &mut rng);
        let bullets = HazardSpawner::new(HazardKind::Bullet, &tuning, &mut rng);
        Self {
            seed,
            session: Session::new(0, tuning.base_speed),
            high_score: HighScoreStore::new(),
            player: Player::new(&tuning),
            obstacles: Vec::new(),
            hazards: Vec::new(),
            pickups: Vec::new(),
            lasers,
            bullets,
            modifier_table: ModifierTable::new(),
            banner: Banner::default(),
            timers: TimerQueue::new(),
            rng,
            events: Vec::new(),
            next_id: 1,
            tuning,
        }
    }

    /// Allocate a new entity ID
    pub(super) fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn run_state(&self) -> RunState {
        self.session.state
    }

    pub fn high_score(&self) -> &HighScoreStore {
        &self.high_score
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    pub fn banner(&self) -> &Banner {
        &self.banner
    }

    pub fn spawner(&self, kind: HazardKind) -> &HazardSpawner {
        match kind {
            HazardKind::Laser => &self.lasers,
            HazardKind::Bullet => &self.bullets,
        }
    }

    /// Seconds since the run started (0 while idle)
    pub fn clock(&self) -> f64 {
        self.timers.now()
    }

    /// Events emitted since the last drain, oldest first
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_idle() {
        let state = GameState::new(7, Tuning::default());
        assert_eq!(state.run_state(), RunState::Idle);
        assert_eq!(state.session().speed(), state.tuning().base_speed);
        assert_eq!(state.clock(), 0.0);
    }

    #[test]
    fn test_reversed_threshold_falls_back_to_defaults() {
        let tuning = Tuning {
            laser_threshold: (35, 20),
            ..Default::default()
        };
        let state = GameState::new(7, tuning);
        assert_eq!(state.tuning(), &Tuning::default());
        let threshold = state.spawner(HazardKind::Laser).threshold();
        assert!((20..=35).contains(&threshold));
    }

    #[test]
    fn test_immunity_charges_clear_the_kind() {
        let mut session = Session::new(0, 160.0);
        session.grant_immunity(2);
        assert!(session.is_modifier_active(ModifierKind::Immunity));
        assert!(session.consume_immunity_charge());
        assert!(session.consume_immunity_charge());
        assert!(!session.consume_immunity_charge());
        assert!(!session.is_modifier_active(ModifierKind::Immunity));
    }
}
