//! Run state machine
//!
//! Owns every transition of `GameState`: start, flap, per-tick simulation,
//! scoring, modifier activation/expiry, lethal contact resolution, end and
//! restart. All other sim modules only compute; this is where the session is
//! mutated.

use super::banner::{Banner, BannerText};
use super::collision::{Contact, detect_contacts};
use super::hazards::{HazardKind, HazardSpawner};
use super::modifiers::{ModifierEffect, ModifierKind, Reversal, spawn_pickup};
use super::motion::{MotionContext, advance_all, retire_offscreen};
use super::obstacles::spawn_obstacle;
use super::state::{
    EntityId, GameEvent, GameState, Player, RunState, ScoreMultiplier, Session, TimerEvent,
};
use super::timer::Fired;
use crate::audio::SoundCue;
use crate::consts::SIM_DT;
use crate::sample_range;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// The single "activate" input (key, click or tap)
    pub flap: bool,
}

/// Advance the game state by one frame of `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.flap {
        state.on_flap();
    }
    state.on_tick(dt);
}

impl GameState {
    /// Activate input. Starts the run when idle, flaps when active.
    /// Returns true if the input had an effect.
    pub fn on_flap(&mut self) -> bool {
        match self.session.state {
            RunState::Idle => {
                self.start_run();
                true
            }
            RunState::Active => {
                let now = self.timers.now();
                let (impulse, cooldown) = (self.tuning.flap_impulse, self.tuning.flap_cooldown);
                let accepted = self.player.try_flap(now, impulse, cooldown);
                if accepted {
                    self.events.push(GameEvent::Flapped);
                    self.events.push(GameEvent::Sound(SoundCue::Flap));
                }
                accepted
            }
            RunState::Ended => false,
        }
    }

    fn start_run(&mut self) {
        self.session.state = RunState::Active;
        let obstacle_interval = self.tuning.obstacle_interval as f64;
        self.timers
            .schedule_repeating(obstacle_interval, TimerEvent::SpawnObstacle);
        let first_pickup = self.tuning.pickup_first_delay as f64;
        self.timers
            .schedule_once(first_pickup, TimerEvent::SpawnPickup);

        let now = self.timers.now();
        self.player.flap(now, self.tuning.flap_impulse);
        self.events.push(GameEvent::RunStarted {
            generation: self.session.generation,
        });
        self.events.push(GameEvent::Flapped);
        self.events.push(GameEvent::Sound(SoundCue::Flap));
        log::info!(
            "Run {} started (seed {}, laser threshold {}, bullet threshold {})",
            self.session.generation,
            self.seed,
            self.lasers.threshold(),
            self.bullets.threshold()
        );
    }

    /// Advance the simulation by `dt` seconds. Does nothing unless active.
    ///
    /// Spans longer than `SIM_DT` run as equal substeps no longer than
    /// `SIM_DT`, so every timer fires on its own step.
    pub fn on_tick(&mut self, dt: f32) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }
        let substeps = (dt / SIM_DT).ceil().max(1.0) as u32;
        let step = dt / substeps as f32;
        for _ in 0..substeps {
            if self.session.state != RunState::Active {
                break;
            }
            self.step(step);
        }
    }

    /// Order within a step: due timers, player integration, entity motion,
    /// pass scoring, off-screen reclamation, contacts, bounds check.
    fn step(&mut self, dt: f32) {
        let now = self.timers.now() + dt as f64;
        self.timers.advance_to(now);
        self.dispatch_timers();

        self.player.integrate(dt, self.tuning.gravity);

        let ctx = MotionContext::new(&self.tuning, self.session.speed);
        advance_all(&mut self.obstacles, dt, &ctx);
        advance_all(&mut self.hazards, dt, &ctx);
        advance_all(&mut self.pickups, dt, &ctx);

        let player_x = self.player.x;
        let crossing: Vec<EntityId> = self
            .obstacles
            .iter()
            .filter(|o| !o.passed && o.x < player_x)
            .map(|o| o.id)
            .collect();
        for id in crossing {
            self.on_obstacle_passed(id);
        }

        retire_offscreen(&mut self.obstacles, &ctx);
        retire_offscreen(&mut self.hazards, &ctx);
        retire_offscreen(&mut self.pickups, &ctx);

        let player_box = self.player.hitbox();
        let contacts = detect_contacts(
            &player_box,
            &mut self.obstacles,
            &self.hazards,
            &self.pickups,
        );
        for contact in contacts {
            // An ended run takes no further hits, but pickups still resolve
            if contact.is_lethal() && self.session.state != RunState::Active {
                continue;
            }
            self.resolve_contact(contact);
        }

        if self.session.state == RunState::Active
            && self
                .player
                .is_out_of_bounds(self.tuning.screen_height, self.tuning.out_of_bounds_margin)
        {
            log::debug!("Player left the screen at y={:.1}", self.player.y);
            self.end();
        }
    }

    fn dispatch_timers(&mut self) {
        while self.session.state == RunState::Active {
            let Some(fired) = self.timers.pop_due() else {
                break;
            };
            self.handle_timer(fired);
        }
    }

    fn handle_timer(&mut self, fired: Fired<TimerEvent>) {
        match fired.payload {
            TimerEvent::SpawnObstacle => {
                let id = self.next_entity_id();
                let obstacle = spawn_obstacle(id, self.session.score, &self.tuning, &mut self.rng);
                self.obstacles.push(obstacle);
            }
            TimerEvent::SpawnPickup => {
                self.spawn_pickup();
                let delay = sample_range(&mut self.rng, self.tuning.pickup_interval) as f64;
                self.timers.schedule_once(delay, TimerEvent::SpawnPickup);
            }
            TimerEvent::EmitHazard(kind) => {
                let spawner = self.spawner_mut(kind);
                if spawner.chain() == Some(fired.id) {
                    spawner.set_chain(None);
                }
                self.fire_hazard(kind);
            }
            TimerEvent::LaserDutyEnd => {
                if let Some(rest) = self.lasers.begin_rest() {
                    log::info!("Lasers resting for {:.1}s", rest);
                    self.timers
                        .schedule_once(rest as f64, TimerEvent::LaserDutyResume);
                }
            }
            TimerEvent::LaserDutyResume => {
                let growth = self.tuning.laser_duration_growth;
                if let Some(window) = self.lasers.resume(growth, &mut self.rng) {
                    log::info!("Lasers firing again for {:.1}s", window);
                    self.fire_hazard(HazardKind::Laser);
                    self.timers
                        .schedule_once(window as f64, TimerEvent::LaserDutyEnd);
                }
            }
            TimerEvent::ModifierExpired { kind, reversal } => {
                self.expire_modifier(kind, reversal);
            }
            TimerEvent::HideBanner(text) => self.banner.expire(text),
        }
    }

    fn spawn_pickup(&mut self) {
        let id = self.next_entity_id();
        let kind = self.modifier_table.choose(&mut self.rng);
        let pickup = spawn_pickup(id, kind, self.session.speed, &self.tuning, &mut self.rng);
        log::debug!("Pickup {} ({:?}) at y={:.0}", id, kind, pickup.pos.y);
        self.pickups.push(pickup);
        self.events.push(GameEvent::PickupSpawned { id, kind });
    }

    fn spawner_mut(&mut self, kind: HazardKind) -> &mut HazardSpawner {
        match kind {
            HazardKind::Laser => &mut self.lasers,
            HazardKind::Bullet => &mut self.bullets,
        }
    }

    /// Emit one hazard now and (re)arm the spawner's single emission chain.
    /// No-op if the spawner is inactive, which is how a chain ends.
    fn fire_hazard(&mut self, kind: HazardKind) {
        if !self.spawner(kind).is_active() {
            return;
        }
        let id = self.next_entity_id();
        let spawner = match kind {
            HazardKind::Laser => &mut self.lasers,
            HazardKind::Bullet => &mut self.bullets,
        };
        let hazard = spawner.spawn(id, &self.tuning, &mut self.rng);
        let interval = spawner.next_interval(&self.tuning, &mut self.rng);
        let next = self
            .timers
            .schedule_once(interval as f64, TimerEvent::EmitHazard(kind));
        if let Some(previous) = spawner.set_chain(Some(next)) {
            self.timers.cancel(previous);
        }
        self.hazards.push(hazard);
    }

    /// Latch a pair as passed and score it. A pair scores at most once.
    pub fn on_obstacle_passed(&mut self, id: EntityId) -> bool {
        if self.session.state != RunState::Active {
            return false;
        }
        let Some(obstacle) = self.obstacles.iter_mut().find(|o| o.id == id) else {
            return false;
        };
        if obstacle.passed {
            return false;
        }
        obstacle.passed = true;

        self.session.score += self.session.score_multiplier.factor();
        self.session.speed += self.tuning.speed_increment;
        self.events.push(GameEvent::ObstaclePassed {
            id,
            score: self.session.score,
        });
        self.events.push(GameEvent::Sound(SoundCue::Point));

        self.check_hazard_thresholds();
        true
    }

    fn check_hazard_thresholds(&mut self) {
        let score = self.session.score;

        if self.bullets.crosses_threshold(score) {
            self.bullets.engage_by_score();
            log::info!("Bullets engaged at score {}", score);
            let engaged = GameEvent::HazardEngaged(HazardKind::Bullet);
            self.events.push(engaged);
            self.fire_hazard(HazardKind::Bullet);
        }

        if self.lasers.crosses_threshold(score) {
            if let Some(window) = self.lasers.engage_by_score() {
                log::info!("Lasers engaged at score {} for {:.1}s", score, window);
                self.timers
                    .schedule_once(window as f64, TimerEvent::LaserDutyEnd);
            }
            let engaged = GameEvent::HazardEngaged(HazardKind::Laser);
            self.events.push(engaged);
            self.fire_hazard(HazardKind::Laser);
        }
    }

    fn resolve_contact(&mut self, contact: Contact) {
        match contact {
            Contact::Pickup(id) => self.collect_pickup(id),
            Contact::Hazard(id) => {
                self.hazards.retain(|h| h.id != id);
                self.resolve_lethal();
            }
            Contact::Obstacle(_) => self.resolve_lethal(),
        }
    }

    fn collect_pickup(&mut self, id: EntityId) {
        let Some(index) = self.pickups.iter().position(|p| p.id == id) else {
            return;
        };
        let pickup = self.pickups.remove(index);
        self.events.push(GameEvent::Sound(SoundCue::Point));
        self.activate_modifier(pickup.kind);
    }

    /// Lethal contact: spend an immunity charge or end the run
    fn resolve_lethal(&mut self) {
        if self.session.state != RunState::Active {
            return;
        }
        if self.session.consume_immunity_charge() {
            let remaining = self.session.immunity_charges;
            log::debug!("Immunity absorbed a hit ({} left)", remaining);
            self.events.push(GameEvent::ImmunityAbsorbed { remaining });
            self.refresh_immunity_banner();
            return;
        }
        self.events.push(GameEvent::Sound(SoundCue::Hit));
        self.end();
    }

    /// Apply a modifier's effect and arm its expiry
    pub fn activate_modifier(&mut self, kind: ModifierKind) {
        if self.session.state != RunState::Active {
            return;
        }
        log::debug!("Activating modifier {:?}", kind);
        self.events.push(GameEvent::ModifierActivated(kind));

        let reversal = match kind.effect() {
            ModifierEffect::Immunity => {
                self.session.grant_immunity(self.tuning.immunity_charges);
                self.refresh_immunity_banner();
                return;
            }
            ModifierEffect::ScaleSpeed(factor) => {
                self.session.speed *= factor;
                Reversal::DivideSpeed(factor)
            }
            ModifierEffect::EnableHazard(hazard) => {
                self.spawner_mut(hazard).boost();
                Reversal::DisableHazard(hazard)
            }
            ModifierEffect::ScoreMultiplier(multiplier) => {
                self.session.score_multiplier = multiplier;
                Reversal::ResetMultiplier
            }
        };

        self.session.add_modifier(kind);
        self.show_banner(BannerText::Modifier(kind), false);
        if let Reversal::DisableHazard(hazard) = reversal {
            self.fire_hazard(hazard);
        }
        self.timers.schedule_once(
            kind.duration() as f64,
            TimerEvent::ModifierExpired { kind, reversal },
        );
    }

    fn expire_modifier(&mut self, kind: ModifierKind, reversal: Reversal) {
        match reversal {
            Reversal::DivideSpeed(factor) => self.session.speed /= factor,
            Reversal::DisableHazard(hazard) => self.spawner_mut(hazard).release_boost(),
            // Last writer wins: this resets even if another score modifier is live
            Reversal::ResetMultiplier => self.session.score_multiplier = ScoreMultiplier::Single,
        }
        self.session.remove_modifier(kind);
        log::debug!("Modifier {:?} expired", kind);
        self.events.push(GameEvent::ModifierExpired(kind));

        if !self.session.has_active_modifiers() {
            self.banner.hide(&mut self.timers);
        } else if self.session.immunity_charges > 0 {
            self.refresh_immunity_banner();
        }
    }

    /// Show the charge count, or retire the immunity text once charges run out
    fn refresh_immunity_banner(&mut self) {
        let charges = self.session.immunity_charges;
        if charges > 0 {
            self.show_banner(BannerText::Immunity(charges), true);
        } else if !self.session.has_active_modifiers()
            || matches!(self.banner.text(), Some(BannerText::Immunity(_)))
        {
            self.banner.hide(&mut self.timers);
        }
    }

    fn show_banner(&mut self, text: BannerText, persistent: bool) {
        let duration = self.tuning.banner_duration;
        let timers = &mut self.timers;
        self.banner.show(text, persistent, duration, timers);
    }

    /// Active → Ended. Idempotent: returns false if the run was not active.
    pub fn end(&mut self) -> bool {
        if self.session.state != RunState::Active {
            return false;
        }
        self.session.state = RunState::Ended;

        // Nothing scheduled for this run may fire later
        self.timers.invalidate_all();
        self.lasers.set_chain(None);
        self.bullets.set_chain(None);
        self.banner.detach_timers();

        let score = self.session.score;
        let new_best = self.high_score.record(score);
        let high_score = self.high_score.best();
        log::info!(
            "Run {} ended: score {} (best {}{})",
            self.session.generation,
            score,
            high_score,
            if new_best { ", new best!" } else { "" }
        );
        self.events.push(GameEvent::RunEnded {
            score,
            high_score,
            new_best,
        });
        true
    }

    /// Ended → Idle with a fresh session. Returns false unless the run had ended.
    pub fn restart(&mut self) -> bool {
        if self.session.state != RunState::Ended {
            return false;
        }
        let generation = self.session.generation.wrapping_add(1);
        self.timers.invalidate_all();
        self.session = Session::new(generation, self.tuning.base_speed);
        self.player = Player::new(&self.tuning);
        self.obstacles.clear();
        self.hazards.clear();
        self.pickups.clear();
        self.banner = Banner::default();
        self.lasers = HazardSpawner::new(HazardKind::Laser, &self.tuning, &mut self.rng);
        self.bullets = HazardSpawner::new(HazardKind::Bullet, &self.tuning, &mut self.rng);
        log::info!("Run {} ready", generation);
        true
    }
}
