//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Virtual time only (timers run on the simulation clock)
//! - Stable iteration order (by entity ID)

pub mod banner;
pub mod collision;
pub mod hazards;
pub mod modifiers;
pub mod motion;
pub mod obstacles;
pub mod state;
pub mod tick;
pub mod timer;

pub use banner::{Banner, BannerText};
pub use collision::{Aabb, Collidable, Contact, detect_contacts};
pub use hazards::{DutyCycle, DutyPhase, HazardKind, HazardSpawner};
pub use modifiers::{ModifierEffect, ModifierKind, ModifierTable, Reversal};
pub use motion::{MotionContext, Movable};
pub use state::{
    EntityId, GameEvent, GameState, Hazard, Obstacle, Pickup, Player, RunState, ScoreMultiplier,
    Session, TimerEvent,
};
pub use tick::{TickInput, tick};
pub use timer::{Fired, TimerId, TimerQueue};
