//! Entity movement and off-screen reclamation

use super::state::{Hazard, Obstacle, Pickup};
use crate::tuning::Tuning;

/// World facts movers need for one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionContext {
    /// Current scroll speed (obstacles follow it live)
    pub scroll_speed: f32,
    pub screen_width: f32,
    pub screen_height: f32,
    /// Vertical band pickups bounce inside
    pub band_min_y: f32,
    pub band_max_y: f32,
    pub drift_speed: f32,
}

impl MotionContext {
    pub fn new(tuning: &Tuning, scroll_speed: f32) -> Self {
        Self {
            scroll_speed,
            screen_width: tuning.screen_width,
            screen_height: tuning.screen_height,
            band_min_y: tuning.pickup_band_top,
            band_max_y: tuning.screen_height - tuning.pickup_band_bottom,
            drift_speed: tuning.pickup_drift_speed,
        }
    }
}

pub trait Movable {
    fn advance(&mut self, dt: f32, ctx: &MotionContext);
    /// Fully left the playfield and can be dropped
    fn is_offscreen(&self, ctx: &MotionContext) -> bool;
}

impl Movable for Obstacle {
    fn advance(&mut self, dt: f32, ctx: &MotionContext) {
        self.x -= ctx.scroll_speed * dt;
    }

    fn is_offscreen(&self, _ctx: &MotionContext) -> bool {
        self.x <= -self.width
    }
}

impl Movable for Hazard {
    fn advance(&mut self, dt: f32, _ctx: &MotionContext) {
        self.pos += self.vel * dt;
    }

    fn is_offscreen(&self, ctx: &MotionContext) -> bool {
        let hitbox = self.hitbox();
        hitbox.max.x < 0.0 || hitbox.min.y > ctx.screen_height
    }
}

impl Movable for Pickup {
    fn advance(&mut self, dt: f32, ctx: &MotionContext) {
        self.pos.x -= self.speed_x * dt;
        self.pos.y += self.drift_dir * ctx.drift_speed * dt;
        // Reflect at the band edges; only flip when heading further out
        if (self.pos.y < ctx.band_min_y && self.drift_dir < 0.0)
            || (self.pos.y > ctx.band_max_y && self.drift_dir > 0.0)
        {
            self.drift_dir = -self.drift_dir;
        }
    }

    fn is_offscreen(&self, _ctx: &MotionContext) -> bool {
        self.pos.x + self.size / 2.0 < 0.0
    }
}

/// Advance every entity one step
pub fn advance_all<T: Movable>(items: &mut [T], dt: f32, ctx: &MotionContext) {
    for item in items.iter_mut() {
        item.advance(dt, ctx);
    }
}

/// Drop entities that left the screen. Returns how many were removed.
pub fn retire_offscreen<T: Movable>(items: &mut Vec<T>, ctx: &MotionContext) -> usize {
    let before = items.len();
    items.retain(|item| !item.is_offscreen(ctx));
    before - items.len()
}
