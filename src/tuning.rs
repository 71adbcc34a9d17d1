//! Game balance
//!
//! Every gameplay constant lives here so runs can be rebalanced from a JSON
//! file without recompiling. Missing fields fall back to the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// Gameplay constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Screen ===
    pub screen_width: f32,
    pub screen_height: f32,

    // === Player ===
    /// Fixed horizontal position
    pub player_x: f32,
    /// Hover height while idle
    pub player_start_y: f32,
    /// Hitbox (width, height), centered on the player position
    pub player_size: (f32, f32),
    /// Downward acceleration (pixels/s²)
    pub gravity: f32,
    /// Upward velocity set by a flap (pixels/s)
    pub flap_impulse: f32,
    /// Minimum seconds between accepted flaps
    pub flap_cooldown: f32,
    /// How far past the top/bottom edge the player may go before the run ends
    pub out_of_bounds_margin: f32,

    // === Scrolling ===
    /// Starting scroll speed (pixels/s)
    pub base_speed: f32,
    /// Speed added per obstacle passed
    pub speed_increment: f32,

    // === Obstacles ===
    pub obstacle_interval: f32,
    pub obstacle_width: f32,
    pub gap_base: f32,
    pub gap_min: f32,
    /// Gap shrink per point of score
    pub gap_reduction: f32,
    /// Gap jitter half-width, applied after the floor
    pub gap_jitter: f32,
    /// Vertical offset half-width of the gap center
    pub gap_offset_jitter: f32,

    // === Pickups ===
    pub pickup_first_delay: f32,
    pub pickup_interval: (f32, f32),
    /// Horizontal speed as a multiple of scroll speed at spawn time
    pub pickup_speed_factor: f32,
    pub pickup_drift_speed: f32,
    pub pickup_size: f32,
    /// Pickups spawn and bounce within `[band_top, screen_height - band_bottom]`
    pub pickup_band_top: f32,
    pub pickup_band_bottom: f32,

    // === Lasers ===
    pub laser_threshold: (u32, u32),
    pub laser_interval: (f32, f32),
    pub laser_speed: f32,
    pub laser_size: (f32, f32),
    /// First firing window of the laser duty cycle
    pub laser_duration: f32,
    pub laser_break_duration: f32,
    /// Added to the firing window after each break
    pub laser_duration_growth: (f32, f32),

    // === Bullets ===
    pub bullet_threshold: (u32, u32),
    pub bullet_interval: (f32, f32),
    pub bullet_speed: f32,
    pub bullet_size: f32,
    pub bullet_margin: f32,

    // === Modifiers ===
    pub immunity_charges: u32,
    pub banner_duration: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            screen_width: 800.0,
            screen_height: 600.0,

            player_x: 80.0,
            player_start_y: 240.0,
            player_size: (34.0, 24.0),
            gravity: 980.0,
            flap_impulse: 310.0,
            flap_cooldown: 0.1,
            out_of_bounds_margin: 30.0,

            base_speed: 160.0,
            speed_increment: 9.0,

            obstacle_interval: 1.5,
            obstacle_width: 64.0,
            gap_base: 245.0,
            gap_min: 132.0,
            gap_reduction: 5.0,
            gap_jitter: 33.0,
            gap_offset_jitter: 50.0,

            pickup_first_delay: 5.0,
            pickup_interval: (40.0, 65.0),
            pickup_speed_factor: 2.2,
            pickup_drift_speed: 60.0,
            pickup_size: 32.0,
            pickup_band_top: 50.0,
            pickup_band_bottom: 100.0,

            laser_threshold: (20, 35),
            laser_interval: (1.0, 3.0),
            laser_speed: 400.0,
            laser_size: (16.0, 80.0),
            laser_duration: 25.0,
            laser_break_duration: 20.0,
            laser_duration_growth: (10.0, 30.0),

            bullet_threshold: (35, 55),
            bullet_interval: (1.5, 4.0),
            bullet_speed: 3000.0,
            bullet_size: 24.0,
            bullet_margin: 50.0,

            immunity_charges: 2,
            banner_duration: 2.0,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json_str(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    /// Screen center on the vertical axis
    pub fn center_y(&self) -> f32 {
        self.screen_height / 2.0
    }

    /// Reject values that would stall or break the simulation
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("screen_width", self.screen_width),
            ("screen_height", self.screen_height),
            ("gravity", self.gravity),
            ("flap_impulse", self.flap_impulse),
            ("base_speed", self.base_speed),
            ("obstacle_interval", self.obstacle_interval),
            ("obstacle_width", self.obstacle_width),
            ("pickup_first_delay", self.pickup_first_delay),
            ("pickup_interval.0", self.pickup_interval.0),
            ("laser_interval.0", self.laser_interval.0),
            ("bullet_interval.0", self.bullet_interval.0),
            ("laser_duration", self.laser_duration),
            ("laser_break_duration", self.laser_break_duration),
            ("banner_duration", self.banner_duration),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(TuningError::Invalid(format!(
                    "{name} must be > 0, got {value}"
                )));
            }
        }

        let non_negative = [
            ("flap_cooldown", self.flap_cooldown),
            ("out_of_bounds_margin", self.out_of_bounds_margin),
            ("speed_increment", self.speed_increment),
            ("gap_reduction", self.gap_reduction),
            ("gap_jitter", self.gap_jitter),
            ("gap_offset_jitter", self.gap_offset_jitter),
            ("pickup_speed_factor", self.pickup_speed_factor),
            ("pickup_drift_speed", self.pickup_drift_speed),
            ("laser_duration_growth.0", self.laser_duration_growth.0),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(TuningError::Invalid(format!(
                    "{name} must be >= 0, got {value}"
                )));
            }
        }

        let ranges = [
            ("pickup_interval", self.pickup_interval),
            ("laser_interval", self.laser_interval),
            ("bullet_interval", self.bullet_interval),
            ("laser_duration_growth", self.laser_duration_growth),
        ];
        for (name, (min, max)) in ranges {
            if min > max {
                return Err(TuningError::Invalid(format!(
                    "{name} is reversed: {min} > {max}"
                )));
            }
        }
        if self.laser_threshold.0 > self.laser_threshold.1 {
            return Err(TuningError::Invalid("laser_threshold is reversed".into()));
        }
        if self.bullet_threshold.0 > self.bullet_threshold.1 {
            return Err(TuningError::Invalid("bullet_threshold is reversed".into()));
        }
        if self.gap_min > self.gap_base {
            return Err(TuningError::Invalid(format!(
                "gap_min ({}) exceeds gap_base ({})",
                self.gap_min, self.gap_base
            )));
        }
        if self.pickup_band_top > self.screen_height - self.pickup_band_bottom {
            return Err(TuningError::Invalid("pickup band is empty".into()));
        }
        Ok(())
    }
}
