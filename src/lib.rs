//! Flap Rush - a gap-dodging arcade side-scroller
//!
//! Core modules:
//! - `sim`: Deterministic simulation (timers, physics, spawners, modifiers, run state)
//! - `tuning`: Data-driven game balance
//! - `highscores`: In-memory best score for the process lifetime
//! - `audio`: Sound cue names and the sink seam hosts plug playback into

pub mod audio;
pub mod highscores;
pub mod sim;
pub mod tuning;

pub use audio::{LogSink, SoundCue, SoundSink};
pub use highscores::HighScoreStore;
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Timers due within this many seconds of "now" fire on the current tick
    pub const TIMER_EPSILON: f64 = 1e-6;
}

/// Uniform sample from an inclusive float range given as `(min, max)`.
///
/// Degenerate ranges (`min == max`) return `min` instead of panicking.
#[inline]
pub fn sample_range<R: rand::Rng + ?Sized>(rng: &mut R, (min, max): (f32, f32)) -> f32 {
    if max > min {
        rng.random_range(min..=max)
    } else {
        min
    }
}
