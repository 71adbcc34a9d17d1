//! Audio cues
//!
//! The simulation never plays sound itself. It emits fire-and-forget cues
//! (see [`crate::sim::GameEvent::Sound`]) and the host routes them to a
//! [`SoundSink`]. No return value, no failure handling.

use serde::{Deserialize, Serialize};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// Player flapped (also the run-start flap)
    Flap,
    /// Obstacle passed or pickup collected
    Point,
    /// Lethal collision that ended the run
    Hit,
}

impl SoundCue {
    /// Asset name the host should play for this cue
    pub fn name(&self) -> &'static str {
        match self {
            SoundCue::Flap => "wooosh",
            SoundCue::Point => "point",
            SoundCue::Hit => "hit",
        }
    }
}

/// Audio collaborator seam
pub trait SoundSink {
    fn play(&mut self, cue: SoundCue);
}

/// Sink that only logs cues (headless runs, tests)
#[derive(Debug, Default)]
pub struct LogSink {
    played: u64,
    muted: bool,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle mute state
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Number of cues played since creation (muted cues excluded)
    pub fn played(&self) -> u64 {
        self.played
    }
}

impl SoundSink for LogSink {
    fn play(&mut self, cue: SoundCue) {
        if self.muted {
            return;
        }
        self.played += 1;
        log::debug!("♪ {}", cue.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_names_match_assets() {
        assert_eq!(SoundCue::Flap.name(), "wooosh");
        assert_eq!(SoundCue::Point.name(), "point");
        assert_eq!(SoundCue::Hit.name(), "hit");
    }

    #[test]
    fn test_log_sink_counts_unmuted_cues() {
        let mut sink = LogSink::new();
        sink.play(SoundCue::Flap);
        sink.toggle_mute();
        sink.play(SoundCue::Hit);
        assert!(sink.is_muted());
        assert_eq!(sink.played(), 1);
    }
}
