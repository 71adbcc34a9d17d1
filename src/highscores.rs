//! High score tracking
//!
//! In-memory only: the best score survives restarts within one process and
//! is lost when the process exits.

use serde::{Deserialize, Serialize};

/// Best score seen this process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreStore {
    best: u32,
    runs_recorded: u32,
}

impl HighScoreStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished run's score.
    /// Returns true if it set a new best.
    pub fn record(&mut self, score: u32) -> bool {
        self.runs_recorded += 1;
        if score > self.best {
            self.best = score;
            true
        } else {
            false
        }
    }

    /// Get the best score (0 if no run scored)
    pub fn best(&self) -> u32 {
        self.best
    }

    /// Number of runs recorded
    pub fn runs_recorded(&self) -> u32 {
        self.runs_recorded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_maximum() {
        let mut store = HighScoreStore::new();
        assert!(store.record(12));
        assert!(!store.record(7));
        assert_eq!(store.best(), 12);
        assert!(store.record(13));
        assert_eq!(store.best(), 13);
        assert_eq!(store.runs_recorded(), 3);
    }

    #[test]
    fn test_equal_score_is_not_new_best() {
        let mut store = HighScoreStore::new();
        store.record(5);
        assert!(!store.record(5));
    }

    #[test]
    fn test_zero_score_run_is_counted() {
        let mut store = HighScoreStore::new();
        assert!(!store.record(0));
        assert_eq!(store.best(), 0);
        assert_eq!(store.runs_recorded(), 1);
    }
}
