//! Virtual-time timer service
//!
//! Timers carry a typed payload instead of a closure. The owner advances the
//! clock once per tick and drains due timers in `(fire_at, scheduling order)`
//! order, dispatching on the payload. Every timer is stamped with the queue's
//! generation; [`TimerQueue::invalidate_all`] bumps the generation so nothing
//! scheduled for a finished run can fire into the next one.

use serde::{Deserialize, Serialize};

use crate::consts::TIMER_EPSILON;

/// Handle returned by `schedule_*`, used to cancel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Scheduled<T> {
    id: TimerId,
    fire_at: f64,
    seq: u64,
    generation: u32,
    /// Re-arm interval for repeating timers
    repeat: Option<f64>,
    payload: T,
}

/// A timer that came due
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<T> {
    pub id: TimerId,
    /// Scheduled fire time (may be slightly before `now`)
    pub at: f64,
    pub payload: T,
}

/// Pending timers ordered by fire time
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    now: f64,
    generation: u32,
    next_id: u64,
    next_seq: u64,
    /// Sorted ascending by (fire_at, seq)
    pending: Vec<Scheduled<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            generation: 0,
            next_id: 1,
            next_seq: 0,
            pending: Vec::new(),
        }
    }

    /// Current virtual time (seconds)
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Fire `payload` once, `delay` seconds from now
    pub fn schedule_once(&mut self, delay: f64, payload: T) -> TimerId {
        self.insert(delay, None, payload)
    }

    /// Fire `payload` every `interval` seconds, first at `now + interval`
    pub fn schedule_repeating(&mut self, interval: f64, payload: T) -> TimerId {
        debug_assert!(interval > 0.0, "repeating timer needs a positive interval");
        let repeat = interval.max(TIMER_EPSILON);
        self.insert(interval, Some(repeat), payload)
    }

    /// Cancel a pending timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.pending.iter().position(|t| t.id == id) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    /// Move the clock forward. Time never runs backwards.
    pub fn advance_to(&mut self, now: f64) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Drop every pending timer and reset the clock for a new run.
    pub fn invalidate_all(&mut self) {
        let dropped = self.pending.len();
        self.pending.clear();
        self.generation = self.generation.wrapping_add(1);
        self.now = 0.0;
        if dropped > 0 {
            log::trace!(
                "Invalidated {} pending timers (generation -> {})",
                dropped,
                self.generation
            );
        }
    }

    fn insert(&mut self, delay: f64, repeat: Option<f64>, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let fire_at = self.now + delay.max(0.0);
        self.push(Scheduled {
            id,
            fire_at,
            seq: 0,
            generation: self.generation,
            repeat,
            payload,
        });
        id
    }

    fn push(&mut self, mut timer: Scheduled<T>) {
        timer.seq = self.next_seq;
        self.next_seq += 1;
        let index = self
            .pending
            .partition_point(|t| (t.fire_at, t.seq) <= (timer.fire_at, timer.seq));
        self.pending.insert(index, timer);
    }
}

impl<T: Clone> TimerQueue<T> {
    /// Pop the earliest timer due at or before `now`.
    ///
    /// Repeating timers are re-armed (same id) before being returned, so a
    /// handler can cancel them from inside dispatch.
    pub fn pop_due(&mut self) -> Option<Fired<T>> {
        loop {
            let first = self.pending.first()?;
            if first.fire_at > self.now + TIMER_EPSILON {
                return None;
            }
            let timer = self.pending.remove(0);
            if timer.generation != self.generation {
                log::trace!("Discarding stale timer {:?}", timer.id);
                continue;
            }
            let fired = Fired {
                id: timer.id,
                at: timer.fire_at,
                payload: timer.payload.clone(),
            };
            if let Some(interval) = timer.repeat {
                self.push(Scheduled {
                    fire_at: timer.fire_at + interval,
                    ..timer
                });
            }
            return Some(fired);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(queue: &mut TimerQueue<&'static str>) -> Vec<&'static str> {
        let mut out = Vec::new();
        while let Some(fired) = queue.pop_due() {
            out.push(fired.payload);
        }
        out
    }

    #[test]
    fn test_fires_in_timestamp_order() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(3.0, "c");
        queue.schedule_once(1.0, "a");
        queue.schedule_once(2.0, "b");

        queue.advance_to(2.5);
        assert_eq!(drain(&mut queue), vec!["a", "b"]);
        queue.advance_to(3.0);
        assert_eq!(drain(&mut queue), vec!["c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_same_time_fires_in_scheduling_order() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(1.0, "first");
        queue.schedule_once(1.0, "second");
        queue.advance_to(1.0);
        assert_eq!(drain(&mut queue), vec!["first", "second"]);
    }

    #[test]
    fn test_not_due_before_time() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(5.0, "x");
        queue.advance_to(4.99);
        assert!(queue.pop_due().is_none());
        queue.advance_to(5.0);
        assert_eq!(queue.pop_due().map(|f| f.payload), Some("x"));
    }

    #[test]
    fn test_cancel() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule_once(1.0, "x");
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        queue.advance_to(2.0);
        assert!(queue.pop_due().is_none());
    }

    #[test]
    fn test_repeating_rearms_with_same_id() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule_repeating(1.5, "tick");
        queue.advance_to(4.6);
        let fired: Vec<_> = std::iter::from_fn(|| queue.pop_due()).collect();
        assert_eq!(fired.len(), 3);
        assert!(fired.iter().all(|f| f.id == id));
        assert_eq!(fired[2].at, 4.5);
        assert_eq!(queue.len(), 1, "re-armed");

        assert!(queue.cancel(id));
        queue.advance_to(10.0);
        assert!(queue.pop_due().is_none());
    }

    #[test]
    fn test_zero_delay_scheduled_during_drain_fires_same_tick() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(1.0, "outer");
        queue.advance_to(1.0);
        let fired = queue.pop_due().unwrap();
        assert_eq!(fired.payload, "outer");
        queue.schedule_once(0.0, "inner");
        assert_eq!(drain(&mut queue), vec!["inner"]);
    }

    #[test]
    fn test_invalidate_all_drops_pending_and_resets_clock() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(1.0, "old");
        queue.advance_to(0.5);
        let gen_before = queue.generation();

        queue.invalidate_all();
        assert_eq!(queue.generation(), gen_before + 1);
        assert_eq!(queue.now(), 0.0);
        assert!(queue.is_empty());

        queue.schedule_once(1.0, "new");
        queue.advance_to(1.0);
        assert_eq!(drain(&mut queue), vec!["new"]);
    }

    #[test]
    fn test_clock_never_runs_backwards() {
        let mut queue: TimerQueue<()> = TimerQueue::new();
        queue.advance_to(2.0);
        queue.advance_to(1.0);
        assert_eq!(queue.now(), 2.0);
    }
}
