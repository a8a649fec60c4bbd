// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Rolling throttle-event windows

/// Fixed-size ring of binary indicators with a running sum.
#[derive(Debug, Clone)]
struct Window {
    slots: Vec<bool>,
    head: usize,
    count: usize,
}

impl Window {
    fn new(size: usize) -> Self {
        Self {
            slots: vec![false; size.max(1)],
            head: 0,
            count: 0,
        }
    }

    fn push(&mut self, throttled: bool) {
        if self.slots[self.head] {
            self.count -= 1;
        }
        self.slots[self.head] = throttled;
        if throttled {
            self.count += 1;
        }
        self.head = (self.head + 1) % self.slots.len();
    }

    fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = false);
        self.head = 0;
        self.count = 0;
    }
}

/// Short and long throttle windows sharing one fill counter.
///
/// The throttling flag is only evaluated once the short window has filled.
#[derive(Debug, Clone)]
pub struct ThrottleTracker {
    short: Window,
    long: Window,
    filled: usize,
    trigger_count: usize,
    throttling: bool,
}

impl ThrottleTracker {
    /// `trigger_count` is the short-window count at which throttling is
    /// reported, clamped into `1..=short_size`.
    pub fn new(short_size: usize, long_size: usize, trigger_count: usize) -> Self {
        let short = Window::new(short_size);
        let trigger_count = trigger_count.clamp(1, short.slots.len());
        Self {
            short,
            long: Window::new(long_size),
            filled: 0,
            trigger_count,
            throttling: false,
        }
    }

    /// Record one tick and return the updated flag.
    pub fn record(&mut self, throttled: bool) -> bool {
        self.short.push(throttled);
        self.long.push(throttled);
        if self.filled < self.short.slots.len() {
            self.filled += 1;
        }
        if self.filled >= self.short.slots.len() {
            self.throttling = self.short.count >= self.trigger_count;
        }
        self.throttling
    }

    /// Zero both windows and the fill counter together.
    pub fn reset(&mut self) {
        self.short.clear();
        self.long.clear();
        self.filled = 0;
        self.throttling = false;
    }

    pub fn is_throttling(&self) -> bool {
        self.throttling
    }

    pub fn short_count(&self) -> usize {
        self.short.count
    }

    pub fn long_count(&self) -> usize {
        self.long.count
    }

    pub fn short_window(&self) -> usize {
        self.short.slots.len()
    }

    pub fn long_window(&self) -> usize {
        self.long.slots.len()
    }

    /// Fraction of the long window spent throttling.
    pub fn long_ratio(&self) -> f64 {
        self.long.count as f64 / self.long.slots.len() as f64
    }
}

impl Default for ThrottleTracker {
    fn default() -> Self {
        Self::new(3, 30, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_throttling_ticks_set_flag() {
        let mut tracker = ThrottleTracker::default();
        assert!(!tracker.record(true));
        assert!(!tracker.record(true));
        assert!(tracker.record(true));
        assert_eq!(tracker.short_count(), 3);
    }

    #[test]
    fn test_three_clear_ticks_after_reset() {
        let mut tracker = ThrottleTracker::default();
        for _ in 0..5 {
            tracker.record(true);
        }
        tracker.reset();
        for _ in 0..3 {
            tracker.record(false);
        }
        assert!(!tracker.is_throttling());
        assert_eq!(tracker.short_count(), 0);
        assert_eq!(tracker.long_count(), 0);
    }

    #[test]
    fn test_single_event_in_short_window_counts() {
        let mut tracker = ThrottleTracker::default();
        tracker.record(false);
        tracker.record(true);
        assert!(tracker.record(false));
        // the event ages out of the short window
        assert!(tracker.record(false));
        assert!(!tracker.record(false));
    }

    #[test]
    fn test_counts_never_exceed_windows() {
        let mut tracker = ThrottleTracker::default();
        for _ in 0..100 {
            tracker.record(true);
            assert!(tracker.short_count() <= tracker.short_window());
            assert!(tracker.long_count() <= tracker.long_window());
        }
        assert_eq!(tracker.long_count(), 30);
        assert!((tracker.long_ratio() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_higher_trigger_count() {
        let mut tracker = ThrottleTracker::new(3, 30, 2);
        tracker.record(false);
        tracker.record(false);
        assert!(!tracker.record(true));
        assert!(tracker.record(true));
    }

    #[test]
    fn test_trigger_count_clamped() {
        let mut tracker = ThrottleTracker::new(3, 30, 10);
        tracker.record(true);
        tracker.record(true);
        assert!(tracker.record(true));
    }

    #[test]
    fn test_long_window_tracks_history() {
        let mut tracker = ThrottleTracker::default();
        for i in 0..30 {
            tracker.record(i % 3 == 0);
        }
        assert_eq!(tracker.long_count(), 10);
    }
}
