//! Cancellable timers on the sink clock.
//!
//! The queue never looks at wall time. The host calls
//! [`TimerQueue::pop_due`] with the sink's current time and gets back every
//! timer whose deadline has passed, one at a time, earliest first. Because the
//! sink clock stands still while output is suspended, so do the timers.

/// Opaque id of a scheduled timer. Never reused within one queue.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// What a timer is for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Chirp,
    Swell,
}

#[derive(Copy, Clone, Debug)]
struct Timer {
    handle: TimerHandle,
    kind: TimerKind,
    due: f64,
    period: Option<f64>,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: Vec<Timer>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline] pub fn len(&self) -> usize { self.timers.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.timers.is_empty() }

    fn push(&mut self, kind: TimerKind, due: f64, period: Option<f64>) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer { handle, kind, due, period });
        handle
    }

    /// Fire once, `delay_s` after `now`.
    pub fn schedule_once(&mut self, now: f64, delay_s: f64, kind: TimerKind) -> TimerHandle {
        self.push(kind, now + delay_s.max(0.0), None)
    }

    /// Fire every `period_s`, first at `now + period_s`.
    pub fn schedule_repeating(&mut self, now: f64, period_s: f64, kind: TimerKind) -> TimerHandle {
        let period = period_s.max(f64::EPSILON);
        self.push(kind, now + period, Some(period))
    }

    /// Returns `false` if the timer already fired (one-shot) or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.handle != handle);
        self.timers.len() != before
    }

    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.timers.iter().any(|t| t.handle == handle)
    }

    /// Earliest deadline, if any.
    pub fn next_due(&self) -> Option<f64> {
        self.timers.iter().map(|t| t.due).min_by(f64::total_cmp)
    }

    /// Take the earliest timer due at or before `now`.
    ///
    /// One-shot timers are removed. Repeating timers are re-armed one period
    /// later; if the host fell behind by more than a period the missed ticks
    /// are coalesced into this one.
    pub fn pop_due(&mut self, now: f64) -> Option<(TimerHandle, TimerKind)> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due))
            .map(|(i, _)| i)?;

        let timer = self.timers[idx];
        match timer.period {
            Some(period) => {
                let mut due = timer.due + period;
                if due <= now {
                    due = now + period;
                }
                self.timers[idx].due = due;
            }
            None => {
                self.timers.swap_remove(idx);
            }
        }
        Some((timer.handle, timer.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_fires_once() {
        let mut q = TimerQueue::new();
        let h = q.schedule_once(1.0, 3.0, TimerKind::Chirp);
        assert_eq!(q.next_due(), Some(4.0));
        assert_eq!(q.pop_due(3.99), None);
        assert_eq!(q.pop_due(4.0), Some((h, TimerKind::Chirp)));
        assert_eq!(q.pop_due(10.0), None);
        assert!(!q.is_scheduled(h));
        assert!(!q.cancel(h));
    }

    #[test]
    fn repeating_rearms_and_coalesces() {
        let mut q = TimerQueue::new();
        let h = q.schedule_repeating(0.0, 7.0, TimerKind::Swell);
        assert_eq!(q.pop_due(7.0), Some((h, TimerKind::Swell)));
        assert_eq!(q.next_due(), Some(14.0));

        // fell behind by several periods: one tick, then back on a fresh grid
        assert_eq!(q.pop_due(40.0), Some((h, TimerKind::Swell)));
        assert_eq!(q.pop_due(40.0), None);
        assert_eq!(q.next_due(), Some(47.0));
    }

    #[test]
    fn earliest_fires_first_and_cancel_removes() {
        let mut q = TimerQueue::new();
        let swell = q.schedule_repeating(0.0, 7.0, TimerKind::Swell);
        let chirp = q.schedule_once(0.0, 3.5, TimerKind::Chirp);
        assert_eq!(q.len(), 2);

        assert_eq!(q.pop_due(8.0), Some((chirp, TimerKind::Chirp)));
        assert_eq!(q.pop_due(8.0), Some((swell, TimerKind::Swell)));

        assert!(q.cancel(swell));
        assert!(q.is_empty());
        assert_eq!(q.pop_due(100.0), None);
    }

    #[test]
    fn handles_are_unique() {
        let mut q = TimerQueue::new();
        let a = q.schedule_once(0.0, 1.0, TimerKind::Chirp);
        q.cancel(a);
        let b = q.schedule_once(0.0, 1.0, TimerKind::Chirp);
        assert_ne!(a, b);
    }
}
