//! Chirp and swell timing.
//!
//! Two timers drive the soundscape while it runs:
//! - chirp : one-shot with a freshly drawn delay, re-armed explicitly after
//!   each firing, so birds arrive at an irregular cadence
//! - swell : fixed-period repeating tick that gives the wind a new peak
//!
//! [`EventScheduler`] only decides *when*. What a firing does to the graph is
//! up to the lifecycle controller, which also re-checks its own running flag.

use log::{debug, trace};
use rand::Rng;

use crate::timer::{TimerHandle, TimerKind, TimerQueue};
use crate::tuning::{CHIRP_DELAY_MS, SWELL_PEAK, SWELL_PERIOD_MS};

/// Delay before the next chirp, in milliseconds.
pub fn draw_chirp_delay_ms<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(CHIRP_DELAY_MS)
}

/// Peak level of one wind swell.
pub fn draw_swell_peak<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(SWELL_PEAK)
}

#[derive(Debug, Default)]
pub struct EventScheduler {
    queue: TimerQueue,
    chirp: Option<TimerHandle>,
    swell: Option<TimerHandle>,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline] pub fn chirp_handle(&self) -> Option<TimerHandle> { self.chirp }
    #[inline] pub fn swell_handle(&self) -> Option<TimerHandle> { self.swell }
    #[inline] pub fn pending(&self) -> usize { self.queue.len() }

    /// True while either timer is armed.
    pub fn is_active(&self) -> bool {
        self.chirp.is_some() || self.swell.is_some()
    }

    /// Arm both timers. A timer that is already armed is left alone.
    pub fn start<R: Rng + ?Sized>(&mut self, now: f64, rng: &mut R) {
        if self.chirp.is_none() {
            self.reschedule_chirp(now, rng);
        }
        if self.swell.is_none() {
            let period = SWELL_PERIOD_MS / 1000.0;
            self.swell = Some(self.queue.schedule_repeating(now, period, TimerKind::Swell));
            debug!("swell timer armed, every {period:.1}s");
        }
    }

    /// Arm the next chirp with a fresh delay, replacing any pending one.
    pub fn reschedule_chirp<R: Rng + ?Sized>(&mut self, now: f64, rng: &mut R) -> TimerHandle {
        if let Some(old) = self.chirp.take() {
            self.queue.cancel(old);
        }
        let delay_ms = draw_chirp_delay_ms(rng);
        let handle = self.queue.schedule_once(now, delay_ms / 1000.0, TimerKind::Chirp);
        trace!("next chirp in {delay_ms:.0} ms");
        self.chirp = Some(handle);
        handle
    }

    /// Cancel and clear both timers.
    pub fn stop(&mut self) {
        for handle in [self.chirp.take(), self.swell.take()].into_iter().flatten() {
            self.queue.cancel(handle);
        }
    }

    /// Earliest armed deadline.
    pub fn next_due(&self) -> Option<f64> {
        self.queue.next_due()
    }

    /// Next timer due at `now`, earliest first.
    ///
    /// A fired chirp leaves its handle cleared until [`Self::reschedule_chirp`]
    /// is called. Firings whose handle is no longer the current one are
    /// swallowed.
    pub fn pop_due(&mut self, now: f64) -> Option<TimerKind> {
        while let Some((handle, kind)) = self.queue.pop_due(now) {
            match kind {
                TimerKind::Chirp if self.chirp == Some(handle) => {
                    self.chirp = None;
                    return Some(kind);
                }
                TimerKind::Swell if self.swell == Some(handle) => return Some(kind),
                _ => {
                    trace!("dropping stale {kind:?} timer");
                    self.queue.cancel(handle);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn chirp_delays_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..5000 {
            let d = draw_chirp_delay_ms(&mut rng);
            assert!((3000.0..8500.0).contains(&d), "{d}");
        }
    }

    #[test]
    fn swell_peaks_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..5000 {
            let p = draw_swell_peak(&mut rng);
            assert!((0.28..0.48).contains(&p), "{p}");
        }
    }

    #[test]
    fn start_twice_arms_each_timer_once() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut s = EventScheduler::new();
        s.start(0.0, &mut rng);
        let (c, w) = (s.chirp_handle(), s.swell_handle());
        s.start(0.0, &mut rng);
        assert_eq!(s.pending(), 2);
        assert_eq!((s.chirp_handle(), s.swell_handle()), (c, w));
    }

    #[test]
    fn chirp_chain_fires_inside_the_window() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut s = EventScheduler::new();
        s.start(0.0, &mut rng);

        let mut last = 0.0;
        let mut now = 0.0;
        let mut fired = 0;
        while fired < 50 {
            now += 0.01;
            while let Some(kind) = s.pop_due(now) {
                if kind == TimerKind::Chirp {
                    let gap = now - last;
                    assert!(gap >= 3.0 - 1e-9 && gap < 8.5 + 0.011, "gap {gap}");
                    last = now;
                    fired += 1;
                    s.reschedule_chirp(now, &mut rng);
                }
            }
        }
    }

    #[test]
    fn stop_clears_everything() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut s = EventScheduler::new();
        s.start(0.0, &mut rng);
        s.stop();
        assert!(!s.is_active());
        assert_eq!(s.pending(), 0);
        assert_eq!(s.pop_due(1_000.0), None);
    }

    #[test]
    fn swell_ticks_every_seven_seconds() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut s = EventScheduler::new();
        s.start(0.0, &mut rng);
        s.stop();
        // re-arm only the swell by clearing the chirp afterwards
        s.start(0.0, &mut rng);
        if let Some(h) = s.chirp.take() {
            s.queue.cancel(h);
        }
        assert_eq!(s.pop_due(6.99), None);
        assert_eq!(s.pop_due(7.0), Some(TimerKind::Swell));
        assert_eq!(s.pop_due(13.99), None);
        assert_eq!(s.pop_due(14.0), Some(TimerKind::Swell));
    }
}
