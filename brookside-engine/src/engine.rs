//! Lifecycle controller.
//!
//! [`NatureEngine`] is the only thing a host talks to. It owns the sink, the
//! random source and one explicit [`ControllerState`] record, and moves
//! between three states:
//!
//! ```text
//!        start()            stop()
//!  Idle ─────────→ Running ───────→ Idle
//!   │                 │
//!   └── dispose() ────┴── dispose() ──→ Disposed (terminal)
//! ```
//!
//! Public operations never fail and never panic. Timers are fired by
//! [`NatureEngine::poll`], which the host calls from the same thread that
//! calls `start`/`stop`.

use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::chirp::synthesize_chirp;
use crate::graph::SignalGraph;
use crate::scheduler::{draw_swell_peak, EventScheduler};
use crate::sink::{AudioSink, VoiceKind};
use crate::timer::TimerKind;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Idle,
    Running,
    Disposed,
}

/// Everything the controller mutates, in one place.
#[derive(Debug, Default)]
pub struct ControllerState {
    pub phase: EngineState,
    pub graph: SignalGraph,
    pub scheduler: EventScheduler,
}

pub struct NatureEngine<S: AudioSink, R: Rng = StdRng> {
    sink: S,
    rng: R,
    state: ControllerState,
}

impl<S: AudioSink> NatureEngine<S> {
    /// Engine seeded from OS entropy.
    pub fn new(sink: S) -> Self {
        Self::with_rng(sink, StdRng::from_entropy())
    }

    /// Reproducible engine: same seed, same buffers, same chirps.
    pub fn with_seed(sink: S, seed: u64) -> Self {
        Self::with_rng(sink, StdRng::seed_from_u64(seed))
    }
}

impl<S: AudioSink, R: Rng> NatureEngine<S, R> {
    pub fn with_rng(sink: S, rng: R) -> Self {
        Self::from_state(sink, rng, ControllerState::default())
    }

    /// Resume from an explicitly built state record.
    pub fn from_state(sink: S, rng: R, state: ControllerState) -> Self {
        Self { sink, rng, state }
    }

    #[inline] pub fn state(&self) -> EngineState { self.state.phase }
    #[inline] pub fn is_running(&self) -> bool { self.state.phase == EngineState::Running }
    #[inline] pub fn sink(&self) -> &S { &self.sink }
    #[inline] pub fn sink_mut(&mut self) -> &mut S { &mut self.sink }
    #[inline] pub fn graph(&self) -> &SignalGraph { &self.state.graph }
    #[inline] pub fn scheduler(&self) -> &EventScheduler { &self.state.scheduler }

    fn resume_sink(&mut self) {
        if let Err(e) = self.sink.resume() {
            debug!("{e}; will retry on next start");
        }
    }

    /// Fade the soundscape in. Idempotent while running.
    pub fn start(&mut self) {
        match self.state.phase {
            EngineState::Disposed => {
                info!("start() ignored: engine disposed");
                return;
            }
            EngineState::Running => {
                self.resume_sink();
                return;
            }
            EngineState::Idle => {}
        }

        self.state.phase = EngineState::Running;
        self.resume_sink();

        let ControllerState { graph, scheduler, .. } = &mut self.state;
        graph.fade_in_output(&mut self.sink);
        for kind in VoiceKind::ALL {
            graph.ensure_source(kind, &mut self.sink, &mut self.rng);
            graph.fade_in_voice(&mut self.sink, kind);
        }
        scheduler.start(self.sink.current_time(), &mut self.rng);

        info!("soundscape started @ {:.3}s", self.sink.current_time());
    }

    /// Fade everything to the floor and stop the timers. Sources keep running.
    pub fn stop(&mut self) {
        if self.state.phase != EngineState::Running {
            return;
        }
        self.state.phase = EngineState::Idle;
        self.state.graph.fade_out(&mut self.sink);
        self.state.scheduler.stop();
        info!("soundscape stopped @ {:.3}s", self.sink.current_time());
    }

    /// Stop, tear down the graph and disconnect. Terminal.
    pub fn dispose(&mut self) {
        if self.state.phase == EngineState::Disposed {
            return;
        }
        self.stop();
        for (kind, outcome) in self.state.graph.stop_sources(&mut self.sink) {
            debug!("{kind:?} source: {outcome:?}");
        }
        self.state.graph.release(&mut self.sink);
        self.state.phase = EngineState::Disposed;
        info!("engine disposed");
    }

    /// Fire every timer due at the sink's current time, then free any
    /// released source buffers the render path no longer uses.
    ///
    /// Returns the number of timer callbacks dispatched.
    pub fn poll(&mut self) -> usize {
        self.state.graph.collect_retired();
        let now = self.sink.current_time();
        let mut fired = 0;
        while let Some(kind) = self.state.scheduler.pop_due(now) {
            fired += 1;
            if self.state.phase != EngineState::Running {
                trace!("{kind:?} fired while not running; ignored");
                continue;
            }
            match kind {
                TimerKind::Chirp => {
                    let event = synthesize_chirp(&mut self.rng, now);
                    trace!("chirp @ {:.3}s pan {:+.2}", event.start, event.pan);
                    self.state.graph.play_chirp(&mut self.sink, event);
                    self.state.scheduler.reschedule_chirp(now, &mut self.rng);
                }
                TimerKind::Swell => {
                    let peak = draw_swell_peak(&mut self.rng);
                    trace!("wind swell → {peak:.3}");
                    self.state.graph.swell(&mut self.sink, peak);
                }
            }
        }
        fired
    }
}

impl<S: AudioSink, R: Rng> Drop for NatureEngine<S, R> {
    fn drop(&mut self) {
        self.dispose();
    }
}
