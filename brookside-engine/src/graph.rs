//! Signal graph, control side.
//!
//! [`SignalGraph`] owns the control thread's view of the mix: a mirror of each
//! gain bus timeline and a handle for each looping source. Every change is
//! applied to the mirror and forwarded to the sink as a [`Command`], so the
//! control side can always answer "what is this bus at right now" without
//! asking the render thread.
//!
//! Topology
//! ```text
//! wind   : pink 8 s loop → lowpass 750 Hz Q0.6 ───────────→ wind bus ───┐
//! stream : water 6 s loop → bandpass 950 Hz Q1.1 → ×0.85 → stream bus ─┼→ output bus → sink
//! chirps : sine → envelope → pan ──────────────────────────────────────┘
//! ```

use std::sync::Arc;

use brookside_core::automation::{ramp_param, Automatable, Automation, AutomationEvent, AutomationOp};
use brookside_core::dsp::NEAR_ZERO;
use brookside_core::filters::SvfMode;
use brookside_core::noise::{pink_noise, water_noise, NoiseBuffer};
use log::{debug, trace};
use rand::Rng;

use crate::chirp::ChirpEvent;
use crate::sink::{AudioSink, Bus, Command, FilterSpec, SourceSpec, VoiceKind};
use crate::tuning::{
    FADE_OUT_SECS, OUTPUT_FADE_IN_SECS, OUTPUT_LEVEL, STREAM_BUFFER_SECS, STREAM_CENTER_HZ, STREAM_FADE_IN_SECS,
    STREAM_LEVEL, STREAM_Q, STREAM_TRIM, SWELL_RISE_SECS, SWELL_SETTLE_LEVEL, SWELL_SETTLE_SECS, WIND_BUFFER_SECS,
    WIND_CUTOFF_HZ, WIND_FADE_IN_SECS, WIND_LEVEL, WIND_Q,
};

/// Result of hard-stopping a source. Both outcomes are acceptable.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    AlreadyStopped,
}

/// Control-side handle to a live looping source.
#[derive(Debug)]
pub struct SourceHandle {
    kind: VoiceKind,
    buffer: Arc<NoiseBuffer>,
    stopped: bool,
}

impl SourceHandle {
    #[inline] pub fn kind(&self) -> VoiceKind { self.kind }
    #[inline] pub fn buffer(&self) -> &NoiseBuffer { &self.buffer }
    #[inline] pub fn is_stopped(&self) -> bool { self.stopped }

    /// Hard-stop the source. Stopping twice is reported, not treated as an error.
    pub fn stop<S: AudioSink + ?Sized>(&mut self, sink: &mut S) -> StopOutcome {
        if self.stopped {
            return StopOutcome::AlreadyStopped;
        }
        sink.submit(Command::StopSource(self.kind));
        self.stopped = true;
        StopOutcome::Stopped
    }
}

/// A gain bus seen through the ramp primitive: the local mirror is updated and
/// every change is forwarded to the sink.
pub struct BusParam<'a, S: AudioSink + ?Sized> {
    bus: Bus,
    mirror: &'a mut Automation,
    sink: &'a mut S,
}

impl<S: AudioSink + ?Sized> BusParam<'_, S> {
    fn forward(&mut self, op: AutomationOp) {
        self.mirror.apply(op);
        self.sink.submit(Command::Automate { bus: self.bus, op });
    }
}

impl<S: AudioSink + ?Sized> Automatable for BusParam<'_, S> {
    fn value_at(&self, time: f64) -> f32 {
        self.mirror.value_at(time)
    }

    fn cancel_scheduled_values(&mut self, from: f64) {
        self.forward(AutomationOp::Cancel { from });
    }

    fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.forward(AutomationOp::Schedule(AutomationEvent::SetValue { value, time }));
    }

    fn linear_ramp_to_value_at_time(&mut self, value: f32, time: f64) {
        self.forward(AutomationOp::Schedule(AutomationEvent::LinearRamp { value, time }));
    }

    fn exponential_ramp_to_value_at_time(&mut self, value: f32, time: f64) {
        self.forward(AutomationOp::Schedule(AutomationEvent::ExponentialRamp { value, time }));
    }
}

#[derive(Debug)]
pub struct SignalGraph {
    output: Automation,
    wind_bus: Automation,
    stream_bus: Automation,
    wind: Option<SourceHandle>,
    stream: Option<SourceHandle>,
    /// Buffers of released sources, held until the render path lets go of
    /// them so they are freed here and not on the audio thread.
    retired: Vec<Arc<NoiseBuffer>>,
    connected: bool,
}

impl Default for SignalGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalGraph {
    pub fn new() -> Self {
        Self {
            output: Automation::new(0.0),
            wind_bus: Automation::new(0.0),
            stream_bus: Automation::new(0.0),
            wind: None,
            stream: None,
            retired: Vec::new(),
            connected: true,
        }
    }

    #[inline] pub fn is_connected(&self) -> bool { self.connected }
    #[inline] pub fn retired_buffers(&self) -> usize { self.retired.len() }

    pub fn source(&self, kind: VoiceKind) -> Option<&SourceHandle> {
        match kind {
            VoiceKind::Wind => self.wind.as_ref(),
            VoiceKind::Stream => self.stream.as_ref(),
        }
    }

    /// Control-side view of a bus timeline.
    pub fn automation(&self, bus: Bus) -> &Automation {
        match bus {
            Bus::Output => &self.output,
            Bus::Wind => &self.wind_bus,
            Bus::Stream => &self.stream_bus,
        }
    }

    /// Open a bus for scheduling. History the sink clock has already passed
    /// is pruned from the mirror first, the same way the renderer prunes its copy.
    pub fn bus<'a, S: AudioSink + ?Sized>(&'a mut self, bus: Bus, sink: &'a mut S) -> BusParam<'a, S> {
        let mirror = match bus {
            Bus::Output => &mut self.output,
            Bus::Wind => &mut self.wind_bus,
            Bus::Stream => &mut self.stream_bus,
        };
        mirror.prune_before(sink.current_time());
        BusParam { bus, mirror, sink }
    }

    /// Ramp one bus from wherever it is now to `target` over `seconds`.
    pub fn ramp_bus<S: AudioSink + ?Sized>(&mut self, sink: &mut S, bus: Bus, target: f32, seconds: f64) {
        let now = sink.current_time();
        trace!("ramp {bus:?} → {target:.4} over {seconds:.2}s @ {now:.3}");
        ramp_param(&mut self.bus(bus, sink), now, target, seconds);
    }

    /// Build and start the voice's looping source unless it already exists.
    ///
    /// Returns `true` if a source was created.
    pub fn ensure_source<S, R>(&mut self, kind: VoiceKind, sink: &mut S, rng: &mut R) -> bool
    where
        S: AudioSink + ?Sized,
        R: Rng + ?Sized,
    {
        let slot = match kind {
            VoiceKind::Wind => &mut self.wind,
            VoiceKind::Stream => &mut self.stream,
        };
        if slot.is_some() {
            return false;
        }

        let sr = sink.sample_rate();
        let spec = match kind {
            VoiceKind::Wind => SourceSpec {
                kind,
                buffer: Arc::new(pink_noise(WIND_BUFFER_SECS, sr, rng)),
                filter: FilterSpec { mode: SvfMode::Lowpass, cutoff_hz: WIND_CUTOFF_HZ, q: WIND_Q },
                trim: 1.0,
            },
            VoiceKind::Stream => SourceSpec {
                kind,
                buffer: Arc::new(water_noise(STREAM_BUFFER_SECS, sr, rng)),
                filter: FilterSpec { mode: SvfMode::Bandpass, cutoff_hz: STREAM_CENTER_HZ, q: STREAM_Q },
                trim: STREAM_TRIM,
            },
        };
        debug!("starting {kind:?} source ({} frames @ {sr} Hz)", spec.buffer.len());

        *slot = Some(SourceHandle { kind, buffer: Arc::clone(&spec.buffer), stopped: false });
        sink.submit(Command::StartSource(spec));
        true
    }

    /// Fade the output bus up to its running level.
    pub fn fade_in_output<S: AudioSink + ?Sized>(&mut self, sink: &mut S) {
        self.ramp_bus(sink, Bus::Output, OUTPUT_LEVEL, OUTPUT_FADE_IN_SECS);
    }

    /// Fade a voice's bus up to its running level.
    pub fn fade_in_voice<S: AudioSink + ?Sized>(&mut self, sink: &mut S, kind: VoiceKind) {
        let (level, secs) = match kind {
            VoiceKind::Wind => (WIND_LEVEL, WIND_FADE_IN_SECS),
            VoiceKind::Stream => (STREAM_LEVEL, STREAM_FADE_IN_SECS),
        };
        self.ramp_bus(sink, kind.bus(), level, secs);
    }

    /// Fade every bus to the near-zero floor. Sources keep running.
    pub fn fade_out<S: AudioSink + ?Sized>(&mut self, sink: &mut S) {
        for bus in [Bus::Output, Bus::Wind, Bus::Stream] {
            self.ramp_bus(sink, bus, NEAR_ZERO, FADE_OUT_SECS);
        }
    }

    /// One wind swell: up to `peak`, then settle.
    pub fn swell<S: AudioSink + ?Sized>(&mut self, sink: &mut S, peak: f32) {
        let now = sink.current_time();
        let mut wind = self.bus(Bus::Wind, sink);
        ramp_param(&mut wind, now, peak, SWELL_RISE_SECS);
        wind.linear_ramp_to_value_at_time(SWELL_SETTLE_LEVEL, now + SWELL_RISE_SECS + SWELL_SETTLE_SECS);
    }

    /// Route a chirp into the output bus.
    pub fn play_chirp<S: AudioSink + ?Sized>(&mut self, sink: &mut S, event: ChirpEvent) {
        if self.connected {
            sink.submit(Command::PlayChirp(event));
        }
    }

    /// Hard-stop both sources.
    pub fn stop_sources<S: AudioSink + ?Sized>(&mut self, sink: &mut S) -> Vec<(VoiceKind, StopOutcome)> {
        [self.wind.as_mut(), self.stream.as_mut()]
            .into_iter()
            .flatten()
            .map(|src| (src.kind(), src.stop(sink)))
            .collect()
    }

    /// Drop all source handles and disconnect the output bus.
    ///
    /// The buffers move to the retired list; [`collect_retired`](Self::collect_retired)
    /// frees them once the render path has dropped its references.
    pub fn release<S: AudioSink + ?Sized>(&mut self, sink: &mut S) {
        let handles = [self.wind.take(), self.stream.take()];
        self.retired.extend(handles.into_iter().flatten().map(|h| h.buffer));
        if self.connected {
            sink.submit(Command::Disconnect);
            self.connected = false;
        }
    }

    /// Free retired buffers nobody else references any more.
    ///
    /// Returns how many are still held elsewhere.
    pub fn collect_retired(&mut self) -> usize {
        let before = self.retired.len();
        self.retired.retain(|buf| Arc::strong_count(buf) > 1);
        if self.retired.len() < before {
            trace!("freed {} retired buffer(s)", before - self.retired.len());
        }
        self.retired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::LocalSink;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sink() -> LocalSink {
        let mut s = LocalSink::new(8000.0);
        s.resume().unwrap();
        s
    }

    #[test]
    fn ensure_source_is_idempotent() {
        let mut sink = sink();
        let mut rng = StdRng::seed_from_u64(0);
        let mut g = SignalGraph::new();

        assert!(g.ensure_source(VoiceKind::Wind, &mut sink, &mut rng));
        assert!(!g.ensure_source(VoiceKind::Wind, &mut sink, &mut rng));
        assert!(g.ensure_source(VoiceKind::Stream, &mut sink, &mut rng));

        let wind = g.source(VoiceKind::Wind).unwrap();
        assert_eq!(wind.buffer().channel_count(), 1);
        assert_eq!(wind.buffer().len(), 8 * 8000);
        let stream = g.source(VoiceKind::Stream).unwrap();
        assert_eq!(stream.buffer().channel_count(), 2);
        assert_eq!(stream.buffer().len(), 6 * 8000);

        assert!(sink.renderer().has_source(VoiceKind::Wind));
        assert!(sink.renderer().has_source(VoiceKind::Stream));
    }

    #[test]
    fn mirror_and_renderer_agree() {
        let mut sink = sink();
        let mut g = SignalGraph::new();
        g.fade_in_output(&mut sink);
        g.fade_in_voice(&mut sink, VoiceKind::Wind);
        sink.advance(1.0);
        g.swell(&mut sink, 0.4);
        sink.advance(0.5);
        g.fade_out(&mut sink);

        // both sides prune on their own schedule, so compare values, not events
        let now = sink.current_time();
        for bus in [Bus::Output, Bus::Wind, Bus::Stream] {
            for dt in [0.0, 0.3, 1.1, 2.2, 5.0] {
                let t = now + dt;
                assert_eq!(g.automation(bus).value_at(t), sink.renderer().bus(bus).value_at(t), "{bus:?} @ {t}");
            }
        }
    }

    #[test]
    fn repeated_swells_keep_the_mirror_small() {
        let mut sink = sink();
        let mut g = SignalGraph::new();
        g.fade_in_voice(&mut sink, VoiceKind::Wind);
        for i in 0..400 {
            sink.advance(0.25);
            g.swell(&mut sink, 0.28 + (i % 10) as f32 * 0.02);
        }
        let events = g.automation(Bus::Wind).events().len();
        assert!(events <= 4, "wind mirror holds {events} events");

        // the settle point is still scheduled and agrees with the render side
        let now = sink.current_time();
        let settle = now + SWELL_RISE_SECS + SWELL_SETTLE_SECS;
        assert_eq!(g.automation(Bus::Wind).value_at(settle), SWELL_SETTLE_LEVEL);
        assert_eq!(sink.renderer().bus(Bus::Wind).value_at(settle), SWELL_SETTLE_LEVEL);
    }

    #[test]
    fn swell_settles_at_fixed_level() {
        let mut sink = sink();
        let mut g = SignalGraph::new();
        g.swell(&mut sink, 0.4);
        let wind = g.automation(Bus::Wind);
        assert!((wind.value_at(3.0) - 0.4).abs() < 1e-6);
        assert_eq!(wind.value_at(6.5), 0.24);
        assert_eq!(wind.pending_target(0.0), Some((0.24, 6.5)));
    }

    #[test]
    fn stopping_twice_reports_already_stopped() {
        let mut sink = sink();
        let mut rng = StdRng::seed_from_u64(0);
        let mut g = SignalGraph::new();
        g.ensure_source(VoiceKind::Wind, &mut sink, &mut rng);

        assert_eq!(g.stop_sources(&mut sink), vec![(VoiceKind::Wind, StopOutcome::Stopped)]);
        assert_eq!(g.stop_sources(&mut sink), vec![(VoiceKind::Wind, StopOutcome::AlreadyStopped)]);
        assert!(!sink.renderer().has_source(VoiceKind::Wind));

        g.release(&mut sink);
        assert!(g.stop_sources(&mut sink).is_empty());
        assert!(!g.is_connected());
        assert!(!sink.renderer().is_connected());

        // the render side already let go of the wind buffer
        assert_eq!(g.retired_buffers(), 1);
        assert_eq!(g.collect_retired(), 0);
    }

    #[test]
    fn retired_buffers_wait_for_the_render_side() {
        let mut sink = sink();
        let mut rng = StdRng::seed_from_u64(0);
        let mut g = SignalGraph::new();
        g.ensure_source(VoiceKind::Wind, &mut sink, &mut rng);
        g.ensure_source(VoiceKind::Stream, &mut sink, &mut rng);

        // released without stopping: the renderer still plays both
        g.release(&mut sink);
        assert_eq!(g.collect_retired(), 2);

        sink.submit(Command::StopSource(VoiceKind::Wind));
        assert_eq!(g.collect_retired(), 1);
        sink.submit(Command::StopSource(VoiceKind::Stream));
        assert_eq!(g.collect_retired(), 0);
    }
}
