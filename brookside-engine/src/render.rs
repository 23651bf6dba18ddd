//! Render path.
//!
//! The [`Renderer`] owns everything that produces sound: the three gain bus
//! timelines, the two looping sources and the live chirps. It is driven by
//! whoever owns the sink (a cpal callback, or [`LocalSink`](crate::sink::LocalSink))
//! and only ever reads the schedules the control side sent it.
//!
//! Design goals
//! - No locks; commands arrive by value through [`Renderer::apply`]
//! - Per-frame work is automation lookups plus voice DSP, nothing else
//! - Finished chirps and stale automation history are dropped in
//!   [`Renderer::housekeeping`], once per block, not per frame

use brookside_core::automation::{Automatable, Automation};

use crate::nodes::{ChirpVoice, Frame, Generator, LoopSource};
use crate::sink::{Bus, Command, VoiceKind};

/// Live chirps are rare (one every few seconds, under a second long);
/// this only bounds the allocation made up front.
const CHIRP_CAPACITY: usize = 8;

#[derive(Debug)]
pub struct Renderer {
    sr: f32,
    output: Automation,
    wind_bus: Automation,
    stream_bus: Automation,
    wind: Option<LoopSource>,
    stream: Option<LoopSource>,
    chirps: Vec<ChirpVoice>,
    connected: bool,
}

impl Renderer {
    pub fn new(sr: f32) -> Self {
        Self {
            sr: sr.max(1.0),
            output: Automation::new(0.0),
            wind_bus: Automation::new(0.0),
            stream_bus: Automation::new(0.0),
            wind: None,
            stream: None,
            chirps: Vec::with_capacity(CHIRP_CAPACITY),
            connected: true,
        }
    }

    #[inline] pub fn sample_rate(&self) -> f32 { self.sr }
    #[inline] pub fn is_connected(&self) -> bool { self.connected }
    #[inline] pub fn active_chirps(&self) -> usize { self.chirps.len() }

    pub fn bus(&self, bus: Bus) -> &Automation {
        match bus {
            Bus::Output => &self.output,
            Bus::Wind => &self.wind_bus,
            Bus::Stream => &self.stream_bus,
        }
    }

    fn bus_mut(&mut self, bus: Bus) -> &mut Automation {
        match bus {
            Bus::Output => &mut self.output,
            Bus::Wind => &mut self.wind_bus,
            Bus::Stream => &mut self.stream_bus,
        }
    }

    fn source_slot(&mut self, kind: VoiceKind) -> &mut Option<LoopSource> {
        match kind {
            VoiceKind::Wind => &mut self.wind,
            VoiceKind::Stream => &mut self.stream,
        }
    }

    pub fn has_source(&self, kind: VoiceKind) -> bool {
        match kind {
            VoiceKind::Wind => self.wind.is_some(),
            VoiceKind::Stream => self.stream.is_some(),
        }
    }

    /// Apply one control message.
    pub fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Automate { bus, op } => self.bus_mut(bus).apply(op),
            Command::StartSource(spec) => {
                let sr = self.sr;
                let slot = self.source_slot(spec.kind);
                // one live source per voice
                if slot.is_none() {
                    *slot = Some(LoopSource::new(spec, sr));
                }
            }
            Command::StopSource(kind) => {
                self.source_slot(kind).take();
            }
            Command::PlayChirp(event) => {
                if self.connected {
                    self.chirps.push(ChirpVoice::new(&event, self.sr));
                }
            }
            Command::Disconnect => {
                self.connected = false;
                self.chirps.clear();
            }
        }
    }

    /// Produce the frame for sink time `time`.
    #[inline]
    pub fn next_frame(&mut self, time: f64) -> Frame {
        if !self.connected {
            return (0.0, 0.0);
        }

        let (mut l, mut r) = (0.0_f32, 0.0_f32);

        if let Some(src) = self.wind.as_mut() {
            let g = self.wind_bus.value_at(time);
            let (a, b) = src.next(time);
            l += a * g;
            r += b * g;
        }
        if let Some(src) = self.stream.as_mut() {
            let g = self.stream_bus.value_at(time);
            let (a, b) = src.next(time);
            l += a * g;
            r += b * g;
        }
        for chirp in &mut self.chirps {
            let (a, b) = chirp.next(time);
            l += a;
            r += b;
        }

        let master = self.output.value_at(time);
        (l * master, r * master)
    }

    /// Drop finished chirps and automation history older than `now`.
    pub fn housekeeping(&mut self, now: f64) {
        self.chirps.retain(|c| !c.is_finished(now));
        self.output.prune_before(now);
        self.wind_bus.prune_before(now);
        self.stream_bus.prune_before(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use brookside_core::automation::{AutomationEvent, AutomationOp};
    use brookside_core::filters::SvfMode;
    use brookside_core::noise::pink_noise;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::chirp::synthesize_chirp;
    use crate::sink::{FilterSpec, SourceSpec};

    fn wind_spec(sr: f32) -> SourceSpec {
        SourceSpec {
            kind: VoiceKind::Wind,
            buffer: Arc::new(pink_noise(0.5, sr, &mut StdRng::seed_from_u64(1))),
            filter: FilterSpec { mode: SvfMode::Lowpass, cutoff_hz: 750.0, q: 0.6 },
            trim: 1.0,
        }
    }

    fn set(bus: Bus, value: f32) -> Command {
        Command::Automate { bus, op: AutomationOp::Schedule(AutomationEvent::SetValue { value, time: 0.0 }) }
    }

    fn energy(r: &mut Renderer, frames: usize, sr: f32) -> f32 {
        (0..frames)
            .map(|i| {
                let (l, rr) = r.next_frame(i as f64 / f64::from(sr));
                l * l + rr * rr
            })
            .sum()
    }

    #[test]
    fn silent_until_buses_open() {
        let sr = 8000.0;
        let mut r = Renderer::new(sr);
        r.apply(Command::StartSource(wind_spec(sr)));
        assert_eq!(energy(&mut r, 800, sr), 0.0);

        r.apply(set(Bus::Output, 1.0));
        r.apply(set(Bus::Wind, 1.0));
        assert!(energy(&mut r, 800, sr) > 0.0);
    }

    #[test]
    fn duplicate_start_keeps_the_first_source() {
        let sr = 8000.0;
        let mut r = Renderer::new(sr);
        r.apply(Command::StartSource(wind_spec(sr)));
        r.apply(set(Bus::Output, 1.0));
        r.apply(set(Bus::Wind, 1.0));
        for i in 0..100 {
            r.next_frame(f64::from(i) / 8000.0);
        }
        r.apply(Command::StartSource(wind_spec(sr)));
        assert_eq!(r.wind.as_ref().map(LoopSource::position), Some(100));
    }

    #[test]
    fn disconnect_silences_everything() {
        let sr = 8000.0;
        let mut r = Renderer::new(sr);
        r.apply(Command::StartSource(wind_spec(sr)));
        r.apply(set(Bus::Output, 1.0));
        r.apply(set(Bus::Wind, 1.0));
        r.apply(Command::Disconnect);
        assert!(!r.is_connected());
        assert_eq!(energy(&mut r, 400, sr), 0.0);
    }

    #[test]
    fn finished_chirps_are_dropped() {
        let mut r = Renderer::new(8000.0);
        r.apply(Command::PlayChirp(synthesize_chirp(&mut StdRng::seed_from_u64(2), 0.0)));
        assert_eq!(r.active_chirps(), 1);
        r.housekeeping(0.5);
        assert_eq!(r.active_chirps(), 1);
        r.housekeeping(0.95);
        assert_eq!(r.active_chirps(), 0);
    }
}
