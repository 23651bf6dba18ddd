//! Render-side building blocks (nodes) for the soundscape.
//!
//! These are per-sample components owned by the [`Renderer`](crate::render::Renderer).
//! Nothing here allocates once constructed; no locks.
//!
//! Contents:
//! - `Generator`  : anything that produces one stereo frame at a time
//! - `LoopSource` : a noise buffer looped forever through a filter and trim
//! - `ChirpVoice` : one transient sine chirp with scheduled pitch, level and pan
//!
//! Notes:
//! - Time is **seconds on the sink clock**; methods take it per frame so
//!   scheduled automation can be evaluated sample-accurately.

use std::sync::Arc;

use brookside_core::dsp::{fast_sin, PanLaw, TAU};
use brookside_core::filters::SvfTpt;
use brookside_core::noise::NoiseBuffer;

use crate::chirp::ChirpEvent;
use crate::sink::{SourceSpec, VoiceKind};

/// One stereo frame `(left, right)`.
pub type Frame = (f32, f32);

/// Anything that can generate one frame at a time.
pub trait Generator {
    /// Generate the frame for sink time `time` (seconds).
    fn next(&mut self, time: f64) -> Frame;
}

/// Looping buffer player with a per-channel filter and a fixed trim.
#[derive(Clone, Debug)]
pub struct LoopSource {
    kind: VoiceKind,
    buffer: Arc<NoiseBuffer>,
    pos: usize,
    filters: [SvfTpt; 2],
    trim: f32,
}

impl LoopSource {
    pub fn new(spec: SourceSpec, sr: f32) -> Self {
        let f = spec.filter;
        let svf = SvfTpt::new(f.mode, f.cutoff_hz, f.q, sr);
        Self {
            kind: spec.kind,
            buffer: spec.buffer,
            pos: 0,
            filters: [svf, svf],
            trim: spec.trim,
        }
    }

    #[inline] pub fn kind(&self) -> VoiceKind { self.kind }
    #[inline] pub fn position(&self) -> usize { self.pos }
}

impl Generator for LoopSource {
    #[inline]
    fn next(&mut self, _time: f64) -> Frame {
        let len = self.buffer.len();
        if len == 0 {
            return (0.0, 0.0);
        }
        let (l, r) = self.buffer.frame(self.pos);
        self.pos += 1;
        if self.pos >= len {
            self.pos = 0;
        }

        if self.buffer.channel_count() == 1 {
            let y = self.filters[0].process(l) * self.trim;
            (y, y)
        } else {
            (self.filters[0].process(l) * self.trim, self.filters[1].process(r) * self.trim)
        }
    }
}

/// One chirp: sine oscillator → gain envelope → fixed panner.
///
/// Plain data, no heap: building and dropping one is free on the audio thread.
#[derive(Copy, Clone, Debug)]
pub struct ChirpVoice {
    event: ChirpEvent,
    pan: (f32, f32),
    phase: f32, // [0,1)
    sr: f32,
}

impl ChirpVoice {
    pub fn new(event: &ChirpEvent, sr: f32) -> Self {
        Self {
            event: *event,
            pan: PanLaw::gains(event.pan),
            phase: 0.0,
            sr: sr.max(1.0),
        }
    }

    /// True once the oscillator's stop time has passed.
    #[inline]
    pub fn is_finished(&self, time: f64) -> bool {
        time >= self.event.stop
    }
}

impl Generator for ChirpVoice {
    #[inline]
    fn next(&mut self, time: f64) -> Frame {
        if time < self.event.start || time >= self.event.stop {
            return (0.0, 0.0);
        }
        let s = fast_sin(TAU * self.phase) * self.event.gain_at(time);
        self.phase = (self.phase + self.event.frequency_at(time) / self.sr).fract();
        (s * self.pan.0, s * self.pan.1)
    }
}
