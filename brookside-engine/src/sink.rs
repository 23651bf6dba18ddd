//! The audio sink seam: where the control side hands work to a render path.
//!
//! The engine never renders steady-state audio itself. It schedules parameter
//! changes and wires voices by submitting [`Command`]s to an [`AudioSink`],
//! and reads the sink's clock to know what "now" is.
//!
//! Implementations:
//! - [`LocalSink`]  : in-process, renders on demand (offline render, FFI, tests)
//! - `DeviceSink`   : cpal output stream fed through a lock-free ring buffer
//!   (feature `realtime`, see [`crate::device`])

use core::fmt;
use std::sync::Arc;

use brookside_core::automation::AutomationOp;
use brookside_core::filters::SvfMode;
use brookside_core::noise::NoiseBuffer;

use crate::chirp::ChirpEvent;
use crate::nodes::Frame;
use crate::render::Renderer;

/// A summing gain stage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Bus {
    Output,
    Wind,
    Stream,
}

/// The two looping voices.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VoiceKind {
    Wind,
    Stream,
}

impl VoiceKind {
    pub const ALL: [VoiceKind; 2] = [VoiceKind::Wind, VoiceKind::Stream];

    /// The gain bus this voice feeds.
    #[inline]
    pub fn bus(self) -> Bus {
        match self {
            VoiceKind::Wind => Bus::Wind,
            VoiceKind::Stream => Bus::Stream,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FilterSpec {
    pub mode: SvfMode,
    pub cutoff_hz: f32,
    pub q: f32,
}

/// Everything the render path needs to start a looping voice.
#[derive(Clone, Debug)]
pub struct SourceSpec {
    pub kind: VoiceKind,
    pub buffer: Arc<NoiseBuffer>,
    pub filter: FilterSpec,
    pub trim: f32,
}

/// Control → render message.
#[derive(Clone, Debug)]
pub enum Command {
    Automate { bus: Bus, op: AutomationOp },
    StartSource(SourceSpec),
    StopSource(VoiceKind),
    PlayChirp(ChirpEvent),
    /// Detach the output bus from the sink; nothing is heard afterwards.
    Disconnect,
}

/// Failures reported by sinks.
#[derive(Debug)]
pub enum SinkError {
    /// The sink refused to start or resume output.
    Resume(String),
    /// No usable output device.
    NoDevice,
    /// Device enumeration or configuration failed.
    Device(String),
    /// Building the output stream failed.
    Stream(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Resume(e) => write!(f, "could not resume audio output: {e}"),
            SinkError::NoDevice => f.write_str("no output device available"),
            SinkError::Device(e) => write!(f, "audio device error: {e}"),
            SinkError::Stream(e) => write!(f, "could not build output stream: {e}"),
        }
    }
}

impl std::error::Error for SinkError {}

/// Real-time audio output as seen from the control thread.
pub trait AudioSink {
    /// Sink clock in seconds. Does not advance while the sink is suspended.
    fn current_time(&self) -> f64;

    fn sample_rate(&self) -> f32;

    /// Start or resume output. May fail, e.g. before the platform allows playback.
    fn resume(&mut self) -> Result<(), SinkError>;

    /// Hand a command to the render path.
    fn submit(&mut self, cmd: Command);
}

/// In-process sink that renders on demand.
///
/// The clock is the number of frames rendered so far; it only advances while
/// the sink is resumed, so rendering a suspended sink yields silence and keeps
/// time still.
#[derive(Debug)]
pub struct LocalSink {
    renderer: Renderer,
    frames: u64,
    sr: f32,
    resumed: bool,
}

impl LocalSink {
    pub fn new(sample_rate: f32) -> Self {
        let sr = sample_rate.max(1.0);
        Self { renderer: Renderer::new(sr), frames: 0, sr, resumed: false }
    }

    #[inline] pub fn is_resumed(&self) -> bool { self.resumed }
    #[inline] pub fn renderer(&self) -> &Renderer { &self.renderer }
    #[inline] pub fn frames_rendered(&self) -> u64 { self.frames }

    /// Render interleaved frames into `out`. Returns the number of frames written.
    pub fn render_interleaved(&mut self, out: &mut [f32], channels: usize) -> usize {
        if channels == 0 {
            return 0;
        }
        let frames = out.len() / channels;
        if !self.resumed {
            out.fill(0.0);
            return frames;
        }
        for frame in out.chunks_exact_mut(channels) {
            let t = self.frames as f64 / f64::from(self.sr);
            let y = self.renderer.next_frame(t);
            write_frame(frame, y, |x| x);
            self.frames += 1;
        }
        self.renderer.housekeeping(self.current_time());
        frames
    }

    /// Render `frames` stereo frames and return them.
    pub fn render_frames(&mut self, frames: usize) -> Vec<Frame> {
        let mut buf = vec![0.0; frames * 2];
        self.render_interleaved(&mut buf, 2);
        buf.chunks_exact(2).map(|f| (f[0], f[1])).collect()
    }

    /// Render and discard `seconds` of audio, in small blocks.
    pub fn advance(&mut self, seconds: f64) {
        let mut remaining = (seconds * f64::from(self.sr)).round() as usize;
        let mut block = [0.0_f32; 512];
        while remaining > 0 {
            let n = remaining.min(block.len() / 2);
            self.render_interleaved(&mut block[..n * 2], 2);
            remaining -= n;
        }
    }
}

impl AudioSink for LocalSink {
    fn current_time(&self) -> f64 {
        self.frames as f64 / f64::from(self.sr)
    }

    fn sample_rate(&self) -> f32 {
        self.sr
    }

    fn resume(&mut self) -> Result<(), SinkError> {
        self.resumed = true;
        Ok(())
    }

    fn submit(&mut self, cmd: Command) {
        self.renderer.apply(cmd);
    }
}

/// Write a stereo frame to an interleaved device frame of any width.
///
/// Mono devices get the average; extra channels beyond two repeat the average.
/// Samples are hard-limited to [-1, 1] before conversion.
#[inline]
pub fn write_frame<T: Copy>(out: &mut [T], (l, r): Frame, conv: impl Fn(f32) -> T) {
    let l = l.clamp(-1.0, 1.0);
    let r = r.clamp(-1.0, 1.0);
    match out {
        [] => {}
        [mono] => *mono = conv(0.5 * (l + r)),
        [left, right, rest @ ..] => {
            *left = conv(l);
            *right = conv(r);
            let mid = conv(0.5 * (l + r));
            rest.fill(mid);
        }
    }
}
