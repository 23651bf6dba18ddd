//! Brookside engine: a procedural nature soundscape.
//!
//! Wind, a stream and the occasional bird, all synthesized. The engine does
//! not render audio on the control thread; it builds the signal graph once,
//! then only schedules parameter ramps and one-shot chirps that a render path
//! plays back sample-accurately.
//!
//! Crate layout:
//! - [`engine`]    : `NatureEngine` lifecycle (start / stop / dispose / poll)
//! - [`graph`]     : control-side signal graph, bus mirrors, source handles
//! - [`scheduler`] : chirp and swell timers
//! - [`timer`]     : cancellable timers on the sink clock
//! - [`chirp`]     : one bird chirp as a set of scheduled control points
//! - [`render`]    : render-side mixer evaluated per sample
//! - [`nodes`]     : looping sources and chirp voices
//! - [`sink`]      : the `AudioSink` seam and the in-process `LocalSink`
//! - `device`      : cpal output sink (feature `realtime`)
//! - [`tuning`]    : fixed levels, fade times and timing ranges
//!
//! ```no_run
//! use brookside_engine::{LocalSink, NatureEngine};
//!
//! let mut engine = NatureEngine::with_seed(LocalSink::new(48_000.0), 42);
//! engine.start();
//! engine.sink_mut().advance(10.0);
//! engine.poll();
//! engine.stop();
//! ```

pub mod chirp;
pub mod engine;
pub mod graph;
pub mod nodes;
pub mod render;
pub mod scheduler;
pub mod sink;
pub mod timer;
pub mod tuning;

cfg_if::cfg_if! {
    if #[cfg(feature = "realtime")] {
        pub mod device;
        pub use device::DeviceSink;
        pub use cpal;
    }
}

pub use chirp::{synthesize_chirp, ChirpEvent};
pub use engine::{ControllerState, EngineState, NatureEngine};
pub use graph::{SignalGraph, StopOutcome};
pub use render::Renderer;
pub use sink::{AudioSink, Bus, Command, LocalSink, SinkError, VoiceKind};
