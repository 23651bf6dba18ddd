//! Fixed mix and timing constants for the three voices.
//!
//! The soundscape has no user-facing mix controls; everything that shapes it
//! lives here so the graph, the scheduler and the tests agree on one set of
//! numbers.

use core::ops::Range;

// ------------------------------------- Wind ---------------------------------------

pub const WIND_BUFFER_SECS: f32 = 8.0;
pub const WIND_CUTOFF_HZ: f32 = 750.0;
pub const WIND_Q: f32 = 0.6;
pub const WIND_LEVEL: f32 = 0.32;
pub const WIND_FADE_IN_SECS: f64 = 2.6;

// ------------------------------------- Stream -------------------------------------

pub const STREAM_BUFFER_SECS: f32 = 6.0;
pub const STREAM_CENTER_HZ: f32 = 950.0;
pub const STREAM_Q: f32 = 1.1;
/// Fixed trim between the band-pass and the stream bus.
pub const STREAM_TRIM: f32 = 0.85;
pub const STREAM_LEVEL: f32 = 0.36;
pub const STREAM_FADE_IN_SECS: f64 = 2.0;

// ------------------------------------- Output -------------------------------------

pub const OUTPUT_LEVEL: f32 = 0.8;
pub const OUTPUT_FADE_IN_SECS: f64 = 1.2;

/// Every bus fades to the near-zero floor over this long on stop.
pub const FADE_OUT_SECS: f64 = 2.2;

// ------------------------------------- Chirps -------------------------------------

/// Delay between chirps, redrawn for every chirp.
pub const CHIRP_DELAY_MS: Range<f64> = 3000.0..8500.0;

/// Offset between scheduling a chirp and its oscillator starting.
pub const CHIRP_LEAD_SECS: f64 = 0.05;
/// Oscillator start → frequency peak.
pub const CHIRP_RISE_SECS: f64 = 0.2;
/// Oscillator start → end of the audible body.
pub const CHIRP_BODY_SECS: f64 = 0.75;
/// Oscillator start → amplitude peak.
pub const CHIRP_ATTACK_SECS: f64 = 0.08;
/// Silent tail after the body before the oscillator is stopped.
pub const CHIRP_TAIL_SECS: f64 = 0.1;

pub const CHIRP_START_HZ: Range<f32> = 880.0..1200.0;
pub const CHIRP_PEAK_HZ: Range<f32> = 1200.0..1800.0;
pub const CHIRP_END_HZ: Range<f32> = 680.0..920.0;
pub const CHIRP_PEAK_GAIN: f32 = 0.4;
pub const CHIRP_PAN: Range<f32> = -0.6..0.6;

// ------------------------------------- Swells -------------------------------------

pub const SWELL_PERIOD_MS: f64 = 7000.0;
pub const SWELL_PEAK: Range<f32> = 0.28..0.48;
pub const SWELL_RISE_SECS: f64 = 3.0;
pub const SWELL_SETTLE_LEVEL: f32 = 0.24;
pub const SWELL_SETTLE_SECS: f64 = 3.5;
