//! Transient tone synthesis: one bird chirp per call.
//!
//! A chirp is a sine whose pitch rises then falls along exponential segments
//! while an exponential swell-and-decay envelope shapes its level. It is
//! described declaratively (control points on a timeline) and handed to the
//! render path by value. The render path plays it with a
//! [`ChirpVoice`](crate::nodes::ChirpVoice) that reads the fixed control
//! points directly, so nothing is allocated per chirp on the audio thread.

use brookside_core::automation::{evaluate, AutomationEvent};
use brookside_core::dsp::NEAR_ZERO;
use rand::Rng;

use crate::tuning::{
    CHIRP_ATTACK_SECS, CHIRP_BODY_SECS, CHIRP_END_HZ, CHIRP_LEAD_SECS, CHIRP_PAN, CHIRP_PEAK_GAIN, CHIRP_PEAK_HZ,
    CHIRP_RISE_SECS, CHIRP_START_HZ, CHIRP_TAIL_SECS,
};

/// Fully-resolved parameters of one chirp, in absolute sink time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ChirpEvent {
    /// Oscillator start.
    pub start: f64,
    /// Oscillator stop; the voice is discarded after this.
    pub stop: f64,
    /// Set → exponential rise → exponential fall.
    pub frequency: [AutomationEvent; 3],
    /// Floor → floor hold → exponential attack → exponential decay to floor.
    pub envelope: [AutomationEvent; 4],
    /// Fixed stereo position in [-0.6, 0.6).
    pub pan: f32,
}

impl ChirpEvent {
    /// Seconds between scheduling and the oscillator starting.
    #[inline]
    pub fn start_offset(&self, scheduled_at: f64) -> f64 {
        self.start - scheduled_at
    }

    /// Oscillator frequency at sink time `time`.
    #[inline]
    pub fn frequency_at(&self, time: f64) -> f32 {
        evaluate(self.frequency[0].value(), &self.frequency, time)
    }

    /// Envelope level at sink time `time`.
    #[inline]
    pub fn gain_at(&self, time: f64) -> f32 {
        evaluate(NEAR_ZERO, &self.envelope, time)
    }
}

/// Draw one chirp scheduled at `now`.
pub fn synthesize_chirp<R: Rng + ?Sized>(rng: &mut R, now: f64) -> ChirpEvent {
    let start = now + CHIRP_LEAD_SECS;
    let end = start + CHIRP_BODY_SECS;

    let pan = rng.gen_range(CHIRP_PAN);
    let f_start = rng.gen_range(CHIRP_START_HZ);
    let f_peak = rng.gen_range(CHIRP_PEAK_HZ);
    let f_end = rng.gen_range(CHIRP_END_HZ);

    ChirpEvent {
        start,
        stop: end + CHIRP_TAIL_SECS,
        frequency: [
            AutomationEvent::SetValue { value: f_start, time: start },
            AutomationEvent::ExponentialRamp { value: f_peak, time: start + CHIRP_RISE_SECS },
            AutomationEvent::ExponentialRamp { value: f_end, time: end },
        ],
        envelope: [
            AutomationEvent::SetValue { value: NEAR_ZERO, time: now },
            AutomationEvent::SetValue { value: NEAR_ZERO, time: start },
            AutomationEvent::ExponentialRamp { value: CHIRP_PEAK_GAIN, time: start + CHIRP_ATTACK_SECS },
            AutomationEvent::ExponentialRamp { value: NEAR_ZERO, time: end },
        ],
        pan,
    }
}
