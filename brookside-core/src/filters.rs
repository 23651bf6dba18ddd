//! Tone shaping for the looping voices.
//!
//! Wind runs through a gentle low-pass, the stream through a band-pass
//! around 950 Hz. Both use the same zero-delay state-variable filter, one
//! instance per channel, configured once when the voice starts.
//!
//! The band-pass tap is normalised to unity gain at the center frequency,
//! so `Q` changes only the bandwidth, never the level.

use crate::dsp::{kill_denormals, tpt_g};

/// Which response `SvfTpt::process` returns.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SvfMode {
    Lowpass,
    Bandpass,
}

/// Zero-delay (trapezoidal) state-variable filter with `g = tan(π fc / sr)`
/// and damping `R = 1 / (2Q)`.
#[derive(Copy, Clone, Debug)]
pub struct SvfTpt {
    sr: f32,
    cut: f32,
    q: f32,
    mode: SvfMode,
    // derived
    g: f32,
    r: f32,
    // states
    ic1eq: f32,
    ic2eq: f32,
}

impl SvfTpt {
    #[inline]
    pub fn new(mode: SvfMode, cut_hz: f32, q: f32, sr: f32) -> Self {
        let mut s = Self {
            sr: sr.max(1.0),
            cut: cut_hz.max(0.0),
            q: q.max(1e-4),
            mode,
            g: 0.0,
            r: 0.0,
            ic1eq: 0.0,
            ic2eq: 0.0,
        };
        s.recalc();
        s
    }

    #[inline] pub fn mode(&self) -> SvfMode { self.mode }
    #[inline] pub fn cutoff_hz(&self) -> f32 { self.cut }
    #[inline] pub fn q(&self) -> f32 { self.q }

    #[inline]
    fn recalc(&mut self) {
        self.g = tpt_g(self.cut, self.sr);
        self.r = 1.0 / (2.0 * self.q);
    }

    /// Process one sample and return both taps `(lp, bp)`.
    #[inline]
    pub fn process_both(&mut self, x: f32) -> (f32, f32) {
        // TPT SVF (Zavalishin), solved for the zero-delay feedback loop:
        // v1 = (ic1eq + g (x - ic2eq)) / (1 + 2Rg + g^2)
        let g = self.g;
        let k = 2.0 * self.r;
        let v1 = (self.ic1eq + g * (x - self.ic2eq)) / (1.0 + g * (g + k));
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = kill_denormals(2.0 * v1 - self.ic1eq);
        self.ic2eq = kill_denormals(2.0 * v2 - self.ic2eq);

        (v2, k * v1)
    }

    /// Process one sample, returning the configured tap.
    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let (lp, bp) = self.process_both(x);
        match self.mode {
            SvfMode::Lowpass => lp,
            SvfMode::Bandpass => bp,
        }
    }
}

// ------------------------------------ Tests --------------------------------------
