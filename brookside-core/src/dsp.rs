//! Math helpers shared by the noise generators, filters, automation and voices.
//!
//! With the `fast-math` feature the sine used by chirp oscillators, the pan
//! law and the filter coefficient switch to polynomial approximations.

#![allow(clippy::excessive_precision)]

use core::f32::consts::PI;

use cfg_if::cfg_if;

// --------------------------------- Constants -------------------------------------

pub const TAU: f32 = 2.0 * PI;

/// Below this a filter state is flushed to zero.
pub const EPS_SMALL: f32 = 1.0e-20;

/// Smallest level a gain is faded to. Exponential curves are undefined at 0,
/// so "silent" always means this value.
pub const NEAR_ZERO: f32 = 1.0e-4;

// --------------------------------- Utilities -------------------------------------

#[inline]
pub fn clamp(x: f32, lo: f32, hi: f32) -> f32 {
    if x < lo { lo } else if x > hi { hi } else { x }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Geometric interpolation `a * (b/a)^t`.
///
/// Only meaningful when `a` and `b` are non-zero with the same sign; otherwise
/// the start value `a` is held, which is how audio-parameter timelines treat
/// an undefined exponential segment.
#[inline]
pub fn exp_interp(a: f32, b: f32, t: f32) -> f32 {
    if a == 0.0 || b == 0.0 || (a < 0.0) != (b < 0.0) {
        return a;
    }
    a * (b / a).powf(t)
}

/// Kill denormal/subnormal values. Returns 0.0 if |x| < EPS_SMALL.
#[inline]
pub fn kill_denormals(x: f32) -> f32 {
    if x.abs() < EPS_SMALL { 0.0 } else { x }
}

/// Uniform white sample in [-1, 1) from a unit draw in [0, 1).
#[inline]
pub fn bipolar(u: f32) -> f32 {
    u * 2.0 - 1.0
}

// --------------------------------- Fast trig -------------------------------------

/// Sine. Under `fast-math`: fold into [-π/2, π/2], then an odd 5th-order
/// polynomial (abs error well under 1e-3).
#[inline]
pub fn fast_sin(x: f32) -> f32 {
    cfg_if! {
        if #[cfg(feature = "fast-math")] {
            let mut xr = x;
            let k = (xr / TAU).round();
            xr -= k * TAU;
            let half_pi = core::f32::consts::FRAC_PI_2;
            if xr > half_pi {
                xr = PI - xr;
            } else if xr < -half_pi {
                xr = -PI - xr;
            }

            let x2 = xr * xr;
            xr * (0.999_979_313_3 + x2 * (-0.166_624_432_0 + x2 * 0.008_308_978_98))
        } else {
            x.sin()
        }
    }
}

#[inline]
pub fn fast_cos(x: f32) -> f32 {
    cfg_if! {
        if #[cfg(feature = "fast-math")] {
            fast_sin(x + core::f32::consts::PI * 0.5)
        } else {
            x.cos()
        }
    }
}

/// Filter coefficient `g = tan(π fc / sr)`, with `fc` kept just below Nyquist.
#[inline]
pub fn tpt_g(cut_hz: f32, sr: f32) -> f32 {
    let x = PI * (cut_hz.min(0.499 * sr) / sr);
    cfg_if! {
        if #[cfg(feature = "fast-math")] {
            fast_sin(x) / fast_cos(x)
        } else {
            x.tan()
        }
    }
}

// --------------------------------- Panning ---------------------------------------

/// Constant-power stereo placement.
#[derive(Copy, Clone, Debug)]
pub struct PanLaw;
impl PanLaw {
    /// `(left, right)` gains for `pan` in [-1, 1]; -1 is hard left.
    #[inline]
    pub fn gains(pan: f32) -> (f32, f32) {
        let p = (clamp(pan, -1.0, 1.0) + 1.0) * 0.25 * PI; // map to [0, π/2]
        (fast_cos(p), fast_sin(p))
    }
}

// --------------------------------- Tests -----------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_limits_both_ends() {
        assert_eq!(clamp(2.0, -1.0, 1.0), 1.0);
        assert_eq!(clamp(-2.0, -1.0, 1.0), -1.0);
        assert_eq!(clamp(0.25, -1.0, 1.0), 0.25);
    }

    #[test]
    fn exp_interp_hits_endpoints() {
        assert!((exp_interp(NEAR_ZERO, 0.4, 0.0) - NEAR_ZERO).abs() < 1e-9);
        assert!((exp_interp(NEAR_ZERO, 0.4, 1.0) - 0.4).abs() < 1e-5);
        let mid = exp_interp(1000.0, 1500.0, 0.5);
        assert!(mid > 1000.0 && mid < 1250.0, "geometric mean sits below the linear one: {mid}");
    }

    #[test]
    fn exp_interp_holds_on_zero_or_sign_change() {
        assert_eq!(exp_interp(0.0, 1.0, 0.5), 0.0);
        assert_eq!(exp_interp(0.5, -0.5, 0.5), 0.5);
    }

    #[test]
    fn fast_sin_tracks_sin_over_a_full_turn() {
        for i in 0..=1000 {
            let x = TAU * i as f32 / 1000.0;
            assert!((fast_sin(x) - x.sin()).abs() < 2e-3, "x={x}");
        }
    }

    #[test]
    fn pan_law_is_constant_power() {
        for pan in [-1.0, -0.6, 0.0, 0.3, 0.6, 1.0] {
            let (l, r) = PanLaw::gains(pan);
            assert!((l * l + r * r - 1.0).abs() < 1e-2, "pan={pan} l={l} r={r}");
        }
        let (l, r) = PanLaw::gains(-1.0);
        assert!(l > 0.99 && r < 0.01);
    }
}
