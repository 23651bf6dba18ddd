//! Brookside core: DSP primitives for the procedural nature soundscape.
//!
//! Features
//! - `fast-math`: enable polynomial approximations for sin/cos/tan in the hot paths
//!
//! Modules
//! - [`dsp`]        : math helpers (interpolation, fast trig, pan law, near-zero floor)
//! - [`filters`]    : TPT state-variable filter (low-pass and band-pass)
//! - [`noise`]      : pink and water noise buffer synthesis
//! - [`automation`] : scheduled parameter timelines and the ramp primitive
//!
//! Design
//! - Randomness is always injected (`rand::Rng`), never drawn from a global
//! - Per-sample primitives do no heap work; buffers are built once up front
//! - Clear separation between math helpers and the building blocks on top

pub mod automation;
pub mod dsp;
pub mod filters;
pub mod noise;

/// Commonly used types/functions for convenience:
pub mod prelude {
    pub use crate::automation::{evaluate, ramp_param, Automatable, Automation, AutomationEvent, AutomationOp};
    pub use crate::dsp::{clamp, exp_interp, fast_sin, kill_denormals, lerp, PanLaw, NEAR_ZERO, TAU};
    pub use crate::filters::{SvfMode, SvfTpt};
    pub use crate::noise::{pink_noise, water_noise, NoiseBuffer};
}

#[cfg(test)]
mod smoke {

    #[test]
    fn prelude_exists() {
        use crate::prelude::*;
        use rand::SeedableRng;

        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        let buf = pink_noise(0.01, 48000.0, &mut rng);
        let mut lp = SvfTpt::new(SvfMode::Lowpass, 750.0, 0.6, 48000.0);
        let _ = lp.process(buf.channel(0)[0]);
        let mut gain = Automation::new(0.0);
        ramp_param(&mut gain, 0.0, 0.32, 2.6);
        assert!(gain.value_at(1.3) > 0.15);
    }
}
