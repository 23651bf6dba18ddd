//! Noise buffer synthesis.
//!
//! Two noise colours, both rendered once into a fixed-length buffer that a
//! voice then loops forever:
//!
//! - [`pink_noise`]  : mono, −3 dB/octave (Paul Kellet's "refined" 7-state
//!   filter). Low-weighted rumble for wind.
//! - [`water_noise`] : stereo, leaky-integrated white noise with independent
//!   draws per channel. Smoother and darker, with natural stereo width.
//!
//! Both take the random source as a parameter; with a seeded RNG the output
//! is fully reproducible.

use rand::Rng;

use crate::dsp::bipolar;

/// Immutable multi-channel sample data.
///
/// Channels are stored planar: one `Vec<f32>` per channel, all of equal
/// length.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseBuffer {
    sample_rate: f32,
    channels: Vec<Vec<f32>>,
}

impl NoiseBuffer {
    fn from_channels(sample_rate: f32, channels: Vec<Vec<f32>>) -> Self {
        Self { sample_rate, channels }
    }

    #[inline] pub fn channel_count(&self) -> usize { self.channels.len() }
    #[inline] pub fn sample_rate(&self) -> f32 { self.sample_rate }

    /// Frames per channel.
    #[inline]
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    #[inline] pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Duration in seconds.
    #[inline]
    pub fn duration(&self) -> f32 {
        self.len() as f32 / self.sample_rate
    }

    /// Samples of one channel. Panics if `ch` is out of range.
    #[inline]
    pub fn channel(&self, ch: usize) -> &[f32] {
        &self.channels[ch]
    }

    /// Stereo frame at `index`. Mono buffers are duplicated to both sides.
    #[inline]
    pub fn frame(&self, index: usize) -> (f32, f32) {
        match self.channels.as_slice() {
            [mono] => (mono[index], mono[index]),
            [l, r, ..] => (l[index], r[index]),
            [] => (0.0, 0.0),
        }
    }
}

/// Frame count for a buffer of `duration_s` seconds: the floor of
/// `duration_s * sample_rate`, taken in `f64`.
///
/// A duration like `0.7` is stored a hair below its decimal value in `f32`;
/// products within one `f32` epsilon (relative) of an integer count as that
/// integer.
#[inline]
fn frame_count(duration_s: f32, sample_rate: f32) -> usize {
    let n = f64::from(duration_s.max(0.0)) * f64::from(sample_rate.max(0.0));
    (n + n * f64::from(f32::EPSILON)).floor() as usize
}

#[inline]
fn white<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    bipolar(rng.gen::<f32>())
}

/// Mono pink noise, `duration_s * sample_rate` frames long.
pub fn pink_noise<R: Rng + ?Sized>(duration_s: f32, sample_rate: f32, rng: &mut R) -> NoiseBuffer {
    let n = frame_count(duration_s, sample_rate);
    let mut out = Vec::with_capacity(n);

    let (mut b0, mut b1, mut b2, mut b3, mut b4, mut b5, mut b6) =
        (0.0_f32, 0.0_f32, 0.0_f32, 0.0_f32, 0.0_f32, 0.0_f32, 0.0_f32);

    for _ in 0..n {
        let w = white(rng);
        b0 = 0.99886 * b0 + w * 0.055_517_9;
        b1 = 0.99332 * b1 + w * 0.075_075_9;
        b2 = 0.969_00 * b2 + w * 0.153_852_0;
        b3 = 0.866_50 * b3 + w * 0.310_485_6;
        b4 = 0.550_00 * b4 + w * 0.532_952_2;
        b5 = -0.7616 * b5 - w * 0.016_898_0;
        let y = b0 + b1 + b2 + b3 + b4 + b5 + b6 + w * 0.5362;
        out.push(y * 0.11);
        // zero-memory term lands one sample late
        b6 = w * 0.115_926;
    }

    NoiseBuffer::from_channels(sample_rate, vec![out])
}

/// Stereo "water" noise, `duration_s * sample_rate` frames per channel.
///
/// Each channel runs its own leaky integrator over its own white-noise
/// draws, so the two sides are uncorrelated.
pub fn water_noise<R: Rng + ?Sized>(duration_s: f32, sample_rate: f32, rng: &mut R) -> NoiseBuffer {
    let n = frame_count(duration_s, sample_rate);
    let channels = (0..2)
        .map(|_| {
            let mut last = 0.0_f32;
            (0..n)
                .map(|_| {
                    last = (last + 0.02 * white(rng)) / 1.02;
                    last * 3.5 * 0.45
                })
                .collect::<Vec<f32>>()
        })
        .collect();

    NoiseBuffer::from_channels(sample_rate, channels)
}

// ------------------------------------ Tests --------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn correlation(a: &[f32], b: &[f32]) -> f32 {
        let n = a.len() as f32;
        let ma = a.iter().sum::<f32>() / n;
        let mb = b.iter().sum::<f32>() / n;
        let (mut cov, mut va, mut vb) = (0.0_f32, 0.0_f32, 0.0_f32);
        for (x, y) in a.iter().zip(b) {
            cov += (x - ma) * (y - mb);
            va += (x - ma) * (x - ma);
            vb += (y - mb) * (y - mb);
        }
        cov / (va.sqrt() * vb.sqrt())
    }

    #[test]
    fn lengths_match_duration_times_rate() {
        let mut rng = StdRng::seed_from_u64(1);
        for (d, r) in [(1.0, 8000.0), (0.5, 44100.0), (2.0, 22050.0), (0.25, 48000.0)] {
            let pink = pink_noise(d, r, &mut rng);
            assert_eq!(pink.channel_count(), 1);
            assert_eq!(pink.len(), (d * r) as usize);

            let water = water_noise(d, r, &mut rng);
            assert_eq!(water.channel_count(), 2);
            assert_eq!(water.channel(0).len(), (d * r) as usize);
            assert_eq!(water.channel(1).len(), (d * r) as usize);
        }
    }

    #[test]
    fn inexact_durations_keep_every_frame() {
        let mut rng = StdRng::seed_from_u64(1);
        for (d, r, n) in [(0.7, 1000.0, 700), (0.1, 48000.0, 4800), (0.3, 44100.0, 13230), (1.1, 22050.0, 24255)] {
            assert_eq!(pink_noise(d, r, &mut rng).len(), n, "d={d} r={r}");
            assert_eq!(water_noise(d, r, &mut rng).len(), n, "d={d} r={r}");
        }
        // a real fraction is still floored
        assert_eq!(pink_noise(0.0015, 1000.0, &mut rng).len(), 1);
    }

    #[test]
    fn seeded_synthesis_is_reproducible() {
        let a = pink_noise(0.1, 48000.0, &mut StdRng::seed_from_u64(7));
        let b = pink_noise(0.1, 48000.0, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        let c = pink_noise(0.1, 48000.0, &mut StdRng::seed_from_u64(8));
        assert_ne!(a, c);
    }

    #[test]
    fn water_channels_are_uncorrelated() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let buf = water_noise(2.0, 8000.0, &mut rng);
            let rho = correlation(buf.channel(0), buf.channel(1));
            assert!(rho.abs() < 0.4, "channels look correlated: {rho}");
        }
    }

    #[test]
    fn pink_noise_is_low_weighted() {
        let buf = pink_noise(2.0, 48000.0, &mut StdRng::seed_from_u64(3));
        let s = buf.channel(0);

        // Lag-1 autocorrelation of white noise is ~0; pink is strongly positive.
        let rho = correlation(&s[..s.len() - 1], &s[1..]);
        assert!(rho > 0.3, "lag-1 autocorrelation too low for pink: {rho}");
    }

    #[test]
    fn zero_duration_gives_empty_buffer() {
        let buf = water_noise(0.0, 48000.0, &mut StdRng::seed_from_u64(0));
        assert!(buf.is_empty());
        assert_eq!(buf.channel_count(), 2);
        assert_eq!(buf.duration(), 0.0);
    }
}
