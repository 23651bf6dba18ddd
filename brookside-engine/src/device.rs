//! Real-time output through cpal.
//!
//! The audio callback owns a [`Renderer`]. The control thread never touches
//! it; commands travel through an `rtrb` ring buffer and are drained at the
//! top of every callback. The callback publishes how many frames it has
//! rendered, which is the sink clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{debug, error, warn};
use rtrb::{Consumer, Producer, RingBuffer};

use crate::render::Renderer;
use crate::sink::{write_frame, AudioSink, Command, SinkError};

/// Pending control messages. A start() sends about a dozen; chirps and swells
/// trickle in a few per second.
const COMMAND_QUEUE: usize = 1024;

pub struct DeviceSink {
    stream: cpal::Stream,
    tx: Producer<Command>,
    frames: Arc<AtomicU64>,
    sr: f32,
    channels: u16,
}

impl DeviceSink {
    /// Build a suspended output stream on `device`.
    pub fn open(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        format: cpal::SampleFormat,
    ) -> Result<Self, SinkError> {
        let (tx, rx) = RingBuffer::<Command>::new(COMMAND_QUEUE);
        let frames = Arc::new(AtomicU64::new(0));
        let sr = config.sample_rate.0 as f32;

        let stream = match format {
            cpal::SampleFormat::F32 => build_stream::<f32>(device, config, rx, Arc::clone(&frames)),
            cpal::SampleFormat::I16 => build_stream::<i16>(device, config, rx, Arc::clone(&frames)),
            cpal::SampleFormat::U16 => build_stream::<u16>(device, config, rx, Arc::clone(&frames)),
            other => return Err(SinkError::Stream(format!("unsupported sample format: {other:?}"))),
        }?;

        // some backends start playing on build
        if let Err(e) = stream.pause() {
            debug!("could not pause new stream: {e}");
        }

        Ok(Self { stream, tx, frames, sr, channels: config.channels })
    }

    /// Default output device in its default configuration.
    pub fn open_default() -> Result<Self, SinkError> {
        let device = cpal::default_host().default_output_device().ok_or(SinkError::NoDevice)?;
        let supported = device.default_output_config().map_err(|e| SinkError::Device(e.to_string()))?;
        Self::open(&device, &supported.config(), supported.sample_format())
    }

    #[inline] pub fn channels(&self) -> u16 { self.channels }

    /// Suspend output. The sink clock stops with it.
    pub fn pause(&self) -> Result<(), SinkError> {
        self.stream.pause().map_err(|e| SinkError::Stream(e.to_string()))
    }
}

impl AudioSink for DeviceSink {
    fn current_time(&self) -> f64 {
        self.frames.load(Ordering::Acquire) as f64 / f64::from(self.sr)
    }

    fn sample_rate(&self) -> f32 {
        self.sr
    }

    fn resume(&mut self) -> Result<(), SinkError> {
        self.stream.play().map_err(|e| SinkError::Resume(e.to_string()))
    }

    fn submit(&mut self, cmd: Command) {
        if let Err(e) = self.tx.push(cmd) {
            warn!("command queue full, dropping {e:?}");
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut rx: Consumer<Command>,
    clock: Arc<AtomicU64>,
) -> Result<cpal::Stream, SinkError>
where
    T: cpal::Sample + cpal::FromSample<f32> + cpal::SizedSample + Send + 'static,
{
    let sr = config.sample_rate.0 as f32;
    let channels = usize::from(config.channels).max(1);
    let mut renderer = Renderer::new(sr);
    let mut frames: u64 = 0;

    device
        .build_output_stream(
            config,
            move |output: &mut [T], _| {
                while let Ok(cmd) = rx.pop() {
                    renderer.apply(cmd);
                }
                for frame in output.chunks_mut(channels) {
                    let t = frames as f64 / f64::from(sr);
                    write_frame(frame, renderer.next_frame(t), |x| T::from_sample(x));
                    frames += 1;
                }
                clock.store(frames, Ordering::Release);
                renderer.housekeeping(frames as f64 / f64::from(sr));
            },
            |e| error!("stream error: {e}"),
            None,
        )
        .map_err(|e| SinkError::Stream(e.to_string()))
}
