//! Brookside CLI: play the soundscape live, or render it to a WAV file.

use std::io::BufRead;
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use brookside_engine::tuning::FADE_OUT_SECS;
use brookside_engine::{AudioSink, DeviceSink, LocalSink, NatureEngine};
use cpal::traits::{DeviceTrait, HostTrait};
use hound::{SampleFormat, WavSpec, WavWriter};
use log::{info, warn};

const DEFAULT_RENDER_SR: u32 = 48_000;
const DEFAULT_RENDER_SECS: f64 = 30.0;
const RENDER_BLOCK: usize = 512;
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Default)]
struct Args {
    list_devices: bool,
    device_name: Option<String>,
    sample_rate: Option<u32>,
    channels: Option<u16>,
    duration_sec: Option<f64>,
    seed: Option<u64>,
    render: Option<String>,
}

fn parse_args() -> Args {
    let mut a = Args::default();
    for s in std::env::args().skip(1) {
        if s == "--list-devices" { a.list_devices = true; continue; }
        if let Some(rest) = s.strip_prefix("--device=")      { a.device_name  = Some(rest.to_string()); continue; }
        if let Some(rest) = s.strip_prefix("--sample-rate=") { a.sample_rate  = rest.parse().ok();      continue; }
        if let Some(rest) = s.strip_prefix("--channels=")    { a.channels     = rest.parse().ok();      continue; }
        if let Some(rest) = s.strip_prefix("--duration=")    { a.duration_sec = rest.parse().ok();      continue; }
        if let Some(rest) = s.strip_prefix("--seed=")        { a.seed         = rest.parse().ok();      continue; }
        if let Some(rest) = s.strip_prefix("--render=")      { a.render       = Some(rest.to_string()); continue; }
        warn!("unknown arg: {s}");
    }
    a
}

fn make_engine<S: AudioSink>(sink: S, seed: Option<u64>) -> NatureEngine<S> {
    match seed {
        Some(seed) => NatureEngine::with_seed(sink, seed),
        None => NatureEngine::new(sink),
    }
}

fn list_output_devices() -> Result<()> {
    let host = cpal::default_host();
    println!("Available output devices:");
    for dev in host.output_devices().context("enumerating output devices")? {
        println!("- {}", dev.name().unwrap_or_else(|_| "<unnamed>".into()));
    }
    Ok(())
}

fn pick_device(args: &Args) -> Result<cpal::Device> {
    let host = cpal::default_host();
    if let Some(name) = &args.device_name {
        for d in host.output_devices().context("enumerating output devices")? {
            if d.name().is_ok_and(|n| n == *name) {
                return Ok(d);
            }
        }
        bail!("requested device not found: {name}");
    }
    host.default_output_device().ok_or_else(|| anyhow!("no default output device"))
}

fn choose_config(
    device: &cpal::Device,
    req_sr: Option<u32>,
    req_ch: Option<u16>,
) -> Result<cpal::SupportedStreamConfig> {
    if req_sr.is_none() && req_ch.is_none() {
        return device.default_output_config().context("querying default output config");
    }

    // Score every supported range: sample-rate distance dominates channel distance.
    let mut best: Option<(u64, cpal::SupportedStreamConfigRange)> = None;
    for range in device.supported_output_configs().context("querying output configs")? {
        let ch = range.channels();
        let sr_min = range.min_sample_rate().0;
        let sr_max = range.max_sample_rate().0;

        let ch_pen = req_ch.map_or(0, |c| u64::from(ch.abs_diff(c)));
        let sr_pen = match req_sr {
            Some(sr) if !(sr_min..=sr_max).contains(&sr) => u64::from(sr_min.abs_diff(sr).min(sr_max.abs_diff(sr))),
            _ => 0,
        };

        let score = sr_pen.saturating_mul(1000) + ch_pen;
        if best.as_ref().map_or(true, |(s, _)| score < *s) {
            best = Some((score, range));
        }
    }

    let (_, range) = best.ok_or_else(|| anyhow!("no supported output configs"))?;
    let pick_sr = match req_sr {
        Some(sr) => cpal::SampleRate(sr.clamp(range.min_sample_rate().0, range.max_sample_rate().0)),
        None => range.max_sample_rate(),
    };
    Ok(range.with_sample_rate(pick_sr))
}

/// Render a started engine to a 16-bit stereo WAV, fading out at the end.
fn render_to_wav(path: &Path, args: &Args) -> Result<()> {
    let sr = args.sample_rate.unwrap_or(DEFAULT_RENDER_SR);
    let seconds = args.duration_sec.unwrap_or(DEFAULT_RENDER_SECS).max(0.0);
    let total_frames = (seconds * f64::from(sr)).round() as u64;
    let fade_at = (seconds - FADE_OUT_SECS).max(0.0);

    let spec = WavSpec { channels: 2, sample_rate: sr, bits_per_sample: 16, sample_format: SampleFormat::Int };
    let mut writer = WavWriter::create(path, spec).with_context(|| format!("creating {}", path.display()))?;

    let mut engine = make_engine(LocalSink::new(sr as f32), args.seed);
    engine.start();
    info!("rendering {seconds:.1}s @ {sr} Hz → {}", path.display());

    let mut block = vec![0.0_f32; RENDER_BLOCK * 2];
    let mut written = 0_u64;
    while written < total_frames {
        if engine.is_running() && engine.sink().current_time() >= fade_at {
            engine.stop();
        }
        let n = (total_frames - written).min(RENDER_BLOCK as u64) as usize;
        let out = &mut block[..n * 2];
        engine.sink_mut().render_interleaved(out, 2);
        engine.poll();

        for &s in out.iter() {
            let v = (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
            writer.write_sample(v).context("writing sample")?;
        }
        written += n as u64;
    }

    engine.dispose();
    writer.finalize().context("finalizing WAV file")?;
    info!("wrote {written} frames");
    Ok(())
}

enum Control {
    Toggle,
    Quit,
}

/// Read control lines from stdin until EOF or `q`.
fn spawn_stdin_reader(tx: mpsc::Sender<Control>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let msg = match line.trim() {
                "" | "t" => Control::Toggle,
                "q" => Control::Quit,
                other => {
                    warn!("unknown command {other:?} (Enter/t toggles, q quits)");
                    continue;
                }
            };
            let quit = matches!(msg, Control::Quit);
            if tx.send(msg).is_err() || quit {
                break;
            }
        }
    });
}

fn play_live(args: &Args) -> Result<()> {
    let device = pick_device(args)?;
    let sup_cfg = choose_config(&device, args.sample_rate, args.channels)?;
    let sample_format = sup_cfg.sample_format();
    let cfg = sup_cfg.config();

    info!("device: {}", device.name().unwrap_or_else(|_| "<unnamed>".into()));
    info!("stream config: {cfg:?} (sample_format: {sample_format:?})");

    let sink = DeviceSink::open(&device, &cfg, sample_format).context("opening output stream")?;
    let mut engine = make_engine(sink, args.seed);
    engine.start();

    let (tx, rx) = mpsc::channel();
    spawn_stdin_reader(tx);
    println!("Enter or 't' toggles, 'q' quits.");
    if let Some(d) = args.duration_sec {
        println!("Auto-stop after {d} seconds");
    }

    let deadline = args.duration_sec.map(|d| Instant::now() + Duration::from_secs_f64(d.max(0.0)));
    loop {
        match rx.try_recv() {
            Ok(Control::Toggle) if engine.is_running() => engine.stop(),
            Ok(Control::Toggle) => engine.start(),
            Ok(Control::Quit) => break,
            Err(_) => {}
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        engine.poll();
        std::thread::sleep(POLL_INTERVAL);
    }

    engine.dispose();
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = parse_args();

    if args.list_devices {
        return list_output_devices();
    }

    match args.render.as_deref() {
        Some(path) => render_to_wav(Path::new(path), &args),
        None => play_live(&args),
    }
}
