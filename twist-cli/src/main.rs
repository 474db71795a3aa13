//! Twist CLI: list engines, render a note to WAV, or play it live.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use twist_core::tuning::{NoteTable, TuningMapper};
use twist_engine::{ControlKind, Controls, PipelineConfig, TwistOscillator, CONTROL_SLOTS, ENGINE_NAMES};

/// Frames rendered per `process_block` call.
const BLOCK: usize = 256;

#[derive(Debug, Parser)]
#[command(name = "twist", version, about = "Multi-engine macro oscillator")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the synthesis engines and control slots.
    Engines,
    /// List audio output devices.
    Devices,
    /// Render one note to a 32-bit float stereo WAV file.
    Render {
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long, default_value_t = 48_000)]
        sample_rate: u32,
        #[command(flatten)]
        note: NoteArgs,
    },
    /// Play one note on an output device.
    Play {
        #[arg(long)]
        device: Option<String>,
        #[command(flatten)]
        note: NoteArgs,
    },
}

#[derive(Debug, Args)]
struct NoteArgs {
    /// Pipeline configuration as JSON (rates, sub-block, quality ...).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Pitch in semitones (60 = middle C).
    #[arg(long, default_value_t = 60.0)]
    pitch: f32,
    #[arg(long, default_value_t = 2.0)]
    seconds: f32,
    /// Release the gate after this many seconds (default: hold).
    #[arg(long)]
    gate: Option<f32>,
    #[arg(long, default_value_t = 0)]
    engine: i32,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    harmonics: f32,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    timbre: f32,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    morph: f32,
    #[arg(long, default_value_t = 0.0)]
    aux_mix: f32,
    /// Enables the low-pass gate.
    #[arg(long)]
    lpg_response: Option<f32>,
    #[arg(long, default_value_t = 0.0)]
    lpg_decay: f32,
    #[arg(long)]
    retrigger: bool,
    /// Drift depth in semitones.
    #[arg(long, default_value_t = 0.0)]
    drift: f32,
    /// Frequency modulation offset in semitones.
    #[arg(long, allow_hyphen_values = true)]
    fm: Option<f32>,
    #[arg(long)]
    stereo: bool,
    /// Retune through an equal-step table with this step size in cents.
    #[arg(long)]
    step_cents: Option<f64>,
    #[arg(long, default_value_t = 0.5)]
    gain: f32,
    #[arg(long)]
    seed: Option<u64>,
}

impl NoteArgs {
    fn controls(&self) -> Controls {
        Controls {
            engine: self.engine,
            harmonics: self.harmonics,
            timbre: self.timbre,
            morph: self.morph,
            aux_mix: self.aux_mix,
            lpg_response: self.lpg_response,
            lpg_decay: self.lpg_decay,
            retrigger: self.retrigger,
        }
    }

    fn pipeline_config(&self, target_rate: f64) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => PipelineConfig::default(),
        };
        config.target_rate = target_rate;
        config.validate().context("invalid pipeline configuration")?;
        Ok(config)
    }

    /// Build and start a voice for `target_rate`.
    fn oscillator(&self, target_rate: f64) -> Result<TwistOscillator> {
        let mut osc = TwistOscillator::new(self.pipeline_config(target_rate)?)?;
        if let Some(seed) = self.seed {
            osc = osc.with_seed(seed);
        }
        if let Some(cents) = self.step_cents {
            let table = NoteTable::equal_steps(cents, 128).ok_or_else(|| anyhow!("empty tuning table"))?;
            osc.set_tuning(TuningMapper::retune_all(Arc::new(table)));
        }
        osc.set_controls(&self.controls());
        osc.set_gate(true);
        let spin = osc.initialize(self.pitch, false, self.drift != 0.0).ok_or_else(|| anyhow!("oscillator is degraded"))?;
        log::info!(
            "{} at pitch {}: pre-roll {} frames (cycle {:.2}, jitter {:.3})",
            twist_engine::engine_name(self.engine),
            self.pitch,
            spin.preroll_frames,
            spin.cycle,
            spin.jitter
        );
        Ok(osc)
    }

    fn render(&self, osc: &mut TwistOscillator, left: &mut [f32], right: &mut [f32]) {
        osc.process_block(self.pitch, self.drift, self.stereo, self.fm.is_some(), self.fm.unwrap_or(0.0), left, right);
        for s in left.iter_mut().chain(right.iter_mut()) {
            *s = (*s * self.gain).clamp(-1.0, 1.0);
        }
    }
}

fn load_config(path: &Path) -> Result<PipelineConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

// ---- Commands ----

fn list_engines() {
    println!("Engines:");
    for (i, name) in ENGINE_NAMES.iter().enumerate() {
        println!("  {i:>2}  {name}");
    }
    println!("\nControls:");
    for slot in &CONTROL_SLOTS {
        let kind = match slot.kind {
            ControlKind::EngineSelector => "engine",
            ControlKind::PercentBipolar => "bipolar %",
            ControlKind::Percent => "%",
            ControlKind::PercentDeactivatable => "% (can be off)",
        };
        let off = if slot.default_deactivated { ", off" } else { "" };
        println!("  {:<13} {kind:<15} default {}{off}", slot.name, slot.default);
    }
}

fn list_devices() -> Result<()> {
    let host = cpal::default_host();
    println!("Available output devices:");
    for dev in host.output_devices()? {
        println!("- {}", dev.name()?);
    }
    Ok(())
}

fn render_wav(out: &Path, sample_rate: u32, note: &NoteArgs) -> Result<()> {
    let mut osc = note.oscillator(f64::from(sample_rate))?;
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(out, spec).with_context(|| format!("creating {}", out.display()))?;

    let total = (note.seconds.max(0.0) * sample_rate as f32) as usize;
    let release = note.gate.map(|g| (g.max(0.0) * sample_rate as f32) as usize);
    let (mut left, mut right) = ([0.0f32; BLOCK], [0.0f32; BLOCK]);
    let mut done = 0;
    while done < total {
        let n = BLOCK.min(total - done);
        if release.is_some_and(|r| done >= r) {
            osc.set_gate(false);
        }
        note.render(&mut osc, &mut left[..n], &mut right[..n]);
        for (l, r) in left[..n].iter().zip(&right[..n]) {
            writer.write_sample(*l)?;
            writer.write_sample(*r)?;
        }
        done += n;
    }
    writer.finalize()?;
    log::info!("wrote {total} frames to {}", out.display());
    Ok(())
}

fn pick_device(name: Option<&str>) -> Result<cpal::Device> {
    let host = cpal::default_host();
    if let Some(name) = name {
        for d in host.output_devices()? {
            if d.name()? == name {
                return Ok(d);
            }
        }
        bail!("requested device not found: {name}");
    }
    host.default_output_device().ok_or_else(|| anyhow!("no default output device"))
}

fn build_stream<T>(
    device: &cpal::Device,
    cfg: &cpal::StreamConfig,
    mut osc: TwistOscillator,
    note: NoteArgs,
    gate: Arc<AtomicBool>,
) -> Result<cpal::Stream>
where
    T: cpal::Sample + cpal::FromSample<f32> + cpal::SizedSample + Send + 'static,
{
    let channels = usize::from(cfg.channels);
    let (mut left, mut right) = ([0.0f32; BLOCK], [0.0f32; BLOCK]);
    let stream = device.build_output_stream(
        cfg,
        move |output: &mut [T], _| {
            osc.set_gate(gate.load(Ordering::Relaxed));
            for chunk in output.chunks_mut(BLOCK * channels) {
                let n = chunk.len() / channels;
                note.render(&mut osc, &mut left[..n], &mut right[..n]);
                for (i, frame) in chunk.chunks_mut(channels).enumerate() {
                    for (c, s) in frame.iter_mut().enumerate() {
                        *s = T::from_sample(if c == 1 { right[i] } else { left[i] });
                    }
                }
            }
        },
        |e| log::error!("stream error: {e}"),
        None,
    )?;
    Ok(stream)
}

fn play(device: Option<&str>, note: NoteArgs) -> Result<()> {
    let device = pick_device(device)?;
    let supported = device.default_output_config()?;
    let format = supported.sample_format();
    let cfg = supported.config();
    let osc = note.oscillator(f64::from(cfg.sample_rate.0))?;
    log::info!("playing on {} ({cfg:?}, {format:?})", device.name()?);

    let gate = Arc::new(AtomicBool::new(true));
    let seconds = note.seconds.max(0.0);
    let release = note.gate;
    let stream = match format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &cfg, osc, note, Arc::clone(&gate))?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &cfg, osc, note, Arc::clone(&gate))?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &cfg, osc, note, Arc::clone(&gate))?,
        other => bail!("unsupported device sample format: {other:?}"),
    };
    stream.play()?;

    match release {
        Some(g) if g < seconds => {
            std::thread::sleep(Duration::from_secs_f32(g.max(0.0)));
            gate.store(false, Ordering::Relaxed);
            std::thread::sleep(Duration::from_secs_f32(seconds - g.max(0.0)));
        }
        _ => std::thread::sleep(Duration::from_secs_f32(seconds)),
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Engines => list_engines(),
        Command::Devices => list_devices()?,
        Command::Render { out, sample_rate, note } => render_wav(&out, sample_rate, &note)?,
        Command::Play { device, note } => play(device.as_deref(), note)?,
    }
    Ok(())
}
