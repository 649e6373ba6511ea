//! saavy-sampler - plays a short phrase through the sampler engine
//!
//! Run with: cargo run -- [SAMPLE.wav] [--render out.wav] [--pitch 1.5]

mod phrase;
mod player;
mod render;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use saavy_sampler::{
    io::converter::midi_note_to_freq, sample::Sample, EngineConfig, ParamIndex, SamplerEngine,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "saavy-sampler", about = "Polyphonic sample player demo")]
struct Args {
    /// WAV file to play; a saw wave is synthesized when omitted
    sample: Option<PathBuf>,

    /// MIDI note the sample sounds at when played unshifted
    #[arg(long, default_value_t = 60)]
    base_note: u8,

    /// Render offline to this WAV file instead of playing live
    #[arg(long)]
    render: Option<PathBuf>,

    /// Pitch ratio applied by the phase vocoder in render mode
    #[arg(long, default_value_t = 1.0)]
    pitch: f32,

    /// Phrase tempo in BPM
    #[arg(long, default_value_t = 120.0)]
    bpm: f32,

    /// Loop the sample while notes are held
    #[arg(long = "loop")]
    looping: bool,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    match &args.render {
        Some(path) => {
            let config = EngineConfig {
                tempo: args.bpm,
                ..EngineConfig::default()
            };
            let mut engine = build_engine(&args, config)?;
            render::render(&mut engine, path, args.bpm, args.pitch)
        }
        None => player::play(&args),
    }
}

fn build_engine(args: &Args, config: EngineConfig) -> EyreResult<SamplerEngine> {
    let mut engine = SamplerEngine::new(config).wrap_err("invalid engine configuration")?;
    let base_freq = midi_note_to_freq(args.base_note);
    engine.set_param_value(ParamIndex::Gen1Sample, args.base_note as f32);

    let sample = match &args.sample {
        Some(path) => Sample::open(path, base_freq)
            .wrap_err_with(|| format!("failed to open {}", path.display()))?,
        None => saw_sample(config.sample_rate, base_freq)?,
    };
    engine.set_sample(sample);
    engine.set_loop(args.looping);

    engine.set_param_value(ParamIndex::Dca1Attack, 0.05);
    engine.set_param_value(ParamIndex::Dca1Release, 0.2);
    engine.set_param_value(ParamIndex::Dcf1Cutoff, 0.7);
    engine.set_param_value(ParamIndex::Out1Width, 1.0);
    Ok(engine)
}

/// Two seconds of a band-unlimited saw at `freq`.
fn saw_sample(sample_rate: f32, freq: f32) -> EyreResult<Sample> {
    let frames = (2.0 * sample_rate) as usize;
    let period = sample_rate / freq;
    let data = (0..frames)
        .map(|i| 2.0 * (i as f32 / period).fract() - 1.0)
        .map(|s| 0.5 * s)
        .collect();
    Ok(Sample::from_frames(vec![data], sample_rate, freq)?)
}
