//! Offline render to WAV, optionally through the phase vocoder.

use std::path::Path;

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use saavy_sampler::{
    dsp::pshifter::{PhaseVocoder, PitchShifter},
    SamplerEngine,
};

use super::phrase;

const FFT_SIZE: usize = 2048;
const OVERSAMPLING: usize = 8;

pub fn render(engine: &mut SamplerEngine, path: &Path, bpm: f32, pitch: f32) -> EyreResult<()> {
    let sample_rate = engine.sample_rate();
    let channels = engine.channels() as usize;
    let block = engine.buffer_size();
    let frames_per_beat = sample_rate * 60.0 / bpm;
    let total = (phrase::length_beats() * frames_per_beat) as usize;

    let mut shifter = (pitch != 1.0)
        .then(|| PhaseVocoder::with_rustfft(channels, sample_rate, FFT_SIZE, OVERSAMPLING))
        .transpose()
        .wrap_err("failed to build pitch shifter")?;
    let latency = shifter.as_ref().map_or(0, |s| s.latency());

    let mut planar = vec![vec![0.0f32; total + latency]; channels];
    let events = phrase::events();
    let mut next_event = 0;
    let mut midi = Vec::new();

    let mut offset = 0;
    while offset < planar[0].len() {
        let frames = (planar[0].len() - offset).min(block);

        midi.clear();
        while let Some(event) = events.get(next_event) {
            if (event.beat * frames_per_beat) as usize > offset {
                break;
            }
            let (bytes, len) = event.event.to_bytes();
            midi.extend_from_slice(&bytes[..len]);
            next_event += 1;
        }
        engine.process_midi(&midi);

        let mut outs: Vec<&mut [f32]> = planar
            .iter_mut()
            .map(|buf| &mut buf[offset..offset + frames])
            .collect();
        engine.process(&[], &mut outs, frames);
        if let Some(shifter) = shifter.as_mut() {
            shifter.process(&mut outs, pitch);
        }
        offset += frames;
    }

    let spec = hound::WavSpec {
        channels: channels as u16,
        sample_rate: sample_rate as u32,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .wrap_err_with(|| format!("failed to create {}", path.display()))?;
    for i in latency..planar[0].len() {
        for channel in &planar {
            writer.write_sample(channel[i])?;
        }
    }
    writer.finalize()?;

    tracing::info!(path = %path.display(), frames = total, pitch, "render finished");
    Ok(())
}
