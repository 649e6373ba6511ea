//! Live playback through the default cpal output device.

use std::time::{Duration, Instant};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::RingBuffer;
use saavy_sampler::{EngineConfig, MAX_BLOCK_SIZE};

use super::{build_engine, phrase, Args};

const MIDI_QUEUE: usize = 256;

pub fn play(args: &Args) -> EyreResult<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;

    let mut engine = build_engine(
        args,
        EngineConfig {
            channels: config.channels(),
            sample_rate,
            buffer_size: MAX_BLOCK_SIZE,
            tempo: args.bpm,
        },
    )?;

    tracing::info!(sample_rate, channels, "output stream opening");

    let (mut midi_tx, mut midi_rx) = RingBuffer::<([u8; 3], usize)>::new(MIDI_QUEUE);

    let mut planar = vec![vec![0.0f32; MAX_BLOCK_SIZE]; channels];
    let mut midi_buf = Vec::with_capacity(MIDI_QUEUE * 3);

    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _| {
            midi_buf.clear();
            while let Ok((bytes, len)) = midi_rx.pop() {
                midi_buf.extend_from_slice(&bytes[..len]);
            }
            engine.process_midi(&midi_buf);

            let total_frames = data.len() / channels;
            let mut frames_written = 0;
            while frames_written < total_frames {
                let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                {
                    let mut outs: Vec<&mut [f32]> = planar
                        .iter_mut()
                        .map(|buf| &mut buf[..frames])
                        .collect();
                    engine.process(&[], &mut outs, frames);
                }

                let out_off = frames_written * channels;
                for i in 0..frames {
                    for (ch, buf) in planar.iter().enumerate() {
                        data[out_off + i * channels + ch] = buf[i];
                    }
                }
                frames_written += frames;
            }
        },
        |err| tracing::error!(%err, "audio stream error"),
        None,
    )?;

    stream.play()?;

    let seconds_per_beat = 60.0 / args.bpm;
    let start = Instant::now();
    for event in phrase::events() {
        let due = Duration::from_secs_f32(event.beat * seconds_per_beat);
        if let Some(wait) = due.checked_sub(start.elapsed()) {
            std::thread::sleep(wait);
        }
        if midi_tx.push(event.event.to_bytes()).is_err() {
            tracing::warn!(?event, "midi queue full, event dropped");
        }
    }

    let end = Duration::from_secs_f32(phrase::length_beats() * seconds_per_beat);
    if let Some(wait) = end.checked_sub(start.elapsed()) {
        std::thread::sleep(wait);
    }
    Ok(())
}
