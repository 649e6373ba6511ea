use std::f32::consts::{PI, TAU};

use rustfft::num_complex::Complex32;

use super::fft::{FftKernel, Radix2Fft, RustFft};
use crate::error::{Result, SamplerError};

/*
Phase-Vocoder Pitch Shifting
============================

Shifts pitch by a ratio without changing duration, by re-mapping the
short-time spectrum of the signal onto scaled frequencies.

Vocabulary
----------

  N           FFT frame size (power of two).

  V           Oversampling: how many frames overlap each sample. The hop
              between frames is N / V. V ≥ 4 keeps the squared Hann windows
              summing to a constant.

  bin         One FFT output. Bin j sits at j · sample_rate / N Hz.

  true freq   A bin's real frequency, recovered from how much its phase
              advanced between two frames beyond what the bin center alone
              would explain.


Per Frame
---------

  input fifo ──window──→ FFT ──→ magnitude + true frequency per bin
                                     │
                                     │  bin j moves to round(j · ratio),
                                     │  its frequency scaled by ratio
                                     ↓
  output fifo ←─overlap-add─ window ←─ IFFT ←─ rebuilt phase per bin

Analysis, for bin j with phase φ and previous phase φ':

    Δ       = φ − φ' − j · 2π · hop / N        (expected advance removed)
    Δ       = Δ wrapped to [−π, π]
    freq[j] = (j + V · Δ / 2π) · bin_width

Synthesis accumulates the phase advance the shifted frequency implies and
rebuilds a Hermitian spectrum, so the inverse FFT is real.


Streaming and Latency
---------------------

Samples enter an N-long input fifo starting at offset N − hop. Whenever the
fifo fills, one frame is analysed and resynthesised, the oldest hop of the
overlap-add accumulator becomes the next hop of output, and the fifo keeps
its newest N − hop samples. A finished output sample leaves exactly N
samples after the input sample it came from, which is what `latency()`
reports. Streaming state persists across calls, so the block size is free.
*/

/// Pitch-shift blocks in place.
pub trait PitchShifter {
    /// Process `channels` independently, shifting pitch by `ratio`.
    fn process(&mut self, channels: &mut [&mut [f32]], ratio: f32);

    /// Delay in samples between an input sample and its shifted output.
    fn latency(&self) -> usize;

    fn reset(&mut self);
}

#[derive(Debug, Clone)]
struct ChannelState {
    in_fifo: Vec<f32>,
    out_fifo: Vec<f32>,
    last_phase: Vec<f32>,
    sum_phase: Vec<f32>,
    accum: Vec<f32>,
    rover: usize,
}

impl ChannelState {
    fn new(size: usize, fifo_latency: usize) -> Self {
        let half = size / 2 + 1;
        Self {
            in_fifo: vec![0.0; size],
            out_fifo: vec![0.0; size],
            last_phase: vec![0.0; half],
            sum_phase: vec![0.0; half],
            accum: vec![0.0; 2 * size],
            rover: fifo_latency,
        }
    }

    fn clear(&mut self, fifo_latency: usize) {
        self.in_fifo.fill(0.0);
        self.out_fifo.fill(0.0);
        self.last_phase.fill(0.0);
        self.sum_phase.fill(0.0);
        self.accum.fill(0.0);
        self.rover = fifo_latency;
    }
}

pub struct PhaseVocoder<K: FftKernel = Radix2Fft> {
    kernel: K,
    sample_rate: f32,
    size: usize,
    oversampling: usize,
    hop: usize,
    window: Vec<f32>,
    work: Vec<Complex32>,
    ana_magn: Vec<f32>,
    ana_freq: Vec<f32>,
    syn_magn: Vec<f32>,
    syn_freq: Vec<f32>,
    channels: Vec<ChannelState>,
}

impl PhaseVocoder<Radix2Fft> {
    /// `size` must be a power of two and `oversampling` must divide it.
    pub fn new(channels: usize, sample_rate: f32, size: usize, oversampling: usize) -> Self {
        Self::with_kernel(Radix2Fft::new(size), channels, sample_rate, oversampling)
    }

    /// Validating constructor for sizes coming from user configuration.
    pub fn try_new(
        channels: usize,
        sample_rate: f32,
        size: usize,
        oversampling: usize,
    ) -> Result<Self> {
        validate(size, oversampling)?;
        Ok(Self::new(channels, sample_rate, size, oversampling))
    }
}

impl PhaseVocoder<RustFft> {
    pub fn with_rustfft(
        channels: usize,
        sample_rate: f32,
        size: usize,
        oversampling: usize,
    ) -> Result<Self> {
        validate(size, oversampling)?;
        Ok(Self::with_kernel(
            RustFft::new(size),
            channels,
            sample_rate,
            oversampling,
        ))
    }
}

fn validate(size: usize, oversampling: usize) -> Result<()> {
    if size < 4 || !size.is_power_of_two() {
        return Err(SamplerError::InvalidConfig(format!(
            "FFT size must be a power of two of at least 4, got {size}"
        )));
    }
    if oversampling == 0 || oversampling > size || size % oversampling != 0 {
        return Err(SamplerError::InvalidConfig(format!(
            "oversampling {oversampling} must divide FFT size {size}"
        )));
    }
    Ok(())
}

impl<K: FftKernel> PhaseVocoder<K> {
    pub fn with_kernel(kernel: K, channels: usize, sample_rate: f32, oversampling: usize) -> Self {
        let size = kernel.size();
        let hop = size / oversampling;
        let half = size / 2 + 1;
        let window = (0..size)
            .map(|j| 0.5 - 0.5 * (TAU * j as f32 / size as f32).cos())
            .collect();

        tracing::debug!(size, oversampling, hop, "phase vocoder configured");

        Self {
            kernel,
            sample_rate,
            size,
            oversampling,
            hop,
            window,
            work: vec![Complex32::new(0.0, 0.0); size],
            ana_magn: vec![0.0; half],
            ana_freq: vec![0.0; half],
            syn_magn: vec![0.0; half],
            syn_freq: vec![0.0; half],
            channels: (0..channels)
                .map(|_| ChannelState::new(size, size - hop))
                .collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn oversampling(&self) -> usize {
        self.oversampling
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Shift one channel's block in place.
    pub fn process_channel(&mut self, channel: usize, frames: &mut [f32], ratio: f32) {
        if channel >= self.channels.len() {
            return;
        }
        let fifo_latency = self.size - self.hop;
        for sample in frames.iter_mut() {
            let state = &mut self.channels[channel];
            let rover = state.rover;
            state.in_fifo[rover] = *sample;
            *sample = state.out_fifo[rover - fifo_latency];
            state.rover += 1;
            if state.rover >= self.size {
                state.rover = fifo_latency;
                self.process_frame(channel, ratio);
            }
        }
    }

    fn process_frame(&mut self, channel: usize, ratio: f32) {
        let Self {
            kernel,
            sample_rate,
            size,
            oversampling,
            hop,
            window,
            work,
            ana_magn,
            ana_freq,
            syn_magn,
            syn_freq,
            channels,
        } = self;
        let (size, hop) = (*size, *hop);
        let half = size / 2;
        let over = *oversampling as f32;
        let bin_width = *sample_rate / size as f32;
        let expected = TAU * hop as f32 / size as f32;
        let state = &mut channels[channel];

        // analysis
        for ((bin, &x), &w) in work.iter_mut().zip(&state.in_fifo).zip(window.iter()) {
            *bin = Complex32::new(x * w, 0.0);
        }
        kernel.forward(work);

        for j in 0..=half {
            let (magn, phase) = work[j].to_polar();
            let mut delta = phase - state.last_phase[j];
            state.last_phase[j] = phase;

            delta -= j as f32 * expected;
            delta -= TAU * (delta / TAU).round();

            ana_magn[j] = magn;
            ana_freq[j] = (j as f32 + over * delta / TAU) * bin_width;
        }

        // shift
        syn_magn.fill(0.0);
        syn_freq.fill(0.0);
        for j in 0..=half {
            let k = (j as f32 * ratio).round() as usize;
            if k <= half {
                syn_freq[k] = ana_freq[j] * ratio;
                syn_magn[k] += ana_magn[j];
            }
        }

        // synthesis
        for j in 0..=half {
            let deviation = syn_freq[j] / bin_width - j as f32;
            let advance = TAU * deviation / over + j as f32 * expected;
            let phase = wrap_phase(state.sum_phase[j] + advance);
            state.sum_phase[j] = phase;
            work[j] = Complex32::from_polar(syn_magn[j], phase);
        }
        work[0].im = 0.0;
        work[half].im = 0.0;
        for j in 1..half {
            work[size - j] = work[j].conj();
        }
        kernel.inverse(work);

        // Σ hann² over V overlapped frames = 3V/8
        let scale = 1.0 / (size as f32 * 0.375 * over);
        for ((acc, &w), bin) in state.accum.iter_mut().zip(window.iter()).zip(work.iter()) {
            *acc += w * bin.re * scale;
        }

        state.out_fifo[..hop].copy_from_slice(&state.accum[..hop]);
        state.accum.copy_within(hop..hop + size, 0);
        state.in_fifo.copy_within(hop..size, 0);
    }
}

impl<K: FftKernel> PitchShifter for PhaseVocoder<K> {
    fn process(&mut self, channels: &mut [&mut [f32]], ratio: f32) {
        for (channel, frames) in channels.iter_mut().enumerate() {
            self.process_channel(channel, frames, ratio);
        }
    }

    fn latency(&self) -> usize {
        self.size
    }

    fn reset(&mut self) {
        let fifo_latency = self.size - self.hop;
        for state in &mut self.channels {
            state.clear(fifo_latency);
        }
    }
}

#[inline]
fn wrap_phase(phase: f32) -> f32 {
    phase - TAU * ((phase + PI) / TAU).floor()
}
