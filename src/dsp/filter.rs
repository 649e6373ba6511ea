use std::f32::consts::PI;

use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
| type              | constructed by       | passes          | rejects      |
| ----------------- | -------------------- | --------------- | ------------ |
| low-pass          | LPF                  | below cutoff    | above cutoff |
| high-pass         | HPF                  | above cutoff    | below cutoff |
| band-pass         | LPF ∘ HPF (series)   | between cutoffs | outside      |
| notch / band-stop | LPF + HPF (parallel) | outside         | between      |

| slope   | kernel                         | rolloff        |
| ------- | ------------------------------ | -------------- |
| 12 dB   | one TPT state-variable stage   | 12 dB/oct      |
| 24 dB   | two cascaded SVF stages        | 24 dB/oct      |
| biquad  | RBJ cookbook, DF2 transposed   | 12 dB/oct      |
| formant | five parallel band-passes      | vowel-shaped   |

Cutoff and resonance arrive normalized to [0, 1]. Cutoff maps quadratically
from 20 Hz up to 0.45 · sample_rate; resonance maps onto the kernel's own
damping or Q range.
*/

const MIN_CUTOFF_HZ: f32 = 20.0;
const MAX_CUTOFF_RATIO: f32 = 0.45;
const MAX_RESONANCE: f32 = 0.98;
const MIN_Q: f32 = 0.707;
const MAX_Q: f32 = 10.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    #[default]
    LowPass,
    BandPass,
    HighPass,
    Notch,
}

impl FilterType {
    pub fn from_value(value: f32) -> Self {
        match value.round() as i32 {
            1 => Self::BandPass,
            2 => Self::HighPass,
            3 => Self::Notch,
            _ => Self::LowPass,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterSlope {
    #[default]
    Slope12,
    Slope24,
    Biquad,
    Formant,
}

impl FilterSlope {
    pub fn from_value(value: f32) -> Self {
        match value.round() as i32 {
            1 => Self::Slope24,
            2 => Self::Biquad,
            3 => Self::Formant,
            _ => Self::Slope12,
        }
    }
}

/// A per-voice filter with normalized controls.
pub trait FilterKernel {
    /// Clear state and prime coefficients for a new note.
    fn reset(&mut self, filter_type: FilterType, sample_rate: f32, cutoff: f32, reso: f32);

    fn output(&mut self, input: f32, cutoff: f32, reso: f32) -> f32;
}

/// Normalized cutoff to Hz.
#[inline]
pub fn cutoff_hz(cutoff: f32, sample_rate: f32) -> f32 {
    let cutoff = cutoff.clamp(0.0, 1.0);
    let max_hz = MAX_CUTOFF_RATIO * sample_rate;
    MIN_CUTOFF_HZ + (max_hz - MIN_CUTOFF_HZ).max(0.0) * cutoff * cutoff
}

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
    pub notch: f32,
}

impl FilterOutputs {
    #[inline]
    fn select(&self, filter_type: FilterType) -> f32 {
        match filter_type {
            FilterType::LowPass => self.lowpass,
            FilterType::HighPass => self.highpass,
            FilterType::BandPass => self.bandpass,
            FilterType::Notch => self.notch,
        }
    }
}

/// Topology-preserving-transform state-variable filter.
#[derive(Debug, Clone)]
pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    filter_type: FilterType,
    sample_rate: f32,
    cutoff: f32,
    reso: f32,
    g: f32,
    k: f32,
}

impl Default for SVFilter {
    fn default() -> Self {
        Self::new(FilterType::LowPass)
    }
}

impl SVFilter {
    pub fn new(filter_type: FilterType) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            filter_type,
            sample_rate: 48_000.0,
            cutoff: -1.0,
            reso: -1.0,
            g: 0.0,
            k: 2.0,
        }
    }

    /// Integrator gain for a cutoff in Hz.
    #[inline]
    pub fn compute_g(cutoff_hz: f32, sample_rate: f32) -> f32 {
        (PI * cutoff_hz / sample_rate).tan()
    }

    pub fn next_sample(&mut self, sample: f32, k: f32, g: f32) -> FilterOutputs {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass: sample - k * v1 - v2,
            notch: sample - k * v1,
        }
    }

    pub fn clear(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    #[inline]
    fn update(&mut self, cutoff: f32, reso: f32) {
        if cutoff != self.cutoff {
            self.cutoff = cutoff;
            self.g = Self::compute_g(cutoff_hz(cutoff, self.sample_rate), self.sample_rate);
        }
        if reso != self.reso {
            self.reso = reso;
            self.k = 2.0 - 2.0 * MAX_RESONANCE * reso.clamp(0.0, 1.0);
        }
    }
}

impl FilterKernel for SVFilter {
    fn reset(&mut self, filter_type: FilterType, sample_rate: f32, cutoff: f32, reso: f32) {
        self.clear();
        self.filter_type = filter_type;
        self.sample_rate = sample_rate;
        self.cutoff = -1.0;
        self.reso = -1.0;
        self.update(cutoff, reso);
    }

    #[inline]
    fn output(&mut self, input: f32, cutoff: f32, reso: f32) -> f32 {
        self.update(cutoff, reso);
        let (k, g) = (self.k, self.g);
        self.next_sample(input, k, g).select(self.filter_type)
    }
}

/// Two SVF stages in series sharing one set of coefficients.
#[derive(Debug, Clone, Default)]
pub struct Svf24 {
    stages: [SVFilter; 2],
}

impl FilterKernel for Svf24 {
    fn reset(&mut self, filter_type: FilterType, sample_rate: f32, cutoff: f32, reso: f32) {
        for stage in &mut self.stages {
            stage.reset(filter_type, sample_rate, cutoff, reso);
        }
    }

    #[inline]
    fn output(&mut self, input: f32, cutoff: f32, reso: f32) -> f32 {
        let [first, second] = &mut self.stages;
        let mid = first.output(input, cutoff, reso);
        second.output(mid, cutoff, reso)
    }
}

const PASSTHROUGH: Coefficients<f32> = Coefficients {
    a1: 0.0,
    a2: 0.0,
    b0: 1.0,
    b1: 0.0,
    b2: 0.0,
};

/// RBJ biquad; coefficients are recomputed only when the controls move.
pub struct BiquadFilter {
    filter: DirectForm2Transposed<f32>,
    filter_type: FilterType,
    sample_rate: f32,
    cutoff: f32,
    reso: f32,
}

impl Default for BiquadFilter {
    fn default() -> Self {
        Self {
            filter: DirectForm2Transposed::<f32>::new(PASSTHROUGH),
            filter_type: FilterType::LowPass,
            sample_rate: 48_000.0,
            cutoff: -1.0,
            reso: -1.0,
        }
    }
}

impl BiquadFilter {
    fn coefficients(&self, cutoff: f32, reso: f32) -> Coefficients<f32> {
        let kind = match self.filter_type {
            FilterType::LowPass => biquad::Type::LowPass,
            FilterType::BandPass => biquad::Type::BandPass,
            FilterType::HighPass => biquad::Type::HighPass,
            FilterType::Notch => biquad::Type::Notch,
        };
        let f0 = cutoff_hz(cutoff, self.sample_rate);
        let q = MIN_Q + (MAX_Q - MIN_Q) * reso.clamp(0.0, 1.0);
        Coefficients::<f32>::from_params(kind, self.sample_rate.hz(), f0.hz(), q)
            .unwrap_or(PASSTHROUGH)
    }
}

impl FilterKernel for BiquadFilter {
    fn reset(&mut self, filter_type: FilterType, sample_rate: f32, cutoff: f32, reso: f32) {
        self.filter_type = filter_type;
        self.sample_rate = sample_rate;
        self.cutoff = cutoff;
        self.reso = reso;
        self.filter = DirectForm2Transposed::<f32>::new(self.coefficients(cutoff, reso));
    }

    #[inline]
    fn output(&mut self, input: f32, cutoff: f32, reso: f32) -> f32 {
        if (cutoff - self.cutoff).abs() > 1e-4 || (reso - self.reso).abs() > 1e-4 {
            let coeffs = self.coefficients(cutoff, reso);
            self.filter.update_coefficients(coeffs);
            self.cutoff = cutoff;
            self.reso = reso;
        }
        self.filter.run(input)
    }
}
