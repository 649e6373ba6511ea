//! Vowel formant filter.
//!
//! Five band-pass SVF stages in parallel, each tuned to one formant of a
//! sung vowel (tenor, Csound formant table). The cutoff control morphs
//! through the vowels A → E → I → O → U; resonance narrows every band.

use super::filter::{FilterKernel, FilterType, SVFilter};

const BANDS: usize = 5;
const MAX_Q_BOOST: f32 = 4.0;

/// (center Hz, gain dB, bandwidth Hz) per formant.
type Vowel = [(f32, f32, f32); BANDS];

const VOWELS: [Vowel; 5] = [
    // A
    [
        (650.0, 0.0, 80.0),
        (1080.0, -6.0, 90.0),
        (2650.0, -7.0, 120.0),
        (2900.0, -8.0, 130.0),
        (3250.0, -22.0, 140.0),
    ],
    // E
    [
        (400.0, 0.0, 70.0),
        (1700.0, -14.0, 80.0),
        (2600.0, -12.0, 100.0),
        (3200.0, -14.0, 120.0),
        (3580.0, -20.0, 120.0),
    ],
    // I
    [
        (290.0, 0.0, 40.0),
        (1870.0, -15.0, 90.0),
        (2800.0, -18.0, 100.0),
        (3250.0, -20.0, 120.0),
        (3540.0, -30.0, 120.0),
    ],
    // O
    [
        (400.0, 0.0, 40.0),
        (800.0, -10.0, 80.0),
        (2600.0, -12.0, 100.0),
        (2800.0, -12.0, 120.0),
        (3000.0, -26.0, 120.0),
    ],
    // U
    [
        (350.0, 0.0, 40.0),
        (600.0, -20.0, 60.0),
        (2700.0, -17.0, 100.0),
        (2900.0, -14.0, 120.0),
        (3300.0, -26.0, 120.0),
    ],
];

#[derive(Debug, Clone, Copy, Default)]
struct Band {
    gain: f32,
    g: f32,
    k: f32,
}

#[derive(Debug, Clone)]
pub struct FormantFilter {
    filters: [SVFilter; BANDS],
    bands: [Band; BANDS],
    sample_rate: f32,
    cutoff: f32,
    reso: f32,
}

impl Default for FormantFilter {
    fn default() -> Self {
        Self {
            filters: std::array::from_fn(|_| SVFilter::new(FilterType::BandPass)),
            bands: [Band::default(); BANDS],
            sample_rate: 48_000.0,
            cutoff: -1.0,
            reso: -1.0,
        }
    }
}

impl FormantFilter {
    fn update(&mut self, cutoff: f32, reso: f32) {
        if cutoff == self.cutoff && reso == self.reso {
            return;
        }
        self.cutoff = cutoff;
        self.reso = reso;

        let position = cutoff.clamp(0.0, 1.0) * (VOWELS.len() - 1) as f32;
        let lower = (position.floor() as usize).min(VOWELS.len() - 2);
        let frac = position - lower as f32;
        let q_boost = 1.0 + MAX_Q_BOOST * reso.clamp(0.0, 1.0);
        let nyquist_guard = 0.45 * self.sample_rate;

        for (band, (from, to)) in self
            .bands
            .iter_mut()
            .zip(VOWELS[lower].iter().zip(VOWELS[lower + 1].iter()))
        {
            let freq = from.0 + (to.0 - from.0) * frac;
            let gain_db = from.1 + (to.1 - from.1) * frac;
            let bandwidth = from.2 + (to.2 - from.2) * frac;

            let q = q_boost * freq / bandwidth;
            band.g = SVFilter::compute_g(freq.min(nyquist_guard), self.sample_rate);
            band.k = 1.0 / q;
            band.gain = 10f32.powf(gain_db / 20.0);
        }
    }
}

impl FilterKernel for FormantFilter {
    fn reset(&mut self, _filter_type: FilterType, sample_rate: f32, cutoff: f32, reso: f32) {
        for filter in &mut self.filters {
            filter.clear();
        }
        self.sample_rate = sample_rate;
        self.cutoff = -1.0;
        self.reso = -1.0;
        self.update(cutoff, reso);
    }

    #[inline]
    fn output(&mut self, input: f32, cutoff: f32, reso: f32) -> f32 {
        self.update(cutoff, reso);
        let mut out = 0.0;
        for (filter, band) in self.filters.iter_mut().zip(self.bands.iter()) {
            // k · bandpass has unity gain at the band center
            let bp = filter.next_sample(input, band.k, band.g).bandpass;
            out += band.gain * band.k * bp;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::TAU;

    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn response_at(cutoff: f32, freq: f32) -> f32 {
        let mut filter = FormantFilter::default();
        filter.reset(FilterType::LowPass, SAMPLE_RATE, cutoff, 0.0);
        let mut peak = 0.0f32;
        for n in 0..9_600 {
            let x = (TAU * freq * n as f32 / SAMPLE_RATE).sin();
            let y = filter.output(x, cutoff, 0.0);
            if n > 4_800 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn vowel_a_emphasizes_its_first_formant() {
        let on_formant = response_at(0.0, 650.0);
        let between = response_at(0.0, 1_800.0);
        assert!(
            on_formant > between * 4.0,
            "expected peak at 650 Hz: on={on_formant}, between={between}"
        );
    }

    #[test]
    fn cutoff_morphs_between_vowels() {
        // I has its first formant at 290 Hz, A at 650 Hz
        let a_at_290 = response_at(0.0, 290.0);
        let i_at_290 = response_at(0.5, 290.0);
        assert!(i_at_290 > a_at_290 * 2.0, "a={a_at_290}, i={i_at_290}");
    }

    #[test]
    fn output_stays_bounded_for_unit_input() {
        let mut filter = FormantFilter::default();
        filter.reset(FilterType::LowPass, SAMPLE_RATE, 0.3, 1.0);
        for n in 0..4_800 {
            let x = if n % 100 < 50 { 1.0 } else { -1.0 };
            let y = filter.output(x, 0.3, 1.0);
            assert!(y.is_finite() && y.abs() < 20.0);
        }
    }
}
