//! In-place complex FFT kernels.
//!
//! Both directions are unnormalized: `inverse(forward(x)) = N · x`. Callers
//! fold the `1/N` into their own output scaling.

use std::{f32::consts::TAU, sync::Arc};

use rustfft::{num_complex::Complex32, Fft, FftPlanner};

pub trait FftKernel {
    fn size(&self) -> usize;

    fn forward(&mut self, buffer: &mut [Complex32]);

    fn inverse(&mut self, buffer: &mut [Complex32]);
}

/// Iterative radix-2 Cooley-Tukey with precomputed twiddles.
#[derive(Debug, Clone)]
pub struct Radix2Fft {
    size: usize,
    twiddles: Vec<Complex32>,
}

impl Radix2Fft {
    /// `size` must be a power of two.
    pub fn new(size: usize) -> Self {
        debug_assert!(size.is_power_of_two(), "FFT size must be a power of two");
        let twiddles = (0..size / 2)
            .map(|k| Complex32::from_polar(1.0, -TAU * k as f32 / size as f32))
            .collect();
        Self { size, twiddles }
    }

    fn transform(&self, buffer: &mut [Complex32], inverse: bool) {
        let n = self.size;
        debug_assert_eq!(buffer.len(), n);

        // bit-reversal permutation
        let mut j = 0;
        for i in 1..n {
            let mut bit = n >> 1;
            while j & bit != 0 {
                j ^= bit;
                bit >>= 1;
            }
            j |= bit;
            if i < j {
                buffer.swap(i, j);
            }
        }

        let mut len = 2;
        while len <= n {
            let half = len / 2;
            let stride = n / len;
            for start in (0..n).step_by(len) {
                for k in 0..half {
                    let mut w = self.twiddles[k * stride];
                    if inverse {
                        w = w.conj();
                    }
                    let a = buffer[start + k];
                    let b = buffer[start + k + half] * w;
                    buffer[start + k] = a + b;
                    buffer[start + k + half] = a - b;
                }
            }
            len <<= 1;
        }
    }
}

impl FftKernel for Radix2Fft {
    fn size(&self) -> usize {
        self.size
    }

    fn forward(&mut self, buffer: &mut [Complex32]) {
        self.transform(buffer, false);
    }

    fn inverse(&mut self, buffer: &mut [Complex32]) {
        self.transform(buffer, true);
    }
}

/// `rustfft`-backed kernel, planned once with scratch allocated up front.
pub struct RustFft {
    size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex32>,
}

impl RustFft {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        Self {
            size,
            forward,
            inverse,
            scratch: vec![Complex32::new(0.0, 0.0); scratch_len],
        }
    }
}

impl FftKernel for RustFft {
    fn size(&self) -> usize {
        self.size
    }

    fn forward(&mut self, buffer: &mut [Complex32]) {
        self.forward.process_with_scratch(buffer, &mut self.scratch);
    }

    fn inverse(&mut self, buffer: &mut [Complex32]) {
        self.inverse.process_with_scratch(buffer, &mut self.scratch);
    }
}
