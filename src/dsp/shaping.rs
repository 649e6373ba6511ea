//! Transfer curves
//!
//! Small memoryless functions that bend control values and audio into
//! useful ranges. They are evaluated per sample inside the voice loop, so
//! all of them avoid branches beyond simple range checks.
//!
//! # Curves
//!
//! Soft knee (`sigmoid_0`):
//!   f(x) = t1 · x · (1.5 − 0.5x²),  t1 = 1 − t0
//!   - Cubic S-curve through the origin, flat at ±1
//!   - Saturates to ±t1 outside [−1, 1]
//!
//! Unit soft knee (`sigmoid_1`):
//!   g(x) = 0.5 · (1 + f(2x − 1))
//!   - Maps [0, 1] onto [t0/2, 1 − t0/2]
//!   - Used to keep cutoff and resonance away from the filter's edges
//!
//! Limiter (`limit`):
//!   h(x) = tanh(2x) via a Padé approximant
//!   - Output never leaves [−1, 1]
//!
//! Velocity curve:
//!   v' = v^(1 − p)
//!   - p = 0 is linear, p → 1 flattens every velocity toward full scale

const KNEE_FLOOR: f32 = 0.01;

/// Cubic soft knee saturating at `±(1 − t0)`.
#[inline]
pub fn sigmoid_0(x: f32, t0: f32) -> f32 {
    let t1 = 1.0 - t0;
    if x < -1.0 {
        -t1
    } else if x > 1.0 {
        t1
    } else {
        t1 * x * (1.5 - 0.5 * x * x)
    }
}

/// Soft knee over the unit interval.
#[inline]
pub fn sigmoid_1(x: f32) -> f32 {
    0.5 * (1.0 + sigmoid_0(2.0 * x - 1.0, KNEE_FLOOR))
}

/// Rational tanh approximation, exact at the ±3 clamp points.
#[inline]
pub fn fast_tanh(x: f32) -> f32 {
    let x = x.clamp(-3.0, 3.0);
    let x2 = x * x;
    x * (27.0 + x2) / (27.0 + 9.0 * x2)
}

/// Output limiter applied to every mixed sample when enabled.
#[inline]
pub fn limit(x: f32) -> f32 {
    fast_tanh(2.0 * x)
}

/// Raise a normalized velocity to the curve exponent `1 − p`.
#[inline]
pub fn velocity_curve(x: f32, p: f32) -> f32 {
    x.powf(1.0 - p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_stays_in_unit_range() {
        for i in -200..=200 {
            let x = i as f32 * 0.1;
            let y = limit(x);
            assert!((-1.0..=1.0).contains(&y), "limit({x}) = {y}");
        }
        assert!((limit(100.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn fast_tanh_tracks_tanh_near_origin() {
        for i in -20..=20 {
            let x = i as f32 * 0.05;
            assert!((fast_tanh(x) - x.tanh()).abs() < 0.02);
        }
    }

    #[test]
    fn sigmoid_1_keeps_margin_at_edges() {
        assert!((sigmoid_1(0.5) - 0.5).abs() < 1e-6);
        assert!((sigmoid_1(0.0) - 0.005).abs() < 1e-6);
        assert!((sigmoid_1(1.0) - 0.995).abs() < 1e-6);
        assert!((sigmoid_1(5.0) - 0.995).abs() < 1e-6);
        assert!((sigmoid_1(-5.0) - 0.005).abs() < 1e-6);
    }

    #[test]
    fn sigmoid_1_is_monotonic() {
        let mut last = sigmoid_1(-0.1);
        for i in 0..=110 {
            let y = sigmoid_1(i as f32 * 0.01);
            assert!(y >= last);
            last = y;
        }
    }

    #[test]
    fn velocity_curve_flattens_with_pressure() {
        assert!((velocity_curve(0.25, 0.0) - 0.25).abs() < 1e-6);
        assert!(velocity_curve(0.25, 0.5) > 0.25);
        assert!((velocity_curve(0.25, 1.0) - 1.0).abs() < 1e-6);
    }
}
