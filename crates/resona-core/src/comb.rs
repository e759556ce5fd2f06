//! Feedback comb filter with damping.
//!
//! The feedback path runs through a one-pole lowpass, so high
//! frequencies decay faster than lows, the way air and walls absorb
//! treble in a real room. Banks of these in parallel are the body of a
//! Freeverb-style reverb.

use crate::flush_denormal;
use crate::DelayLine;

/// Comb filter with a damped feedback path, built on a [`DelayLine`].
///
/// # Invariants
///
/// - `damp2 == 1 - damp1` after any [`set_damp`](Self::set_damp) call
#[derive(Debug, Clone)]
pub struct Comb {
    delay: DelayLine,
    feedback: f32,
    damp1: f32,
    damp2: f32,
    filterstore: f32,
}

impl Comb {
    /// Create a comb with `length` samples of delay, undamped and with
    /// zero feedback.
    ///
    /// # Panics
    ///
    /// Panics if `length` is 0, like [`DelayLine::new`].
    pub fn new(length: usize) -> Self {
        Self {
            delay: DelayLine::new(length),
            feedback: 0.0,
            damp1: 0.0,
            damp2: 1.0,
            filterstore: 0.0,
        }
    }

    /// Set the feedback coefficient. Values at or above 1 make the comb
    /// unstable; the reverb models map `roomsize` well below that.
    #[inline]
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback;
    }

    /// Current feedback coefficient.
    #[inline]
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Set the damping amount (0 = bright, 1 = fully damped) and derive
    /// the complementary coefficient.
    #[inline]
    pub fn set_damp(&mut self, damp: f32) {
        self.damp1 = damp;
        self.damp2 = 1.0 - damp;
    }

    /// Current damping amount.
    #[inline]
    pub fn damp(&self) -> f32 {
        self.damp1
    }

    /// Complementary damping coefficient.
    #[inline]
    pub fn damp2(&self) -> f32 {
        self.damp2
    }

    /// Delay length in samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.delay.len()
    }

    /// Always false; the delay buffer has at least one sample.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Process one sample. The output is the delayed sample; the input
    /// plus the damped, scaled feedback is written back.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.delay.read_tap(0);

        self.filterstore = flush_denormal(output * self.damp2 + self.filterstore * self.damp1);
        self.delay.process(input + self.filterstore * self.feedback);

        output
    }

    /// Write `value` into every delay cell without moving the cursor.
    ///
    /// The Freeverb model fills with a small DC offset instead of zero
    /// on reset, so its recursion converges against the offset rather
    /// than ramping down through the denormal range.
    pub fn fill(&mut self, value: f32) {
        self.delay.fill(value);
    }

    /// Zero the delay buffer, cursor, and lowpass state.
    pub fn reset(&mut self) {
        self.delay.reset();
        self.filterstore = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damp_coefficients_are_complementary() {
        let mut comb = Comb::new(10);
        for damp in [0.0, 0.2, 0.5, 0.99, 1.0] {
            comb.set_damp(damp);
            assert!((comb.damp() + comb.damp2() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn echoes_after_delay_length() {
        let mut comb = Comb::new(100);
        comb.set_feedback(0.5);
        comb.set_damp(0.2);

        assert_eq!(comb.process(1.0), 0.0);
        for _ in 0..99 {
            comb.process(0.0);
        }
        let echo = comb.process(0.0);
        assert!(echo.abs() > 0.1, "expected echo, got {echo}");
    }

    #[test]
    fn echoes_decay_with_feedback_below_one() {
        let mut comb = Comb::new(10);
        comb.set_feedback(0.8);
        comb.set_damp(0.0);

        comb.process(1.0);
        let mut last_peak = f32::MAX;
        for _ in 0..20 {
            let mut peak = 0.0f32;
            for _ in 0..10 {
                peak = peak.max(comb.process(0.0).abs());
            }
            assert!(peak <= last_peak + 1e-6, "echoes should not grow");
            last_peak = peak;
        }
    }

    #[test]
    fn damped_comb_loses_energy_faster() {
        let mut bright = Comb::new(20);
        bright.set_feedback(0.8);
        bright.set_damp(0.0);

        let mut dark = Comb::new(20);
        dark.set_feedback(0.8);
        dark.set_damp(0.8);

        bright.process(1.0);
        dark.process(1.0);

        let mut bright_sum = 0.0f32;
        let mut dark_sum = 0.0f32;
        for _ in 0..400 {
            bright_sum += bright.process(0.0).abs();
            dark_sum += dark.process(0.0).abs();
        }
        assert!(dark_sum < bright_sum);
    }

    #[test]
    fn fill_seeds_the_whole_buffer() {
        let mut comb = Comb::new(4);
        comb.fill(1e-8);
        for _ in 0..4 {
            assert_eq!(comb.process(0.0), 1e-8);
        }
    }

    #[test]
    fn reset_silences_the_filter() {
        let mut comb = Comb::new(16);
        comb.set_feedback(0.9);
        for _ in 0..64 {
            comb.process(1.0);
        }
        comb.reset();
        for _ in 0..32 {
            assert_eq!(comb.process(0.0), 0.0);
        }
    }
}
