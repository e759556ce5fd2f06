//! Freeverb: 8 parallel combs into 4 series allpasses, per channel.
//!
//! The classic public-domain Freeverb topology. Both channels run the
//! same network; the right channel's delay lengths are offset by a
//! fixed stereo spread so the tails decorrelate. The comb/allpass
//! tunings are listening-test values at 44.1 kHz, scaled linearly to
//! the actual rate.
//!
//! Denormal handling is behavioral here: a small DC offset rides the
//! input and is subtracted again at the output, so the recursion
//! converges against the offset instead of ramping down through the
//! subnormal range. Reset fills the buffers with the offset for the
//! same reason.

use libm::roundf;
use resona_core::{
    stereo_wet, Allpass, AllpassMode, Comb, RateChangeError, ReverbModel, ReverbParams, BUFSIZE,
};

const NUM_COMBS: usize = 8;
const NUM_ALLPASSES: usize = 4;

/// Comb delay lengths at the 44.1 kHz reference rate (left channel).
/// Mutually prime to avoid coincident resonances.
const COMB_TUNINGS: [usize; NUM_COMBS] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];

/// Allpass delay lengths at the 44.1 kHz reference rate (left channel).
const ALLPASS_TUNINGS: [usize; NUM_ALLPASSES] = [556, 441, 341, 225];

/// Right-channel delay offset in samples.
const STEREO_SPREAD: usize = 23;

/// Reference sample rate for the tuning tables.
const REFERENCE_RATE: f32 = 44100.0;

/// Offset keeping the recursion away from denormals; invisible at the
/// output because it is subtracted again after the filter network.
const DC_OFFSET: f32 = 1e-8;

const FIXED_GAIN: f32 = 0.015;
const SCALE_WET: f32 = 3.0;
const SCALE_DAMP: f32 = 1.0;
const SCALE_ROOM: f32 = 0.28;
const OFFSET_ROOM: f32 = 0.7;

/// Compensation weight keeping the output amplitude roughly independent
/// of the width setting; see [`stereo_wet`].
const SCALE_WET_WIDTH: f32 = 0.2;

const ALLPASS_FEEDBACK: f32 = 0.5;

/// Scale a reference-rate delay length to the target rate.
fn scale_to_rate(samples: usize, sample_rate: f32) -> usize {
    (roundf(samples as f32 * sample_rate / REFERENCE_RATE) as usize).max(1)
}

/// Freeverb reverb model.
pub struct Freeverb {
    params: ReverbParams,
    /// `params.roomsize` mapped into comb-feedback range.
    roomsize: f32,
    /// `params.damp` scaled into comb-damping range.
    damp: f32,
    gain: f32,
    wet1: f32,
    wet2: f32,

    comb_l: [Comb; NUM_COMBS],
    comb_r: [Comb; NUM_COMBS],
    allpass_l: [Allpass; NUM_ALLPASSES],
    allpass_r: [Allpass; NUM_ALLPASSES],
}

impl Freeverb {
    /// Create a Freeverb model tuned for `sample_rate`, with default
    /// parameters applied.
    pub fn new(sample_rate: f32) -> Self {
        let comb_l = core::array::from_fn(|i| Comb::new(scale_to_rate(COMB_TUNINGS[i], sample_rate)));
        let comb_r = core::array::from_fn(|i| {
            Comb::new(scale_to_rate(COMB_TUNINGS[i] + STEREO_SPREAD, sample_rate))
        });

        let allpass_l = core::array::from_fn(|i| {
            let mut ap = Allpass::new(
                scale_to_rate(ALLPASS_TUNINGS[i], sample_rate),
                AllpassMode::Freeverb,
            );
            ap.set_feedback(ALLPASS_FEEDBACK);
            ap
        });
        let allpass_r = core::array::from_fn(|i| {
            let mut ap = Allpass::new(
                scale_to_rate(ALLPASS_TUNINGS[i] + STEREO_SPREAD, sample_rate),
                AllpassMode::Freeverb,
            );
            ap.set_feedback(ALLPASS_FEEDBACK);
            ap
        });

        let mut rev = Self {
            params: ReverbParams::default(),
            roomsize: 0.0,
            damp: 0.0,
            gain: FIXED_GAIN,
            wet1: 0.0,
            wet2: 0.0,
            comb_l,
            comb_r,
            allpass_l,
            allpass_r,
        };

        rev.reset();
        rev.update();
        rev
    }

    /// Recompute the derived coefficients from the stored parameters
    /// and push them into the filter bank.
    fn update(&mut self) {
        self.roomsize = self.params.roomsize * SCALE_ROOM + OFFSET_ROOM;
        self.damp = self.params.damp * SCALE_DAMP;

        let wet =
            (self.params.level * SCALE_WET) / (1.0 + self.params.width * SCALE_WET_WIDTH);
        let (wet1, wet2) = stereo_wet(wet, self.params.width);
        self.wet1 = wet1;
        self.wet2 = wet2;

        for comb in self.comb_l.iter_mut().chain(self.comb_r.iter_mut()) {
            comb.set_feedback(self.roomsize);
            comb.set_damp(self.damp);
        }
    }

    fn run<const MIX: bool>(
        &mut self,
        input: &[f32; BUFSIZE],
        left_out: &mut [f32; BUFSIZE],
        right_out: &mut [f32; BUFSIZE],
    ) {
        for k in 0..BUFSIZE {
            // Freeverb expects a stereo signal and sums both sides into
            // its input. This engine is fed mono, so the sample is
            // doubled instead.
            let in_sample = (2.0 * input[k] + DC_OFFSET) * self.gain;

            let mut out_l = 0.0f32;
            let mut out_r = 0.0f32;

            for comb in &mut self.comb_l {
                out_l += comb.process(in_sample);
            }
            for comb in &mut self.comb_r {
                out_r += comb.process(in_sample);
            }

            for ap in &mut self.allpass_l {
                out_l = ap.process(out_l);
            }
            for ap in &mut self.allpass_r {
                out_r = ap.process(out_r);
            }

            out_l -= DC_OFFSET;
            out_r -= DC_OFFSET;

            let mix_l = out_l * self.wet1 + out_r * self.wet2;
            let mix_r = out_r * self.wet1 + out_l * self.wet2;

            if MIX {
                left_out[k] += mix_l;
                right_out[k] += mix_r;
            } else {
                left_out[k] = mix_l;
                right_out[k] = mix_r;
            }
        }
    }
}

impl ReverbModel for Freeverb {
    fn process_mix(
        &mut self,
        input: &[f32; BUFSIZE],
        left_out: &mut [f32; BUFSIZE],
        right_out: &mut [f32; BUFSIZE],
    ) {
        self.run::<true>(input, left_out, right_out);
    }

    fn process_replace(
        &mut self,
        input: &[f32; BUFSIZE],
        left_out: &mut [f32; BUFSIZE],
        right_out: &mut [f32; BUFSIZE],
    ) {
        self.run::<false>(input, left_out, right_out);
    }

    fn reset(&mut self) {
        // Clear the filter state, then seed the buffers with the DC
        // offset rather than silence so the recursion converges against
        // the offset instead of ramping down into denormals.
        for comb in self.comb_l.iter_mut().chain(self.comb_r.iter_mut()) {
            comb.reset();
            comb.fill(DC_OFFSET);
        }
        for ap in self.allpass_l.iter_mut().chain(self.allpass_r.iter_mut()) {
            ap.reset();
            ap.fill(DC_OFFSET);
        }
    }

    fn set_params(&mut self, mask: u32, roomsize: f32, damping: f32, width: f32, level: f32) {
        self.params.apply_masked(mask, roomsize, damping, width, level);
        self.update();
    }

    fn samplerate_change(&mut self, sample_rate: f32) -> Result<(), RateChangeError> {
        if !(sample_rate > 0.0) || !sample_rate.is_finite() {
            return Err(RateChangeError::InvalidRate);
        }

        for (i, comb) in self.comb_l.iter_mut().enumerate() {
            *comb = Comb::new(scale_to_rate(COMB_TUNINGS[i], sample_rate));
        }
        for (i, comb) in self.comb_r.iter_mut().enumerate() {
            *comb = Comb::new(scale_to_rate(COMB_TUNINGS[i] + STEREO_SPREAD, sample_rate));
        }
        for (i, ap) in self.allpass_l.iter_mut().enumerate() {
            *ap = Allpass::new(
                scale_to_rate(ALLPASS_TUNINGS[i], sample_rate),
                AllpassMode::Freeverb,
            );
            ap.set_feedback(ALLPASS_FEEDBACK);
        }
        for (i, ap) in self.allpass_r.iter_mut().enumerate() {
            *ap = Allpass::new(
                scale_to_rate(ALLPASS_TUNINGS[i] + STEREO_SPREAD, sample_rate),
                AllpassMode::Freeverb,
            );
            ap.set_feedback(ALLPASS_FEEDBACK);
        }

        self.reset();
        self.update();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resona_core::SET_ALL;

    fn blocks(model: &mut Freeverb, input: &[f32; BUFSIZE], count: usize) -> (f32, f32) {
        let mut left = [0.0f32; BUFSIZE];
        let mut right = [0.0f32; BUFSIZE];
        let mut peak_l = 0.0f32;
        let mut peak_r = 0.0f32;
        for _ in 0..count {
            model.process_replace(input, &mut left, &mut right);
            for k in 0..BUFSIZE {
                peak_l = peak_l.max(left[k].abs());
                peak_r = peak_r.max(right[k].abs());
            }
        }
        (peak_l, peak_r)
    }

    #[test]
    fn silence_in_stays_near_silence_out() {
        let mut rev = Freeverb::new(44100.0);
        rev.set_params(SET_ALL, 0.5, 0.5, 1.0, 1.0);

        let zeros = [0.0f32; BUFSIZE];
        // Warm up past the turn-on transient of the DC offset.
        blocks(&mut rev, &zeros, 32);
        let (peak_l, peak_r) = blocks(&mut rev, &zeros, 8);
        assert!(peak_l < 1e-5, "left leakage {peak_l}");
        assert!(peak_r < 1e-5, "right leakage {peak_r}");
    }

    #[test]
    fn impulse_produces_a_tail() {
        let mut rev = Freeverb::new(44100.0);
        rev.set_params(SET_ALL, 0.8, 0.2, 0.5, 1.0);

        let mut impulse = [0.0f32; BUFSIZE];
        impulse[0] = 1.0;
        let zeros = [0.0f32; BUFSIZE];

        let mut left = [0.0f32; BUFSIZE];
        let mut right = [0.0f32; BUFSIZE];
        rev.process_replace(&impulse, &mut left, &mut right);

        let mut energy = 0.0f32;
        for _ in 0..64 {
            rev.process_replace(&zeros, &mut left, &mut right);
            for k in 0..BUFSIZE {
                energy += left[k] * left[k] + right[k] * right[k];
            }
        }
        assert!(energy > 1e-6, "expected a reverb tail, energy {energy}");
    }

    #[test]
    fn roomsize_maps_into_comb_feedback() {
        let mut rev = Freeverb::new(48000.0);
        rev.set_params(SET_ALL, 0.0, 0.0, 0.5, 0.9);
        assert!((rev.roomsize - OFFSET_ROOM).abs() < 1e-6);
        rev.set_params(SET_ALL, 1.0, 0.0, 0.5, 0.9);
        assert!((rev.roomsize - (SCALE_ROOM + OFFSET_ROOM)).abs() < 1e-6);
    }

    #[test]
    fn right_channel_is_spread() {
        let rev = Freeverb::new(44100.0);
        for i in 0..NUM_COMBS {
            assert_eq!(rev.comb_r[i].len(), rev.comb_l[i].len() + STEREO_SPREAD);
        }
        for i in 0..NUM_ALLPASSES {
            assert_eq!(rev.allpass_r[i].len(), rev.allpass_l[i].len() + STEREO_SPREAD);
        }
    }

    #[test]
    fn samplerate_change_rescales_buffers() {
        let mut rev = Freeverb::new(44100.0);
        assert_eq!(rev.comb_l[0].len(), COMB_TUNINGS[0]);

        rev.samplerate_change(88200.0).unwrap();
        assert_eq!(rev.comb_l[0].len(), COMB_TUNINGS[0] * 2);

        assert_eq!(
            rev.samplerate_change(0.0),
            Err(RateChangeError::InvalidRate)
        );
    }
}
