//! Lexverb: two cross-coupled cascades of Schroeder allpasses.
//!
//! A Lexicon-inspired topology. Each channel runs the mono input
//! through five allpass stages; between the second and third stage, a
//! delayed, scaled copy of the *opposite* cascade's final output is
//! mixed in. The two cross-delays are what couple the channels and give
//! the tail its slow stereo churn. A shared one-pole lowpass at the end
//! darkens both channels together as `damp` rises.
//!
//! The cross-feedback reads the previous sample's cascade output, which
//! is how the cyclic graph is evaluated without recursion inside a
//! sample.
//!
//! Stage lengths are fixed millisecond values; the network is tuned as
//! a whole, so a sample-rate change is rejected rather than rescaled.

use resona_core::{
    flush_denormal, ms_to_samples, stereo_wet, Allpass, AllpassMode, DelayLine, RateChangeError,
    ReverbModel, ReverbParams, BUFSIZE,
};

const NUM_ALLPASSES: usize = 10;
const NUM_DELAYS: usize = 2;

/// Input trim applied before each cascade.
const LEX_TRIM: f32 = 0.7;

/// Width compensation weight; see [`stereo_wet`].
const SCALE_WET_WIDTH: f32 = 0.2;

/// Per-stage delay length (ms) and coefficient.
///
/// Entries 0-4 are the left cascade, 5-9 the right cascade, 10-11 the
/// left-into-right and right-into-left cross-delays.
const STAGE_PARAMS: [(f32, f32); NUM_ALLPASSES + NUM_DELAYS] = [
    (50.00, 0.750), // AP0
    (44.50, 0.720), // AP1
    (37.37, 0.691), // AP2
    (24.85, 0.649), // AP3
    (19.31, 0.662), // AP4
    (49.60, 0.750), // AP5
    (45.13, 0.720), // AP6
    (35.25, 0.691), // AP7
    (28.17, 0.649), // AP8
    (15.59, 0.646), // AP9
    (8.71, 0.646),  // dl0, left into right
    (12.05, 0.666), // dl1, right into left
];

/// Lexicon-style reverb model.
pub struct Lexverb {
    params: ReverbParams,
    wet1: f32,
    wet2: f32,

    ap: [Allpass; NUM_ALLPASSES],
    dl: [DelayLine; NUM_DELAYS],
    damp_state_left: f32,
    damp_state_right: f32,
}

impl Lexverb {
    /// Create a Lexverb model tuned for `sample_rate`, with default
    /// parameters applied.
    pub fn new(sample_rate: f32) -> Self {
        let ap = core::array::from_fn(|i| {
            let (ms, coef) = STAGE_PARAMS[i];
            let mut ap = Allpass::new(ms_to_samples(ms, sample_rate), AllpassMode::Schroeder);
            ap.set_feedback(coef);
            ap
        });

        let dl = core::array::from_fn(|i| {
            let (ms, coef) = STAGE_PARAMS[NUM_ALLPASSES + i];
            let mut dl = DelayLine::new(ms_to_samples(ms, sample_rate));
            dl.set_coefficient(coef);
            dl
        });

        let mut rev = Self {
            params: ReverbParams::default(),
            wet1: 0.0,
            wet2: 0.0,
            ap,
            dl,
            damp_state_left: 0.0,
            damp_state_right: 0.0,
        };

        rev.reset();
        rev.update();
        rev
    }

    fn update(&mut self) {
        let roomscale = 0.5 + 0.5 * self.params.roomsize;
        let wet =
            (self.params.level * roomscale) / (1.0 + self.params.width * SCALE_WET_WIDTH);
        let (wet1, wet2) = stereo_wet(wet, self.params.width);
        self.wet1 = wet1;
        self.wet2 = wet2;
    }

    /// One sample through both cascades and the shared damping tail.
    #[inline]
    fn tick(&mut self, input: f32) -> (f32, f32) {
        let trimmed = input * LEX_TRIM;

        // Left cascade, with the right side's previous output crossed
        // in through dl1 between AP1 and AP2.
        let mut left = self.ap[0].process(trimmed);
        left = self.ap[1].process(left);
        let cross_rl = self.dl[1].process(self.ap[9].last_output()) * self.dl[1].coefficient();
        left = self.ap[2].process(left + cross_rl);
        left = self.ap[3].process(left);
        left = self.ap[4].process(left);

        // Right cascade, crossing in AP4's output (this sample's, per
        // the evaluation order) through dl0 between AP6 and AP7.
        let mut right = self.ap[5].process(trimmed);
        right = self.ap[6].process(right);
        let cross_lr = self.dl[0].process(self.ap[4].last_output()) * self.dl[0].coefficient();
        right = self.ap[7].process(right + cross_lr);
        right = self.ap[8].process(right);
        right = self.ap[9].process(right);

        let damp = self.params.damp;
        let mut out_left = left;
        let mut out_right = right;
        if damp > 0.0 {
            out_left = out_left * (1.0 - damp) + self.damp_state_left * damp;
            out_right = out_right * (1.0 - damp) + self.damp_state_right * damp;
        }
        self.damp_state_left = flush_denormal(out_left);
        self.damp_state_right = flush_denormal(out_right);

        (out_left, out_right)
    }

    fn run<const MIX: bool>(
        &mut self,
        input: &[f32; BUFSIZE],
        left_out: &mut [f32; BUFSIZE],
        right_out: &mut [f32; BUFSIZE],
    ) {
        for k in 0..BUFSIZE {
            let (left, right) = self.tick(input[k]);

            let mix_l = left * self.wet1 + right * self.wet2;
            let mix_r = right * self.wet1 + left * self.wet2;

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

impl ReverbModel for Lexverb {
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
        for ap in &mut self.ap {
            ap.reset();
            ap.set_index(1 % ap.len());
        }
        for dl in &mut self.dl {
            let start = 1 % dl.len();
            dl.reset();
            dl.set_single_tap_position(start);
        }
        self.damp_state_left = 0.0;
        self.damp_state_right = 0.0;
    }

    fn set_params(&mut self, mask: u32, roomsize: f32, damping: f32, width: f32, level: f32) {
        self.params.apply_masked(mask, roomsize, damping, width, level);
        self.update();
    }

    /// The stage tunings are fixed; rescaling them changes the sound,
    /// so a rate change is reported as unsupported.
    fn samplerate_change(&mut self, _sample_rate: f32) -> Result<(), RateChangeError> {
        Err(RateChangeError::Unsupported)
    }
}
