//! Dattorro plate reverb.
//!
//! After Jon Dattorro, "Effect Design Part 1: Reverberator and Other
//! Filters" (J. Audio Eng. Soc., 1997). The signal runs through a short
//! predelay and a one-pole bandwidth limiter, is diffused by four
//! series allpasses, then recirculates through two cross-coupled tanks
//! (allpass, delay, absorption lowpass, allpass, delay each). The
//! stereo output is assembled from fourteen signed taps into the tank
//! delay and allpass buffers, seven per channel.
//!
//! All lengths in the paper are sample counts at its 29761 Hz reference
//! rate; they are kept in that form and scaled linearly to the actual
//! rate when buffers are (re)built.

use resona_core::{
    seconds_to_samples, stereo_wet, Allpass, AllpassMode, DelayLine, RateChangeError, ReverbModel,
    ReverbParams, BUFSIZE,
};

/// Reference sample rate used by the paper's delay and tap tables.
const PAPER_RATE: f32 = 29761.0;

/// Input trim applied before the predelay.
const TRIM: f32 = 0.6;

/// Predelay ahead of the diffusion network.
const PREDELAY_S: f32 = 4.0 / 1000.0;

/// Input diffusion allpass feedbacks (stages 1-2 and 3-4).
const INPUT_DIFFUSION_1: f32 = 0.75;
const INPUT_DIFFUSION_2: f32 = 0.625;

/// Tank allpass feedbacks (decay diffusion 1 and 2).
const DECAY_DIFFUSION_1: f32 = 0.7;
const DECAY_DIFFUSION_2: f32 = 0.5;

/// Width compensation weight; see [`stereo_wet`].
const SCALE_WET_WIDTH: f32 = 0.2;

/// Initial coefficient of the input bandwidth lowpass.
const INITIAL_BANDWIDTH: f32 = 0.9999;

/// Input-diffuser delay lengths in seconds.
const INPUT_DELAY_S: [f32; 4] = [
    142.0 / PAPER_RATE,
    107.0 / PAPER_RATE,
    379.0 / PAPER_RATE,
    277.0 / PAPER_RATE,
];

/// Tank allpass delay lengths in seconds.
const TANK_AP_DELAY_S: [f32; 4] = [
    672.0 / PAPER_RATE,
    1800.0 / PAPER_RATE,
    908.0 / PAPER_RATE,
    2656.0 / PAPER_RATE,
];

/// Tank delay-line lengths in seconds.
const TANK_DELAY_S: [f32; 4] = [
    4453.0 / PAPER_RATE,
    3720.0 / PAPER_RATE,
    4217.0 / PAPER_RATE,
    3163.0 / PAPER_RATE,
];

/// Output tap positions in seconds, left channel then right.
const TAP_S: [f32; 14] = [
    266.0 / PAPER_RATE,
    2974.0 / PAPER_RATE,
    1913.0 / PAPER_RATE,
    1996.0 / PAPER_RATE,
    1990.0 / PAPER_RATE,
    187.0 / PAPER_RATE,
    1066.0 / PAPER_RATE,
    353.0 / PAPER_RATE,
    3627.0 / PAPER_RATE,
    1228.0 / PAPER_RATE,
    2673.0 / PAPER_RATE,
    2111.0 / PAPER_RATE,
    335.0 / PAPER_RATE,
    121.0 / PAPER_RATE,
];

fn input_diffuser(i: usize, sample_rate: f32) -> Allpass {
    let mut ap = Allpass::new(
        seconds_to_samples(INPUT_DELAY_S[i], sample_rate),
        AllpassMode::Schroeder,
    );
    ap.set_feedback(if i < 2 {
        INPUT_DIFFUSION_1
    } else {
        INPUT_DIFFUSION_2
    });
    ap
}

fn tank_diffuser(i: usize, sample_rate: f32) -> Allpass {
    let mut ap = Allpass::new(
        seconds_to_samples(TANK_AP_DELAY_S[i], sample_rate),
        AllpassMode::Schroeder,
    );
    ap.set_feedback(if i % 2 == 0 {
        DECAY_DIFFUSION_1
    } else {
        DECAY_DIFFUSION_2
    });
    ap
}

fn tank_line(i: usize, sample_rate: f32) -> DelayLine {
    DelayLine::new(seconds_to_samples(TANK_DELAY_S[i], sample_rate))
}

/// Dattorro plate reverb model.
///
/// Indices 0/1 of `tank_ap` and `tank_delay` form the left tank, 2/3
/// the right. The damping lowpasses live embedded in `predelay`
/// (bandwidth limiter) and `tank_delay[0]`/`tank_delay[2]` (absorption).
pub struct Dattorro {
    params: ReverbParams,
    wet1: f32,
    wet2: f32,
    bandwidth: f32,
    decay: f32,

    predelay: DelayLine,
    input_ap: [Allpass; 4],
    tank_ap: [Allpass; 4],
    tank_delay: [DelayLine; 4],
    taps: [isize; 14],
}

impl Dattorro {
    /// Create a plate model tuned for `sample_rate`, with default
    /// parameters applied.
    pub fn new(sample_rate: f32) -> Self {
        let mut rev = Self {
            params: ReverbParams::default(),
            wet1: 0.0,
            wet2: 0.0,
            bandwidth: INITIAL_BANDWIDTH,
            decay: 0.5,
            predelay: DelayLine::new(seconds_to_samples(PREDELAY_S, sample_rate)),
            input_ap: core::array::from_fn(|i| input_diffuser(i, sample_rate)),
            tank_ap: core::array::from_fn(|i| tank_diffuser(i, sample_rate)),
            tank_delay: core::array::from_fn(|i| tank_line(i, sample_rate)),
            taps: core::array::from_fn(|i| seconds_to_samples(TAP_S[i], sample_rate) as isize),
        };

        rev.update();
        rev
    }

    /// Recompute the derived coefficients from the stored parameters.
    fn update(&mut self) {
        let wet = self.params.level / (1.0 + self.params.width * SCALE_WET_WIDTH);
        let (wet1, wet2) = stereo_wet(wet, self.params.width);
        self.wet1 = wet1;
        self.wet2 = wet2;

        self.decay = 0.2 + self.params.roomsize * 0.78;

        // damp = 0 leaves the tanks bright, damp = 1 fully absorbs; the
        // one-poles keep a1 = 1 - b0 for unity DC gain.
        self.predelay.damping_mut().set_coefficient(self.bandwidth);
        self.tank_delay[0]
            .damping_mut()
            .set_coefficient(1.0 - self.params.damp);
        self.tank_delay[2]
            .damping_mut()
            .set_coefficient(1.0 - self.params.damp);
    }

    /// One sample through predelay, diffusion, and both tanks.
    #[inline]
    fn tick(&mut self, in_sample: f32) -> (f32, f32) {
        let input = in_sample * TRIM;
        let pre = self.predelay.process(input);
        let bandlimited = self.predelay.damping_mut().process(pre);

        let mut split = bandlimited;
        for ap in &mut self.input_ap {
            split = ap.process(split);
        }

        // Left tank, fed the right tank's final delay from the previous
        // sample.
        let mut left = split + self.decay * self.tank_delay[3].last_output();
        left = self.tank_ap[0].process(left);
        left = self.tank_delay[0].process(left);
        let damp_left = self.tank_delay[0].damping_mut().process(left);
        left = self.tank_ap[1].process(self.decay * damp_left);
        left = self.tank_delay[1].process(left);

        // Right tank, fed the left tank's final delay.
        let mut right = split + self.decay * self.tank_delay[1].last_output();
        right = self.tank_ap[2].process(right);
        right = self.tank_delay[2].process(right);
        let damp_right = self.tank_delay[2].damping_mut().process(right);
        right = self.tank_ap[3].process(self.decay * damp_right);
        right = self.tank_delay[3].process(right);

        let t = &self.taps;
        let out_left = self.tank_delay[2].read_tap(t[0])
            + self.tank_delay[2].read_tap(t[1])
            - self.tank_ap[3].read_tap(t[2])
            + self.tank_delay[3].read_tap(t[3])
            - self.tank_delay[0].read_tap(t[4])
            - self.tank_ap[1].read_tap(t[5])
            - self.tank_delay[1].read_tap(t[6]);

        let out_right = self.tank_delay[0].read_tap(t[7])
            + self.tank_delay[0].read_tap(t[8])
            - self.tank_ap[1].read_tap(t[9])
            + self.tank_delay[1].read_tap(t[10])
            - self.tank_delay[2].read_tap(t[11])
            - self.tank_ap[3].read_tap(t[12])
            - self.tank_delay[3].read_tap(t[13]);

        (out_left, out_right)
    }

    fn run<const MIX: bool>(
        &mut self,
        input: &[f32; BUFSIZE],
        left_out: &mut [f32; BUFSIZE],
        right_out: &mut [f32; BUFSIZE],
    ) {
        for k in 0..BUFSIZE {
            let (out_left, out_right) = self.tick(input[k]);

            let mix_l = out_left * self.wet1 + out_right * self.wet2;
            let mix_r = out_right * self.wet1 + out_left * self.wet2;

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

impl ReverbModel for Dattorro {
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
        self.predelay.reset();
        for ap in self.input_ap.iter_mut().chain(self.tank_ap.iter_mut()) {
            ap.reset();
        }
        for dl in &mut self.tank_delay {
            dl.reset();
        }
    }

    fn set_params(&mut self, mask: u32, roomsize: f32, damping: f32, width: f32, level: f32) {
        self.params.apply_masked(mask, roomsize, damping, width, level);
        self.update();
    }

    /// Rebuild every buffer at the new rate and clear state. Any
    /// positive finite rate is accepted.
    fn samplerate_change(&mut self, sample_rate: f32) -> Result<(), RateChangeError> {
        if !(sample_rate > 0.0) || !sample_rate.is_finite() {
            return Err(RateChangeError::InvalidRate);
        }

        self.predelay = DelayLine::new(seconds_to_samples(PREDELAY_S, sample_rate));
        self.input_ap = core::array::from_fn(|i| input_diffuser(i, sample_rate));
        self.tank_ap = core::array::from_fn(|i| tank_diffuser(i, sample_rate));
        self.tank_delay = core::array::from_fn(|i| tank_line(i, sample_rate));
        self.taps = core::array::from_fn(|i| seconds_to_samples(TAP_S[i], sample_rate) as isize);

        self.update();
        Ok(())
    }
}
