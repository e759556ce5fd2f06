//! End-to-end scenarios driving the models through the public contract.

use resona_reverb::{new_revmodel, ReverbModel, ReverbType, BUFSIZE, SET_ALL};

/// Feed `input` through the model block by block with `process_replace`
/// and collect the full stereo output.
fn render(
    model: &mut (dyn ReverbModel + Send),
    input: &[f32],
) -> (Vec<f32>, Vec<f32>) {
    assert_eq!(input.len() % BUFSIZE, 0, "input must be whole blocks");

    let mut left_all = Vec::with_capacity(input.len());
    let mut right_all = Vec::with_capacity(input.len());
    let mut left = [0.0f32; BUFSIZE];
    let mut right = [0.0f32; BUFSIZE];

    for block in input.chunks_exact(BUFSIZE) {
        let mut in_block = [0.0f32; BUFSIZE];
        in_block.copy_from_slice(block);
        model.process_replace(&in_block, &mut left, &mut right);
        left_all.extend_from_slice(&left);
        right_all.extend_from_slice(&right);
    }

    (left_all, right_all)
}

fn impulse(len: usize) -> Vec<f32> {
    let mut signal = vec![0.0f32; len];
    signal[0] = 1.0;
    signal
}

#[test]
fn freeverb_silence_stays_below_epsilon() {
    let mut model = new_revmodel(44100.0, 44100.0, ReverbType::Freeverb).unwrap();
    model.set_params(SET_ALL, 0.5, 0.5, 1.0, 1.0);

    // Warm up past the DC-offset turn-on transient, then measure.
    let zeros = vec![0.0f32; BUFSIZE * 32];
    render(&mut *model, &zeros);

    let (left, right) = render(&mut *model, &vec![0.0f32; BUFSIZE * 4]);
    for (l, r) in left.iter().zip(&right) {
        assert!(l.abs() < 1e-5, "left output {l} above silence bound");
        assert!(r.abs() < 1e-5, "right output {r} above silence bound");
    }
}

#[test]
fn lexverb_impulse_energy_without_runaway() {
    let mut model = new_revmodel(48000.0, 48000.0, ReverbType::Lexverb).unwrap();

    let (left, right) = render(&mut *model, &impulse(4096));

    let energy: f32 = left
        .iter()
        .zip(&right)
        .map(|(l, r)| l * l + r * r)
        .sum();
    assert!(energy > 0.001, "reverb tail missing, energy {energy}");

    for (l, r) in left.iter().zip(&right) {
        assert!(l.abs() < 10.0, "left runaway: {l}");
        assert!(r.abs() < 10.0, "right runaway: {r}");
    }
}

#[test]
fn identical_runs_are_bit_identical() {
    for ty in [ReverbType::Freeverb, ReverbType::Lexverb, ReverbType::Fdn] {
        let mut model = new_revmodel(48000.0, 48000.0, ty).unwrap();
        model.set_params(SET_ALL, 0.6, 0.4, 2.0, 0.9);

        let input: Vec<f32> = (0..1024)
            .map(|i| (i as f32 * 0.05).sin() * 0.3)
            .collect();

        model.reset();
        let (left_a, right_a) = render(&mut *model, &input);
        model.reset();
        let (left_b, right_b) = render(&mut *model, &input);

        assert_eq!(left_a, left_b, "{ty:?} left output not deterministic");
        assert_eq!(right_a, right_b, "{ty:?} right output not deterministic");
    }
}

#[test]
fn dattorro_zero_width_is_mono() {
    let mut model = new_revmodel(48000.0, 48000.0, ReverbType::Fdn).unwrap();
    model.set_params(SET_ALL, 0.7, 0.1, 0.0, 1.0);

    let input: Vec<f32> = (0..2048)
        .map(|i| if i % 311 == 0 { 0.8 } else { 0.0 })
        .collect();
    let (left, right) = render(&mut *model, &input);

    for (k, (l, r)) in left.iter().zip(&right).enumerate() {
        assert_eq!(l, r, "channels diverge at sample {k}");
    }
}

#[test]
fn mix_equals_replace_plus_preset() {
    for ty in [ReverbType::Freeverb, ReverbType::Lexverb, ReverbType::Fdn] {
        let mut replace_model = new_revmodel(48000.0, 48000.0, ty).unwrap();
        let mut mix_model = new_revmodel(48000.0, 48000.0, ty).unwrap();
        replace_model.set_params(SET_ALL, 0.5, 0.2, 1.0, 1.0);
        mix_model.set_params(SET_ALL, 0.5, 0.2, 1.0, 1.0);

        let mut input = [0.0f32; BUFSIZE];
        input[0] = 1.0;
        input[37] = -0.25;

        for round in 0..16 {
            let mut left_replace = [0.0f32; BUFSIZE];
            let mut right_replace = [0.0f32; BUFSIZE];
            replace_model.process_replace(&input, &mut left_replace, &mut right_replace);

            let preset_l: [f32; BUFSIZE] = core::array::from_fn(|k| (k + round) as f32 * 0.01);
            let preset_r: [f32; BUFSIZE] = core::array::from_fn(|k| 0.5 - k as f32 * 0.002);
            let mut left_mix = preset_l;
            let mut right_mix = preset_r;
            mix_model.process_mix(&input, &mut left_mix, &mut right_mix);

            for k in 0..BUFSIZE {
                assert!(
                    (left_mix[k] - preset_l[k] - left_replace[k]).abs() < 1e-6,
                    "{ty:?} left mismatch at round {round}, sample {k}"
                );
                assert!(
                    (right_mix[k] - preset_r[k] - right_replace[k]).abs() < 1e-6,
                    "{ty:?} right mismatch at round {round}, sample {k}"
                );
            }
        }
    }
}

#[test]
fn delay_line_round_trip() {
    use resona_core::DelayLine;

    let n = 100;
    let mut delay = DelayLine::new(n);
    let samples: Vec<f32> = (0..2 * n).map(|i| (i as f32 * 0.13).cos()).collect();

    for (i, &s) in samples.iter().enumerate() {
        let out = delay.process(s);
        if i < n {
            assert_eq!(out, 0.0, "output {i} should be the zero fill");
        } else {
            assert_eq!(out, samples[i - n], "output {i} should echo input {}", i - n);
        }
    }
}

#[test]
fn reset_restores_initial_output() {
    for ty in [ReverbType::Freeverb, ReverbType::Lexverb, ReverbType::Fdn] {
        let mut model = new_revmodel(48000.0, 48000.0, ty).unwrap();
        model.set_params(SET_ALL, 0.8, 0.3, 1.5, 1.0);

        let noise: Vec<f32> = (0..BUFSIZE * 8)
            .map(|i| ((i * 7919 % 104729) as f32 / 104729.0) - 0.5)
            .collect();

        let (first_l, first_r) = render(&mut *model, &noise);
        model.reset();
        let (second_l, second_r) = render(&mut *model, &noise);

        assert_eq!(first_l, second_l, "{ty:?} reset left state leak");
        assert_eq!(first_r, second_r, "{ty:?} reset right state leak");
    }
}
