//! The common contract every reverb model implements.
//!
//! A model is mono-in, stereo-out, and processes fixed-size blocks of
//! [`BUFSIZE`] samples. The host serializes all calls on one instance;
//! nothing here locks, allocates, or blocks during processing (the one
//! exception is [`ReverbModel::samplerate_change`], which may
//! reallocate and must only be called while processing is stopped).
//!
//! # Parameter model
//!
//! Four user controls are shared by all algorithms: `roomsize`, `damp`,
//! `level` in `[0, 1]` and `width` in `[0, 100]`. Updates go through
//! [`ReverbModel::set_params`] with a bitmask selecting which values to
//! apply; unmasked arguments are ignored. Each model recomputes its
//! derived coefficients at the end of the call, so a `mask` of 0 leaves
//! the stored parameters untouched but still refreshes the derived
//! state deterministically.

use thiserror::Error;

/// Number of samples per processing block.
pub const BUFSIZE: usize = 64;

/// `set_params` mask bit: apply the `roomsize` argument.
pub const SET_ROOMSIZE: u32 = 1 << 0;
/// `set_params` mask bit: apply the `damping` argument.
pub const SET_DAMPING: u32 = 1 << 1;
/// `set_params` mask bit: apply the `width` argument.
pub const SET_WIDTH: u32 = 1 << 2;
/// `set_params` mask bit: apply the `level` argument.
pub const SET_LEVEL: u32 = 1 << 3;
/// `set_params` mask: apply all four arguments.
pub const SET_ALL: u32 = SET_ROOMSIZE | SET_DAMPING | SET_WIDTH | SET_LEVEL;

/// Why a sample-rate change was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RateChangeError {
    /// The requested rate is not a positive finite number.
    #[error("sample rate must be positive and finite")]
    InvalidRate,
    /// The model's delay network is tuned for a fixed rate.
    #[error("this reverb model does not support sample rate changes")]
    Unsupported,
}

/// The four user-facing reverb controls, stored clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParams {
    /// Room size in `[0, 1]`; drives decay time.
    pub roomsize: f32,
    /// High-frequency damping in `[0, 1]`; 0 is bright.
    pub damp: f32,
    /// Stereo width in `[0, 100]`.
    pub width: f32,
    /// Wet output level in `[0, 1]`.
    pub level: f32,
}

impl Default for ReverbParams {
    /// The synth-facing defaults: a smallish bright room at moderate
    /// width and near-full level.
    fn default() -> Self {
        Self {
            roomsize: 0.2,
            damp: 0.0,
            width: 0.5,
            level: 0.9,
        }
    }
}

impl ReverbParams {
    /// Apply the masked subset of the arguments, clamping each to its
    /// valid range before storing.
    pub fn apply_masked(&mut self, mask: u32, roomsize: f32, damping: f32, width: f32, level: f32) {
        if mask & SET_ROOMSIZE != 0 {
            self.roomsize = roomsize.clamp(0.0, 1.0);
        }
        if mask & SET_DAMPING != 0 {
            self.damp = damping.clamp(0.0, 1.0);
        }
        if mask & SET_WIDTH != 0 {
            self.width = width.clamp(0.0, 100.0);
        }
        if mask & SET_LEVEL != 0 {
            self.level = level.clamp(0.0, 1.0);
        }
    }
}

/// Split a wet gain into the `(wet1, wet2)` stereo-spread pair.
///
/// `wet1` scales each channel's own tap sum, `wet2` the opposite
/// channel's. At `width = 0` both halves are equal and the output
/// collapses to mono; at `width = 1` the channels are fully separate.
/// Models divide `wet` by `1 + width * scale` before calling this so
/// the output amplitude stays roughly independent of the width setting.
#[inline]
pub fn stereo_wet(wet: f32, width: f32) -> (f32, f32) {
    let wet1 = wet * (width / 2.0 + 0.5);
    let wet2 = wet * ((1.0 - width) / 2.0);
    (wet1, wet2)
}

/// Contract shared by all reverb algorithms.
///
/// All methods on one instance must be serialized by the caller;
/// distinct instances are fully independent.
pub trait ReverbModel {
    /// Process one block, *adding* the wet signal into the output
    /// buffers.
    fn process_mix(
        &mut self,
        input: &[f32; BUFSIZE],
        left_out: &mut [f32; BUFSIZE],
        right_out: &mut [f32; BUFSIZE],
    );

    /// Process one block, *overwriting* the output buffers with the wet
    /// signal.
    fn process_replace(
        &mut self,
        input: &[f32; BUFSIZE],
        left_out: &mut [f32; BUFSIZE],
        right_out: &mut [f32; BUFSIZE],
    );

    /// Clear all internal signal state without changing parameters.
    fn reset(&mut self);

    /// Update the masked subset of the four user parameters (each
    /// clamped to its range) and recompute derived coefficients.
    fn set_params(&mut self, mask: u32, roomsize: f32, damping: f32, width: f32, level: f32);

    /// Retune the delay network for a new sample rate, clearing state.
    ///
    /// May reallocate; callers must stop processing first. Models whose
    /// tuning is fixed return [`RateChangeError::Unsupported`].
    fn samplerate_change(&mut self, sample_rate: f32) -> Result<(), RateChangeError>;
}
