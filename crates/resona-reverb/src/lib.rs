//! Resona Reverb - algorithmic reverb models for a software synthesizer
//!
//! Three mono-in/stereo-out reverb algorithms share the
//! [`ReverbModel`] contract and the DSP primitives from `resona-core`:
//!
//! - [`Freeverb`] - 8 parallel combs + 4 series allpasses per channel
//! - [`Lexverb`] - two cross-coupled 5-stage allpass cascades
//! - [`Dattorro`] - plate reverb with predelay, input diffusion, and
//!   two recirculating tanks
//!
//! Models are built through [`new_revmodel`] and driven in fixed blocks
//! of [`BUFSIZE`] samples. Hosts that call into the engine from a
//! realtime thread should go through the [`Reverb`] handle, which keeps
//! panics from unwinding across the audio boundary.
//!
//! # Example
//!
//! ```rust
//! use resona_reverb::{new_revmodel, ReverbModel, ReverbType, BUFSIZE, SET_ALL};
//!
//! let mut model = new_revmodel(96000.0, 48000.0, ReverbType::Freeverb).unwrap();
//! model.set_params(SET_ALL, 0.5, 0.3, 0.8, 0.9);
//!
//! let input = [0.0f32; BUFSIZE];
//! let mut left = [0.0f32; BUFSIZE];
//! let mut right = [0.0f32; BUFSIZE];
//! model.process_replace(&input, &mut left, &mut right);
//! ```
//!
//! ## no_std Support
//!
//! The models and factory are `no_std` compatible (an allocator is
//! required); the [`Reverb`] handle needs `std` for its unwind guard.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::boxed::Box;

use thiserror::Error;

pub mod dattorro;
pub mod freeverb;
pub mod lexverb;

#[cfg(feature = "std")]
mod shim;

pub use dattorro::Dattorro;
pub use freeverb::Freeverb;
pub use lexverb::Lexverb;

#[cfg(feature = "std")]
pub use shim::Reverb;

// Re-export the contract so hosts depend on one crate.
pub use resona_core::{
    RateChangeError, ReverbModel, BUFSIZE, SET_ALL, SET_DAMPING, SET_LEVEL, SET_ROOMSIZE,
    SET_WIDTH,
};

/// Which reverb algorithm to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReverbType {
    /// The Freeverb comb/allpass network.
    Freeverb,
    /// The Lexicon-style allpass cascade network.
    Lexverb,
    /// The feedback-network plate reverb (Dattorro).
    #[default]
    Fdn,
}

/// Errors surfaced by the factory and the host-facing handle.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum RevError {
    /// The requested rates cannot configure a model.
    #[error("invalid sample rate {rate} (must be positive, finite, and at most {max})")]
    InvalidSampleRate {
        /// The rejected processing rate.
        rate: f32,
        /// The maximum rate the host declared.
        max: f32,
    },

    /// A sample-rate change was rejected by the model.
    #[error("sample rate change rejected: {0}")]
    RateChange(#[from] RateChangeError),

    /// A model panicked inside a processing call; the call was dropped.
    #[error("reverb operation '{op}' panicked and was ignored")]
    Panicked {
        /// Name of the operation that panicked.
        op: &'static str,
    },
}

/// Build the selected reverb model.
///
/// `sample_rate` is the current processing rate and `sample_rate_max`
/// the highest rate the host will ever request; both must be positive
/// and finite with `sample_rate <= sample_rate_max`. On failure the
/// error is logged and returned; no partially-initialized model is ever
/// observable.
pub fn new_revmodel(
    sample_rate_max: f32,
    sample_rate: f32,
    reverb_type: ReverbType,
) -> Result<Box<dyn ReverbModel + Send>, RevError> {
    if !(sample_rate > 0.0)
        || !sample_rate.is_finite()
        || !sample_rate_max.is_finite()
        || sample_rate > sample_rate_max
    {
        let err = RevError::InvalidSampleRate {
            rate: sample_rate,
            max: sample_rate_max,
        };
        log::error!("reverb initialization failed: {err}");
        return Err(err);
    }

    Ok(match reverb_type {
        ReverbType::Freeverb => Box::new(Freeverb::new(sample_rate)),
        ReverbType::Lexverb => Box::new(Lexverb::new(sample_rate)),
        ReverbType::Fdn => Box::new(Dattorro::new(sample_rate)),
    })
}
