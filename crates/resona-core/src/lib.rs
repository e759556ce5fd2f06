//! Resona Core - primitives and contract for algorithmic reverberation
//!
//! This crate provides the shared substrate the reverb models in
//! `resona-reverb` are built from:
//!
//! - [`DelayLine`] - ring buffer with single-tap processing and
//!   cursor-free tap reads
//! - [`Allpass`] - Schroeder or Freeverb-variant allpass diffuser
//! - [`Comb`] - feedback comb with a damped feedback path
//! - [`Damping`] - one-pole lowpass state with unity DC gain
//! - [`ReverbModel`] - the block-processing contract models implement
//!
//! All three filter kinds are built on the one [`DelayLine`] primitive,
//! so index arithmetic, wrap-around, and tap semantics are identical
//! wherever a buffer is read. That is what lets the plate model tap
//! into delay and allpass buffers alike when assembling its output.
//!
//! ## no_std Support
//!
//! This crate is `no_std` compatible (an allocator is still required).
//! Use `default-features = false` in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! resona-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod allpass;
pub mod comb;
pub mod delay;
pub mod math;
pub mod model;
pub mod one_pole;

// Re-export main types at crate root
pub use allpass::{Allpass, AllpassMode};
pub use comb::Comb;
pub use delay::DelayLine;
pub use math::{flush_denormal, ms_to_samples, seconds_to_samples};
pub use model::{
    stereo_wet, RateChangeError, ReverbModel, ReverbParams, BUFSIZE, SET_ALL, SET_DAMPING,
    SET_LEVEL, SET_ROOMSIZE, SET_WIDTH,
};
pub use one_pole::Damping;
