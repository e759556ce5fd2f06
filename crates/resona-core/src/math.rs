//! Small numeric helpers shared by the reverb primitives.
//!
//! Everything here is allocation-free and `no_std`-safe. Delay lengths are
//! derived from millisecond or second figures with [`ms_to_samples`] and
//! [`seconds_to_samples`]; both round to the nearest sample and never
//! return a zero-length buffer.

use libm::roundf;

/// Flush values in the IEEE 754 subnormal range to exact zero.
///
/// Recursive filters decay exponentially when their input stops. Left
/// alone, the state eventually enters the subnormal range (below
/// ~1.2e-38 for `f32`), where many CPUs fall off their fast path. The
/// 1e-20 threshold is far below anything audible but comfortably above
/// the subnormal boundary.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Convert a delay length in milliseconds to a buffer length in samples.
///
/// Rounds to the nearest sample and clamps to a minimum of 1 so that a
/// very short delay at a low sample rate still yields a usable buffer.
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> usize {
    (roundf(ms * sample_rate / 1000.0) as usize).max(1)
}

/// Convert a delay length in seconds to a buffer length in samples.
///
/// Same rounding and minimum-length policy as [`ms_to_samples`].
#[inline]
pub fn seconds_to_samples(seconds: f32, sample_rate: f32) -> usize {
    (roundf(seconds * sample_rate) as usize).max(1)
}
