//! The ring-buffer delay line every reverb filter is built on.
//!
//! All three filter kinds in this crate (plain delay, allpass, comb)
//! share this one primitive so that cursor arithmetic, wrap-around, and
//! tap semantics stay identical across algorithms. The plate reverb's
//! output taps in particular read straight out of delay and allpass
//! buffers through [`DelayLine::read_tap`], which only works because
//! every filter stores its history in the same layout.
//!
//! # Cursors
//!
//! A line carries two cursors, `line_in` and `line_out`. The single-tap
//! hot path ([`process`](DelayLine::process)) reads and writes at
//! `line_out` and keeps `line_in` mirrored onto it; multi-tap users
//! position them independently through
//! [`set_positions`](DelayLine::set_positions).

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use crate::Damping;

/// Fixed-capacity ring buffer of samples with single-tap and tap-read
/// access.
///
/// The buffer is heap-allocated during construction but never
/// reallocates; no allocations occur during audio processing.
///
/// Two pieces of per-line state ride along for the algorithms that need
/// them: an embedded one-pole [`Damping`] filter (the plate reverb's
/// bandwidth and tank absorption filters) and a cross-feed
/// `coefficient` (the Lexicon-style model's cross-coupled delays). Both
/// are inert unless the owning filter uses them.
///
/// # Example
///
/// ```rust
/// use resona_core::DelayLine;
///
/// let mut delay = DelayLine::new(4);
/// assert_eq!(delay.process(1.0), 0.0); // buffer starts zeroed
/// assert_eq!(delay.process(2.0), 0.0);
/// assert_eq!(delay.process(3.0), 0.0);
/// assert_eq!(delay.process(4.0), 0.0);
/// assert_eq!(delay.process(5.0), 1.0); // four samples later
/// ```
#[derive(Debug, Clone)]
pub struct DelayLine {
    line: Vec<f32>,
    line_in: usize,
    line_out: usize,
    damping: Damping,
    coefficient: f32,
    last_output: f32,
}

impl DelayLine {
    /// Create a delay line of `length` samples, zero-initialized.
    ///
    /// # Panics
    ///
    /// Panics if `length` is 0. Callers derive lengths through
    /// [`ms_to_samples`](crate::ms_to_samples) or
    /// [`seconds_to_samples`](crate::seconds_to_samples), which clamp to
    /// a minimum of one sample.
    pub fn new(length: usize) -> Self {
        assert!(length > 0, "delay length must be > 0");

        Self {
            line: vec![0.0; length],
            line_in: 0,
            line_out: 0,
            damping: Damping::new(),
            coefficient: 0.0,
            last_output: 0.0,
        }
    }

    /// Buffer length in samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.line.len()
    }

    /// Always false; a delay line has at least one sample of storage.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Write `value` into every cell without moving the cursors.
    pub fn fill(&mut self, value: f32) {
        self.line.fill(value);
    }

    /// Set both cursors independently.
    ///
    /// Callers must keep both positions inside `[0, len)`.
    #[inline]
    pub fn set_positions(&mut self, in_pos: usize, out_pos: usize) {
        self.line_in = in_pos;
        self.line_out = out_pos;
    }

    /// Set both cursors to the same position (single-tap usage).
    #[inline]
    pub fn set_single_tap_position(&mut self, position: usize) {
        self.set_positions(position, position);
    }

    /// Current read cursor.
    #[inline]
    pub fn line_out(&self) -> usize {
        self.line_out
    }

    /// Current write cursor.
    #[inline]
    pub fn line_in(&self) -> usize {
        self.line_in
    }

    /// Read the sample `offset` positions ahead of the read cursor
    /// without advancing anything.
    ///
    /// The index is reduced with Euclidean modulo, so negative offsets
    /// wrap backwards through the buffer.
    #[inline]
    pub fn read_tap(&self, offset: isize) -> f32 {
        let len = self.line.len() as isize;
        let index = (self.line_out as isize + offset).rem_euclid(len);
        self.line[index as usize]
    }

    /// Process one sample through the delay (read and write at the same
    /// position, then advance).
    ///
    /// Returns the sample that went in `len()` calls ago.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.line[self.line_out];
        self.line[self.line_out] = input;

        self.line_out += 1;
        if self.line_out >= self.line.len() {
            self.line_out = 0;
        }

        self.line_in = self.line_out;
        self.last_output = output;
        output
    }

    /// The most recent sample returned by [`process`](Self::process).
    ///
    /// Cross-coupled reverb topologies read this instead of re-tapping
    /// the buffer: it is by definition the *previous* sample's output,
    /// which is how cyclic signal graphs are broken without structural
    /// cycles.
    #[inline]
    pub fn last_output(&self) -> f32 {
        self.last_output
    }

    /// Embedded one-pole damping state.
    #[inline]
    pub fn damping(&self) -> &Damping {
        &self.damping
    }

    /// Mutable access to the embedded one-pole damping state.
    #[inline]
    pub fn damping_mut(&mut self) -> &mut Damping {
        &mut self.damping
    }

    /// Cross-feed gain applied by the owning algorithm to this line's
    /// output.
    #[inline]
    pub fn coefficient(&self) -> f32 {
        self.coefficient
    }

    /// Set the cross-feed gain.
    #[inline]
    pub fn set_coefficient(&mut self, value: f32) {
        self.coefficient = value;
    }

    /// Zero the buffer, both cursors, the cached output, and the
    /// embedded damping history. The damping coefficients and the
    /// cross-feed gain are left alone.
    pub fn reset(&mut self) {
        self.line.fill(0.0);
        self.line_in = 0;
        self.line_out = 0;
        self.last_output = 0.0;
        self.damping.reset();
    }
}
