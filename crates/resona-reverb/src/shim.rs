//! Host-facing handle that keeps panics off the audio thread.
//!
//! The audio callback cannot unwind: a panic escaping into a realtime
//! host is undefined at best and a crash at worst. [`Reverb`] wraps a
//! boxed model and converts any panic inside a call into a logged
//! failure and a no-op, so the host sees sentinel returns instead of
//! unwinding.
//!
//! The handle does not add locking. Like the models themselves, one
//! instance must be driven from one thread at a time, and
//! [`Reverb::samplerate_change`] may reallocate, so it must only be
//! called while processing is stopped.

use std::panic::{catch_unwind, AssertUnwindSafe};

use resona_core::{ReverbModel, BUFSIZE};

use crate::{new_revmodel, RevError, ReverbType};

/// Panic-isolating wrapper around a reverb model.
pub struct Reverb {
    model: Box<dyn ReverbModel + Send>,
}

impl Reverb {
    /// Build the selected model; see [`new_revmodel`].
    pub fn new(
        sample_rate_max: f32,
        sample_rate: f32,
        reverb_type: ReverbType,
    ) -> Result<Self, RevError> {
        Ok(Self {
            model: new_revmodel(sample_rate_max, sample_rate, reverb_type)?,
        })
    }

    /// Process one block, adding the wet signal into the outputs.
    /// A panic inside the model is logged and the call dropped.
    pub fn process_mix(
        &mut self,
        input: &[f32; BUFSIZE],
        left_out: &mut [f32; BUFSIZE],
        right_out: &mut [f32; BUFSIZE],
    ) {
        let model = &mut self.model;
        guard("process_mix", || {
            model.process_mix(input, left_out, right_out)
        });
    }

    /// Process one block, overwriting the outputs with the wet signal.
    /// A panic inside the model is logged and the call dropped.
    pub fn process_replace(
        &mut self,
        input: &[f32; BUFSIZE],
        left_out: &mut [f32; BUFSIZE],
        right_out: &mut [f32; BUFSIZE],
    ) {
        let model = &mut self.model;
        guard("process_replace", || {
            model.process_replace(input, left_out, right_out)
        });
    }

    /// Clear all internal signal state.
    pub fn reset(&mut self) {
        let model = &mut self.model;
        guard("reset", || model.reset());
    }

    /// Update the masked subset of the four user parameters.
    pub fn set_params(&mut self, mask: u32, roomsize: f32, damping: f32, width: f32, level: f32) {
        let model = &mut self.model;
        guard("set_params", || {
            model.set_params(mask, roomsize, damping, width, level)
        });
    }

    /// Retune the model for a new sample rate.
    ///
    /// Must not be called while audio is being processed: the model may
    /// reallocate its delay buffers.
    pub fn samplerate_change(&mut self, sample_rate: f32) -> Result<(), RevError> {
        let model = &mut self.model;
        match catch_unwind(AssertUnwindSafe(|| model.samplerate_change(sample_rate))) {
            Ok(result) => result.map_err(RevError::from),
            Err(_) => {
                let err = RevError::Panicked {
                    op: "samplerate_change",
                };
                log::error!("{err}");
                Err(err)
            }
        }
    }
}

/// Run `f`, swallowing and logging any panic.
fn guard(op: &'static str, f: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        log::error!("reverb operation '{op}' panicked and was ignored");
    }
}
