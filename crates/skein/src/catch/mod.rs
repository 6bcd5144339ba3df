//! Scoped guard that filters faults escaping a region.
//!
//! [`with_handler`] builds a [`Catch`] guard around a fallible region. A
//! fault escaping the region is run through the filter engine and the guard
//! acts on what survives; [`Catch::run`] spells out the possible outcomes.
//! A guard whose handler changes nothing is fully transparent: the caller
//! receives the very same fault it would have seen without the guard.

use std::sync::Arc;

use skein_trace::Frame;

use crate::fault::FaultRef;
use crate::filter::filter;

/// Scoped fault guard. Built by [`with_handler`].
pub struct Catch<H> {
    handler: H,
}

/// Build a guard that applies `handler` to each leaf of any fault escaping
/// the region passed to [`Catch::run`].
pub fn with_handler<H>(handler: H) -> Catch<H>
where
    H: FnMut(&FaultRef) -> Option<FaultRef>,
{
    Catch { handler }
}

impl<H> Catch<H>
where
    H: FnMut(&FaultRef) -> Option<FaultRef>,
{
    /// Run `body` under the guard.
    ///
    /// - `body` succeeds: `Ok(Some(value))`, the guard has no effect.
    /// - the escaping fault comes back from the filter unchanged (same
    ///   node): it keeps propagating as `Err`, untouched.
    /// - every leaf was consumed by the handler: `Ok(None)`, the fault is
    ///   swallowed and the scope exits normally.
    /// - otherwise the simplified fault propagates as `Err`. If it carries
    ///   neither a cause nor a context, its context suppression flag is set:
    ///   any implicit link at this point is an artifact of the guard itself,
    ///   not a causal relationship worth reporting. The guard's own exit
    ///   frame is appended to its trace, in this branch only, marking where
    ///   the simplification happened.
    #[track_caller]
    pub fn run<T, F>(mut self, body: F) -> Result<Option<T>, FaultRef>
    where
        F: FnOnce() -> Result<T, FaultRef>,
    {
        let exit = std::panic::Location::caller();
        match body() {
            Ok(value) => Ok(Some(value)),
            Err(raised) => match filter(&mut self.handler, &raised) {
                Some(filtered) if Arc::ptr_eq(&filtered, &raised) => Err(raised),
                None => Ok(None),
                Some(filtered) => {
                    if filtered.cause().is_none() && filtered.context().is_none() {
                        filtered.suppress_context();
                    }
                    filtered.push_frame(Frame::at("catch", exit.file(), exit.line()));
                    Err(filtered)
                }
            },
        }
    }
}
