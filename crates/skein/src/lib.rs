//! Composite faults for concurrent failures.
//!
//! When several concurrently running operations fail at once, a scheduler
//! joins their errors into a single fault tree ([`Fault::group`]). This
//! crate owns everything that happens to that tree afterwards:
//!
//! - **Fault trees** ([`Fault`], [`FaultRef`]) — leaves wrap ordinary error
//!   payloads; groups own two or more children in join order, never
//!   reordered or deduplicated. Cause and context links are shared by
//!   identity and may alias nodes anywhere in a tree.
//! - **Filtering** ([`filter`]) — apply a handler that keeps, replaces, or
//!   drops each leaf, then simplify the tree and repair every node's
//!   propagation trace so each fault reads as if it had propagated alone.
//! - **Scoped catching** ([`with_handler`]) — a guard that ties filtering
//!   into normal control flow; an escaping fault is re-raised untouched,
//!   swallowed, or replaced by its simplified remainder.
//! - **Reporting** ([`render`], [`hook`]) — cycle-safe multi-fault reports,
//!   and an explicitly claimed process-wide reporter for uncaught faults.
//!
//! Everything here is synchronous tree surgery; nothing suspends or blocks.
//! A tree handed to [`filter`] must not be mutated concurrently for the
//! duration of the call.

mod catch;
mod fault;
mod filter;
pub mod hook;
mod render;
mod stack;

#[cfg(test)]
mod test_support;

pub use catch::{with_handler, Catch};
pub use fault::{Fault, FaultId, FaultRef};
pub use filter::filter;
pub use render::{render, render_with, write_report, RenderOptions};

// Re-export the trace building blocks so callers need only one crate.
pub use skein_trace::{Frame, Location, TraceSegment};
