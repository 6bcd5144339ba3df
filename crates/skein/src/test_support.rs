//! Shared builders for unit tests.

use thiserror::Error;

use crate::fault::{Fault, FaultRef};
use skein_trace::{Frame, TraceSegment};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("probe `{0}` failed")]
pub(crate) struct Probe(pub(crate) &'static str);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("timed out after {0}ms")]
pub(crate) struct Timeout(pub(crate) u64);

pub(crate) fn leaf(name: &'static str) -> FaultRef {
    Fault::new(Probe(name)).shared()
}

pub(crate) fn leaf_with_frames(name: &'static str, frames: &[&str]) -> FaultRef {
    let mut fault = Fault::new(Probe(name));
    for frame in frames {
        fault = fault.with_frame(Frame::new(*frame));
    }
    fault.shared()
}

pub(crate) fn push_frames(fault: &FaultRef, frames: &[&str]) {
    for frame in frames {
        fault.push_frame(Frame::new(*frame));
    }
}

pub(crate) fn frame_names(segment: &TraceSegment) -> Vec<String> {
    segment.frames().iter().map(|f| f.name.clone()).collect()
}

/// Handler that keeps every leaf as-is.
pub(crate) fn keep(leaf: &FaultRef) -> Option<FaultRef> {
    Some(std::sync::Arc::clone(leaf))
}

/// Handler that drops every leaf.
pub(crate) fn drop_all(_leaf: &FaultRef) -> Option<FaultRef> {
    None
}
