//! Human-readable reports for fault trees.
//!
//! [`render`] walks a fault and produces an ordered sequence of text chunks:
//! cause/context chains first (oldest fault at the top, the way a reader
//! wants to follow them), then the fault's own backtrace block and one-line
//! summary, then every embedded child fault under a numbered heading,
//! indented one level. A `seen` identity set keeps shared references from
//! rendering twice and guarantees termination whatever the link structure.

use std::io;

use rustc_hash::FxHashSet;

use crate::fault::{FaultId, FaultRef};
use crate::stack::ensure_sufficient_stack;

const CAUSE_BANNER: &str = "\nthe above fault was the direct cause of the following fault:\n\n";
const CONTEXT_BANNER: &str = "\nwhile handling the above fault, another fault occurred:\n\n";

/// Rendering controls for [`render_with`].
#[derive(Clone, Copy, Debug)]
pub struct RenderOptions {
    /// Maximum frames shown per trace segment. `None` shows everything.
    ///
    /// The cap applies to each segment separately, not to a leaf's
    /// concatenated logical trace.
    pub limit: Option<usize>,
    /// Follow cause/context links. On by default.
    pub chain: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            limit: None,
            chain: true,
        }
    }
}

/// Render a full report for `fault` with default options.
pub fn render(fault: &FaultRef) -> Vec<String> {
    render_with(fault, &RenderOptions::default())
}

/// Render a full report for `fault`.
pub fn render_with(fault: &FaultRef, options: &RenderOptions) -> Vec<String> {
    let mut seen = FxHashSet::default();
    let mut chunks = Vec::new();
    render_tree(&mut seen, fault, options, &mut chunks);
    chunks
}

/// Write a rendered report into `out`.
pub fn write_report<W: io::Write>(fault: &FaultRef, out: &mut W) -> io::Result<()> {
    for chunk in render(fault) {
        out.write_all(chunk.as_bytes())?;
    }
    Ok(())
}

fn render_tree(
    seen: &mut FxHashSet<FaultId>,
    fault: &FaultRef,
    options: &RenderOptions,
    chunks: &mut Vec<String>,
) {
    ensure_sufficient_stack(|| {
        if seen.contains(&fault.id()) {
            chunks.push(format!("<previously reported fault: {fault}>\n"));
            return;
        }
        seen.insert(fault.id());

        if options.chain {
            if let Some(cause) = fault.cause() {
                render_tree(seen, cause, options, chunks);
                chunks.push(CAUSE_BANNER.to_string());
            } else if let Some(context) = fault.context() {
                if !fault.context_suppressed() {
                    render_tree(seen, context, options, chunks);
                    chunks.push(CONTEXT_BANNER.to_string());
                }
            }
        }

        chunks.push(render_single(fault, options.limit));

        for (index, child) in fault.children().iter().enumerate() {
            chunks.push(format!("\ndetails of embedded fault {}:\n\n", index + 1));
            let mut sub_chunks = Vec::new();
            render_tree(seen, child, options, &mut sub_chunks);
            for chunk in sub_chunks {
                chunks.push(indent(&chunk));
            }
        }
    });
}

/// One fault's own block: its backtrace (capped per segment) and summary.
fn render_single(fault: &FaultRef, limit: Option<usize>) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    let segment = fault.segment();
    let frames = segment.frames();
    let shown = limit.map_or(frames.len(), |cap| cap.min(frames.len()));
    if shown > 0 {
        out.push_str("stack backtrace:\n");
        for (i, frame) in frames[..shown].iter().enumerate() {
            let _ = writeln!(out, "  {i}: {frame}");
        }
    }
    let _ = writeln!(out, "{fault}");
    out
}

/// Prefix every non-blank line of `chunk` with two spaces.
fn indent(chunk: &str) -> String {
    let mut out = String::with_capacity(chunk.len());
    for line in chunk.split_inclusive('\n') {
        if line != "\n" {
            out.push_str("  ");
        }
        out.push_str(line);
    }
    out
}
