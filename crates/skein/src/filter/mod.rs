//! Two-pass fault-tree filtering.
//!
//! [`filter`] applies a handler to every leaf of a fault tree and simplifies
//! the result: dropped leaves disappear, and a group that loses children
//! collapses to its sole survivor or vanishes entirely. The handler never
//! sees a group, only leaves.
//!
//! The work is split into two passes over the tree:
//!
//! 1. **Structural pass** — rebuild the tree bottom-up from the handler's
//!    answers. A group whose children all come back as the very same nodes
//!    (by identity, not content) is returned unchanged and recorded in the
//!    *preserved* set.
//! 2. **Push-down pass** — walk the *original* tree and distribute each
//!    group's own trace segment onto its descendants, so every leaf ends up
//!    carrying its complete root-to-leaf trace. The walk stops at preserved
//!    nodes: their subtree is reused compactly in the new tree, frames still
//!    factored out at the group level. Dropped leaves are walked too; they
//!    may survive as another fault's cause or context and must keep an
//!    accurate trace.
//!
//! Keeping shared frames on preserved groups instead of copying them onto
//! every leaf is what makes filtering a large mostly-untouched tree cheap.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use skein_trace::TraceSegment;

use crate::fault::{Fault, FaultId, FaultRef};
use crate::stack::ensure_sufficient_stack;

/// Filter a fault tree through `handler` and simplify the result.
///
/// Returns `None` when every leaf was dropped, the root itself (same node)
/// when nothing changed, and a rebuilt tree otherwise. Trace segments on the
/// original tree are redistributed so each node not covered by a preserved
/// group carries its complete trace.
pub fn filter<H>(mut handler: H, root: &FaultRef) -> Option<FaultRef>
where
    H: FnMut(&FaultRef) -> Option<FaultRef>,
{
    let mut preserved = FxHashSet::default();
    let filtered = filter_tree(&mut handler, root, &mut preserved);
    push_down(&TraceSegment::new(), root, &preserved);
    tracing::trace!(
        preserved = preserved.len(),
        dropped = filtered.is_none(),
        "filtered fault tree"
    );
    filtered
}

/// Structural pass: rebuild the tree from the handler's answers, ignoring
/// trace segments, recording groups that came through unchanged.
fn filter_tree<H>(
    handler: &mut H,
    node: &FaultRef,
    preserved: &mut FxHashSet<FaultId>,
) -> Option<FaultRef>
where
    H: FnMut(&FaultRef) -> Option<FaultRef>,
{
    ensure_sufficient_stack(|| {
        let Some(children) = node.group_children() else {
            return handler(node);
        };
        let mut kept = Vec::with_capacity(children.len());
        let mut changed = false;
        for child in children {
            match filter_tree(handler, child, preserved) {
                Some(new_child) => {
                    if !Arc::ptr_eq(&new_child, child) {
                        changed = true;
                    }
                    kept.push(new_child);
                }
                None => changed = true,
            }
        }
        if kept.is_empty() {
            None
        } else if changed {
            Some(Fault::group(kept))
        } else {
            preserved.insert(node.id());
            Some(Arc::clone(node))
        }
    })
}

/// Push-down pass: distribute `incoming` plus each node's own segment onto
/// its descendants, over the original tree, skipping preserved subtrees.
fn push_down(incoming: &TraceSegment, node: &FaultRef, preserved: &FxHashSet<FaultId>) {
    ensure_sufficient_stack(|| {
        if preserved.contains(&node.id()) {
            return;
        }
        let merged = incoming.concat(&node.segment());
        match node.group_children() {
            Some(children) => {
                for child in children {
                    push_down(&merged, child, preserved);
                }
                // Fully distributed; a rebuilt parent group starts empty.
                node.clear_segment();
            }
            None => node.replace_segment(merged),
        }
    });
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
