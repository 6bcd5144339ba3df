//! The fault tree: leaves, groups, and the links between them.
//!
//! A [`Fault`] is one node of an error tree. A leaf wraps a single payload
//! error from a failed task; a group owns an ordered sequence of two or more
//! child faults that failed concurrently. Child order is the order the
//! failures were joined and is never changed or deduplicated.
//!
//! Besides its owned children, a fault can point at other faults through two
//! non-owning links: an explicit *cause* and an implicit *context*. Those
//! links are shared by identity and may alias nodes that also appear
//! elsewhere in a tree, so everything downstream (filtering, rendering)
//! keys off node identity, never content equality.

use std::error::Error as StdError;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use skein_trace::{Frame, TraceSegment};

/// Shared handle to a fault tree node.
pub type FaultRef = Arc<Fault>;

/// Identity of a fault node, by allocation address.
///
/// Two content-equal faults are still distinct nodes; identity is what the
/// filter engine's preserved set and the renderer's seen set key on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct FaultId(usize);

impl FaultId {
    /// Address of the node, for diagnostics.
    pub fn addr(self) -> usize {
        self.0
    }
}

pub(crate) enum FaultKind {
    Leaf(Box<dyn StdError + Send + Sync>),
    Group(Vec<FaultRef>),
}

/// One node of a fault tree.
pub struct Fault {
    kind: FaultKind,
    /// Frames accumulated since this node was raised or last absorbed into
    /// a parent group.
    segment: Mutex<TraceSegment>,
    cause: Option<FaultRef>,
    context: Option<FaultRef>,
    suppress_context: AtomicBool,
}

impl Fault {
    /// Start a leaf fault wrapping `payload`.
    #[cold]
    pub fn new(payload: impl StdError + Send + Sync + 'static) -> Fault {
        Fault::from_boxed(Box::new(payload))
    }

    /// Start a leaf fault from an already-boxed payload.
    #[cold]
    pub fn from_boxed(payload: Box<dyn StdError + Send + Sync>) -> Fault {
        Fault {
            kind: FaultKind::Leaf(payload),
            segment: Mutex::new(TraceSegment::new()),
            cause: None,
            context: None,
            suppress_context: AtomicBool::new(false),
        }
    }

    /// Attach the fault this one was explicitly raised from.
    #[must_use]
    pub fn with_cause(mut self, cause: FaultRef) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Attach the fault that was being handled when this one occurred.
    #[must_use]
    pub fn with_context(mut self, context: FaultRef) -> Self {
        self.context = Some(context);
        self
    }

    /// Append a frame to the fault's own trace segment.
    #[must_use]
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.segment.get_mut().push(frame);
        self
    }

    /// Wrap the fault into a shared handle.
    pub fn shared(self) -> FaultRef {
        Arc::new(self)
    }

    /// Join faults into a group.
    ///
    /// A single child is returned unchanged, with no wrapping, so any handle
    /// the caller already holds on it stays valid. Two or more children
    /// become a group owning them in the given order.
    ///
    /// # Panics
    ///
    /// Panics when `children` is empty: there is no empty fault.
    pub fn group(mut children: Vec<FaultRef>) -> FaultRef {
        assert!(!children.is_empty(), "fault group requires at least one child");
        if children.len() == 1 {
            return children.remove(0);
        }
        Arc::new(Fault {
            kind: FaultKind::Group(children),
            segment: Mutex::new(TraceSegment::new()),
            cause: None,
            context: None,
            suppress_context: AtomicBool::new(false),
        })
    }

    /// This node's identity.
    pub fn id(&self) -> FaultId {
        FaultId(std::ptr::from_ref(self) as usize)
    }

    /// Check if this node is a group.
    pub fn is_group(&self) -> bool {
        matches!(self.kind, FaultKind::Group(_))
    }

    /// The owned children, in join order. Empty for a leaf.
    pub fn children(&self) -> &[FaultRef] {
        match &self.kind {
            FaultKind::Group(children) => children,
            FaultKind::Leaf(_) => &[],
        }
    }

    pub(crate) fn group_children(&self) -> Option<&[FaultRef]> {
        match &self.kind {
            FaultKind::Group(children) => Some(children),
            FaultKind::Leaf(_) => None,
        }
    }

    /// The explicit predecessor, if any.
    pub fn cause(&self) -> Option<&FaultRef> {
        self.cause.as_ref()
    }

    /// The implicit predecessor, if any.
    pub fn context(&self) -> Option<&FaultRef> {
        self.context.as_ref()
    }

    /// Check if the implicit predecessor should be hidden from reports.
    pub fn context_suppressed(&self) -> bool {
        self.suppress_context.load(Ordering::Relaxed)
    }

    /// Hide the implicit predecessor from reports.
    pub fn suppress_context(&self) {
        self.suppress_context.store(true, Ordering::Relaxed);
    }

    /// Record a propagation frame on this node's own segment.
    ///
    /// Called by whatever carries the fault while it unwinds: a scheduler
    /// recording the scopes a group travels through, or a guard marking its
    /// own boundary.
    pub fn push_frame(&self, frame: Frame) {
        self.segment.lock().push(frame);
    }

    /// Snapshot of this node's own trace segment.
    ///
    /// For a leaf that went through a filter pass this is the complete
    /// root-to-leaf trace; otherwise it holds only the frames accumulated at
    /// this level.
    pub fn segment(&self) -> TraceSegment {
        self.segment.lock().clone()
    }

    pub(crate) fn replace_segment(&self, segment: TraceSegment) {
        *self.segment.lock() = segment;
    }

    pub(crate) fn clear_segment(&self) {
        self.segment.lock().clear();
    }

    /// Downcast a leaf payload to a concrete error type.
    ///
    /// Returns `None` for groups and for leaves of another type. This is how
    /// handlers pick out the fault kinds they want to consume.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match &self.kind {
            FaultKind::Leaf(payload) => payload.downcast_ref::<E>(),
            FaultKind::Group(_) => None,
        }
    }

    /// Check if this is a leaf with a payload of type `E`.
    pub fn is<E: StdError + 'static>(&self) -> bool {
        self.downcast_ref::<E>().is_some()
    }

    /// Verify structural invariants of the owned tree.
    ///
    /// # Panics
    ///
    /// Panics if a group owns fewer than two children or a node recurs on
    /// its own path to the root. Cause and context links are not walked;
    /// they are allowed to alias freely.
    pub fn assert_well_formed(&self) {
        fn walk(node: &Fault, path: &mut Vec<FaultId>) {
            let id = node.id();
            assert!(
                !path.contains(&id),
                "fault tree contains a cycle through `{node}`"
            );
            if let Some(children) = node.group_children() {
                assert!(
                    children.len() >= 2,
                    "stable fault group holds fewer than two children: `{node}`"
                );
                path.push(id);
                for child in children {
                    walk(child, path);
                }
                path.pop();
            }
        }
        walk(self, &mut Vec::new());
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FaultKind::Leaf(payload) => write!(f, "{payload}"),
            FaultKind::Group(children) => {
                let mut first = true;
                for child in children {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{child}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FaultKind::Leaf(payload) => fmt::Debug::fmt(payload, f),
            FaultKind::Group(_) => write!(f, "<fault group: {self}>"),
        }
    }
}

impl StdError for Fault {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|cause| cause as &(dyn StdError + 'static))
    }
}
