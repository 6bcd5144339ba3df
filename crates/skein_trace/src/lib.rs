//! Propagation trace segments for fault trees.
//!
//! A [`TraceSegment`] is the ordered run of [`Frame`]s a fault accumulated at
//! one level of a fault tree: everything recorded since the fault was last
//! absorbed into a group, or since it was first raised. The full trace of a
//! leaf is the concatenation of every ancestor group's segment followed by
//! its own, root first.
//!
//! Segments compose with [`TraceSegment::concat`], which copies frames into a
//! fresh segment. Two faults extending a shared prefix therefore never
//! observe each other's appended frames, and concatenation stays an explicit
//! loop so segments with many thousands of frames (a recursion-limit failure,
//! say) cannot themselves overflow the stack.

use std::fmt;

/// Source position of a recorded frame.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    /// File the frame was recorded in.
    pub file: String,
    /// Line number (1-based).
    pub line: u32,
}

impl Location {
    /// Create a location.
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Location {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One frame descriptor in a propagation trace.
///
/// Represents a single step in the chain a fault travelled through: a task,
/// a function, or a scope boundary.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Frame {
    /// Task or function name.
    pub name: String,
    /// Where the frame was recorded, if known.
    pub location: Option<Location>,
}

impl Frame {
    /// Create a frame with no location.
    pub fn new(name: impl Into<String>) -> Self {
        Frame {
            name: name.into(),
            location: None,
        }
    }

    /// Create a frame with a source location.
    pub fn at(name: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Frame {
            name: name.into(),
            location: Some(Location::new(file, line)),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(location) = &self.location {
            write!(f, " at {location}")?;
        }
        Ok(())
    }
}

/// Ordered sequence of frames accumulated at one tree level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceSegment {
    frames: Vec<Frame>,
}

impl TraceSegment {
    /// Create an empty segment.
    pub fn new() -> Self {
        TraceSegment { frames: Vec::new() }
    }

    /// Create a segment from a list of frames.
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        TraceSegment { frames }
    }

    /// Append a frame to the end of the segment.
    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// The frames in propagation order, oldest first.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of frames in the segment.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if the segment holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drop all frames.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Concatenate `self` followed by `tail` into a new segment.
    ///
    /// Neither input is mutated. Frames are copied, not aliased: two
    /// segments built from the same prefix extend independently.
    #[must_use]
    pub fn concat(&self, tail: &TraceSegment) -> TraceSegment {
        let mut frames = Vec::with_capacity(self.frames.len() + tail.frames.len());
        for frame in &self.frames {
            frames.push(frame.clone());
        }
        for frame in &tail.frames {
            frames.push(frame.clone());
        }
        TraceSegment { frames }
    }
}

impl fmt::Display for TraceSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "stack backtrace:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            writeln!(f, "  {i}: {frame}")?;
        }
        Ok(())
    }
}
