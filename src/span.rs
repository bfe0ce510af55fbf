//! Byte spans and the region test that decides which nodes survive regeneration.
//!
//! Classification only ever compares offsets, so it works on any node type that can report where
//! it sits in the previous source. Nothing here knows about trees or grammars.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
/// Half-open byte range `[start, end)` into a source text.
pub struct Span {
    /// Byte offset of the first byte (inclusive).
    pub start: usize,
    /// Byte offset one past the last byte (exclusive).
    pub end: usize,
}

impl Span {
    #[must_use]
    /// Build a span, swapping the bounds if given in reverse.
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    #[must_use]
    /// Number of bytes covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    /// Whether the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[must_use]
    /// Whether `other` lies entirely within this span.
    pub fn contains(&self, other: Span) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
/// Located custom region of one marker family: the bytes between its begin and end markers.
pub struct Region {
    /// Offset just past the begin marker.
    pub begin: usize,
    /// Offset of the end marker.
    pub end: usize,
}

impl Region {
    #[must_use]
    /// Build a region, or `None` when the begin marker comes after the end marker.
    ///
    /// A reversed pair is corrupt input; it is treated exactly like a missing pair so that
    /// regeneration still succeeds and nothing from that family is preserved.
    pub fn new(begin: usize, end: usize) -> Option<Self> {
        (begin <= end).then_some(Self { begin, end })
    }
}

#[must_use]
/// Whether a node at `span` holds human-written content for a family located at `region`.
///
/// A node is auto-generated when it lies strictly before or strictly after the region
/// (`start > region.end || end < region.begin`); everything touching the region is custom.
/// Without a region nothing is custom.
pub fn is_custom(span: Span, region: Option<Region>) -> bool {
    region.is_some_and(|r| span.start <= r.end && span.end >= r.begin)
}

#[cfg(test)]
#[path = "tests/span.rs"]
mod tests;
