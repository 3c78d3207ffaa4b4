//! What part of a document a formatting invocation may touch.

use std::fmt;
use std::str::FromStr;

/// 1-based inclusive line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl FromStr for LineRange {
    type Err = String;

    /// Parse a `start:end` token.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once(':')
            .ok_or_else(|| format!("expected start:end, got {s:?}"))?;
        let start = start
            .parse()
            .map_err(|_| format!("invalid start line in {s:?}"))?;
        let end = end
            .parse()
            .map_err(|_| format!("invalid end line in {s:?}"))?;
        Ok(Self { start, end })
    }
}

/// Limits handed to the formatter alongside the full document content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restriction {
    /// Canonical byte range `[offset, offset + length)`.
    ByteRange { offset: usize, length: usize },
    /// Changed line ranges, passed through verbatim.
    Lines(Vec<LineRange>),
}

impl Restriction {
    /// Adapt diff output into a restriction.
    ///
    /// Returns `None` when nothing changed, in which case the caller skips
    /// formatting entirely.
    pub fn from_changed_lines(ranges: Vec<LineRange>) -> Option<Self> {
        if ranges.is_empty() {
            None
        } else {
            Some(Self::Lines(ranges))
        }
    }
}
