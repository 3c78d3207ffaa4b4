//! Changed-line detection between two snapshots.
//!
//! Diffing stays external. [`GnuDiff`] asks GNU `diff` to print one
//! `start:end` token per group of new or changed lines in the current
//! snapshot, which is exactly what the formatter's line restriction takes.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};
use crate::process::{self, Snapshot};
use crate::restrict::LineRange;

/// Something that reports which lines of `current` differ from `original`.
pub trait DiffProvider {
    /// Changed 1-based line ranges in `current`; empty when identical.
    fn changed_lines(&self, original: &[u8], current: &[u8]) -> Result<Vec<LineRange>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GnuDiff {
    binary: PathBuf,
}

impl GnuDiff {
    pub const TOOL: &'static str = "diff";

    /// `diff` exits 0 for identical inputs and 1 when differences were found.
    const SUCCESS_CODES: &'static [i32] = &[0, 1];

    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Group formats that print only new-file line ranges.
    pub const fn format_arguments() -> [&'static str; 4] {
        [
            "--unchanged-group-format=",
            "--old-group-format=",
            "--new-group-format=%dF:%dL ",
            "--changed-group-format=%dF:%dL ",
        ]
    }
}

impl Default for GnuDiff {
    fn default() -> Self {
        Self::new(Self::TOOL)
    }
}

impl DiffProvider for GnuDiff {
    fn changed_lines(&self, original: &[u8], current: &[u8]) -> Result<Vec<LineRange>> {
        let original = Snapshot::new("original", original)?;
        let current = Snapshot::new("current", current)?;
        let mut command = Command::new(&self.binary);
        command
            .args(Self::format_arguments())
            .arg("--")
            .arg(original.path())
            .arg(current.path());
        let output = process::run(Self::TOOL, &mut command, Self::SUCCESS_CODES)?;

        if output.code == 0 {
            debug!("no differences");
            return Ok(Vec::new());
        }
        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| Error::malformed(Self::TOOL, "output is not valid UTF-8"))?;
        let ranges = parse_line_ranges(Self::TOOL, &stdout)?;
        debug!(groups = ranges.len(), "differences found");
        Ok(ranges)
    }
}

/// Parse whitespace-separated `start:end` tokens.
pub fn parse_line_ranges(tool: &str, output: &str) -> Result<Vec<LineRange>> {
    output
        .split_whitespace()
        .map(|token| token.parse::<LineRange>().map_err(|reason| Error::malformed(tool, reason)))
        .collect()
}
