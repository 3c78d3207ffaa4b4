//! Formatter collaborators.
//!
//! A [`Formatter`] takes the canonical bytes of a document plus a
//! [`FormatRequest`] and returns the replacements it wants applied. The
//! formatting engine itself stays external; [`ClangFormat`] drives the
//! `clang-format` executable.

mod xml;

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, warn};

pub use xml::parse_replacements;

use crate::config::FormatStyle;
use crate::edit::EditBatch;
use crate::error::{Error, Result};
use crate::process::{self, Snapshot};
use crate::restrict::Restriction;

/// Parameters of one formatting invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRequest<'a> {
    pub style: &'a FormatStyle,
    pub restriction: Restriction,
    /// Cursor as a canonical byte offset.
    pub cursor: usize,
}

/// Something that turns document bytes into an edit batch.
pub trait Formatter {
    fn format(&self, content: &[u8], request: &FormatRequest<'_>) -> Result<EditBatch>;
}

/// `clang-format` run as a child process with `--output-replacements-xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClangFormat {
    binary: PathBuf,
}

impl ClangFormat {
    pub const TOOL: &'static str = "clang-format";

    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Command-line arguments for `request`, excluding the program name.
    pub fn arguments(request: &FormatRequest<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--output-replacements-xml".into()];
        let style = request.style;
        if let Some(name) = &style.style {
            args.push(format!("--style={name}").into());
        }
        if let Some(name) = &style.fallback_style {
            args.push(format!("--fallback-style={name}").into());
        }
        if let Some(path) = &style.assume_filename {
            let mut arg = OsString::from("--assume-filename=");
            arg.push(path.as_os_str());
            args.push(arg);
        }
        match &request.restriction {
            Restriction::ByteRange { offset, length } => {
                args.push(format!("--offset={offset}").into());
                args.push(format!("--length={length}").into());
            }
            Restriction::Lines(ranges) => {
                for range in ranges {
                    args.push(format!("--lines={range}").into());
                }
            }
        }
        args.push(format!("--cursor={}", request.cursor).into());
        args
    }
}

impl Default for ClangFormat {
    fn default() -> Self {
        Self::new(Self::TOOL)
    }
}

impl Formatter for ClangFormat {
    fn format(&self, content: &[u8], request: &FormatRequest<'_>) -> Result<EditBatch> {
        let input = Snapshot::new("input", content)?;
        let mut command = Command::new(&self.binary);
        command
            .args(Self::arguments(request))
            .stdin(input.stdin()?);
        let output = process::run(Self::TOOL, &mut command, &[0])?;

        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| Error::malformed(Self::TOOL, "output is not valid UTF-8"))?;
        let batch = parse_replacements(Self::TOOL, &stdout)?;
        if batch.incomplete {
            warn!("{} reported incomplete formatting (syntax errors)", Self::TOOL);
        }
        debug!(
            edits = batch.edits.len(),
            cursor = ?batch.relocated_cursor,
            "parsed replacements"
        );
        Ok(batch)
    }
}
