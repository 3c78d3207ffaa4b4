use std::borrow::Cow;

use ropey::Rope;

use crate::error::{Error, Result};

/// Line-ending style of the text a document was loaded from.
///
/// Line breaks introduced by edits are written in this style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// Detect the style from the first line break in `text`.
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(idx) if idx > 0 && text.as_bytes()[idx - 1] == b'\r' => Self::CrLf,
            _ => Self::Lf,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// Normalize `\r\n` to `\n`, the canonical encoding used for offset math.
pub fn canonicalize(text: &str) -> Cow<'_, str> {
    if text.contains("\r\n") {
        Cow::Owned(text.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Byte-level variant of [`canonicalize`] for content that may not be UTF-8.
pub fn canonicalize_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied().peekable();
    while let Some(b) = iter.next() {
        if b == b'\r' && iter.peek() == Some(&b'\n') {
            continue;
        }
        out.push(b);
    }
    out
}

/// Canonical offsets of the `\n` bytes that were preceded by `\r` in `text`.
fn crlf_offsets(text: &str) -> Vec<usize> {
    text.match_indices("\r\n")
        .enumerate()
        .map(|(removed, (idx, _))| idx - removed)
        .collect()
}

/// A text document backed by a rope data structure.
///
/// Content is held in the canonical encoding (UTF-8, `\n` line endings).
/// The host's `\r\n` breaks are remembered by position so untouched lines
/// keep their original endings on output, even in mixed-ending files.
/// Character positions count Unicode scalar values and are what an editor
/// cursor uses; byte offsets index the canonical UTF-8 bytes and are what
/// external tools speak.
#[derive(Clone)]
pub struct Document {
    rope: Rope,
    line_ending: LineEnding,
    /// Sorted canonical offsets of `\n` bytes written as `\r\n` on output.
    crlf_breaks: Vec<usize>,
    dirty: bool,
}

impl Document {
    /// Create a document from host text, normalizing line endings.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(&canonicalize(text)),
            line_ending: LineEnding::detect(text),
            crlf_breaks: crlf_offsets(text),
            dirty: false,
        }
    }

    /// Create an empty document.
    pub fn empty() -> Self {
        Self::from_text("")
    }

    /// The line-ending style the host text used.
    pub const fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Whether any edit has been applied since creation or last save.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the document as clean (e.g., after saving).
    pub const fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Size of the canonical encoding in bytes.
    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    /// Number of characters.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Total number of lines.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// The canonical text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// The canonical bytes, as handed to external tools.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.rope.len_bytes());
        for chunk in self.rope.chunks() {
            bytes.extend_from_slice(chunk.as_bytes());
        }
        bytes
    }

    /// The text with the host's line endings restored.
    pub fn to_host_text(&self) -> String {
        let text = self.text();
        if self.crlf_breaks.is_empty() {
            return text;
        }
        let mut out = String::with_capacity(text.len() + self.crlf_breaks.len());
        let mut last = 0;
        for &offset in &self.crlf_breaks {
            out.push_str(&text[last..offset]);
            out.push('\r');
            last = offset;
        }
        out.push_str(&text[last..]);
        out
    }

    /// Zero-based line and column (in characters) of a character position.
    pub fn line_col(&self, char_idx: usize) -> (usize, usize) {
        let char_idx = char_idx.min(self.rope.len_chars());
        let line = self.rope.char_to_line(char_idx);
        (line, char_idx - self.rope.line_to_char(line))
    }

    /// Translate a byte offset to a character position, failing unless the
    /// offset falls exactly on a character boundary.
    pub fn byte_to_char_exact(&self, byte: usize) -> Result<usize> {
        if byte > self.rope.len_bytes() {
            return Err(Error::RangeOutOfBounds {
                offset: byte,
                length: 0,
                size: self.rope.len_bytes(),
            });
        }
        let char_idx = self.rope.byte_to_char(byte);
        if self.rope.char_to_byte(char_idx) != byte {
            return Err(Error::EncodingAlignment { offset: byte });
        }
        Ok(char_idx)
    }

    /// Translate a byte offset to a character position, rounding a
    /// mid-character offset down to the start of its character and clamping
    /// past-the-end offsets.
    pub fn byte_to_char_approx(&self, byte: usize) -> usize {
        self.rope.byte_to_char(byte.min(self.rope.len_bytes()))
    }

    /// Translate a character position to a byte offset, clamping positions
    /// past the end of the document.
    pub fn char_to_byte_approx(&self, char_idx: usize) -> usize {
        self.rope.char_to_byte(char_idx.min(self.rope.len_chars()))
    }

    /// Replace the byte span `[start, end)` with `text`.
    ///
    /// Only the characters inside the span are removed; nothing outside it
    /// is rewritten. Line breaks in `text` take the document's line ending.
    pub(crate) fn replace_bytes(
        &mut self,
        start: usize,
        end: usize,
        text: Option<&str>,
    ) -> Result<()> {
        if start > end || end > self.rope.len_bytes() {
            return Err(Error::RangeOutOfBounds {
                offset: start,
                length: end.saturating_sub(start),
                size: self.rope.len_bytes(),
            });
        }
        let start_char = self.byte_to_char_exact(start)?;
        let end_char = self.byte_to_char_exact(end)?;
        if start_char < end_char {
            self.rope.remove(start_char..end_char);
        }
        let text = text.unwrap_or_default();
        if !text.is_empty() {
            self.rope.insert(start_char, text);
        }
        self.shift_breaks(start, end, text);
        self.dirty = true;
        Ok(())
    }

    /// Drop the breaks inside `[start, end)`, record the ones `text` adds,
    /// and move later breaks by the size change.
    fn shift_breaks(&mut self, start: usize, end: usize, text: &str) {
        let lo = self.crlf_breaks.partition_point(|&o| o < start);
        let hi = self.crlf_breaks.partition_point(|&o| o < end);
        let added: Vec<usize> = match self.line_ending {
            LineEnding::CrLf => text.match_indices('\n').map(|(i, _)| start + i).collect(),
            LineEnding::Lf => Vec::new(),
        };
        let kept = lo + added.len();
        self.crlf_breaks.splice(lo..hi, added);
        for offset in &mut self.crlf_breaks[kept..] {
            *offset = *offset - (end - start) + text.len();
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field(
                "rope",
                &format_args!(
                    "Rope({} lines, {} bytes)",
                    self.rope.len_lines(),
                    self.rope.len_bytes()
                ),
            )
            .field("line_ending", &self.line_ending)
            .field("dirty", &self.dirty)
            .finish()
    }
}
