//! Edits returned by a formatter and their application to a [`Document`].
//!
//! [`Document`]: crate::editor::Document

mod applier;

pub use applier::{Applied, apply};

/// A single replacement in the pre-edit canonical byte space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// First byte to replace.
    pub offset: usize,
    /// Number of bytes removed starting at `offset`.
    pub length: usize,
    /// Replacement text; `None` is a pure deletion.
    pub text: Option<String>,
}

impl Edit {
    pub fn replace(offset: usize, length: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            length,
            text: Some(text.into()),
        }
    }

    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::replace(offset, 0, text)
    }

    pub const fn delete(offset: usize, length: usize) -> Self {
        Self {
            offset,
            length,
            text: None,
        }
    }

    /// Exclusive end of the replaced span, `None` on overflow.
    pub const fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.length)
    }

    /// Bytes inserted by this edit.
    pub fn inserted_len(&self) -> usize {
        self.text.as_ref().map_or(0, String::len)
    }
}

/// Everything one formatter invocation produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBatch {
    pub edits: Vec<Edit>,
    /// Cursor byte offset reported by the formatter, in the post-edit document.
    pub relocated_cursor: Option<usize>,
    /// The formatter could not fully parse its input.
    pub incomplete: bool,
}

impl EditBatch {
    pub const fn new(edits: Vec<Edit>) -> Self {
        Self {
            edits,
            relocated_cursor: None,
            incomplete: false,
        }
    }

    #[must_use]
    pub fn with_cursor(mut self, cursor: usize) -> Self {
        self.relocated_cursor = Some(cursor);
        self
    }

    #[must_use]
    pub fn with_incomplete(mut self, incomplete: bool) -> Self {
        self.incomplete = incomplete;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}
