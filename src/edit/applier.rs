use tracing::debug;

use super::{Edit, EditBatch};
use crate::editor::Document;
use crate::error::{Error, Result};

/// Result of applying a batch to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    /// New cursor as a character position.
    pub cursor: usize,
    pub edits_applied: usize,
    /// Carried over from the batch.
    pub incomplete: bool,
}

/// Apply every edit in `batch` to `document` and relocate the cursor.
///
/// `cursor` is a byte offset into the pre-edit document. Edits are applied
/// from the highest offset down (ties: longest first), so an edit never
/// shifts the bytes of one still waiting to be applied. The whole batch is
/// validated and staged before the document is replaced; on error the
/// document is left exactly as it was.
///
/// The returned cursor is the batch's relocated cursor when present
/// (translated exactly against the post-edit document), otherwise `cursor`
/// rebased through the applied edits.
pub fn apply(document: &mut Document, cursor: usize, batch: EditBatch) -> Result<Applied> {
    let EditBatch {
        edits,
        relocated_cursor,
        incomplete,
    } = batch;
    let ordered = descending(edits);
    validate(document, &ordered)?;

    let mut staged = document.clone();
    let mut cursor = cursor.min(staged.len_bytes());
    for edit in &ordered {
        staged.replace_bytes(edit.offset, edit.offset + edit.length, edit.text.as_deref())?;
        cursor = rebase_cursor(cursor, edit);
    }

    let cursor = match relocated_cursor {
        Some(byte) => staged.byte_to_char_exact(byte)?,
        None => staged.byte_to_char_approx(cursor),
    };

    debug!(
        edits = ordered.len(),
        cursor,
        bytes_before = document.len_bytes(),
        bytes_after = staged.len_bytes(),
        "applied edit batch"
    );
    *document = staged;

    Ok(Applied {
        cursor,
        edits_applied: ordered.len(),
        incomplete,
    })
}

/// Sort by descending offset, then descending length.
fn descending(mut edits: Vec<Edit>) -> Vec<Edit> {
    edits.sort_by(|a, b| b.offset.cmp(&a.offset).then(b.length.cmp(&a.length)));
    edits
}

/// Check bounds, alignment and overlap of already-ordered edits.
fn validate(document: &Document, ordered: &[Edit]) -> Result<()> {
    let size = document.len_bytes();
    let mut upper: Option<(usize, usize)> = None;

    for edit in ordered {
        let end = edit
            .end()
            .filter(|&end| end <= size)
            .ok_or(Error::RangeOutOfBounds {
                offset: edit.offset,
                length: edit.length,
                size,
            })?;
        document.byte_to_char_exact(edit.offset)?;
        document.byte_to_char_exact(end)?;

        if let Some((upper_start, upper_end)) = upper
            && end > upper_start
        {
            return Err(Error::RangeOverlap {
                lower_start: edit.offset,
                lower_end: end,
                upper_start,
                upper_end,
            });
        }
        upper = Some((edit.offset, end));
    }
    Ok(())
}

/// Move a byte cursor through one edit.
///
/// Edits ending at or before the cursor shift it by their size change; a
/// cursor strictly inside the replaced span snaps to its start.
fn rebase_cursor(cursor: usize, edit: &Edit) -> usize {
    let end = edit.offset + edit.length;
    if end <= cursor {
        cursor - edit.length + edit.inserted_len()
    } else if edit.offset < cursor {
        edit.offset
    } else {
        cursor
    }
}
