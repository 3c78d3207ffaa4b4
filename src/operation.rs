//! Host-facing operations.
//!
//! Each operation reads the document snapshot, blocks on the external tools
//! it needs, then applies the resulting batch. The caller must not mutate
//! the document while an operation is running.

use std::path::Path;

use tracing::{debug, info, info_span, warn};

use crate::config::FormatStyle;
use crate::diff::DiffProvider;
use crate::edit::{self, Applied};
use crate::editor::{Document, canonicalize_bytes};
use crate::error::{Error, Result};
use crate::formatter::{FormatRequest, Formatter};
use crate::restrict::Restriction;
use crate::vcs::RevisionSource;

/// What an operation did to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to format; the formatter was not invoked.
    Unchanged,
    /// A batch was applied (possibly empty).
    Formatted(Applied),
}

impl Outcome {
    /// Cursor after the operation, given the cursor before it.
    pub const fn cursor_or(&self, previous: usize) -> usize {
        match self {
            Self::Unchanged => previous,
            Self::Formatted(applied) => applied.cursor,
        }
    }
}

/// Format the whole document.
pub fn format_buffer<F: Formatter + ?Sized>(
    document: &mut Document,
    cursor: usize,
    style: &FormatStyle,
    formatter: &F,
) -> Result<Outcome> {
    let _span = info_span!("format_buffer").entered();
    let restriction = Restriction::ByteRange {
        offset: 0,
        length: document.len_bytes(),
    };
    run_formatter(document, cursor, style, restriction, formatter).map(Outcome::Formatted)
}

/// Format the characters between `start` and `end`.
///
/// Boundaries past the end of the document are clamped and reversed
/// boundaries are swapped.
pub fn format_region<F: Formatter + ?Sized>(
    document: &mut Document,
    start: usize,
    end: usize,
    cursor: usize,
    style: &FormatStyle,
    formatter: &F,
) -> Result<Outcome> {
    let _span = info_span!("format_region", start, end).entered();
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    let start_byte = document.char_to_byte_approx(start);
    let end_byte = document.char_to_byte_approx(end);
    let restriction = Restriction::ByteRange {
        offset: start_byte,
        length: end_byte - start_byte,
    };
    run_formatter(document, cursor, style, restriction, formatter).map(Outcome::Formatted)
}

/// Format only the lines changed since `revision` of the file at `path`.
///
/// `path` is the document's backing file; a document without one cannot be
/// compared against version control. When the diff is empty the formatter
/// is never invoked and the document is left untouched.
#[allow(clippy::too_many_arguments)]
pub fn format_changed_lines<F, D, R>(
    document: &mut Document,
    path: Option<&Path>,
    revision: &str,
    cursor: usize,
    style: &FormatStyle,
    formatter: &F,
    diff: &D,
    revisions: &R,
) -> Result<Outcome>
where
    F: Formatter + ?Sized,
    D: DiffProvider + ?Sized,
    R: RevisionSource + ?Sized,
{
    let path = path.ok_or_else(|| {
        Error::EnvironmentPrecondition("document has no backing file to compare".to_string())
    })?;
    let _span = info_span!("format_changed_lines", path = %path.display(), revision).entered();

    let original = canonicalize_bytes(&revisions.content_at(path, revision)?);
    let current = document.to_bytes();
    let ranges = diff.changed_lines(&original, &current)?;

    let Some(restriction) = Restriction::from_changed_lines(ranges) else {
        info!("no changes since {revision}; skipping formatter");
        return Ok(Outcome::Unchanged);
    };
    let style = style.with_default_filename(Some(path));
    run_formatter(document, cursor, &style, restriction, formatter).map(Outcome::Formatted)
}

fn run_formatter<F: Formatter + ?Sized>(
    document: &mut Document,
    cursor: usize,
    style: &FormatStyle,
    restriction: Restriction,
    formatter: &F,
) -> Result<Applied> {
    let cursor_byte = document.char_to_byte_approx(cursor);
    debug!(?restriction, cursor_byte, "requesting replacements");
    let request = FormatRequest {
        style,
        restriction,
        cursor: cursor_byte,
    };
    let batch = formatter.format(&document.to_bytes(), &request)?;
    let applied = edit::apply(document, cursor_byte, batch)?;
    if applied.incomplete {
        warn!("formatting incomplete (syntax errors); edits were applied");
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::path::PathBuf;

    use super::*;
    use crate::edit::{Edit, EditBatch};
    use crate::restrict::LineRange;

    /// Returns a canned batch and records what it was asked.
    struct FakeFormatter {
        batch: EditBatch,
        seen: RefCell<Vec<(Vec<u8>, Restriction, usize, Option<PathBuf>)>>,
    }

    impl FakeFormatter {
        fn returning(batch: EditBatch) -> Self {
            Self {
                batch,
                seen: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen.borrow().len()
        }
    }

    impl Formatter for FakeFormatter {
        fn format(&self, content: &[u8], request: &FormatRequest<'_>) -> Result<EditBatch> {
            self.seen.borrow_mut().push((
                content.to_vec(),
                request.restriction.clone(),
                request.cursor,
                request.style.assume_filename.clone(),
            ));
            Ok(self.batch.clone())
        }
    }

    struct FixedDiff(Vec<LineRange>, Cell<usize>);

    impl DiffProvider for FixedDiff {
        fn changed_lines(&self, _original: &[u8], _current: &[u8]) -> Result<Vec<LineRange>> {
            self.1.set(self.1.get() + 1);
            Ok(self.0.clone())
        }
    }

    /// Compares snapshots line by line, reporting single-line ranges.
    struct LineDiff;

    impl DiffProvider for LineDiff {
        fn changed_lines(&self, original: &[u8], current: &[u8]) -> Result<Vec<LineRange>> {
            let original: Vec<&[u8]> = original.split(|&b| b == b'\n').collect();
            Ok(current
                .split(|&b| b == b'\n')
                .enumerate()
                .filter(|(i, line)| original.get(*i) != Some(line))
                .map(|(i, _)| LineRange::new(i + 1, i + 1))
                .collect())
        }
    }

    struct StaticRevision(&'static [u8]);

    impl RevisionSource for StaticRevision {
        fn content_at(&self, _path: &Path, _revision: &str) -> Result<Vec<u8>> {
            Ok(self.0.to_vec())
        }
    }

    #[test]
    fn test_format_buffer_requests_whole_document() {
        let mut doc = Document::from_text("int   x;");
        let formatter = FakeFormatter::returning(EditBatch::new(vec![Edit::replace(3, 3, " ")]));
        let outcome = format_buffer(&mut doc, 8, &FormatStyle::default(), &formatter).unwrap();

        assert_eq!(doc.text(), "int x;");
        assert_eq!(outcome.cursor_or(8), 6);
        let seen = formatter.seen.borrow();
        assert_eq!(seen[0].0, b"int   x;");
        assert_eq!(
            seen[0].1,
            Restriction::ByteRange {
                offset: 0,
                length: 8
            }
        );
        assert_eq!(seen[0].2, 8);
    }

    #[test]
    fn test_format_region_translates_characters_to_bytes() {
        // "é" is 2 bytes: characters 2..4 are bytes 3..5.
        let mut doc = Document::from_text("\u{e9}a  b");
        let formatter = FakeFormatter::returning(EditBatch::new(vec![Edit::replace(3, 2, " ")]));
        let outcome =
            format_region(&mut doc, 4, 2, 5, &FormatStyle::default(), &formatter).unwrap();

        assert_eq!(doc.text(), "\u{e9}a b");
        assert_eq!(outcome.cursor_or(5), 4);
        let seen = formatter.seen.borrow();
        assert_eq!(
            seen[0].1,
            Restriction::ByteRange {
                offset: 3,
                length: 2
            }
        );
        assert_eq!(seen[0].2, 6);
    }

    #[test]
    fn test_format_region_clamps_past_end() {
        let mut doc = Document::from_text("ab");
        let formatter = FakeFormatter::returning(EditBatch::default());
        format_region(&mut doc, 1, 99, 99, &FormatStyle::default(), &formatter).unwrap();
        let seen = formatter.seen.borrow();
        assert_eq!(
            seen[0].1,
            Restriction::ByteRange {
                offset: 1,
                length: 1
            }
        );
        assert_eq!(seen[0].2, 2);
    }

    #[test]
    fn test_no_differences_skips_formatter() {
        let mut doc = Document::from_text("int x;\n");
        let formatter = FakeFormatter::returning(EditBatch::new(vec![Edit::delete(0, 1)]));
        let diff = FixedDiff(Vec::new(), Cell::new(0));
        let outcome = format_changed_lines(
            &mut doc,
            Some(Path::new("a.c")),
            "HEAD",
            0,
            &FormatStyle::default(),
            &formatter,
            &diff,
            &StaticRevision(b"int x;\n"),
        )
        .unwrap();

        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(diff.1.get(), 1);
        assert_eq!(formatter.calls(), 0);
        assert_eq!(doc.text(), "int x;\n");
        assert!(!doc.is_dirty());
    }

    #[test]
    fn test_changed_lines_are_passed_through() {
        let mut doc = Document::from_text("int x;\nint   y;\n");
        let formatter = FakeFormatter::returning(EditBatch::new(vec![Edit::replace(10, 3, " ")]));
        let outcome = format_changed_lines(
            &mut doc,
            Some(Path::new("src/a.c")),
            "HEAD",
            0,
            &FormatStyle::default(),
            &formatter,
            &LineDiff,
            &StaticRevision(b"int x;\nint y;\n"),
        )
        .unwrap();

        assert!(matches!(outcome, Outcome::Formatted(_)));
        assert_eq!(doc.text(), "int x;\nint y;\n");
        let seen = formatter.seen.borrow();
        assert_eq!(seen[0].1, Restriction::Lines(vec![LineRange::new(2, 2)]));
        assert_eq!(seen[0].3, Some(PathBuf::from("src/a.c")));
    }

    #[test]
    fn test_baseline_line_endings_are_canonicalized() {
        let mut doc = Document::from_text("int x;\r\n");
        let formatter = FakeFormatter::returning(EditBatch::default());
        let outcome = format_changed_lines(
            &mut doc,
            Some(Path::new("a.c")),
            "HEAD",
            0,
            &FormatStyle::default(),
            &formatter,
            &LineDiff,
            &StaticRevision(b"int x;\r\n"),
        )
        .unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
    }

    #[test]
    fn test_changed_lines_without_backing_file_is_precondition_error() {
        let mut doc = Document::from_text("int x;\n");
        let formatter = FakeFormatter::returning(EditBatch::default());
        let diff = FixedDiff(vec![LineRange::new(1, 1)], Cell::new(0));
        let err = format_changed_lines(
            &mut doc,
            None,
            "HEAD",
            0,
            &FormatStyle::default(),
            &formatter,
            &diff,
            &StaticRevision(b""),
        )
        .unwrap_err();

        assert!(matches!(err, Error::EnvironmentPrecondition(_)));
        assert_eq!(diff.1.get(), 0);
        assert_eq!(formatter.calls(), 0);
    }

    #[test]
    fn test_formatter_error_leaves_document_untouched() {
        struct Broken;
        impl Formatter for Broken {
            fn format(&self, _: &[u8], _: &FormatRequest<'_>) -> Result<EditBatch> {
                Err(Error::malformed("clang-format", "missing <replacements> element"))
            }
        }
        let mut doc = Document::from_text("int   x;");
        let err = format_buffer(&mut doc, 0, &FormatStyle::default(), &Broken).unwrap_err();
        assert!(matches!(err, Error::MalformedOutput { .. }));
        assert_eq!(doc.text(), "int   x;");
    }

    #[test]
    fn test_second_run_on_formatted_output_is_empty() {
        // A formatter that collapses runs of spaces, returning no edits once
        // the text is clean.
        struct CollapseSpaces;
        impl Formatter for CollapseSpaces {
            fn format(&self, content: &[u8], _: &FormatRequest<'_>) -> Result<EditBatch> {
                let mut edits = Vec::new();
                let mut i = 0;
                while i < content.len() {
                    if content[i] == b' ' {
                        let start = i;
                        while i < content.len() && content[i] == b' ' {
                            i += 1;
                        }
                        if i - start > 1 {
                            edits.push(Edit::replace(start, i - start, " "));
                        }
                    } else {
                        i += 1;
                    }
                }
                Ok(EditBatch::new(edits))
            }
        }

        let mut doc = Document::from_text("int   x  =   1;");
        let first = format_buffer(&mut doc, 0, &FormatStyle::default(), &CollapseSpaces).unwrap();
        assert_eq!(doc.text(), "int x = 1;");
        assert!(matches!(first, Outcome::Formatted(a) if a.edits_applied == 3));

        let second = format_buffer(&mut doc, 0, &FormatStyle::default(), &CollapseSpaces).unwrap();
        assert!(matches!(second, Outcome::Formatted(a) if a.edits_applied == 0));
        assert_eq!(doc.text(), "int x = 1;");
    }
}
