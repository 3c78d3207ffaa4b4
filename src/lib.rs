// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. edit::EditBatch)
    clippy::module_name_repetitions
)]

//! # fmtpatch
//!
//! Apply an external formatter's replacements to a document.
//!
//! fmtpatch sits between an editor and a formatter such as `clang-format`:
//! - Hands the formatter the document's canonical bytes and a restriction
//!   (byte range or changed line ranges)
//! - Parses the replacements it returns
//! - Applies them atomically, highest offset first, and relocates the cursor
//! - Optionally limits formatting to lines changed since a git revision
//!
//! ## Modules
//!
//! - [`editor`]: Rope-backed document and char/byte translation
//! - [`edit`]: Edits, edit batches and their application
//! - [`restrict`]: Byte-range and line-range restrictions
//! - [`formatter`]: Formatter trait and the `clang-format` backend
//! - [`diff`]: Changed-line detection via GNU `diff`
//! - [`vcs`]: Historical file content via `git`
//! - [`operation`]: Buffer, region and changed-lines formatting
//! - [`config`]: Layered flag configuration and explicit style settings
//! - [`process`]: Scoped external process invocation

pub mod config;
pub mod diff;
pub mod edit;
pub mod editor;
pub mod error;
pub mod formatter;
pub mod operation;
pub mod process;
pub mod restrict;
pub mod vcs;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::FormatStyle;
    pub use crate::edit::{Edit, EditBatch, apply};
    pub use crate::editor::Document;
    pub use crate::operation::{Outcome, format_buffer, format_changed_lines, format_region};
}
