//! Streaming parser for git unified diff output.
//!
//! Turns the textual output of `git diff` into structured [`FileDiff`]
//! records: which files were added, deleted, modified, renamed or copied,
//! their modes, blob object names and binary status, and the per-hunk
//! line-level changes with correctly tracked old/new line numbers.
//!
//! Parsing is pull-based and lazy: [`DiffParser`] wraps any iterator of
//! newline-stripped lines and yields one completed record per `diff --git`
//! section, in stream order. [`parse`] is the batch convenience for callers
//! that just want the full list.
//!
//! # Examples
//!
//! ```
//! use diffstream::{parse, ChangeKind};
//!
//! let diff = "diff --git a/foo.txt b/foo.txt\n\
//!             index 257cc56..5716ca5 100644\n\
//!             --- a/foo.txt\n\
//!             +++ b/foo.txt\n\
//!             @@ -1 +1 @@\n\
//!             -foo\n\
//!             +bar\n";
//!
//! let records = parse(diff).unwrap();
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].kind, ChangeKind::Modify);
//! assert_eq!(records[0].old_path, "/foo.txt");
//! assert_eq!(records[0].hunks[0].changes.len(), 2);
//! ```
//!
//! Malformed input is reported as a [`ParseError`], never as a silently
//! incomplete record.

use error_set::error_set;

pub mod classify;
pub mod diff;
pub mod parser;

pub use diff::file::{ChangeKind, FileDiff, TrailingNewline};
pub use diff::hunk::{Change, Hunk};
pub use parser::DiffParser;

error_set! {
    /// Errors from parsing git diff output.
    ///
    /// All variants are fatal: the parser stops at the first violation and
    /// never emits a partial record.
    ParseError := {
        /// A `diff --git` line (or a numeric field in a recognized header)
        /// does not match the expected shape
        #[display("Malformed diff header: {line}")]
        MalformedHeader { line: String },
        /// A record reached the emission boundary with a mandatory field unset
        #[display("File record is missing mandatory field '{field}'")]
        IncompleteRecord { field: String },
        /// A hunk body line appeared with no open hunk
        #[display("Hunk content without an open hunk: {line}")]
        OrphanHunkContent { line: String },
        /// A content line appeared before the first `diff --git` header
        #[display("Diff content before the first file header: {line}")]
        ContentBeforeHeader { line: String },
        /// A hunk's actual line tally disagrees with its declared count
        #[display(
            "Hunk at old line {old_start} declares {declared} {side} lines but contains {actual}"
        )]
        HunkCountMismatch {
            old_start: u32,
            side: String,
            declared: u32,
            actual: u32,
        },
    }
}

/// Parse a complete diff into an ordered list of file records.
///
/// Batch counterpart of [`DiffParser`]: consumes the whole input and either
/// returns every record or the first error encountered. Empty input yields
/// an empty list.
///
/// # Errors
///
/// Returns the first [`ParseError`] hit while scanning the input.
pub fn parse(input: &str) -> Result<Vec<FileDiff>, ParseError> {
    DiffParser::new(input.lines()).collect()
}
