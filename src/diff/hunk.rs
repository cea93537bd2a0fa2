use serde::{Deserialize, Serialize};

use crate::ParseError;

/// A single line change inside a hunk.
///
/// Line numbers are per side: additions carry the new-side number, removals
/// the old-side number, and unchanged context carries both (they diverge
/// once earlier additions or removals have shifted the sides apart).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Change {
    /// Added line with its new-side line number
    Add { content: String, line: u32 },
    /// Removed line with its old-side line number
    Remove { content: String, line: u32 },
    /// Context line present on both sides
    Unchanged {
        content: String,
        old_line: u32,
        new_line: u32,
    },
}

/// A contiguous region of change within one file's diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hunk {
    /// Context caption git appends after the closing `@@`, when present
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub header: Option<String>,
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    /// Changes in file order
    pub changes: Vec<Change>,
}

/// The hunk currently being assembled, with its running line cursors.
///
/// Both cursors are seeded from the hunk header and advance independently:
/// removals move only the old cursor, additions only the new one, context
/// lines both.
#[derive(Debug)]
pub(crate) struct OpenHunk {
    hunk: Hunk,
    old_cursor: u32,
    new_cursor: u32,
}

impl OpenHunk {
    pub(crate) fn new(
        old_start: u32,
        old_count: u32,
        new_start: u32,
        new_count: u32,
        header: Option<String>,
    ) -> Self {
        OpenHunk {
            hunk: Hunk {
                header,
                old_start,
                old_count,
                new_start,
                new_count,
                changes: Vec::new(),
            },
            old_cursor: old_start,
            new_cursor: new_start,
        }
    }

    pub(crate) fn push_add(&mut self, content: String) {
        self.hunk.changes.push(Change::Add {
            content,
            line: self.new_cursor,
        });
        self.new_cursor += 1;
    }

    pub(crate) fn push_remove(&mut self, content: String) {
        self.hunk.changes.push(Change::Remove {
            content,
            line: self.old_cursor,
        });
        self.old_cursor += 1;
    }

    pub(crate) fn push_unchanged(&mut self, content: String) {
        self.hunk.changes.push(Change::Unchanged {
            content,
            old_line: self.old_cursor,
            new_line: self.new_cursor,
        });
        self.old_cursor += 1;
        self.new_cursor += 1;
    }

    /// The most recently appended change, if any.
    pub(crate) fn last_change(&self) -> Option<&Change> {
        self.hunk.changes.last()
    }

    /// Seal the hunk, checking the declared counts against the actual
    /// change tallies.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::HunkCountMismatch`] when the number of
    /// Remove+Unchanged changes differs from the declared old count, or
    /// Add+Unchanged from the declared new count.
    pub(crate) fn close(self) -> Result<Hunk, ParseError> {
        let old_actual = self.old_cursor - self.hunk.old_start;
        let new_actual = self.new_cursor - self.hunk.new_start;

        if old_actual != self.hunk.old_count {
            return Err(ParseError::HunkCountMismatch {
                old_start: self.hunk.old_start,
                side: "old".to_string(),
                declared: self.hunk.old_count,
                actual: old_actual,
            });
        }
        if new_actual != self.hunk.new_count {
            return Err(ParseError::HunkCountMismatch {
                old_start: self.hunk.old_start,
                side: "new".to_string(),
                declared: self.hunk.new_count,
                actual: new_actual,
            });
        }

        Ok(self.hunk)
    }
}
