use serde::{Deserialize, Serialize};

use super::hunk::{Change, Hunk, OpenHunk};
use crate::ParseError;

/// What happened to the file as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Delete,
    Modify,
    Rename,
    Copy,
}

/// How the trailing newline of the file changed, derived from the
/// `\ No newline at end of file` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingNewline {
    /// No marker seen: both sides end with a newline
    Present,
    /// Marker after a context line: neither side has one
    Missing,
    /// Marker after a removal: the new side gained the newline
    Added,
    /// Marker after an addition: the new side lost the newline
    Removed,
}

/// One file's worth of parsed changes.
///
/// Emitted records are complete by construction: kind, both paths, the
/// binary flag, and the trailing-newline status are always set. Optional
/// metadata (modes, blob object names, similarity) is present only when the
/// diff carried the corresponding header line. Binary files and
/// metadata-only diffs have no hunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDiff {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub old_path: String,
    pub new_path: String,
    pub binary: bool,
    pub trailing_newline: TrailingNewline,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub old_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub new_mode: Option<String>,
    /// Blob object name of the content before the change
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub old_blob: Option<String>,
    /// Blob object name of the content after the change
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub new_blob: Option<String>,
    /// Rename/copy detection confidence, in percent
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub similarity: Option<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub hunks: Vec<Hunk>,
}

/// Accumulator for the file record currently being parsed.
///
/// Every mandatory field is an explicit `Option`; [`FileDiffBuilder::finish`]
/// is the only way to obtain a [`FileDiff`], and it fails with
/// [`ParseError::IncompleteRecord`] rather than defaulting anything.
#[derive(Debug, Default)]
pub(crate) struct FileDiffBuilder {
    pub(crate) kind: Option<ChangeKind>,
    pub(crate) old_path: Option<String>,
    pub(crate) new_path: Option<String>,
    pub(crate) binary: Option<bool>,
    pub(crate) trailing_newline: Option<TrailingNewline>,
    pub(crate) old_mode: Option<String>,
    pub(crate) new_mode: Option<String>,
    pub(crate) old_blob: Option<String>,
    pub(crate) new_blob: Option<String>,
    pub(crate) similarity: Option<u8>,
    hunks: Vec<Hunk>,
    open: Option<OpenHunk>,
}

impl FileDiffBuilder {
    /// Start a record from a `diff --git` header: modify by default, not
    /// binary, trailing newline present, paths from the header.
    pub(crate) fn new(old_path: String, new_path: String) -> Self {
        FileDiffBuilder {
            kind: Some(ChangeKind::Modify),
            old_path: Some(old_path),
            new_path: Some(new_path),
            binary: Some(false),
            trailing_newline: Some(TrailingNewline::Present),
            ..FileDiffBuilder::default()
        }
    }

    /// Open a new hunk, sealing the previous one first.
    pub(crate) fn start_hunk(
        &mut self,
        old_start: u32,
        old_count: u32,
        new_start: u32,
        new_count: u32,
        header: Option<String>,
    ) -> Result<(), ParseError> {
        if let Some(open) = self.open.take() {
            self.hunks.push(open.close()?);
        }
        self.open = Some(OpenHunk::new(
            old_start, old_count, new_start, new_count, header,
        ));
        Ok(())
    }

    pub(crate) fn open_hunk_mut(&mut self) -> Option<&mut OpenHunk> {
        self.open.as_mut()
    }

    /// Interpret a `\ No newline at end of file` marker relative to the
    /// last change of the open hunk.
    ///
    /// Returns `false` when no hunk is open, which the caller must treat as
    /// orphan hunk content.
    pub(crate) fn resolve_no_newline(&mut self) -> bool {
        let Some(open) = self.open.as_ref() else {
            return false;
        };
        self.trailing_newline = Some(match open.last_change() {
            // The old side lacked the newline; the new side has it now.
            Some(Change::Remove { .. }) => TrailingNewline::Added,
            Some(Change::Add { .. }) => TrailingNewline::Removed,
            // Still missing on both sides.
            Some(Change::Unchanged { .. }) | None => TrailingNewline::Missing,
        });
        true
    }

    /// Seal the record and validate completeness.
    ///
    /// # Errors
    ///
    /// [`ParseError::HunkCountMismatch`] if the still-open hunk fails count
    /// validation, or [`ParseError::IncompleteRecord`] if a mandatory field
    /// was never set.
    pub(crate) fn finish(mut self) -> Result<FileDiff, ParseError> {
        if let Some(open) = self.open.take() {
            self.hunks.push(open.close()?);
        }
        Ok(FileDiff {
            kind: self.kind.ok_or_else(|| incomplete("type"))?,
            old_path: self.old_path.ok_or_else(|| incomplete("oldPath"))?,
            new_path: self.new_path.ok_or_else(|| incomplete("newPath"))?,
            binary: self.binary.ok_or_else(|| incomplete("binary"))?,
            trailing_newline: self
                .trailing_newline
                .ok_or_else(|| incomplete("trailingNewline"))?,
            old_mode: self.old_mode,
            new_mode: self.new_mode,
            old_blob: self.old_blob,
            new_blob: self.new_blob,
            similarity: self.similarity,
            hunks: self.hunks,
        })
    }
}

fn incomplete(field: &str) -> ParseError {
    ParseError::IncompleteRecord {
        field: field.to_string(),
    }
}
