//! The top-level parse state machine.
//!
//! [`DiffParser`] pulls one line at a time from the underlying source,
//! classifies it, and routes it to the current file record. It has two
//! states: idle (no record in flight) and accumulating. A `diff --git`
//! header always starts a fresh record, sealing and yielding the previous
//! one; end of input seals whatever is in flight.
//!
//! The produced sequence is lazy and forward-only: at most one record per
//! input line, and the underlying source is consumed exactly once.

use crate::ParseError;
use crate::classify::{LineToken, classify};
use crate::diff::file::{ChangeKind, FileDiff, FileDiffBuilder};

/// Path git uses in `---`/`+++` lines to signal file creation or deletion.
const NULL_DEVICE: &str = "/dev/null";

/// Lazy iterator of file records over a line source.
///
/// Yields `Ok(FileDiff)` per `diff --git` section in stream order. The
/// first structural violation yields a single `Err`, after which the
/// iterator is fused; no partial record is ever emitted.
///
/// # Examples
///
/// ```
/// use diffstream::DiffParser;
///
/// let diff = "diff --git a/a.txt b/a.txt\n\
///             --- a/a.txt\n\
///             +++ b/a.txt\n\
///             @@ -1 +1 @@\n\
///             -foo\n\
///             +foo!\n";
///
/// let mut parser = DiffParser::new(diff.lines());
/// let record = parser.next().unwrap().unwrap();
/// assert_eq!(record.new_path, "/a.txt");
/// assert!(parser.next().is_none());
/// ```
#[derive(Debug)]
pub struct DiffParser<I> {
    lines: I,
    current: Option<FileDiffBuilder>,
    done: bool,
}

impl<I, S> DiffParser<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    /// Wrap an ordered source of newline-stripped lines.
    pub fn new(lines: I) -> Self {
        DiffParser {
            lines,
            current: None,
            done: false,
        }
    }

    fn fail(&mut self, error: ParseError) -> Result<FileDiff, ParseError> {
        self.done = true;
        Err(error)
    }
}

impl<I, S> Iterator for DiffParser<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = Result<FileDiff, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let Some(line) = self.lines.next() else {
                self.done = true;
                return self.current.take().map(FileDiffBuilder::finish);
            };
            let line = line.as_ref();

            let token = match classify(line) {
                Ok(token) => token,
                Err(error) => return Some(self.fail(error)),
            };

            if let LineToken::FileHeader { old_path, new_path } = token {
                let previous = self
                    .current
                    .replace(FileDiffBuilder::new(old_path, new_path));
                if let Some(previous) = previous {
                    return Some(match previous.finish() {
                        Ok(record) => Ok(record),
                        Err(error) => self.fail(error),
                    });
                }
                continue;
            }

            let Some(builder) = self.current.as_mut() else {
                return Some(self.fail(ParseError::ContentBeforeHeader {
                    line: line.to_string(),
                }));
            };
            if let Err(error) = apply(builder, token, line) {
                return Some(self.fail(error));
            }
        }
    }
}

/// Route one classified line to the in-flight record.
fn apply(builder: &mut FileDiffBuilder, token: LineToken, line: &str) -> Result<(), ParseError> {
    match token {
        // Consumed by the state machine before dispatch.
        LineToken::FileHeader { .. } => Ok(()),
        LineToken::Similarity { percent } => {
            builder.similarity = Some(percent);
            Ok(())
        }
        LineToken::Dissimilarity { percent } => {
            builder.similarity = Some(100u8.saturating_sub(percent));
            Ok(())
        }
        LineToken::RenameFrom { path } => {
            builder.kind = Some(ChangeKind::Rename);
            builder.old_path = Some(path);
            Ok(())
        }
        LineToken::RenameTo { path } => {
            builder.kind = Some(ChangeKind::Rename);
            builder.new_path = Some(path);
            Ok(())
        }
        LineToken::CopyFrom { path } => {
            builder.kind = Some(ChangeKind::Copy);
            builder.old_path = Some(path);
            Ok(())
        }
        LineToken::CopyTo { path } => {
            builder.kind = Some(ChangeKind::Copy);
            builder.new_path = Some(path);
            Ok(())
        }
        LineToken::Index {
            old_blob,
            new_blob,
            mode,
        } => {
            builder.old_blob = Some(old_blob);
            builder.new_blob = Some(new_blob);
            // A mode on the index line means the mode did not change.
            if let Some(mode) = mode {
                builder.old_mode = Some(mode.clone());
                builder.new_mode = Some(mode);
            }
            Ok(())
        }
        LineToken::OldMode { mode } => {
            builder.old_mode = Some(mode);
            Ok(())
        }
        LineToken::NewMode { mode } => {
            builder.new_mode = Some(mode);
            Ok(())
        }
        LineToken::NewFile { mode } => {
            builder.kind = Some(ChangeKind::Add);
            builder.new_mode = Some(mode);
            Ok(())
        }
        LineToken::DeletedFile { mode } => {
            builder.kind = Some(ChangeKind::Delete);
            builder.old_mode = Some(mode);
            Ok(())
        }
        LineToken::Binary { old_path, new_path } => {
            builder.binary = Some(true);
            builder.old_path = Some(old_path);
            builder.new_path = Some(new_path);
            Ok(())
        }
        LineToken::OldPath { path } => {
            if path == NULL_DEVICE {
                builder.kind = Some(ChangeKind::Add);
            }
            builder.old_path = Some(path);
            Ok(())
        }
        LineToken::NewPath { path } => {
            if path == NULL_DEVICE {
                builder.kind = Some(ChangeKind::Delete);
            }
            builder.new_path = Some(path);
            Ok(())
        }
        LineToken::HunkHeader {
            old_start,
            old_count,
            new_start,
            new_count,
            header,
        } => builder.start_hunk(old_start, old_count, new_start, new_count, header),
        LineToken::Add { content } => match builder.open_hunk_mut() {
            Some(hunk) => {
                hunk.push_add(content);
                Ok(())
            }
            None => Err(orphan(line)),
        },
        LineToken::Remove { content } => match builder.open_hunk_mut() {
            Some(hunk) => {
                hunk.push_remove(content);
                Ok(())
            }
            None => Err(orphan(line)),
        },
        LineToken::Unchanged { content } => match builder.open_hunk_mut() {
            Some(hunk) => {
                hunk.push_unchanged(content);
                Ok(())
            }
            None => Err(orphan(line)),
        },
        LineToken::NoNewlineMarker => {
            if builder.resolve_no_newline() {
                Ok(())
            } else {
                Err(orphan(line))
            }
        }
        // Unrecognized lines inside an open hunk are skipped, matching
        // git's own tolerance; anywhere else they are structural noise.
        LineToken::Other => {
            if builder.open_hunk_mut().is_some() {
                Ok(())
            } else {
                Err(orphan(line))
            }
        }
    }
}

fn orphan(line: &str) -> ParseError {
    ParseError::OrphanHunkContent {
        line: line.to_string(),
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod proptests {
    use super::*;
    use crate::diff::hunk::Change;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Add(String),
        Remove(String),
        Unchanged(String),
    }

    fn arb_content() -> impl Strategy<Value = String> {
        // Restricted alphabet so body lines cannot collide with header
        // patterns once prefixed.
        "[a-zA-Z0-9 ]{0,20}"
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            arb_content().prop_map(Op::Add),
            arb_content().prop_map(Op::Remove),
            arb_content().prop_map(Op::Unchanged),
        ]
    }

    fn render(old_start: u32, new_start: u32, ops: &[Op]) -> String {
        let old_count = ops
            .iter()
            .filter(|op| matches!(op, Op::Remove(_) | Op::Unchanged(_)))
            .count();
        let new_count = ops
            .iter()
            .filter(|op| matches!(op, Op::Add(_) | Op::Unchanged(_)))
            .count();

        let mut text = String::from("diff --git a/gen.txt b/gen.txt\n");
        text.push_str("--- a/gen.txt\n");
        text.push_str("+++ b/gen.txt\n");
        text.push_str(&format!(
            "@@ -{old_start},{old_count} +{new_start},{new_count} @@\n"
        ));
        for op in ops {
            match op {
                Op::Add(content) => text.push_str(&format!("+{content}\n")),
                Op::Remove(content) => text.push_str(&format!("-{content}\n")),
                Op::Unchanged(content) => text.push_str(&format!(" {content}\n")),
            }
        }
        text
    }

    proptest! {
        /// Old/new cursors equal start plus the tally of lines touching
        /// that side among all earlier body lines.
        #[test]
        fn line_numbers_track_both_cursors(
            old_start in 1..1000u32,
            new_start in 1..1000u32,
            ops in prop::collection::vec(arb_op(), 1..40),
        ) {
            let text = render(old_start, new_start, &ops);
            let records = crate::parse(&text).unwrap();
            prop_assert_eq!(records.len(), 1);
            prop_assert_eq!(records[0].hunks.len(), 1);

            let hunk = &records[0].hunks[0];
            prop_assert_eq!(hunk.changes.len(), ops.len());

            let mut old_cursor = old_start;
            let mut new_cursor = new_start;
            for (op, change) in ops.iter().zip(&hunk.changes) {
                match (op, change) {
                    (Op::Add(content), Change::Add { content: got, line }) => {
                        prop_assert_eq!(content, got);
                        prop_assert_eq!(*line, new_cursor);
                        new_cursor += 1;
                    }
                    (Op::Remove(content), Change::Remove { content: got, line }) => {
                        prop_assert_eq!(content, got);
                        prop_assert_eq!(*line, old_cursor);
                        old_cursor += 1;
                    }
                    (
                        Op::Unchanged(content),
                        Change::Unchanged { content: got, old_line, new_line },
                    ) => {
                        prop_assert_eq!(content, got);
                        prop_assert_eq!(*old_line, old_cursor);
                        prop_assert_eq!(*new_line, new_cursor);
                        old_cursor += 1;
                        new_cursor += 1;
                    }
                    (op, change) => {
                        prop_assert!(false, "op {:?} parsed as {:?}", op, change);
                    }
                }
            }
        }

        /// Hunk metadata round-trips from the rendered header.
        #[test]
        fn hunk_header_fields_survive(
            old_start in 1..1000u32,
            new_start in 1..1000u32,
            ops in prop::collection::vec(arb_op(), 1..40),
        ) {
            let text = render(old_start, new_start, &ops);
            let records = crate::parse(&text).unwrap();
            let hunk = &records[0].hunks[0];

            prop_assert_eq!(hunk.old_start, old_start);
            prop_assert_eq!(hunk.new_start, new_start);
            prop_assert_eq!(
                hunk.old_count as usize,
                ops.iter()
                    .filter(|op| matches!(op, Op::Remove(_) | Op::Unchanged(_)))
                    .count()
            );
            prop_assert_eq!(
                hunk.new_count as usize,
                ops.iter()
                    .filter(|op| matches!(op, Op::Add(_) | Op::Unchanged(_)))
                    .count()
            );
        }
    }
}
