//! Line classification for git diff output.
//!
//! Every input line maps to exactly one [`LineToken`]. The pattern table is
//! fixed, compiled once, and checked in a strict priority order: file-diff
//! headers first, then the metadata headers, then hunk headers, and only
//! then the hunk body prefixes. The ordering matters because several
//! categories are textual prefixes of each other — a `--- a/path` header
//! would otherwise classify as a removed line starting with `--`.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::ParseError;

static FILE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^diff --git (?:a/)?(?<old>\S+) (?:b/)?(?<new>\S+)$"));
static SIMILARITY: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^similarity index (?<percent>\d+)%$"));
static DISSIMILARITY: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^dissimilarity index (?<percent>\d+)%$"));
static RENAME_COPY: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^(?<op>rename|copy) (?<dir>from|to) (?<path>.+)$"));
static INDEX: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"^index (?<old>[0-9a-f]+)\.\.(?<new>[0-9a-f]+)(?: (?<mode>\d+))?$")
});
static MODE_CHANGE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^(?<which>old|new) mode (?<mode>\d+)$"));
static NEW_FILE: LazyLock<Regex> = LazyLock::new(|| pattern(r"^new file mode (?<mode>\d+)$"));
static DELETED_FILE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^deleted file mode (?<mode>\d+)$"));
static BINARY: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Binary files (?<old>.+) and (?<new>.+) differ$"));
static OLD_PATH: LazyLock<Regex> = LazyLock::new(|| pattern(r"^--- (?<path>.+)$"));
static NEW_PATH: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\+\+\+ (?<path>.+)$"));
static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"^@@ -(?<old_start>\d+)(?:,(?<old_count>\d+))? \+(?<new_start>\d+)(?:,(?<new_count>\d+))? @@(?: (?<header>.*))?$",
    )
});

/// Literal marker git emits after the last line of a side that has no
/// terminating newline.
const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

fn pattern(re: &str) -> Regex {
    #[allow(clippy::expect_used)]
    Regex::new(re).expect("invalid diff line pattern")
}

/// One classified line of git diff output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineToken {
    /// `diff --git a/<old> b/<new>` — starts a new file record
    FileHeader { old_path: String, new_path: String },
    /// `similarity index NN%`
    Similarity { percent: u8 },
    /// `dissimilarity index NN%`
    Dissimilarity { percent: u8 },
    /// `rename from <path>`
    RenameFrom { path: String },
    /// `rename to <path>`
    RenameTo { path: String },
    /// `copy from <path>`
    CopyFrom { path: String },
    /// `copy to <path>`
    CopyTo { path: String },
    /// `index <old>..<new>[ <mode>]` — blob object names, optional shared mode
    Index {
        old_blob: String,
        new_blob: String,
        mode: Option<String>,
    },
    /// `old mode <mode>`
    OldMode { mode: String },
    /// `new mode <mode>`
    NewMode { mode: String },
    /// `new file mode <mode>`
    NewFile { mode: String },
    /// `deleted file mode <mode>`
    DeletedFile { mode: String },
    /// `Binary files <old> and <new> differ`
    Binary { old_path: String, new_path: String },
    /// `--- <path>` (paths normalized, `/dev/null` kept verbatim)
    OldPath { path: String },
    /// `+++ <path>`
    NewPath { path: String },
    /// `@@ -a[,b] +c[,d] @@ [caption]` — counts default to 1 when omitted
    HunkHeader {
        old_start: u32,
        old_count: u32,
        new_start: u32,
        new_count: u32,
        header: Option<String>,
    },
    /// Hunk body `+` line, marker stripped
    Add { content: String },
    /// Hunk body `-` line, marker stripped
    Remove { content: String },
    /// Hunk body context line, leading space stripped
    Unchanged { content: String },
    /// `\ No newline at end of file`
    NoNewlineMarker,
    /// Anything the table does not recognize
    Other,
}

/// Classify one newline-stripped line of diff output.
///
/// # Errors
///
/// Returns [`ParseError::MalformedHeader`] when a line that starts like a
/// `diff --git` header fails to match the full header shape, or when a
/// numeric field in a recognized header does not fit its type.
pub fn classify(line: &str) -> Result<LineToken, ParseError> {
    if line.starts_with("diff --git") {
        let caps = FILE_HEADER
            .captures(line)
            .ok_or_else(|| ParseError::MalformedHeader {
                line: line.to_string(),
            })?;
        return Ok(LineToken::FileHeader {
            old_path: caps["old"].to_string(),
            new_path: caps["new"].to_string(),
        });
    }
    if let Some(caps) = SIMILARITY.captures(line) {
        return Ok(LineToken::Similarity {
            percent: parse_field(&caps["percent"], line)?,
        });
    }
    if let Some(caps) = DISSIMILARITY.captures(line) {
        return Ok(LineToken::Dissimilarity {
            percent: parse_field(&caps["percent"], line)?,
        });
    }
    if let Some(caps) = RENAME_COPY.captures(line) {
        let path = caps["path"].to_string();
        return Ok(match (&caps["op"], &caps["dir"]) {
            ("rename", "from") => LineToken::RenameFrom { path },
            ("rename", _) => LineToken::RenameTo { path },
            (_, "from") => LineToken::CopyFrom { path },
            (_, _) => LineToken::CopyTo { path },
        });
    }
    if let Some(caps) = INDEX.captures(line) {
        return Ok(LineToken::Index {
            old_blob: caps["old"].to_string(),
            new_blob: caps["new"].to_string(),
            mode: caps.name("mode").map(|m| m.as_str().to_string()),
        });
    }
    if let Some(caps) = MODE_CHANGE.captures(line) {
        let mode = caps["mode"].to_string();
        return Ok(if &caps["which"] == "old" {
            LineToken::OldMode { mode }
        } else {
            LineToken::NewMode { mode }
        });
    }
    if let Some(caps) = NEW_FILE.captures(line) {
        return Ok(LineToken::NewFile {
            mode: caps["mode"].to_string(),
        });
    }
    if let Some(caps) = DELETED_FILE.captures(line) {
        return Ok(LineToken::DeletedFile {
            mode: caps["mode"].to_string(),
        });
    }
    if let Some(caps) = BINARY.captures(line) {
        return Ok(LineToken::Binary {
            old_path: normalize_path(&caps["old"]),
            new_path: normalize_path(&caps["new"]),
        });
    }
    if let Some(caps) = OLD_PATH.captures(line) {
        return Ok(LineToken::OldPath {
            path: normalize_path(&caps["path"]),
        });
    }
    if let Some(caps) = NEW_PATH.captures(line) {
        return Ok(LineToken::NewPath {
            path: normalize_path(&caps["path"]),
        });
    }
    if let Some(caps) = HUNK_HEADER.captures(line) {
        return Ok(LineToken::HunkHeader {
            old_start: parse_field(&caps["old_start"], line)?,
            old_count: parse_optional_count(caps.name("old_count"), line)?,
            new_start: parse_field(&caps["new_start"], line)?,
            new_count: parse_optional_count(caps.name("new_count"), line)?,
            header: caps.name("header").map(|m| m.as_str().to_string()),
        });
    }
    if line == NO_NEWLINE_MARKER {
        return Ok(LineToken::NoNewlineMarker);
    }
    if let Some(content) = line.strip_prefix('+') {
        return Ok(LineToken::Add {
            content: content.to_string(),
        });
    }
    if let Some(content) = line.strip_prefix('-') {
        return Ok(LineToken::Remove {
            content: content.to_string(),
        });
    }
    if let Some(content) = line.strip_prefix(' ') {
        return Ok(LineToken::Unchanged {
            content: content.to_string(),
        });
    }
    Ok(LineToken::Other)
}

/// Replace a leading `a/` or `b/` prefix with a single `/`.
///
/// Paths without the prefix (rename/copy targets, `/dev/null`) pass through
/// verbatim.
fn normalize_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("a/").or_else(|| path.strip_prefix("b/")) {
        format!("/{rest}")
    } else {
        path.to_string()
    }
}

fn parse_field<T: FromStr>(value: &str, line: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::MalformedHeader {
        line: line.to_string(),
    })
}

/// A hunk range with no explicit count covers exactly one line.
fn parse_optional_count(
    count: Option<regex::Match<'_>>,
    line: &str,
) -> Result<u32, ParseError> {
    match count {
        Some(m) => parse_field(m.as_str(), line),
        None => Ok(1),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn classify_file_header_strips_prefixes() {
        let token = classify("diff --git a/foo/a.txt b/foo/a.txt").unwrap();
        assert_eq!(
            token,
            LineToken::FileHeader {
                old_path: "foo/a.txt".to_string(),
                new_path: "foo/a.txt".to_string(),
            }
        );
    }

    #[test]
    fn classify_malformed_file_header_is_fatal() {
        let result = classify("diff --git a/foo/a.txt");
        assert!(matches!(result, Err(ParseError::MalformedHeader { .. })));
    }

    #[test]
    fn classify_similarity() {
        let token = classify("similarity index 87%").unwrap();
        assert_eq!(token, LineToken::Similarity { percent: 87 });
    }

    #[test]
    fn classify_dissimilarity() {
        let token = classify("dissimilarity index 12%").unwrap();
        assert_eq!(token, LineToken::Dissimilarity { percent: 12 });
    }

    #[test]
    fn classify_rename_and_copy_directions() {
        assert_eq!(
            classify("rename from foo/a.txt").unwrap(),
            LineToken::RenameFrom {
                path: "foo/a.txt".to_string()
            }
        );
        assert_eq!(
            classify("rename to bar/a.txt").unwrap(),
            LineToken::RenameTo {
                path: "bar/a.txt".to_string()
            }
        );
        assert_eq!(
            classify("copy from foo/a.txt").unwrap(),
            LineToken::CopyFrom {
                path: "foo/a.txt".to_string()
            }
        );
        assert_eq!(
            classify("copy to foo/b.txt").unwrap(),
            LineToken::CopyTo {
                path: "foo/b.txt".to_string()
            }
        );
    }

    #[test]
    fn classify_index_without_mode() {
        let token = classify("index 257cc56..3bd1f0e").unwrap();
        assert_eq!(
            token,
            LineToken::Index {
                old_blob: "257cc56".to_string(),
                new_blob: "3bd1f0e".to_string(),
                mode: None,
            }
        );
    }

    #[test]
    fn classify_index_with_mode() {
        let token = classify("index cd4d9e8..17110ae 100644").unwrap();
        assert_eq!(
            token,
            LineToken::Index {
                old_blob: "cd4d9e8".to_string(),
                new_blob: "17110ae".to_string(),
                mode: Some("100644".to_string()),
            }
        );
    }

    #[test]
    fn classify_mode_lines() {
        assert_eq!(
            classify("old mode 100644").unwrap(),
            LineToken::OldMode {
                mode: "100644".to_string()
            }
        );
        assert_eq!(
            classify("new mode 100755").unwrap(),
            LineToken::NewMode {
                mode: "100755".to_string()
            }
        );
        assert_eq!(
            classify("new file mode 100644").unwrap(),
            LineToken::NewFile {
                mode: "100644".to_string()
            }
        );
        assert_eq!(
            classify("deleted file mode 100644").unwrap(),
            LineToken::DeletedFile {
                mode: "100644".to_string()
            }
        );
    }

    #[test]
    fn classify_binary_normalizes_paths() {
        let token = classify("Binary files /dev/null and b/foo/test.pdf differ").unwrap();
        assert_eq!(
            token,
            LineToken::Binary {
                old_path: "/dev/null".to_string(),
                new_path: "/foo/test.pdf".to_string(),
            }
        );
    }

    #[test]
    fn classify_path_lines_before_body_prefixes() {
        // `--- a/x` must win over the `-` removal prefix, `+++ b/x` over `+`.
        assert_eq!(
            classify("--- a/foo/a.txt").unwrap(),
            LineToken::OldPath {
                path: "/foo/a.txt".to_string()
            }
        );
        assert_eq!(
            classify("+++ b/foo/a.txt").unwrap(),
            LineToken::NewPath {
                path: "/foo/a.txt".to_string()
            }
        );
        assert_eq!(
            classify("--- /dev/null").unwrap(),
            LineToken::OldPath {
                path: "/dev/null".to_string()
            }
        );
    }

    #[test]
    fn classify_hunk_header_with_counts_and_caption() {
        let token = classify("@@ -11,12 +11,12 @@ export interface Change {").unwrap();
        assert_eq!(
            token,
            LineToken::HunkHeader {
                old_start: 11,
                old_count: 12,
                new_start: 11,
                new_count: 12,
                header: Some("export interface Change {".to_string()),
            }
        );
    }

    #[test]
    fn classify_hunk_header_counts_default_to_one() {
        let token = classify("@@ -1 +1 @@").unwrap();
        assert_eq!(
            token,
            LineToken::HunkHeader {
                old_start: 1,
                old_count: 1,
                new_start: 1,
                new_count: 1,
                header: None,
            }
        );
    }

    #[test]
    fn classify_body_lines() {
        assert_eq!(
            classify("+foo!").unwrap(),
            LineToken::Add {
                content: "foo!".to_string()
            }
        );
        assert_eq!(
            classify("-foo").unwrap(),
            LineToken::Remove {
                content: "foo".to_string()
            }
        );
        assert_eq!(
            classify(" foo").unwrap(),
            LineToken::Unchanged {
                content: "foo".to_string()
            }
        );
        assert_eq!(
            classify("\\ No newline at end of file").unwrap(),
            LineToken::NoNewlineMarker
        );
    }

    #[test]
    fn classify_unknown_line() {
        assert_eq!(classify("some stray text").unwrap(), LineToken::Other);
        assert_eq!(classify("").unwrap(), LineToken::Other);
    }
}
