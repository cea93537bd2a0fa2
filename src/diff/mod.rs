pub mod file;
pub mod hunk;

pub use file::{ChangeKind, FileDiff, TrailingNewline};
pub use hunk::{Change, Hunk};
