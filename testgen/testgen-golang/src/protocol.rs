//! Locations, text edits and document changes exchanged with callers.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Position in source code (zero-based line, zero-based byte column)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Range in source code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// An empty range at a single position.
    pub fn point(pos: Position) -> Self {
        Self { start: pos, end: pos }
    }
}

/// A range within a named file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub path: PathBuf,
    pub range: Range,
}

impl Location {
    pub fn new(path: impl Into<PathBuf>, range: Range) -> Self {
        Self {
            path: path.into(),
            range,
        }
    }

    /// A location pointing at a single position.
    pub fn at(path: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self::new(path, Range::point(Position::new(line, column)))
    }
}

/// Replacement of the byte range `start..end` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub new_text: String,
}

impl TextEdit {
    pub fn new(start: usize, end: usize, new_text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            new_text: new_text.into(),
        }
    }

    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::new(offset, offset, text)
    }
}

/// One step of a change set: create a file, or edit one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentChange {
    Create { path: PathBuf },
    Edit { path: PathBuf, edits: Vec<TextEdit> },
}

impl DocumentChange {
    pub fn path(&self) -> &Path {
        match self {
            DocumentChange::Create { path } | DocumentChange::Edit { path, .. } => path,
        }
    }
}

/// Line start offsets of a text, for position/offset conversion.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Byte offset of a position. Columns past the end of a line are an error.
    pub fn offset(&self, pos: Position) -> Result<usize> {
        let Some(&start) = self.line_starts.get(pos.line) else {
            bail!("line {} out of range (file has {} lines)", pos.line, self.line_starts.len());
        };
        let end = self
            .line_starts
            .get(pos.line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.len);
        if start + pos.column > end {
            bail!("column {} out of range on line {}", pos.column, pos.line);
        }
        Ok(start + pos.column)
    }

    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        Position::new(line, offset - self.line_starts[line])
    }

    pub fn range_offsets(&self, range: Range) -> Result<(usize, usize)> {
        let start = self.offset(range.start)?;
        let end = self.offset(range.end)?;
        if end < start {
            bail!("range end precedes start");
        }
        Ok((start, end))
    }
}

/// Apply edits to `src`. Edits at the same offset keep their list order.
pub fn apply_edits(src: &str, edits: &[TextEdit]) -> Result<String> {
    let mut ordered: Vec<&TextEdit> = edits.iter().collect();
    ordered.sort_by_key(|e| e.start);

    let mut out = String::with_capacity(src.len() + edits.iter().map(|e| e.new_text.len()).sum::<usize>());
    let mut cursor = 0;
    for edit in ordered {
        if edit.end < edit.start || edit.end > src.len() {
            bail!("edit range {}..{} out of bounds", edit.start, edit.end);
        }
        if edit.start < cursor {
            bail!("overlapping edit at offset {}", edit.start);
        }
        if !src.is_char_boundary(edit.start) || !src.is_char_boundary(edit.end) {
            bail!("edit range {}..{} splits a character", edit.start, edit.end);
        }
        out.push_str(&src[cursor..edit.start]);
        out.push_str(&edit.new_text);
        cursor = edit.end;
    }
    out.push_str(&src[cursor..]);
    Ok(out)
}
