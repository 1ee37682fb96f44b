//! Project-relative file references.
//!
//! A reference is `@<project>/<path>`, optionally followed by the selected
//! lines: `#L12` for one line or `#L12-20` for several. Line numbers are
//! 1-based and inclusive.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathRefError {
    #[error("cannot determine a file name for {}", .0.display())]
    NoFileName(PathBuf),
    #[error("selection {start}..{end} is outside the document ({len} characters)")]
    OffsetOutOfRange { start: usize, end: usize, len: usize },
    #[error("invalid selection: {0} (expected START:END)")]
    InvalidSelection(String),
}

/// File contents indexed by line, with offsets counted in characters.
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    /// Character offset at which each line begins.
    line_starts: Vec<usize>,
    char_len: usize,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        let mut char_len = 0;
        for (i, c) in text.chars().enumerate() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
            char_len = i + 1;
        }

        Self {
            text,
            line_starts,
            char_len,
        }
    }

    pub const fn char_len(&self) -> usize {
        self.char_len
    }

    /// 0-based line containing `offset`. Offsets past the end map to the last line.
    pub fn line_number(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset) - 1
    }

    fn byte_offset(&self, offset: usize) -> Option<usize> {
        if offset == self.char_len {
            return Some(self.text.len());
        }
        self.text.char_indices().nth(offset).map(|(byte, _)| byte)
    }

    /// Text covered by `selection`, or `None` if it runs past the end.
    pub fn slice(&self, selection: Selection) -> Option<&str> {
        let start = self.byte_offset(selection.start)?;
        let end = self.byte_offset(selection.end)?;
        Some(&self.text[start..end])
    }
}

/// Half-open character range selected in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    /// Build a selection, swapping the ends if given backwards.
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl FromStr for Selection {
    type Err = PathRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PathRefError::InvalidSelection(s.to_string());
        let (start, end) = s.split_once(':').ok_or_else(invalid)?;
        let start = start.trim().parse().map_err(|_| invalid())?;
        let end = end.trim().parse().map_err(|_| invalid())?;
        Ok(Self::new(start, end))
    }
}

/// 1-based inclusive line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "L{}", self.start)
        } else {
            write!(f, "L{}-{}", self.start, self.end)
        }
    }
}

/// A file located inside a named project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    pub project_name: String,
    pub project_root: PathBuf,
    pub file: PathBuf,
}

impl ProjectFile {
    pub fn new(
        project_name: impl Into<String>,
        project_root: impl Into<PathBuf>,
        file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            project_root: project_root.into(),
            file: file.into(),
        }
    }

    /// `<project>/<path under root>` with `/` separators.
    ///
    /// Files outside the project root fall back to `<project>/<file name>`.
    pub fn relative_path(&self) -> Option<String> {
        let relative = self
            .file
            .strip_prefix(&self.project_root)
            .ok()
            .map(slash_path)
            .filter(|p| !p.is_empty())
            .or_else(|| {
                self.file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })?;

        Some(format!("{}/{relative}", self.project_name))
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Lines spanned by `selection`.
///
/// Blank or whitespace-only selections count as no selection.
pub fn line_range(doc: &Document, selection: Selection) -> Result<Option<LineRange>, PathRefError> {
    let text = doc
        .slice(selection)
        .ok_or(PathRefError::OffsetOutOfRange {
            start: selection.start,
            end: selection.end,
            len: doc.char_len(),
        })?;

    if text.trim().is_empty() {
        return Ok(None);
    }

    Ok(Some(LineRange {
        start: doc.line_number(selection.start) + 1,
        end: doc.line_number(selection.end) + 1,
    }))
}

pub fn format_reference(path: &str, range: Option<LineRange>) -> String {
    match range {
        Some(range) => format!("@{path}#{range}"),
        None => format!("@{path}"),
    }
}

/// Reference for `file`, with the selected lines when there is a selection.
pub fn reference_for(
    file: &ProjectFile,
    doc: &Document,
    selection: Option<Selection>,
) -> Result<String, PathRefError> {
    let path = file
        .relative_path()
        .ok_or_else(|| PathRefError::NoFileName(file.file.clone()))?;

    let range = match selection {
        Some(selection) => line_range(doc, selection)?,
        None => None,
    };

    Ok(format_reference(&path, range))
}
