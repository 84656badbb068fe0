//! In-place RST source formatter.
//!
//! Two fixes, applied to every `*.rst` file directly in the posts directory:
//!
//! 1. **Front matter fence.** A post that opens with `---` but whose closing
//!    fence was mangled into a longer run of dashes gets it back, followed by
//!    a blank line. Without the fence the site generator cannot read the post.
//! 2. **Headings.** Adornments are resized to their titles (see
//!    [`crate::heading`]). Only the body is touched; front matter lines are
//!    never mistaken for headings.
//!
//! Files are written only when something changed.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::heading::normalize_headings;

/// A closing fence must appear before this line to count.
const FENCE_SEARCH_LINES: usize = 50;
/// How far a mangled fence is looked for.
const FENCE_REPAIR_LINES: usize = 30;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("{0} not found")]
    MissingDir(PathBuf),
    #[error("no RST files found in {0}")]
    NoFiles(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn is_fence(line: &str) -> bool {
    line.trim() == "---"
}

/// Repair a missing front matter closing fence.
///
/// Returns the text and the number of fixes (0 or 1). Text without front
/// matter, or whose fence is intact, comes back unchanged.
pub fn ensure_frontmatter_closing(text: &str) -> (String, usize) {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if !lines.first().is_some_and(|l| is_fence(l)) {
        return (text.to_string(), 0);
    }
    if lines
        .iter()
        .take(FENCE_SEARCH_LINES)
        .skip(1)
        .any(|l| is_fence(l))
    {
        return (text.to_string(), 0);
    }

    let mangled = lines
        .iter()
        .take(FENCE_REPAIR_LINES)
        .skip(1)
        .position(|l| {
            let l = l.trim();
            l.len() >= 3 && l.chars().all(|c| c == '-')
        })
        .map(|p| p + 1);
    let Some(i) = mangled else {
        return (text.to_string(), 0);
    };

    lines[i] = "---";
    if lines.get(i + 1).is_some_and(|l| !l.trim().is_empty()) {
        lines.insert(i + 1, "");
    }
    (lines.join("\n"), 1)
}

/// Byte offset just past the front matter's closing fence line.
fn front_matter_end(text: &str) -> Option<usize> {
    let mut offset = 0;
    for (i, line) in text.split_inclusive('\n').enumerate() {
        if i >= FENCE_SEARCH_LINES {
            break;
        }
        if is_fence(line) && i > 0 {
            return Some(offset + line.len());
        }
        if i == 0 && !is_fence(line) {
            return None;
        }
        offset += line.len();
    }
    None
}

/// Resize heading adornments in the body, leaving front matter alone.
///
/// Front matter that is opened but never closed leaves the whole text
/// unchanged, since there is no telling where the body starts.
pub fn standardize_headings(text: &str) -> (String, usize) {
    let (head, body) = match front_matter_end(text) {
        Some(end) => text.split_at(end),
        None if text.lines().next().is_some_and(is_fence) => {
            tracing::warn!("Front matter has no closing fence; headings left as they are");
            return (text.to_string(), 0);
        }
        None => ("", text),
    };
    let fixed = normalize_headings(body);
    (format!("{head}{}", fixed.text), fixed.fixes)
}

/// The formatted text and what was fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatChange {
    pub text: String,
    pub heading_fixes: usize,
    pub frontmatter_fixes: usize,
}

/// Run both fixes: fence first, so the body can be located, then headings.
///
/// A file written with `\r\n` line endings keeps them.
pub fn format_text(text: &str) -> FormatChange {
    if !text.contains("\r\n") {
        return format_lf(text);
    }
    let mut change = format_lf(&text.replace("\r\n", "\n"));
    change.text = change.text.replace('\n', "\r\n");
    change
}

fn format_lf(text: &str) -> FormatChange {
    let (fenced, frontmatter_fixes) = ensure_frontmatter_closing(text);
    let (text, heading_fixes) = standardize_headings(&fenced);
    FormatChange {
        text,
        heading_fixes,
        frontmatter_fixes,
    }
}

/// Outcome for one file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    Modified {
        heading_fixes: usize,
        frontmatter_fixes: usize,
    },
    Unchanged,
    Error(String),
}

impl FileStatus {
    pub fn fixes(&self) -> usize {
        match self {
            FileStatus::Modified {
                heading_fixes,
                frontmatter_fixes,
            } => heading_fixes + frontmatter_fixes,
            _ => 0,
        }
    }
}

/// Format one file. With `write` false the file is only checked.
pub fn format_file(path: &Path, write: bool) -> FileStatus {
    let original = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => return FileStatus::Error(e.to_string()),
    };
    let change = format_text(&original);
    if change.text == original {
        return FileStatus::Unchanged;
    }
    if write && let Err(e) = fs::write(path, &change.text) {
        return FileStatus::Error(e.to_string());
    }
    tracing::debug!(
        path = %path.display(),
        headings = change.heading_fixes,
        frontmatter = change.frontmatter_fixes,
        "Formatted"
    );
    FileStatus::Modified {
        heading_fixes: change.heading_fixes,
        frontmatter_fixes: change.frontmatter_fixes,
    }
}

/// Per-file results of a formatter run.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatReport {
    pub dir: PathBuf,
    /// File name and status, in file name order.
    pub files: Vec<(String, FileStatus)>,
    /// Whether changes were written back.
    pub written: bool,
}

impl FormatReport {
    pub fn modified(&self) -> usize {
        self.files
            .iter()
            .filter(|(_, s)| matches!(s, FileStatus::Modified { .. }))
            .count()
    }

    pub fn errors(&self) -> usize {
        self.files
            .iter()
            .filter(|(_, s)| matches!(s, FileStatus::Error(_)))
            .count()
    }

    pub fn total_fixes(&self) -> usize {
        self.files.iter().map(|(_, s)| s.fixes()).sum()
    }
}

/// Format every `*.rst` file directly inside `dir`.
pub fn format_posts(dir: &Path, write: bool) -> Result<FormatReport, FormatError> {
    if !dir.is_dir() {
        return Err(FormatError::MissingDir(dir.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "rst"))
        .collect();
    if paths.is_empty() {
        return Err(FormatError::NoFiles(dir.to_path_buf()));
    }
    paths.sort();

    let files = paths
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            (name, format_file(path, write))
        })
        .collect();

    Ok(FormatReport {
        dir: dir.to_path_buf(),
        files,
        written: write,
    })
}
