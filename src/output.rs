//! CLI output formatting for the batch commands.
//!
//! # Format
//!
//! ```text
//! Formatting 3 RST files in _posts
//! 001 2024-01-01-hello.rst
//!     2 fixes (1 heading, 1 front matter)
//! 002 2024-02-10-tables.rst
//!     No changes needed
//! 003 broken.rst
//!     Error: stream did not contain valid UTF-8
//! Modified 1/3 files, 2 fixes
//! Errors: 1 file
//! ```
//!
//! With `--check` the per-file line reads `Needs 2 fixes (...)` and the
//! summary `Would modify 1/3 files`.
//!
//! # Attachments
//!
//! ```text
//! Attachments
//!     Total: 3
//!     References: 4
//!     Referenced files: 2
//! Categories
//!     images: 2 files
//!     research: 1 file
//! Most referenced
//!     001 diagram.png (3 references)
//!     002 paper.pdf (1 reference)
//! Data
//!     _data/attachment_galleries.yml
//!     _data/attachment_references.yml
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::attachments::IndexSummary;
use crate::format::{FileStatus, FormatReport};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 file`, `2 files`.
fn plural(n: usize, noun: &str) -> String {
    match (n, noun.ends_with('x')) {
        (1, _) => format!("{n} {noun}"),
        (_, true) => format!("{n} {noun}es"),
        _ => format!("{n} {noun}s"),
    }
}

/// Show a path relative to `base` when it lives under it.
fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn fix_detail(heading_fixes: usize, frontmatter_fixes: usize) -> String {
    let mut parts = Vec::new();
    if heading_fixes > 0 {
        parts.push(plural(heading_fixes, "heading"));
    }
    if frontmatter_fixes > 0 {
        parts.push(format!("{frontmatter_fixes} front matter"));
    }
    parts.join(", ")
}

// ============================================================================
// Format
// ============================================================================

pub fn format_format_report(report: &FormatReport, site_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "Formatting {} in {}",
        plural(report.files.len(), "RST file"),
        display_path(&report.dir, site_root)
    ));

    for (i, (name, status)) in report.files.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), name));
        let detail = match status {
            FileStatus::Modified {
                heading_fixes,
                frontmatter_fixes,
            } => {
                let verb = if report.written { "" } else { "Needs " };
                format!(
                    "{verb}{} ({})",
                    plural(status.fixes(), "fix"),
                    fix_detail(*heading_fixes, *frontmatter_fixes)
                )
            }
            FileStatus::Unchanged => "No changes needed".to_string(),
            FileStatus::Error(message) => format!("Error: {message}"),
        };
        lines.push(format!("{}{}", indent(1), detail));
    }

    let verb = if report.written {
        "Modified"
    } else {
        "Would modify"
    };
    lines.push(format!(
        "{verb} {}/{} files, {}",
        report.modified(),
        report.files.len(),
        plural(report.total_fixes(), "fix")
    ));
    if report.errors() > 0 {
        lines.push(format!("Errors: {}", plural(report.errors(), "file")));
    }
    lines
}

/// Print formatter output to stdout.
pub fn print_format_report(report: &FormatReport, site_root: &Path) {
    for line in format_format_report(report, site_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Attachments
// ============================================================================

pub fn format_index_summary(summary: &IndexSummary, site_root: &Path) -> Vec<String> {
    let mut lines = vec![
        "Attachments".to_string(),
        format!("{}Total: {}", indent(1), summary.total_attachments),
        format!("{}References: {}", indent(1), summary.total_references),
        format!("{}Referenced files: {}", indent(1), summary.referenced_files),
    ];

    if !summary.categories.is_empty() {
        lines.push("Categories".to_string());
        for (name, count) in &summary.categories {
            lines.push(format!("{}{}: {}", indent(1), name, plural(*count, "file")));
        }
    }

    if !summary.top_referenced.is_empty() {
        lines.push("Most referenced".to_string());
        for (i, (filename, count)) in summary.top_referenced.iter().enumerate() {
            lines.push(format!(
                "{}{} {} ({})",
                indent(1),
                format_index(i + 1),
                filename,
                plural(*count, "reference")
            ));
        }
    }

    lines.push("Data".to_string());
    for file in [&summary.galleries_file, &summary.references_file] {
        lines.push(format!("{}{}", indent(1), display_path(file, site_root)));
    }
    lines
}

/// Print indexer output to stdout.
pub fn print_index_summary(summary: &IndexSummary, site_root: &Path) {
    for line in format_index_summary(summary, site_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
