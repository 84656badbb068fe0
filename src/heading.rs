//! Heading adornment normalization.
//!
//! reStructuredText marks section titles with a line of repeated punctuation
//! under the title (and optionally over it). docutils warns when the adornment
//! is shorter than the title, and authors rarely count characters, so every
//! recognized heading is rewritten with an adornment exactly as long as its
//! title:
//!
//! ```text
//! Title            Title
//! ==          →    =====
//!
//! ~~~~             ~~~~~~~~~~
//! A Subtitle  →    A Subtitle
//! ~~~~             ~~~~~~~~~~
//! ```
//!
//! The scan is a single forward pass over the lines; emitted output is never
//! re-examined.

use crate::text::{char_len, join_lines, split_lines};

/// Characters docutils accepts as section adornments.
pub const ADORNMENT_CHARS: &[char] = &[
    '=', '-', '~', '`', '^', '"', '\'', '*', '+', '#', '<', '>', '_',
];

/// Result of a normalization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingFixes {
    pub text: String,
    /// Headings whose adornment (or title whitespace) actually changed.
    pub fixes: usize,
}

/// Return the adornment character if `line` is an adornment line.
///
/// The first character must be in [`ADORNMENT_CHARS`] and every character of
/// the whitespace-trimmed line must equal it.
pub fn adornment_char(line: &str) -> Option<char> {
    let first = line.chars().next()?;
    if !ADORNMENT_CHARS.contains(&first) {
        return None;
    }
    line.trim().chars().all(|c| c == first).then_some(first)
}

fn is_title(line: &str) -> bool {
    !line.trim().is_empty() && adornment_char(line).is_none()
}

/// Rewrite every heading so its adornment length equals its title length.
///
/// Recognizes overline style (adornment, title, adornment of the same
/// character) and underline style (title, adornment). A blank line is never a
/// title, so transitions (`----` after a blank line) pass through untouched.
pub fn normalize_headings(text: &str) -> HeadingFixes {
    let src = split_lines(text);
    let lines = &src.lines;
    let n = lines.len();
    let mut out: Vec<String> = Vec::with_capacity(n);
    let mut fixes = 0;
    let mut i = 0;

    while i < n {
        if i + 2 < n
            && let (Some(over), Some(under)) = (adornment_char(lines[i]), adornment_char(lines[i + 2]))
            && over == under
            && is_title(lines[i + 1])
        {
            let title = lines[i + 1].trim_end();
            let adornment = over.to_string().repeat(char_len(title));
            if lines[i] != adornment || lines[i + 1] != title || lines[i + 2] != adornment {
                fixes += 1;
            }
            out.push(adornment.clone());
            out.push(title.to_string());
            out.push(adornment);
            i += 3;
            continue;
        }

        if i + 1 < n
            && is_title(lines[i])
            && let Some(ch) = adornment_char(lines[i + 1])
        {
            let title = lines[i].trim_end();
            let adornment = ch.to_string().repeat(char_len(title));
            if lines[i] != title || lines[i + 1] != adornment {
                fixes += 1;
            }
            out.push(title.to_string());
            out.push(adornment);
            i += 2;
            continue;
        }

        out.push(lines[i].to_string());
        i += 1;
    }

    HeadingFixes {
        text: join_lines(&out, src.trailing_newline),
        fixes,
    }
}
