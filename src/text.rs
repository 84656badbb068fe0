//! Line-level helpers shared by every text rewrite.
//!
//! Rewrites work on a list of lines and join them back with `\n`. A document
//! that ended with a newline still ends with one afterwards, so running a
//! stage over `"Title\n==\n"` yields `"Title\n=====\n"` rather than losing the
//! final line break.

/// A document split into lines, remembering its trailing newline.
#[derive(Debug, Clone, PartialEq)]
pub struct Lines<'a> {
    pub lines: Vec<&'a str>,
    pub trailing_newline: bool,
}

/// Split text into lines. `\r\n` endings are accepted; the `\r` is dropped.
pub fn split_lines(text: &str) -> Lines<'_> {
    Lines {
        lines: text.lines().collect(),
        trailing_newline: text.ends_with('\n'),
    }
}

/// Join rewritten lines, restoring the trailing newline of the source.
pub fn join_lines<S: AsRef<str>>(lines: &[S], trailing_newline: bool) -> String {
    let mut out = String::with_capacity(lines.iter().map(|l| l.as_ref().len() + 1).sum());
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line.as_ref());
    }
    if trailing_newline && !lines.is_empty() {
        out.push('\n');
    }
    out
}

/// Width of a string in characters (code points).
///
/// docutils measures titles and table cells in characters, not bytes.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_join_keep_trailing_newline() {
        let lines = split_lines("a\nb\n");
        assert_eq!(lines.lines, vec!["a", "b"]);
        assert!(lines.trailing_newline);
        assert_eq!(join_lines(&lines.lines, lines.trailing_newline), "a\nb\n");
    }

    #[test]
    fn join_without_trailing_newline() {
        let lines = split_lines("a\nb");
        assert_eq!(join_lines(&lines.lines, lines.trailing_newline), "a\nb");
    }

    #[test]
    fn crlf_is_normalized() {
        let lines = split_lines("a\r\nb\r\n");
        assert_eq!(lines.lines, vec!["a", "b"]);
        assert_eq!(join_lines(&lines.lines, true), "a\nb\n");
    }

    #[test]
    fn empty_text_stays_empty() {
        let lines = split_lines("");
        assert!(lines.lines.is_empty());
        assert_eq!(join_lines(&lines.lines, lines.trailing_newline), "");
    }

    #[test]
    fn char_len_counts_code_points() {
        assert_eq!(char_len("Café"), 4);
        assert_eq!("Café".len(), 5);
    }
}
