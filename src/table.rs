//! Table normalization: markdown pipe tables → grid tables, and grid table
//! re-measurement.
//!
//! docutils is strict about grid tables: every `+` must line up and every
//! cell must fit its column. Both rewrites below rebuild tables from their
//! cell contents through a single [`GridLayout`], so the output always has
//! equal cell counts per row and border segments of `max(cell width) + 2`.
//!
//! ```text
//! | Name | Role  |         +------+------+
//! | ---- | :---: |    →    | Name | Role |
//! | Ada  | Lead  |         +======+======+
//!                          | Ada  | Lead |
//!                          +------+------+
//! ```

use crate::text::{char_len, join_lines, split_lines};

/// A table block the rewrites refuse to touch.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRejected {
    /// 1-based line number where the offending block starts.
    pub line: usize,
    pub detail: &'static str,
}

/// Rewritten text plus the blocks that were left exactly as written.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRewrite {
    pub text: String,
    pub rejected: Vec<TableRejected>,
}

/// Column widths for a set of padded rows.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    widths: Vec<usize>,
}

impl GridLayout {
    /// Measure rows that have already been padded to the same length.
    pub fn measure(rows: &[Vec<String>]) -> Self {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let widths = (0..columns)
            .map(|c| {
                rows.iter()
                    .filter_map(|r| r.get(c))
                    .map(|cell| char_len(cell))
                    .max()
                    .unwrap_or(0)
                    .max(1)
            })
            .collect();
        Self { widths }
    }

    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    /// A horizontal border drawn with `fill` (`-` or `=`).
    pub fn border(&self, fill: char) -> String {
        let mut line = String::from("+");
        for w in &self.widths {
            line.extend(std::iter::repeat_n(fill, w + 2));
            line.push('+');
        }
        line
    }

    /// A data row; missing cells render empty.
    pub fn row(&self, cells: &[String]) -> String {
        let mut line = String::from("|");
        for (idx, w) in self.widths.iter().enumerate() {
            let cell = cells.get(idx).map(String::as_str).unwrap_or("");
            line.push(' ');
            line.push_str(cell);
            line.extend(std::iter::repeat_n(' ', w.saturating_sub(char_len(cell))));
            line.push_str(" |");
        }
        line
    }
}

/// Pad every row with empty cells up to the widest row.
fn pad_rows(rows: &mut [Vec<String>]) {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in rows.iter_mut() {
        row.resize(columns, String::new());
    }
}

/// Tabs are expanded to 8-column stops by docutils, so a block holding one
/// cannot be measured in chars.
fn reject_tabs(block: &[&str], start: usize) -> Option<TableRejected> {
    block.iter().any(|l| l.contains('\t')).then(|| TableRejected {
        line: start + 1,
        detail: "tab character inside table",
    })
}

// ============================================================================
// Markdown pipe tables
// ============================================================================

fn is_pipe_row(line: &str) -> bool {
    let s = line.trim();
    s.len() >= 2 && s.starts_with('|') && s.ends_with('|') && s[1..s.len() - 1].contains('|')
}

/// Separator row such as `| --- | :---: | ---- |`.
fn is_pipe_separator(line: &str) -> bool {
    let s = line.trim();
    if s.len() < 2 || !s.starts_with('|') || !s.ends_with('|') {
        return false;
    }
    let segments: Vec<&str> = s[1..s.len() - 1].split('|').map(str::trim).collect();
    segments.iter().all(|seg| {
        let core: String = seg.chars().filter(|&c| c != ':').collect();
        core.len() >= 3 && core.chars().all(|c| c == '-')
    })
}

fn parse_pipe_row(line: &str) -> Vec<String> {
    let s = line.trim();
    s[1..s.len() - 1]
        .split('|')
        .map(|cell| cell.trim().to_string())
        .collect()
}

/// Convert markdown pipe tables into grid tables.
///
/// A table is a pipe row immediately followed by a separator row; every
/// following pipe row is a body row. Lines outside tables pass through in
/// their original order, as do tables containing a tab.
pub fn markdown_to_grid(text: &str) -> TableRewrite {
    let src = split_lines(text);
    let lines = &src.lines;
    let n = lines.len();
    let mut out: Vec<String> = Vec::with_capacity(n);
    let mut rejected = Vec::new();
    let mut i = 0;

    while i < n {
        if i + 1 < n && is_pipe_row(lines[i]) && is_pipe_separator(lines[i + 1]) {
            let mut j = i + 2;
            while j < n && is_pipe_row(lines[j]) {
                j += 1;
            }
            if let Some(rejection) = reject_tabs(&lines[i..j], i) {
                rejected.push(rejection);
                out.extend(lines[i..j].iter().map(|l| l.to_string()));
                i = j;
                continue;
            }

            let mut rows = Vec::with_capacity(j - i - 1);
            rows.push(parse_pipe_row(lines[i]));
            rows.extend(lines[i + 2..j].iter().map(|l| parse_pipe_row(l)));
            pad_rows(&mut rows);
            let layout = GridLayout::measure(&rows);

            out.push(layout.border('-'));
            out.push(layout.row(&rows[0]));
            out.push(layout.border('='));
            for row in &rows[1..] {
                out.push(layout.row(row));
                out.push(layout.border('-'));
            }

            i = j;
            continue;
        }

        out.push(lines[i].to_string());
        i += 1;
    }

    TableRewrite {
        text: join_lines(&out, src.trailing_newline),
        rejected,
    }
}

// ============================================================================
// Grid tables
// ============================================================================

fn is_grid_border(line: &str) -> bool {
    line.len() >= 2
        && line.starts_with('+')
        && line.ends_with('+')
        && line[1..line.len() - 1]
            .chars()
            .all(|c| matches!(c, '-' | '=' | '+'))
}

fn is_grid_row(line: &str) -> bool {
    line.len() >= 2 && line.starts_with('|') && line.ends_with('|')
}

/// Header separator: only `=` once the `+` joints are removed.
fn is_header_border(line: &str) -> bool {
    let fill: Vec<char> = line.chars().filter(|&c| c != '+').collect();
    !fill.is_empty() && fill.iter().all(|&c| c == '=')
}

/// Split a grid row into cells. One space of padding on each side is
/// removed when present on both sides; otherwise the cell is trimmed.
fn split_grid_row(line: &str) -> Vec<String> {
    line[1..line.len() - 1]
        .split('|')
        .map(|cell| {
            if cell.len() >= 2 && cell.starts_with(' ') && cell.ends_with(' ') {
                cell[1..cell.len() - 1].to_string()
            } else {
                cell.trim().to_string()
            }
        })
        .collect()
}

/// Re-measure grid tables so borders and column widths are consistent.
///
/// A block starts at a border line and continues over contiguous border and
/// row lines. A block with no data rows, or with a tab in it, is left
/// exactly as written.
pub fn normalize_grid_tables(text: &str) -> TableRewrite {
    let src = split_lines(text);
    let lines = &src.lines;
    let n = lines.len();
    let mut out: Vec<String> = Vec::with_capacity(n);
    let mut rejected = Vec::new();
    let mut i = 0;

    while i < n {
        if is_grid_border(lines[i]) {
            let mut j = i;
            let mut rows: Vec<Vec<String>> = Vec::new();
            let mut header_at: Option<usize> = None;
            while j < n && (is_grid_border(lines[j]) || is_grid_row(lines[j])) {
                if is_grid_border(lines[j]) {
                    if header_at.is_none() && is_header_border(lines[j]) {
                        header_at = Some(rows.len());
                    }
                } else {
                    rows.push(split_grid_row(lines[j]));
                }
                j += 1;
            }

            if !rows.is_empty() {
                if let Some(rejection) = reject_tabs(&lines[i..j], i) {
                    rejected.push(rejection);
                    out.extend(lines[i..j].iter().map(|l| l.to_string()));
                    i = j;
                    continue;
                }
                pad_rows(&mut rows);
                let layout = GridLayout::measure(&rows);

                out.push(layout.border('-'));
                match header_at {
                    Some(at) if at <= 1 => {
                        out.push(layout.row(&rows[0]));
                        out.push(layout.border('='));
                        for row in &rows[1..] {
                            out.push(layout.row(row));
                            out.push(layout.border('-'));
                        }
                    }
                    _ => {
                        for row in &rows {
                            out.push(layout.row(row));
                            out.push(layout.border('-'));
                        }
                    }
                }

                i = j;
                continue;
            }
        }

        out.push(lines[i].to_string());
        i += 1;
    }

    TableRewrite {
        text: join_lines(&out, src.trailing_newline),
        rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn segment_widths(border: &str) -> Vec<usize> {
        border
            .trim_matches('+')
            .split('+')
            .map(|seg| seg.chars().count())
            .collect()
    }

    // =========================================================================
    // Markdown tables
    // =========================================================================

    #[test]
    fn pipe_table_becomes_grid_table() {
        let input = "| Name | Role |\n| ---- | :---: |\n| Ada | Lead |\n";
        let expected = "\
+------+------+
| Name | Role |
+======+======+
| Ada  | Lead |
+------+------+
";
        assert_eq!(markdown_to_grid(input).text, expected);
    }

    #[test]
    fn short_rows_are_padded() {
        let input = "| a | b | c |\n|---|---|---|\n| 1 | 2 |\n| 1 | 2 | 3 | 4 |";
        let out = markdown_to_grid(input).text;
        let rows: Vec<&str> = out.lines().filter(|l| l.starts_with('|')).collect();
        let counts: Vec<usize> = rows.iter().map(|r| r.matches('|').count()).collect();
        assert!(counts.iter().all(|&c| c == 5), "{out}");
    }

    #[test]
    fn border_widths_are_max_cell_plus_two() {
        let input = "| x | longer header |\n| --- | --- |\n| wide cell | y |\n";
        let out = markdown_to_grid(input).text;
        let border = out.lines().next().unwrap();
        assert_eq!(segment_widths(border), vec!["wide cell".len() + 2, "longer header".len() + 2]);
        for line in out.lines() {
            assert_eq!(line.chars().count(), border.chars().count());
        }
    }

    #[test]
    fn separator_requires_three_dashes() {
        let input = "| a | b |\n| -- | -- |\n| 1 | 2 |\n";
        assert_eq!(markdown_to_grid(input).text, input);
    }

    #[test]
    fn header_only_table() {
        let input = "| a | b |\n| --- | --- |\n";
        let expected = "+---+---+\n| a | b |\n+===+===+\n";
        assert_eq!(markdown_to_grid(input).text, expected);
    }

    #[test]
    fn surrounding_text_keeps_its_order() {
        let input = "Before.\n\n| a | b |\n| --- | --- |\n| 1 | 2 |\n\nBetween.\n\n| c | d |\n| --- | --- |\n\nAfter.";
        let out = markdown_to_grid(input).text;
        let before = out.find("Before.").unwrap();
        let between = out.find("Between.").unwrap();
        let after = out.find("After.").unwrap();
        assert!(before < between && between < after);
        assert_eq!(out.matches("+===+===+").count(), 2);
        assert!(out.ends_with("After."));
    }

    #[test]
    fn empty_column_gets_minimum_width() {
        let input = "| a |  |\n| --- | --- |\n";
        let out = markdown_to_grid(input).text;
        assert!(out.starts_with("+---+---+\n| a |   |\n"));
    }

    #[test]
    fn tab_inside_pipe_table_is_rejected() {
        let input = "text\n| a\t| b |\n| --- | --- |\n";
        let out = markdown_to_grid(input);
        assert_eq!(out.text, input);
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].line, 2);
    }

    #[test]
    fn tab_blocks_only_its_own_pipe_table() {
        let input = "| a | b |\n| --- | --- |\n| 1 | 2 |\n\nLater:\n\n| x | y |\n| --- | --- |\n| t\tab | z |\n";
        let out = markdown_to_grid(input);
        assert_eq!(
            out.text,
            "+---+---+\n| a | b |\n+===+===+\n| 1 | 2 |\n+---+---+\n\nLater:\n\n| x | y |\n| --- | --- |\n| t\tab | z |\n"
        );
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].line, 7);
    }

    // =========================================================================
    // Grid tables
    // =========================================================================

    #[test]
    fn ragged_grid_table_is_remeasured() {
        let input = "\
+---+---+
| Name | Role |
+===+
| Ada | Lead engineer |
+--+
";
        let expected = "\
+------+---------------+
| Name | Role          |
+======+===============+
| Ada  | Lead engineer |
+------+---------------+
";
        assert_eq!(normalize_grid_tables(input).text, expected);
    }

    #[test]
    fn table_without_header_separator_has_no_header() {
        let input = "+--+\n| a | b |\n+--+\n| c | d |\n+--+\n";
        let expected = "+---+---+\n| a | b |\n+---+---+\n| c | d |\n+---+---+\n";
        assert_eq!(normalize_grid_tables(input).text, expected);
    }

    #[test]
    fn late_header_separator_is_ignored() {
        let input = "+-+\n| a |\n| b |\n+===+\n| c |\n+-+\n";
        let out = normalize_grid_tables(input).text;
        assert!(!out.contains('='));
    }

    #[test]
    fn bare_border_without_rows_passes_through() {
        let input = "text\n+----+\n\nmore\n";
        assert_eq!(normalize_grid_tables(input).text, input);
    }

    #[test]
    fn renormalizing_is_idempotent() {
        let input = "\
+-+
|  x | long value |
+=+
| y |  |
| z | w |
+-+
";
        let once = normalize_grid_tables(input).text;
        let twice = normalize_grid_tables(&once).text;
        assert_eq!(twice, once);
    }

    #[test]
    fn converted_markdown_survives_renormalization() {
        let input = "| a | bb |\n| --- | --- |\n| ccc | d |\n";
        let grid = markdown_to_grid(input).text;
        assert_eq!(normalize_grid_tables(&grid).text, grid);
    }

    #[test]
    fn cell_content_kept_modulo_single_space_trim() {
        assert_eq!(
            split_grid_row("|  indented | tight|"),
            vec![" indented".to_string(), "tight".to_string()]
        );
    }

    #[test]
    fn tab_inside_grid_table_is_rejected() {
        let input = "+--+\n| a\t|\n+--+\n";
        let out = normalize_grid_tables(input);
        assert_eq!(out.text, input);
        assert_eq!(out.rejected[0].line, 1);
    }

    #[test]
    fn tab_blocks_only_its_own_grid_table() {
        let input = "+--+\n| a\t|\n+--+\n\n+-+\n| b | long |\n+-+\n";
        let out = normalize_grid_tables(input);
        assert_eq!(
            out.text,
            "+--+\n| a\t|\n+--+\n\n+---+------+\n| b | long |\n+---+------+\n"
        );
        assert_eq!(out.rejected.len(), 1);
    }

    #[test]
    fn layout_measures_in_chars() {
        let rows = vec![vec!["Café".to_string(), "x".to_string()]];
        let layout = GridLayout::measure(&rows);
        assert_eq!(layout.widths(), &[4, 1]);
        assert_eq!(layout.row(&rows[0]), "| Café | x |");
    }
}
