//! HTML post-processing of the docutils fragment.
//!
//! The site theme expects a few things docutils does not produce on its own:
//!
//! - **Heading ids**: the table-of-contents script looks for `id` on the
//!   heading, while docutils puts it on the enclosing section container.
//! - **Table widths**: the extended `list-table` option `:custom-table-width:`
//!   only leaves an `rst-cw-<value>` class behind; the width has to become an
//!   inline style.
//! - **Diagrams**: diagram sources arrive as line-numbered code figures; the
//!   theme renders `<pre class="language-mermaid">` blocks client-side.
//!
//! The input is markup docutils just produced, so its shape is known and
//! narrow; regexes are enough. Each processor is idempotent and leaves any
//! element it does not recognize exactly as it was.

use maud::html;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Class prefix carrying a custom table width (`rst-cw-80pct`, `rst-cw-960px`).
pub const TABLE_WIDTH_MARKER: &str = "rst-cw";

/// First tokens that identify a diagram source.
pub const DEFAULT_DIAGRAM_KEYWORDS: &[&str] = &[
    "mindmap",
    "graph",
    "flowchart",
    "sequenceDiagram",
    "classDiagram",
    "stateDiagram",
    "erDiagram",
    "gantt",
    "pie",
    "journey",
    "gitGraph",
];

/// `<div class="section" id="…">` (html4 writer) or `<section id="…">` (html5).
static SECTION_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<(?:div\s+class="section"\s+id="([^"]+)"|section\s+id="([^"]+)")\s*>"#)
        .unwrap()
});

static HEADING_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\s*)<(h[1-6])([^>]*)>").unwrap());

static ID_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bid\s*=").unwrap());

static TABLE_WIDTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(?i)<table\b[^>]*class="[^"]*\b{TABLE_WIDTH_MARKER}-([^\s"]+)[^"]*"[^>]*>"#
    ))
    .unwrap()
});

static STYLE_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"style="([^"]*)""#).unwrap());

static CODE_FIGURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<figure\s+class="code">.*?<td\s+class="code"><pre><code\s+class="[^"]*">(.*?)</code></pre></td>.*?</figure>"#,
    )
    .unwrap()
});

static LINE_SPAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<span class="line">(?:<span></span>)?(.*?)</span>"#).unwrap()
});

// ============================================================================
// Heading ids
// ============================================================================

/// Copy each section container's id onto its first heading.
///
/// Only a heading directly after the container (whitespace allowed) is
/// considered. Headings that already carry an id are left byte-identical.
pub fn assign_section_ids(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + 64);
    let mut pos = 0;
    let mut assigned = 0;

    for caps in SECTION_OPEN_RE.captures_iter(html) {
        let Some(open) = caps.get(0) else { continue };
        if open.start() < pos {
            continue;
        }
        let id = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());

        out.push_str(&html[pos..open.end()]);
        pos = open.end();

        if let Some(heading) = HEADING_OPEN_RE.captures(&html[pos..]) {
            let whole = &heading[0];
            if ID_ATTR_RE.is_match(&heading[3]) {
                out.push_str(whole);
            } else {
                out.push_str(&format!(
                    r#"{}<{}{} id="{}">"#,
                    &heading[1], &heading[2], &heading[3], id
                ));
                assigned += 1;
            }
            pos += whole.len();
        }
    }
    out.push_str(&html[pos..]);

    if assigned > 0 {
        tracing::debug!(count = assigned, "Assigned section ids to headings");
    }
    out
}

// ============================================================================
// Table widths
// ============================================================================

/// Turn the class suffix into a CSS length: `80pct` → `80%`, others verbatim.
pub fn decode_width(token: &str) -> String {
    token.trim().replace("pct", "%")
}

fn style_table_tag(tag: &str, width: &str) -> String {
    let declaration = format!("width: {width}; max-width: none;");
    match STYLE_ATTR_RE.captures(tag) {
        Some(style) => {
            let existing = &style[1];
            if existing.contains(&format!("width: {width}")) {
                return tag.to_string();
            }
            let existing = existing.trim().trim_end_matches(';');
            let merged = if existing.is_empty() {
                declaration
            } else {
                format!("{existing}; {declaration}")
            };
            STYLE_ATTR_RE
                .replace(tag, |_: &Captures| format!(r#"style="{merged}""#))
                .into_owned()
        }
        None => {
            let body = tag.strip_suffix('>').unwrap_or(tag);
            format!(r#"{body} style="{declaration}">"#)
        }
    }
}

/// Apply `rst-cw-<value>` table classes as inline `width` styles.
pub fn apply_table_widths(html: &str) -> String {
    TABLE_WIDTH_RE
        .replace_all(html, |caps: &Captures| {
            style_table_tag(&caps[0], &decode_width(&caps[1]))
        })
        .into_owned()
}

// ============================================================================
// Diagram blocks
// ============================================================================

/// Recover the source text of a line-numbered code figure.
///
/// Each `<span class="line">` is one source line; entities are decoded,
/// whitespace-only lines become empty, and the result is trimmed.
fn code_figure_text(code: &str) -> String {
    let lines: Vec<String> = LINE_SPAN_RE
        .captures_iter(code)
        .map(|line| {
            let decoded = html_escape::decode_html_entities(&line[1]);
            if decoded.trim().is_empty() {
                String::new()
            } else {
                decoded.trim_end().to_string()
            }
        })
        .collect();
    lines.join("\n").trim().to_string()
}

fn diagram_wrapper(source: &str) -> String {
    let markup = html! {
        div class="mermaid-wrapper" {
            "\n"
            pre class="language-mermaid" { code { (source) } }
            "\n"
        }
    };
    format!("{}\n", markup.into_string())
}

/// Replace code figures whose first token is a diagram keyword with the
/// theme's diagram wrapper. Other code figures are returned unchanged.
pub fn reshape_diagram_blocks<S: AsRef<str>>(html: &str, keywords: &[S]) -> String {
    CODE_FIGURE_RE
        .replace_all(html, |caps: &Captures| {
            let source = code_figure_text(&caps[1]);
            match source.split_whitespace().next() {
                Some(first) if keywords.iter().any(|k| k.as_ref() == first) => {
                    tracing::debug!(kind = first, "Reshaped diagram block");
                    diagram_wrapper(&source)
                }
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}
