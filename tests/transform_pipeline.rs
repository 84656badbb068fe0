//! End-to-end render through the public API with a canned parser.
//!
//! The fake parser stands in for docutils: it records the text it was handed
//! and answers with fixed HTML, so everything around the parse (preprocessing,
//! part selection, post-processing, diagnostics) is exercised without Python.

use pretty_assertions::assert_eq;
use rst_forge::docutils::{ParseOutput, ParseRequest, ParserError, ParserSettings, RstParser};
use rst_forge::transform::{RenderOptions, SourceText, render};
use std::cell::RefCell;
use std::collections::BTreeMap;

struct CannedParser {
    fragment: String,
    received: RefCell<Option<(String, ParserSettings)>>,
}

impl CannedParser {
    fn new(fragment: &str) -> Self {
        Self {
            fragment: fragment.to_string(),
            received: RefCell::new(None),
        }
    }

    fn received_text(&self) -> String {
        self.received.borrow().as_ref().unwrap().0.clone()
    }
}

impl RstParser for CannedParser {
    fn parse(
        &self,
        source: &str,
        request: &ParseRequest,
        settings: &ParserSettings,
    ) -> Result<ParseOutput, ParserError> {
        *self.received.borrow_mut() = Some((source.to_string(), settings.clone()));
        let mut parts = BTreeMap::new();
        parts.insert("fragment".to_string(), self.fragment.clone());
        parts.insert("title".to_string(), "Ignored".to_string());
        let path = request.source_path.as_deref().unwrap_or("<string>");
        Ok(ParseOutput {
            parts,
            diagnostics: format!("{path}:2: (INFO/1) Duplicate implicit target name.\n"),
        })
    }
}

fn source(text: &str) -> SourceText {
    SourceText {
        text: text.to_string(),
        source_path: Some("_posts/2024-01-01-post.rst".to_string()),
    }
}

#[test]
fn short_underline_reaches_parser_fixed() {
    let parser = CannedParser::new("<p>ok</p>");
    render(&parser, &source("Title\n==\n"), &RenderOptions::default()).unwrap();
    assert_eq!(parser.received_text(), "Title\n=====\n");
}

#[test]
fn pipe_table_and_heading_rewritten_together() {
    let parser = CannedParser::new("");
    let text = "Results\n===\n\n| name | score |\n|------|------:|\n| ada | 9 |\n";
    render(&parser, &source(text), &RenderOptions::default()).unwrap();
    assert_eq!(
        parser.received_text(),
        concat!(
            "Results\n",
            "=======\n",
            "\n",
            "+------+-------+\n",
            "| name | score |\n",
            "+======+=======+\n",
            "| ada  | 9     |\n",
            "+------+-------+\n",
        )
    );
}

#[test]
fn fragment_gets_every_postprocessor() {
    let fragment = concat!(
        r#"<div class="section" id="setup"><h2>Setup</h2>"#,
        r#"<table class="docutils rst-cw-960px"><tr><td>x</td></tr></table>"#,
        r#"<figure class="code"><table><tr><td class="code"><pre><code class="text">"#,
        r#"<span class="line"><span></span>graph TD</span>"#,
        "\n",
        r#"<span class="line"><span></span>  A --&gt; B</span>"#,
        r#"</code></pre></td></tr></table></figure></div>"#,
    );
    let parser = CannedParser::new(fragment);
    let out = render(&parser, &source("Setup\n=====\n"), &RenderOptions::default()).unwrap();

    assert!(out.html.contains(r#"<h2 id="setup">Setup</h2>"#));
    assert!(out.html.contains("width: 960px"));
    assert!(out.html.contains(
        "<div class=\"mermaid-wrapper\">\n<pre class=\"language-mermaid\"><code>graph TD\n  A --&gt; B</code></pre>\n</div>\n"
    ));
    assert_eq!(
        out.diagnostics,
        "_posts/2024-01-01-post.rst:2: (INFO/1) Duplicate implicit target name.\n"
    );
}

#[test]
fn settings_value_is_passed_through() {
    let parser = CannedParser::new("");
    let mut options = RenderOptions::default();
    options.settings.halt_level = 3;
    options
        .settings
        .extra
        .insert("smart_quotes".into(), serde_json::Value::Bool(true));
    render(&parser, &source("x\n"), &options).unwrap();

    let received = parser.received.borrow();
    let settings = &received.as_ref().unwrap().1;
    assert_eq!(settings.halt_level, 3);
    let overrides = settings.to_overrides();
    assert_eq!(overrides["smart_quotes"], serde_json::Value::Bool(true));
    assert_eq!(overrides["file_insertion_enabled"], serde_json::Value::Bool(false));
}

#[test]
fn other_parts_can_be_selected() {
    let parser = CannedParser::new("<p>body</p>");
    let options = RenderOptions {
        part: "title".into(),
        ..RenderOptions::default()
    };
    let out = render(&parser, &source("x\n"), &options).unwrap();
    assert_eq!(out.html, "Ignored");
}

#[test]
fn malformed_table_does_not_block_render() {
    let parser = CannedParser::new("<p>ok</p>");
    let text = "+----+\n| a\tb |\n+----+\n\nHeading\n-\n";
    let out = render(&parser, &source(text), &RenderOptions::default()).unwrap();
    assert_eq!(out.html, "<p>ok</p>");
    assert_eq!(
        parser.received_text(),
        "+----+\n| a\tb |\n+----+\n\nHeading\n-------\n"
    );
}
