//! External RST parser invocation.
//!
//! The RST → HTML conversion itself belongs to docutils. This module only
//! decides *how* docutils is asked:
//!
//! - [`ParserSettings`] is the immutable settings value handed to every parse.
//!   File insertion and raw HTML passthrough are always disabled; the severity
//!   policy reports every message and halts on none of them; math renders
//!   client-side through MathJax.
//! - [`RstParser`] is the seam between the pipeline and the parser, so the
//!   transform can be exercised without a Python installation.
//! - [`DocutilsParser`] runs `python3 -c <driver>`: settings and writer name on
//!   argv, the document on stdin, the rendered parts back as JSON on stdout.
//!   Everything docutils prints to stderr is captured as diagnostics.
//!
//! docutils is always told the source is `<string>`; diagnostics are rewritten
//! to the real path afterwards (see [`rewrite_diagnostics`]).

use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::process::{Command, Stdio};
use thiserror::Error;

use crate::config::ParserConfig;

/// Placeholder docutils uses for a source without a path.
pub const UNKNOWN_SOURCE: &str = "<string>";

pub const DEFAULT_MATH_OUTPUT: &str =
    "MathJax https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js";

/// Python driver run with `-c`.
///
/// argv: `[settings JSON, writer name]`; stdin: UTF-8 document;
/// stdout: JSON object of the string-valued parts.
const DRIVER: &str = r#"
import json, sys
from docutils.core import publish_parts
settings = json.loads(sys.argv[1])
source = sys.stdin.buffer.read().decode("utf-8")
parts = publish_parts(
    source=source,
    source_path="<string>",
    settings_overrides=settings,
    writer_name=sys.argv[2],
)
sys.stdout.write(json.dumps({k: v for k, v in parts.items() if isinstance(v, str)}))
"#;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("IO error talking to the parser: {0}")]
    Io(#[from] std::io::Error),
    #[error("parser exited with {status}:\n{diagnostics}")]
    Failed { status: String, diagnostics: String },
    #[error("parser produced unreadable output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Settings passed to docutils for every parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserSettings {
    /// Lowest message level reported (1 = info … 5 = none).
    pub report_level: u8,
    /// Message level that aborts the parse (5 = never).
    pub halt_level: u8,
    pub math_output: String,
    pub initial_header_level: Option<u8>,
    /// Extra docutils settings from the command line.
    pub extra: BTreeMap<String, Value>,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            report_level: 1,
            halt_level: 5,
            math_output: DEFAULT_MATH_OUTPUT.to_string(),
            initial_header_level: None,
            extra: BTreeMap::new(),
        }
    }
}

impl ParserSettings {
    pub fn from_config(config: &ParserConfig) -> Self {
        Self {
            report_level: config.report_level,
            halt_level: config.halt_level,
            math_output: config.math_output.clone(),
            initial_header_level: config.initial_header_level,
            extra: BTreeMap::new(),
        }
    }

    /// Merge into the docutils `settings_overrides` mapping.
    ///
    /// Later layers win: severity policy, then command-line extras, then the
    /// fixed overrides and the math directive, which cannot be overridden.
    pub fn to_overrides(&self) -> serde_json::Map<String, Value> {
        let mut map = serde_json::Map::new();
        map.insert("report_level".into(), self.report_level.into());
        map.insert("halt_level".into(), self.halt_level.into());
        if let Some(level) = self.initial_header_level {
            map.insert("initial_header_level".into(), level.into());
        }
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }
        map.insert("file_insertion_enabled".into(), Value::Bool(false));
        map.insert("raw_enabled".into(), Value::Bool(false));
        map.insert("math_output".into(), Value::String(self.math_output.clone()));
        map
    }
}

/// Parse a `key=value` command-line setting.
///
/// Dashes in the key become underscores (`--setting tab-width=4` →
/// `tab_width`). The value is read as JSON when it parses (numbers, booleans),
/// otherwise kept as a string.
pub fn parse_setting(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim().replace('-', "_");
    if key.is_empty() {
        return Err(format!("empty setting name in `{raw}`"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key, value))
}

/// One parse request.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseRequest {
    /// docutils writer name (`html`, `html4`, `html5`, …).
    pub writer: String,
    /// Real path of the document, used in diagnostics.
    pub source_path: Option<String>,
}

/// Rendered parts plus everything the parser reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutput {
    pub parts: BTreeMap<String, String>,
    pub diagnostics: String,
}

pub trait RstParser {
    fn parse(
        &self,
        source: &str,
        request: &ParseRequest,
        settings: &ParserSettings,
    ) -> Result<ParseOutput, ParserError>;
}

/// Replace the `<string>:` placeholder with the real source path.
pub fn rewrite_diagnostics(diagnostics: &str, source_path: Option<&str>) -> String {
    match source_path {
        Some(path) => diagnostics.replace(&format!("{UNKNOWN_SOURCE}:"), &format!("{path}:")),
        None => diagnostics.to_string(),
    }
}

/// docutils run through a Python interpreter.
#[derive(Debug, Clone)]
pub struct DocutilsParser {
    pub python: String,
}

impl DocutilsParser {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }
}

impl RstParser for DocutilsParser {
    fn parse(
        &self,
        source: &str,
        request: &ParseRequest,
        settings: &ParserSettings,
    ) -> Result<ParseOutput, ParserError> {
        let overrides = Value::Object(settings.to_overrides()).to_string();
        let mut child = Command::new(&self.python)
            .arg("-c")
            .arg(DRIVER)
            .arg(overrides)
            .arg(&request.writer)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ParserError::Spawn {
                program: self.python.clone(),
                source,
            })?;

        // The driver reads all of stdin before producing any output. An
        // interpreter that exits early closes the pipe; its stderr says why.
        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(source.as_bytes())
            && e.kind() != std::io::ErrorKind::BrokenPipe
        {
            return Err(e.into());
        }
        let output = child.wait_with_output()?;

        let diagnostics = rewrite_diagnostics(
            &String::from_utf8_lossy(&output.stderr),
            request.source_path.as_deref(),
        );
        if !output.status.success() {
            return Err(ParserError::Failed {
                status: output.status.to_string(),
                diagnostics,
            });
        }

        let parts: BTreeMap<String, String> = serde_json::from_slice(&output.stdout)?;
        tracing::debug!(parts = parts.len(), writer = %request.writer, "docutils parse finished");
        Ok(ParseOutput { parts, diagnostics })
    }
}
