//! End-to-end RST → HTML fragment.
//!
//! ```text
//! source text → preprocess → docutils → part → heading ids → table widths → diagrams
//! ```
//!
//! The site's converter plugin calls `rst-forge transform` once per document
//! and reads the fragment from stdout; diagnostics are returned separately so
//! the caller can send them to stderr.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::docutils::{ParseRequest, ParserError, ParserSettings, RstParser};
use crate::{postprocess, preprocess};

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("failed to read standard input: {0}")]
    Stdin(io::Error),
    #[error(transparent)]
    Parser(#[from] ParserError),
}

/// The document to render and the path diagnostics should name.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceText {
    pub text: String,
    pub source_path: Option<String>,
}

impl SourceText {
    /// Resolve the input document.
    ///
    /// A positional argument is read as a file; if that fails, the argument
    /// itself is the document. Without an argument, stdin is read. An explicit
    /// `source_path` always wins over the argument's path.
    pub fn resolve(arg: Option<&str>, source_path: Option<String>) -> Result<Self, TransformError> {
        match arg {
            Some(arg) => Ok(Self::from_arg(arg, source_path)),
            None => {
                let mut text = String::new();
                io::stdin()
                    .read_to_string(&mut text)
                    .map_err(TransformError::Stdin)?;
                Ok(Self { text, source_path })
            }
        }
    }

    pub fn from_arg(arg: &str, source_path: Option<String>) -> Self {
        match fs::read_to_string(arg) {
            Ok(text) => Self {
                text,
                source_path: source_path.or_else(|| Some(arg.to_string())),
            },
            Err(e) => {
                tracing::debug!(error = %e, "Input is not a readable file; using it as literal text");
                Self {
                    text: arg.to_string(),
                    source_path,
                }
            }
        }
    }
}

/// Everything a render needs besides the parser.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub writer: String,
    pub part: String,
    pub settings: ParserSettings,
    pub diagram_keywords: Vec<String>,
    /// Write the preprocessed RST here before parsing.
    pub dump_preprocessed: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            writer: "html".to_string(),
            part: "fragment".to_string(),
            settings: ParserSettings::default(),
            diagram_keywords: postprocess::DEFAULT_DIAGRAM_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            dump_preprocessed: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    /// The requested part after post-processing; empty if docutils did not
    /// produce that part.
    pub html: String,
    /// Parser diagnostics with the real source path filled in.
    pub diagnostics: String,
}

fn dump(path: &Path, text: &str) {
    if let Err(e) = fs::write(path, text) {
        tracing::warn!(path = %path.display(), error = %e, "Failed to dump preprocessed RST");
    }
}

/// Run the post-processors in order.
pub fn postprocess_html(html: &str, diagram_keywords: &[String]) -> String {
    let html = postprocess::assign_section_ids(html);
    let html = postprocess::apply_table_widths(&html);
    postprocess::reshape_diagram_blocks(&html, diagram_keywords)
}

pub fn render<P: RstParser + ?Sized>(
    parser: &P,
    source: &SourceText,
    options: &RenderOptions,
) -> Result<Rendered, TransformError> {
    let pre = preprocess::preprocess(&source.text);
    if let Some(path) = &options.dump_preprocessed {
        dump(path, &pre.text);
    }

    let request = ParseRequest {
        writer: options.writer.clone(),
        source_path: source.source_path.clone(),
    };
    let output = parser.parse(&pre.text, &request, &options.settings)?;

    let html = match output.parts.get(&options.part) {
        Some(fragment) => postprocess_html(fragment, &options.diagram_keywords),
        None => {
            tracing::warn!(part = %options.part, "Parser did not produce the requested part");
            String::new()
        }
    };

    Ok(Rendered {
        html,
        diagnostics: output.diagnostics,
    })
}
