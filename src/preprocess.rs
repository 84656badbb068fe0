//! RST preprocessing pipeline.
//!
//! Runs the text rewrites in a fixed order before the document reaches
//! docutils:
//!
//! ```text
//! markdown tables → grid tables → headings
//! ```
//!
//! Every stage reports a [`StageOutcome`]. A stage that skips leaves the text
//! exactly as it received it and the next stage runs anyway: a cosmetic
//! rewrite never blocks a build.

use crate::heading;
use crate::table::{self, TableRejected, TableRewrite};

/// Why a stage left the text untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Nothing in the text needed rewriting.
    NothingToRewrite,
    /// The stage refused its input.
    Malformed { line: usize, detail: &'static str },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NothingToRewrite => write!(f, "nothing to rewrite"),
            SkipReason::Malformed { line, detail } => write!(f, "line {line}: {detail}"),
        }
    }
}

/// Result of running one stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Rewritten(String),
    Skipped(SkipReason),
}

impl StageOutcome {
    /// Compare against the input so unchanged output reads as a skip.
    fn from_rewrite(input: &str, output: String) -> Self {
        if output == input {
            StageOutcome::Skipped(SkipReason::NothingToRewrite)
        } else {
            StageOutcome::Rewritten(output)
        }
    }
}

impl From<TableRejected> for SkipReason {
    fn from(e: TableRejected) -> Self {
        SkipReason::Malformed {
            line: e.line,
            detail: e.detail,
        }
    }
}

/// A named rewrite.
#[derive(Clone, Copy)]
pub struct Stage {
    pub name: &'static str,
    pub apply: fn(&str) -> StageOutcome,
}

/// A table stage that rewrote nothing but refused a block reports the
/// refusal; one that rewrote other blocks logs each refused block itself.
fn table_outcome(input: &str, rewrite: TableRewrite) -> StageOutcome {
    let TableRewrite { text, rejected } = rewrite;
    if text == input {
        return match rejected.into_iter().next() {
            Some(first) => StageOutcome::Skipped(first.into()),
            None => StageOutcome::Skipped(SkipReason::NothingToRewrite),
        };
    }
    for block in &rejected {
        tracing::warn!(line = block.line, detail = block.detail, "Table left as written");
    }
    StageOutcome::Rewritten(text)
}

fn markdown_tables(text: &str) -> StageOutcome {
    table_outcome(text, table::markdown_to_grid(text))
}

fn grid_tables(text: &str) -> StageOutcome {
    table_outcome(text, table::normalize_grid_tables(text))
}

fn headings(text: &str) -> StageOutcome {
    StageOutcome::from_rewrite(text, heading::normalize_headings(text).text)
}

/// The stages, in the order they run.
pub const STAGES: &[Stage] = &[
    Stage {
        name: "markdown-tables",
        apply: markdown_tables,
    },
    Stage {
        name: "grid-tables",
        apply: grid_tables,
    },
    Stage {
        name: "headings",
        apply: headings,
    },
];

/// What happened to one stage during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub name: &'static str,
    pub skipped: Option<SkipReason>,
}

impl StageReport {
    pub fn applied(&self) -> bool {
        self.skipped.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessed {
    pub text: String,
    pub report: Vec<StageReport>,
}

/// Run every stage over `text`.
pub fn preprocess(text: &str) -> Preprocessed {
    run_stages(text, STAGES)
}

pub fn run_stages(text: &str, stages: &[Stage]) -> Preprocessed {
    let mut current = text.to_string();
    let mut report = Vec::with_capacity(stages.len());

    for stage in stages {
        match (stage.apply)(&current) {
            StageOutcome::Rewritten(next) => {
                current = next;
                report.push(StageReport {
                    name: stage.name,
                    skipped: None,
                });
            }
            StageOutcome::Skipped(reason) => {
                if let SkipReason::Malformed { .. } = reason {
                    tracing::warn!(stage = stage.name, %reason, "Preprocessing stage skipped");
                } else {
                    tracing::debug!(stage = stage.name, %reason, "Preprocessing stage skipped");
                }
                report.push(StageReport {
                    name: stage.name,
                    skipped: Some(reason),
                });
            }
        }
    }

    Preprocessed {
        text: current,
        report,
    }
}
