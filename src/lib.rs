//! # rst-forge
//!
//! Build-time tooling for a static blog whose posts are written in
//! reStructuredText. The site generator hands each `.rst` document to
//! `rst-forge transform` and embeds the HTML fragment it prints; two batch
//! commands keep the sources and the site's data files in shape.
//!
//! # Architecture: One Pipeline, Two Batch Jobs
//!
//! ```text
//! transform    RST  →  preprocess  →  docutils  →  postprocess  →  HTML fragment
//! format       _posts/*.rst  →  fenced front matter, resized headings (in place)
//! attachments  assets/attachments/ + posts/pages  →  _data/attachment_*.yml
//! ```
//!
//! Every text rewrite is a pure function from string to string, so the whole
//! pipeline is tested without Python: the parser sits behind the
//! [`docutils::RstParser`] trait.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`text`] | Line splitting and joining that keeps the trailing newline |
//! | [`heading`] | Resizes heading adornments to their titles |
//! | [`table`] | Pipe tables → grid tables; re-pads existing grid tables |
//! | [`preprocess`] | Runs the text rewrites in order with an explicit skip contract |
//! | [`docutils`] | Parser settings, the [`docutils::RstParser`] seam, the `python3` driver |
//! | [`postprocess`] | Heading ids, table width classes, diagram code blocks |
//! | [`transform`] | The end-to-end render behind `rst-forge transform` |
//! | [`format`] | In-place formatter for `_posts/*.rst` |
//! | [`frontmatter`] | YAML front matter split |
//! | [`naming`] | `YYYY-MM-DD-slug` post filename parser |
//! | [`attachments`] | Attachment scan, reference detection, gallery data |
//! | [`types`] | Records serialized into the site's `_data/` files |
//! | [`config`] | `rst-forge.toml` loading and validation; `_config.yml` reading |
//! | [`output`] | CLI output formatting for the batch commands |
//!
//! # Design Decisions
//!
//! ## Cosmetic Rewrites Never Block a Build
//!
//! Authors write RST quickly, and docutils is strict about table borders and
//! adornment lengths. Each preprocessing stage either rewrites the text or
//! reports why it skipped ([`preprocess::StageOutcome`]); a skip leaves the
//! text untouched and the next stage runs. HTML post-processors only act on
//! markup they recognize and leave everything else byte-identical.
//!
//! ## docutils as a Black Box
//!
//! The RST grammar belongs to docutils. Rather than re-implementing it, the
//! transform runs `python3 -c` with a tiny driver: settings as JSON on argv,
//! the document on stdin, the rendered parts as JSON on stdout. File
//! insertion and raw HTML are always disabled; the markup the theme needs
//! (heading anchors, table widths, diagram containers) is produced by the
//! post-processors instead.
//!
//! ## One Immutable Settings Value
//!
//! Parser options come from `rst-forge.toml` and the command line, merged once
//! into a [`docutils::ParserSettings`] that is passed to every parse. Nothing
//! is read from process-wide state.

pub mod attachments;
pub mod config;
pub mod docutils;
pub mod format;
pub mod frontmatter;
pub mod heading;
pub mod naming;
pub mod output;
pub mod postprocess;
pub mod preprocess;
pub mod table;
pub mod text;
pub mod transform;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
