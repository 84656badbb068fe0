//! Records written to the site's `_data/` directory.
//!
//! The site theme reads these YAML files at build time, so field names and
//! order are part of its contract:
//!
//! - `attachment_galleries.yml`: category → [`GalleryItem`]s
//! - `attachment_references.yml`: filename → [`ReferenceRecord`]

use serde::{Deserialize, Serialize};

/// One file found under the attachment directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name with extension, e.g. `diagram.png`. Unique key of the index.
    pub filename: String,
    /// Absolute filesystem path.
    pub path: String,
    /// Path relative to the site root with `/` separators.
    pub web_path: String,
    /// Root-relative URL: `/` + `web_path`.
    pub url: String,
    /// Site URL + base URL + `url`.
    pub absolute_url: String,
    /// File stem.
    pub name: String,
    /// Extension with its leading dot, or empty.
    pub ext: String,
    pub category: String,
    /// Size in bytes.
    pub size: u64,
}

/// An attachment as listed in a category gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub filename: String,
    pub path: String,
    pub web_path: String,
    pub url: String,
    pub absolute_url: String,
    pub name: String,
    pub ext: String,
    /// Number of documents referencing this attachment.
    pub references: usize,
}

impl GalleryItem {
    pub fn new(attachment: &Attachment, references: usize) -> Self {
        Self {
            filename: attachment.filename.clone(),
            path: attachment.path.clone(),
            web_path: attachment.web_path.clone(),
            url: attachment.url.clone(),
            absolute_url: attachment.absolute_url.clone(),
            name: attachment.name.clone(),
            ext: attachment.ext.clone(),
            references,
        }
    }
}

/// A document that references an attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocReference {
    pub title: String,
    /// Published URL of the document.
    pub url: String,
    /// `YYYY-MM-DD`, or empty when unknown.
    pub date: String,
    pub excerpt: String,
}

/// Everything known about who references one attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub path: String,
    pub web_path: String,
    pub url: String,
    pub absolute_url: String,
    pub posts: Vec<DocReference>,
    pub pages: Vec<DocReference>,
    pub total_references: usize,
}

impl ReferenceRecord {
    pub fn new(attachment: &Attachment) -> Self {
        Self {
            path: attachment.path.clone(),
            web_path: attachment.web_path.clone(),
            url: attachment.url.clone(),
            absolute_url: attachment.absolute_url.clone(),
            posts: Vec::new(),
            pages: Vec::new(),
            total_references: 0,
        }
    }

    /// Recompute `total_references` from the two lists.
    pub fn update_total(&mut self) {
        self.total_references = self.posts.len() + self.pages.len();
    }
}

/// Posts and pages are listed separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocKind {
    Post,
    Page,
}

impl DocKind {
    pub fn label(self) -> &'static str {
        match self {
            DocKind::Post => "post",
            DocKind::Page => "page",
        }
    }
}
