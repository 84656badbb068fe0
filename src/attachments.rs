//! Attachment indexer.
//!
//! Builds the two data files the site theme uses to render attachment
//! galleries and "referenced by" lists:
//!
//! ```text
//! _config.yml ─┐
//!              ├─ scan attachments ─┬─ scan posts/pages for references ─┐
//! rst-forge.toml                    └──────────────────────────────────┴─ galleries → _data/*.yml
//! ```
//!
//! ## Attachments
//!
//! Every non-hidden file under the attachment directory (default
//! `assets/attachments/`) is one attachment, keyed by its file name. Its
//! category is the first rule whose pattern occurs in the lowercased relative
//! path; files matching no rule are `other`.
//!
//! ## References
//!
//! A document references an attachment when its body (front matter excluded)
//! contains a link to it in one of these forms, case-insensitively, with the
//! attachment prefix written with or without its leading slash:
//!
//! ```text
//! ![alt](/assets/attachments/images/diagram.png)
//! <img src="/assets/attachments/images/diagram.png">
//! <a href="assets/attachments/research_papers/paper.pdf">
//! background: url('/assets/attachments/images/bg.jpg')
//! showImageModal('/assets/attachments/images/diagram.png')
//! showPdfModal('/assets/attachments/research_papers/paper.pdf')
//! see /assets/attachments/research_papers/paper.pdf
//! ```
//!
//! A bare file name also counts when the document mentions the attachment
//! prefix somewhere. Each document is listed at most once per attachment; two
//! documents publishing to the same URL are reported and only the first is
//! kept.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::config::{AttachmentsConfig, CategoryRule, SiteConfig};
use crate::frontmatter;
use crate::naming::parse_post_stem;
use crate::types::{Attachment, DocKind, DocReference, GalleryItem, ReferenceRecord};

pub const GALLERIES_FILE: &str = "attachment_galleries.yml";
pub const REFERENCES_FILE: &str = "attachment_references.yml";

/// Category for attachments no rule matches.
pub const OTHER_CATEGORY: &str = "other";

const EXCERPT_MAX_CHARS: usize = 100;
const TOP_REFERENCED: usize = 5;

pub type Galleries = BTreeMap<String, Vec<GalleryItem>>;
pub type References = BTreeMap<String, ReferenceRecord>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize index data: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid attachment prefix pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Where things live in one site, resolved from both config files.
#[derive(Debug, Clone)]
pub struct SiteLayout {
    /// Site root as given.
    pub root: PathBuf,
    /// Site root made absolute, used for the `path` fields.
    pub absolute_root: PathBuf,
    /// Attachment directory relative to the root, no surrounding slashes.
    pub attachments_dir: String,
    pub base_url: String,
    pub site_url: String,
    pub config: AttachmentsConfig,
}

impl SiteLayout {
    pub fn new(root: &Path, site: &SiteConfig, config: &AttachmentsConfig) -> Self {
        let absolute_root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        Self {
            root: root.to_path_buf(),
            absolute_root,
            attachments_dir: site.attachments_dir().to_string(),
            base_url: site.baseurl.trim_end_matches('/').to_string(),
            site_url: site.url.clone(),
            config: config.clone(),
        }
    }

    /// URL prefix of every attachment, e.g. `/assets/attachments/`.
    pub fn web_prefix(&self) -> String {
        format!("/{}/", self.attachments_dir)
    }

    pub fn attachments_path(&self) -> PathBuf {
        self.root.join(&self.attachments_dir)
    }

    pub fn data_path(&self) -> PathBuf {
        self.root.join(&self.config.data_dir)
    }
}

// ============================================================================
// Attachments
// ============================================================================

/// First rule whose pattern occurs in the lowercased path.
pub fn categorize(rel_path: &str, rules: &[CategoryRule]) -> String {
    let lower = rel_path.to_lowercase();
    rules
        .iter()
        .find(|rule| lower.contains(&rule.pattern.to_lowercase()))
        .map(|rule| rule.name.clone())
        .unwrap_or_else(|| OTHER_CATEGORY.to_string())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn web_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Every non-hidden file under the attachment directory, in path order.
///
/// A missing directory yields no attachments. When two files share a name,
/// the first one found is kept.
pub fn scan_attachments(layout: &SiteLayout) -> Vec<Attachment> {
    let dir = layout.attachments_path();
    if !dir.is_dir() {
        tracing::warn!(path = %dir.display(), "Attachments directory not found");
        return Vec::new();
    }

    let mut attachments: Vec<Attachment> = Vec::new();
    let mut seen: HashMap<String, String> = HashMap::new();

    let walker = WalkDir::new(&dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable attachment entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Ok(rel) = path.strip_prefix(&layout.root) else {
            continue;
        };
        let web_path = web_path(rel);
        let filename = entry.file_name().to_string_lossy().to_string();

        if let Some(first) = seen.get(&filename) {
            tracing::warn!(
                filename = %filename,
                kept = %first,
                ignored = %web_path,
                "Duplicate attachment file name; keeping the first"
            );
            continue;
        }
        seen.insert(filename.clone(), web_path.clone());

        let url = format!("/{web_path}");
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        attachments.push(Attachment {
            absolute_url: format!(
                "{}{}{}",
                layout.site_url.trim_end_matches('/'),
                layout.base_url,
                url
            ),
            path: layout.absolute_root.join(rel).to_string_lossy().to_string(),
            name: path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
            ext: path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default(),
            category: categorize(&web_path, &layout.config.categories),
            filename,
            web_path,
            url,
            size,
        });
    }

    tracing::info!(count = attachments.len(), "Scanned attachments");
    attachments
}

// ============================================================================
// Reference detection
// ============================================================================

/// Finds attachment file names mentioned in a document body.
#[derive(Debug)]
pub struct ReferenceScanner {
    patterns: Vec<Regex>,
    prefix: String,
    prefix_no_slash: String,
}

impl ReferenceScanner {
    /// Build the patterns for one attachment prefix (e.g. `/assets/attachments/`).
    pub fn new(web_prefix: &str) -> Result<Self, regex::Error> {
        let prefix_no_slash = web_prefix.trim_start_matches('/');
        let p = format!(
            "(?:{}|{})",
            regex::escape(web_prefix),
            regex::escape(prefix_no_slash)
        );
        let sources = [
            format!(r"!\[.*?\]\(([^)]*{p}[^)]+)\)"),
            format!(r#"src=['"]([^'"]*{p}[^'"]+)['"]"#),
            format!(r#"href=['"]([^'"]*{p}[^'"]+)['"]"#),
            format!(r#"url\(\s*['"]?([^'")]*{p}[^'")]+?)['"]?\s*\)"#),
            format!(r#"showImageModal\(\s*['"]([^'"]*{p}[^'"]+)['"]"#),
            format!(r#"showPdfModal\(\s*['"]([^'"]*{p}[^'"]+)['"]"#),
            format!(r#"{p}([^\s'")\]]+\.[a-zA-Z0-9]+)"#),
        ];
        let patterns = sources
            .iter()
            .map(|s| Regex::new(&format!("(?i){s}")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            prefix: web_prefix.to_string(),
            prefix_no_slash: prefix_no_slash.to_string(),
        })
    }

    /// File names of the known attachments referenced in `body`.
    pub fn referenced<'k>(
        &self,
        body: &str,
        known: impl IntoIterator<Item = &'k str>,
    ) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        for pattern in &self.patterns {
            for caps in pattern.captures_iter(body) {
                if let Some(m) = caps.get(1) {
                    found.insert(link_basename(m.as_str()).to_string());
                }
            }
        }

        let mentions_prefix = body.contains(&self.prefix) || body.contains(&self.prefix_no_slash);
        let known: BTreeSet<&str> = known.into_iter().collect();
        if mentions_prefix {
            for name in &known {
                if body.contains(name) {
                    found.insert((*name).to_string());
                }
            }
        }
        found.retain(|name| known.contains(name.as_str()));
        found
    }
}

/// Last path segment of a link target, without title, query, or fragment.
fn link_basename(target: &str) -> &str {
    let target = target.split_whitespace().next().unwrap_or("");
    let target = target.split(['?', '#']).next().unwrap_or("");
    target.rsplit('/').next().unwrap_or(target)
}

/// Plain-text summary of a document body.
///
/// Markup characters (`#*`_[]()`) become spaces, whitespace is collapsed, and
/// anything over 100 characters is cut to 97 plus `...`.
pub fn excerpt(body: &str) -> String {
    let cleaned: String = body
        .chars()
        .map(|c| match c {
            '#' | '*' | '`' | '_' | '[' | ']' | '(' | ')' => ' ',
            c => c,
        })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > EXCERPT_MAX_CHARS {
        let cut: String = collapsed.chars().take(EXCERPT_MAX_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        collapsed
    }
}

// ============================================================================
// Documents
// ============================================================================

/// A post or page to scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: PathBuf,
    pub kind: DocKind,
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy())
        .is_some_and(|e| extensions.iter().any(|x| *x == e))
}

/// Posts (recursive) followed by pages (top level of each pages directory).
pub fn collect_documents(layout: &SiteLayout) -> Vec<Document> {
    let mut docs = Vec::new();
    let config = &layout.config;

    let posts_dir = layout.root.join(&config.posts_dir);
    if posts_dir.is_dir() {
        for entry in WalkDir::new(&posts_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() && has_extension(entry.path(), &config.post_extensions) {
                docs.push(Document {
                    path: entry.into_path(),
                    kind: DocKind::Post,
                });
            }
        }
    } else {
        tracing::debug!(path = %posts_dir.display(), "No posts directory");
    }

    let page_ext = std::slice::from_ref(&config.page_extension);
    for dir in &config.pages_dirs {
        let pages_dir = layout.root.join(dir);
        let Ok(entries) = fs::read_dir(&pages_dir) else {
            tracing::debug!(path = %pages_dir.display(), "No pages directory");
            continue;
        };
        let mut pages: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && has_extension(p, page_ext))
            .collect();
        pages.sort();
        docs.extend(pages.into_iter().map(|path| Document {
            path,
            kind: DocKind::Page,
        }));
    }

    docs
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Build the reference entry for a document from its text.
pub fn describe_document(doc: &Document, content: &str, base_url: &str) -> (DocReference, String) {
    let (front, body) = frontmatter::split(content);
    let stem = file_stem(&doc.path);

    let (slug, filename_date) = match doc.kind {
        DocKind::Post => {
            let name = parse_post_stem(&stem);
            (name.slug, name.date)
        }
        DocKind::Page => (stem.clone(), None),
    };

    let title = frontmatter::get_str(&front, "title").unwrap_or_else(|| stem.clone());
    let date = frontmatter::get_str(&front, "date")
        .map(|d| d.chars().take(10).collect())
        .or(filename_date)
        .unwrap_or_default();

    let reference = DocReference {
        title,
        url: format!("{base_url}/{slug}/"),
        date,
        excerpt: excerpt(body),
    };
    (reference, body.to_string())
}

/// Reference records being filled in while documents are scanned.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    pub records: References,
    /// First document seen for each published URL.
    owners: HashMap<(DocKind, String), PathBuf>,
}

impl ReferenceIndex {
    pub fn new(attachments: &[Attachment]) -> Self {
        Self {
            records: attachments
                .iter()
                .map(|a| (a.filename.clone(), ReferenceRecord::new(a)))
                .collect(),
            owners: HashMap::new(),
        }
    }

    /// Record that `doc` references `filename`, once per URL.
    pub fn add(&mut self, filename: &str, doc: &Document, reference: &DocReference) {
        let Some(record) = self.records.get_mut(filename) else {
            return;
        };

        let owner = self
            .owners
            .entry((doc.kind, reference.url.clone()))
            .or_insert_with(|| doc.path.clone());
        if *owner != doc.path {
            tracing::warn!(
                url = %reference.url,
                kept = %owner.display(),
                ignored = %doc.path.display(),
                "Two documents publish to the same URL; keeping the first"
            );
        }

        let list = match doc.kind {
            DocKind::Post => &mut record.posts,
            DocKind::Page => &mut record.pages,
        };
        if !list.iter().any(|r| r.url == reference.url) {
            list.push(reference.clone());
        }
    }

    pub fn finish(mut self) -> References {
        for record in self.records.values_mut() {
            record.update_total();
        }
        self.records
    }
}

/// Scan every document for references to the given attachments.
///
/// A document that cannot be read is logged and skipped.
pub fn scan_references(
    layout: &SiteLayout,
    attachments: &[Attachment],
) -> Result<References, IndexError> {
    let scanner = ReferenceScanner::new(&layout.web_prefix())?;
    let mut index = ReferenceIndex::new(attachments);
    let known: Vec<String> = index.records.keys().cloned().collect();

    for doc in collect_documents(layout) {
        let content = match fs::read_to_string(&doc.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %doc.path.display(), error = %e, "Error scanning document");
                continue;
            }
        };
        let (reference, body) = describe_document(&doc, &content, &layout.base_url);
        let found = scanner.referenced(&body, known.iter().map(String::as_str));
        if !found.is_empty() {
            tracing::debug!(
                path = %doc.path.display(),
                kind = doc.kind.label(),
                count = found.len(),
                "Found attachment references"
            );
        }
        for filename in &found {
            index.add(filename, &doc, &reference);
        }
    }

    Ok(index.finish())
}

// ============================================================================
// Galleries, persistence, summary
// ============================================================================

/// Group attachments by category, each gallery sorted by lowercase name.
pub fn build_galleries(attachments: &[Attachment], references: &References) -> Galleries {
    let mut galleries: Galleries = BTreeMap::new();
    for attachment in attachments {
        let count = references
            .get(&attachment.filename)
            .map(|r| r.total_references)
            .unwrap_or(0);
        galleries
            .entry(attachment.category.clone())
            .or_default()
            .push(GalleryItem::new(attachment, count));
    }
    for items in galleries.values_mut() {
        items.sort_by_key(|item| item.name.to_lowercase());
    }
    galleries
}

fn write_yaml<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), IndexError> {
    let yaml = serde_yaml::to_string(value)?;
    fs::write(path, yaml).map_err(|source| IndexError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write both data files into `data_dir`, creating it if needed.
pub fn save_data(
    data_dir: &Path,
    galleries: &Galleries,
    references: &References,
) -> Result<(PathBuf, PathBuf), IndexError> {
    fs::create_dir_all(data_dir).map_err(|source| IndexError::Write {
        path: data_dir.to_path_buf(),
        source,
    })?;
    let galleries_file = data_dir.join(GALLERIES_FILE);
    let references_file = data_dir.join(REFERENCES_FILE);
    write_yaml(&galleries_file, galleries)?;
    write_yaml(&references_file, references)?;
    Ok((galleries_file, references_file))
}

/// What an indexing run produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSummary {
    pub total_attachments: usize,
    pub total_references: usize,
    pub referenced_files: usize,
    /// Category name and file count, in category order.
    pub categories: Vec<(String, usize)>,
    /// Up to five most referenced file names with their counts.
    pub top_referenced: Vec<(String, usize)>,
    pub galleries_file: PathBuf,
    pub references_file: PathBuf,
}

pub fn summarize(galleries: &Galleries, references: &References) -> IndexSummary {
    let mut ranked: Vec<(String, usize)> = references
        .iter()
        .filter(|(_, r)| r.total_references > 0)
        .map(|(name, r)| (name.clone(), r.total_references))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let referenced_files = ranked.len();
    ranked.truncate(TOP_REFERENCED);

    IndexSummary {
        total_attachments: galleries.values().map(Vec::len).sum(),
        total_references: references.values().map(|r| r.total_references).sum(),
        referenced_files,
        categories: galleries
            .iter()
            .map(|(name, items)| (name.clone(), items.len()))
            .collect(),
        top_referenced: ranked,
        ..IndexSummary::default()
    }
}

/// Index a site: scan, cross-reference, write the data files.
pub fn index_site(
    root: &Path,
    site: &SiteConfig,
    config: &AttachmentsConfig,
) -> Result<IndexSummary, IndexError> {
    let layout = SiteLayout::new(root, site, config);
    tracing::info!(
        root = %layout.absolute_root.display(),
        attachments = %layout.attachments_path().display(),
        prefix = %layout.web_prefix(),
        base_url = %layout.base_url,
        "Indexing attachments"
    );

    let attachments = scan_attachments(&layout);
    let (galleries, references) = if attachments.is_empty() {
        tracing::warn!("No attachments found; writing empty data files");
        (Galleries::new(), References::new())
    } else {
        let references = scan_references(&layout, &attachments)?;
        (build_galleries(&attachments, &references), references)
    };

    let (galleries_file, references_file) =
        save_data(&layout.data_path(), &galleries, &references)?;
    Ok(IndexSummary {
        galleries_file,
        references_file,
        ..summarize(&galleries, &references)
    })
}
