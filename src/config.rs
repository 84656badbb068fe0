//! Configuration.
//!
//! Two files are read from the site root, both optional:
//!
//! - `rst-forge.toml`: settings for this tool. Stock defaults are overridden
//!   key by key, so a file only needs the values it changes. Unknown keys are
//!   rejected to catch typos early.
//! - `_config.yml`: the static-site generator's own configuration, from which
//!   only `url`, `baseurl`, and `attachments_dir` are read.
//!
//! ## Tool Configuration
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [parser]
//! python = "python3"
//! writer = "html"
//! part = "fragment"
//! initial_header_level = 2
//! report_level = 1          # 1=info 2=warning 3=error 4=severe 5=none
//! halt_level = 5            # no message level stops the parse
//! math_output = "MathJax https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"
//!
//! [diagrams]
//! keywords = ["mindmap", "graph", "flowchart", ...]
//!
//! [attachments]
//! posts_dir = "_posts"
//! pages_dirs = ["_tabs", "."]
//! post_extensions = ["md", "rst", "html"]
//! page_extension = "md"
//! data_dir = "_data"
//! categories = [
//!     { pattern = "research_papers", name = "research" },
//!     { pattern = "articles", name = "articles" },
//!     { pattern = "images", name = "images" },
//! ]
//!
//! [format]
//! posts_dir = "_posts"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::docutils::DEFAULT_MATH_OUTPUT;
use crate::postprocess::DEFAULT_DIAGRAM_KEYWORDS;

/// Tool configuration file name, looked up in the site root.
pub const CONFIG_FILE: &str = "rst-forge.toml";

/// Site generator configuration file name.
pub const SITE_CONFIG_FILE: &str = "_config.yml";

pub const DEFAULT_ATTACHMENTS_DIR: &str = "assets/attachments";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("YAML parse error in {SITE_CONFIG_FILE}: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings loaded from `rst-forge.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// How docutils is invoked.
    pub parser: ParserConfig,
    /// Diagram detection in rendered code blocks.
    pub diagrams: DiagramsConfig,
    /// Attachment indexer layout.
    pub attachments: AttachmentsConfig,
    /// Formatter layout.
    pub format: FormatConfig,
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, level) in [
            ("parser.report_level", self.parser.report_level),
            ("parser.halt_level", self.parser.halt_level),
        ] {
            if !(1..=5).contains(&level) {
                return Err(ConfigError::Validation(format!("{name} must be 1-5")));
            }
        }
        if let Some(level) = self.parser.initial_header_level
            && !(1..=6).contains(&level)
        {
            return Err(ConfigError::Validation(
                "parser.initial_header_level must be 1-6".into(),
            ));
        }
        if self.diagrams.keywords.is_empty() {
            return Err(ConfigError::Validation(
                "diagrams.keywords must not be empty".into(),
            ));
        }
        if self
            .attachments
            .categories
            .iter()
            .any(|c| c.name.trim().is_empty() || c.pattern.is_empty())
        {
            return Err(ConfigError::Validation(
                "attachments.categories entries need a pattern and a name".into(),
            ));
        }
        Ok(())
    }
}

/// docutils invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Python interpreter with docutils installed.
    pub python: String,
    /// docutils writer name.
    pub writer: String,
    /// Rendered part returned by `transform`.
    pub part: String,
    /// Level of the document's top section headings.
    pub initial_header_level: Option<u8>,
    /// Lowest message level reported.
    pub report_level: u8,
    /// Message level that aborts the parse.
    pub halt_level: u8,
    /// docutils `math_output` setting.
    pub math_output: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            writer: "html".to_string(),
            part: "fragment".to_string(),
            initial_header_level: Some(2),
            report_level: 1,
            halt_level: 5,
            math_output: DEFAULT_MATH_OUTPUT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagramsConfig {
    /// First tokens that mark a code block as a diagram.
    pub keywords: Vec<String>,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_DIAGRAM_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

/// A path-substring → category rule. Rules are tried in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryRule {
    /// Lowercase substring searched for in the attachment's relative path.
    pub pattern: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttachmentsConfig {
    pub posts_dir: String,
    /// Directories whose top-level pages are scanned (`.` = site root).
    pub pages_dirs: Vec<String>,
    pub post_extensions: Vec<String>,
    pub page_extension: String,
    /// Where the YAML data files are written.
    pub data_dir: String,
    pub categories: Vec<CategoryRule>,
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        let rule = |pattern: &str, name: &str| CategoryRule {
            pattern: pattern.to_string(),
            name: name.to_string(),
        };
        Self {
            posts_dir: "_posts".to_string(),
            pages_dirs: vec!["_tabs".to_string(), ".".to_string()],
            post_extensions: vec!["md".to_string(), "rst".to_string(), "html".to_string()],
            page_extension: "md".to_string(),
            data_dir: "_data".to_string(),
            categories: vec![
                rule("research_papers", "research"),
                rule("articles", "articles"),
                rule("images", "images"),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatConfig {
    /// Directory whose `*.rst` files the formatter rewrites.
    pub posts_dir: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            posts_dir: "_posts".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(ToolConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config does not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `rst-forge.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load the tool config for a site root: stock defaults + optional overrides,
/// unknown keys rejected, result validated.
pub fn load_config(root: &Path) -> Result<ToolConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match load_raw_config(root)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// The parts of `_config.yml` the indexer needs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site origin, e.g. `https://example.github.io`.
    #[serde(deserialize_with = "null_as_empty")]
    pub url: String,
    /// Path prefix under the origin, e.g. `/blog`.
    #[serde(deserialize_with = "null_as_empty")]
    pub baseurl: String,
    pub attachments_dir: Option<String>,
}

fn null_as_empty<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl SiteConfig {
    /// Attachment directory relative to the site root, without surrounding slashes.
    pub fn attachments_dir(&self) -> &str {
        self.attachments_dir
            .as_deref()
            .map(|d| d.trim_matches('/'))
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_ATTACHMENTS_DIR)
    }
}

/// Load `_config.yml`; a missing or empty file means all defaults.
pub fn load_site_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let path = root.join(SITE_CONFIG_FILE);
    if !path.exists() {
        return Ok(SiteConfig::default());
    }
    let content = fs::read_to_string(&path)?;
    if content.trim().is_empty() {
        return Ok(SiteConfig::default());
    }
    Ok(serde_yaml::from_str(&content)?)
}

/// Returns a fully-commented stock `rst-forge.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# rst-forge Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Place this file in the site root
# as rst-forge.toml. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# docutils invocation (rst-forge transform)
# ---------------------------------------------------------------------------
[parser]
# Python interpreter that has docutils installed.
python = "python3"

# docutils writer: "html", "html4", or "html5".
writer = "html"

# Rendered part printed by `transform` (fragment, body, html_body, whole, ...).
part = "fragment"

# Level of the document's top-level section headings (h2 under a page title).
initial_header_level = 2

# Message levels: 1=info 2=warning 3=error 4=severe 5=none.
# Report everything. Nothing stops a parse, SEVERE included: the
# message is written into the HTML and the document still renders.
report_level = 1
halt_level = 5

# Client-side math typesetting.
math_output = "MathJax https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"

# ---------------------------------------------------------------------------
# Diagram code blocks
# ---------------------------------------------------------------------------
[diagrams]
# A code block whose first word is one of these becomes a diagram block.
keywords = [
    "mindmap", "graph", "flowchart", "sequenceDiagram", "classDiagram",
    "stateDiagram", "erDiagram", "gantt", "pie", "journey", "gitGraph",
]

# ---------------------------------------------------------------------------
# Attachment indexer (rst-forge attachments)
# ---------------------------------------------------------------------------
[attachments]
# Posts are scanned recursively; pages only at the top of each pages dir.
posts_dir = "_posts"
pages_dirs = ["_tabs", "."]
post_extensions = ["md", "rst", "html"]
page_extension = "md"

# Output directory for attachment_galleries.yml and attachment_references.yml.
data_dir = "_data"

# First matching rule wins; attachments matching none are "other".
categories = [
    { pattern = "research_papers", name = "research" },
    { pattern = "articles", name = "articles" },
    { pattern = "images", name = "images" },
]

# ---------------------------------------------------------------------------
# Formatter (rst-forge format)
# ---------------------------------------------------------------------------
[format]
posts_dir = "_posts"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_parser_settings() {
        let config = ToolConfig::default();
        assert_eq!(config.parser.python, "python3");
        assert_eq!(config.parser.writer, "html");
        assert_eq!(config.parser.part, "fragment");
        assert_eq!(config.parser.initial_header_level, Some(2));
        assert_eq!(config.parser.report_level, 1);
        assert_eq!(config.parser.halt_level, 5);
    }

    #[test]
    fn default_categories_in_order() {
        let config = ToolConfig::default();
        let names: Vec<&str> = config
            .attachments
            .categories
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["research", "articles", "images"]);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[parser]
halt_level = 4
"#;
        let config: ToolConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.parser.halt_level, 4);
        assert_eq!(config.parser.report_level, 1);
        assert_eq!(config.attachments.data_dir, "_data");
    }

    #[test]
    fn unknown_keys_rejected() {
        let toml = r#"
[parser]
pyhton = "python3.12"
"#;
        let result: Result<ToolConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn merge_toml_overrides_nested_keys_only() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[diagrams]\nkeywords = [\"timeline\"]").unwrap();
        let config: ToolConfig = merge_toml(base, overlay).try_into().unwrap();
        assert_eq!(config.diagrams.keywords, vec!["timeline"]);
        assert_eq!(config.parser.writer, "html");
    }

    #[test]
    fn validation_rejects_bad_levels() {
        let mut config = ToolConfig::default();
        config.parser.halt_level = 9;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validation_rejects_empty_keywords() {
        let mut config = ToolConfig::default();
        config.diagrams.keywords.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: ToolConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = ToolConfig::default();
        assert_eq!(config.diagrams.keywords, defaults.diagrams.keywords);
        assert_eq!(config.attachments.categories, defaults.attachments.categories);
        assert_eq!(config.parser.math_output, defaults.parser.math_output);
        config.validate().unwrap();
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.format.posts_dir, "_posts");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            "[attachments]\ndata_dir = \"data\"\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.attachments.data_dir, "data");
        assert_eq!(config.attachments.posts_dir, "_posts");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[parser\n").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // _config.yml tests
    // =========================================================================

    #[test]
    fn missing_site_config_is_default() {
        let tmp = TempDir::new().unwrap();
        let site = load_site_config(tmp.path()).unwrap();
        assert_eq!(site, SiteConfig::default());
        assert_eq!(site.attachments_dir(), "assets/attachments");
    }

    #[test]
    fn site_config_reads_known_keys_and_ignores_others() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(SITE_CONFIG_FILE),
            "title: My Blog\nurl: https://example.github.io\nbaseurl: /blog\nattachments_dir: /files/\ntheme: jekyll-theme-chirpy\n",
        )
        .unwrap();
        let site = load_site_config(tmp.path()).unwrap();
        assert_eq!(site.url, "https://example.github.io");
        assert_eq!(site.baseurl, "/blog");
        assert_eq!(site.attachments_dir(), "files");
    }

    #[test]
    fn null_values_become_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(SITE_CONFIG_FILE), "url:\nbaseurl: ~\n").unwrap();
        let site = load_site_config(tmp.path()).unwrap();
        assert_eq!(site.url, "");
        assert_eq!(site.baseurl, "");
    }
}
