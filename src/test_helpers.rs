//! Shared test utilities for the rst-forge test suite.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_site();
//! let summary = index_site(tmp.path(), &site, &config).unwrap();
//! let refs = read_references(tmp.path());
//! assert_eq!(post_titles(&refs, "diagram.png"), vec!["Hello Diagrams"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::attachments::{REFERENCES_FILE, References};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Data file lookups
// =========================================================================

/// Parse `_data/attachment_references.yml` under a site root. Panics on failure.
pub fn read_references(root: &Path) -> References {
    let path = root.join("_data").join(REFERENCES_FILE);
    let yaml = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    serde_yaml::from_str(&yaml).unwrap()
}

/// Titles of the posts referencing `filename`. Panics if the file is unknown.
pub fn post_titles<'a>(refs: &'a References, filename: &str) -> Vec<&'a str> {
    refs.get(filename)
        .map(|r| r.posts.iter().map(|p| p.title.as_str()).collect())
        .unwrap_or_else(|| {
            let names: Vec<&str> = refs.keys().map(String::as_str).collect();
            panic!("attachment '{filename}' not found. Available: {names:?}")
        })
}

/// Titles of the pages referencing `filename`. Panics if the file is unknown.
pub fn page_titles<'a>(refs: &'a References, filename: &str) -> Vec<&'a str> {
    refs.get(filename)
        .map(|r| r.pages.iter().map(|p| p.title.as_str()).collect())
        .unwrap_or_else(|| {
            let names: Vec<&str> = refs.keys().map(String::as_str).collect();
            panic!("attachment '{filename}' not found. Available: {names:?}")
        })
}
