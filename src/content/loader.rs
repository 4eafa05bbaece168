//! Source discovery - reads the published and draft collections from disk

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::SourceUnit;

/// Directory holding published essays, relative to the source dir
pub const POSTS_DIR: &str = "_posts";
/// Directory holding drafts, relative to the source dir
pub const DRAFTS_DIR: &str = "_drafts";

/// The two input collections of a run
#[derive(Debug, Default)]
pub struct Collections {
    pub published: Vec<SourceUnit>,
    pub drafts: Vec<SourceUnit>,
}

/// Read `_posts` and `_drafts` under `source_dir`
pub fn discover(source_dir: &Path) -> Result<Collections> {
    let published = read_collection(&source_dir.join(POSTS_DIR))?;
    let drafts = read_collection(&source_dir.join(DRAFTS_DIR))?;

    tracing::debug!(
        "Discovered {} published and {} draft sources in {:?}",
        published.len(),
        drafts.len(),
        source_dir
    );

    Ok(Collections { published, drafts })
}

/// Read every markdown file below `root`, sorted by path.
/// A missing directory is an empty collection.
fn read_collection(root: &Path) -> Result<Vec<SourceUnit>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut units = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || !is_markdown_file(path) {
            continue;
        }

        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let relative = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        units.push(SourceUnit::new(relative, content));
    }

    Ok(units)
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_collections() {
        let dir = tempfile::tempdir().unwrap();
        let posts = dir.path().join(POSTS_DIR);
        let drafts = dir.path().join(DRAFTS_DIR);
        fs::create_dir_all(posts.join("knots")).unwrap();
        fs::create_dir_all(&drafts).unwrap();

        fs::write(posts.join("b.md"), "B").unwrap();
        fs::write(posts.join("a.markdown"), "A").unwrap();
        fs::write(posts.join("knots").join("bowline.md"), "K").unwrap();
        fs::write(posts.join("image.png"), "not markdown").unwrap();
        fs::write(drafts.join("wip.md"), "W").unwrap();

        let collections = discover(dir.path()).unwrap();
        let paths: Vec<_> = collections
            .published
            .iter()
            .map(|u| u.path.as_str())
            .collect();
        assert_eq!(paths, vec!["a.markdown", "b.md", "knots/bowline.md"]);
        assert_eq!(collections.drafts, vec![SourceUnit::new("wip.md", "W")]);
    }

    #[test]
    fn test_missing_directories_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let collections = discover(dir.path()).unwrap();
        assert!(collections.published.is_empty());
        assert!(collections.drafts.is_empty());
    }
}
