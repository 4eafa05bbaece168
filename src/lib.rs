//! quire: a static publishing pipeline for Markdown essays
//!
//! Sources are read from two collections, published posts and drafts.
//! Front-matter is parsed, near-duplicate revisions are grouped with one
//! canonical member each, and the canonical published documents are
//! rendered to HTML with a date-ordered index.

pub mod commands;
pub mod config;
pub mod content;
pub mod dedupe;
pub mod pipeline;
pub mod publisher;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// A site rooted at a directory
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Source directory (holds `_posts` and `_drafts`)
    pub source_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Site {
    /// Create a site from a directory, loading its config if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config = config::SiteConfig::discover(base_dir.as_ref())?;
        Ok(Self::with_config(base_dir, config))
    }

    /// Create a site with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let source_dir = base_dir.join(&config.source_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            source_dir,
            public_dir,
        }
    }

    /// Build the site into the public directory
    pub fn build(&self) -> Result<pipeline::BuildReport> {
        commands::build::run(self)
    }

    /// Load and canonicalize without rendering output files
    pub fn inspect(&self) -> Result<pipeline::BuildReport> {
        commands::build::inspect(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
