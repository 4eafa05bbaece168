//! End-to-end run: load → detect revisions → render → publish
//!
//! Structural problems (bad configuration, id collisions) abort the run.
//! Per-document problems (malformed front-matter, unbalanced fences) exclude
//! the document and are listed in the run summary.

use std::fmt;
use thiserror::Error;

use crate::config::{ConfigError, SiteConfig};
use crate::content::{ContentStore, LoadError, MarkdownRenderer, SourceUnit};
use crate::dedupe::{Cluster, DuplicateDetector};
use crate::publisher::{PublishedSet, Publisher};

/// Errors that abort a whole run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Everything a run produced
#[derive(Debug)]
pub struct BuildReport {
    /// All loaded documents, annotated with their revision clusters
    pub store: ContentStore,
    pub clusters: Vec<Cluster>,
    pub output: PublishedSet,
}

/// Run the whole pipeline over the two input collections
pub fn run(
    published: Vec<SourceUnit>,
    drafts: Vec<SourceUnit>,
    config: &SiteConfig,
) -> Result<BuildReport, PipelineError> {
    config.validate()?;
    let detector = DuplicateDetector::new(&config.duplicates)?;

    let store = ContentStore::load(published, drafts)?;
    let (store, clusters) = detector.canonicalize(store);

    let renderer = MarkdownRenderer::with_options(config.highlight.clone());
    let output = Publisher::new(&renderer, &config.publish).publish(&store);

    Ok(BuildReport {
        store,
        clusters,
        output,
    })
}

impl BuildReport {
    /// Per-document failures of the run
    pub fn summary(&self) -> RunSummary {
        let mut failures: Vec<String> = self
            .store
            .failures()
            .iter()
            .map(|f| format!("{} {}: {}", f.status, f.source, f.error))
            .collect();
        failures.extend(self.output.failures.iter().map(|e| e.to_string()));

        RunSummary {
            loaded: self.store.len(),
            clusters: self.clusters.len(),
            superseded: self.store.iter().filter(|d| !d.canonical).count(),
            published: self.output.len(),
            failures,
        }
    }
}

/// End-of-run counts and failure messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub loaded: usize,
    pub clusters: usize,
    /// Non-canonical revisions kept in the store but not published
    pub superseded: usize,
    pub published: usize,
    pub failures: Vec<String>,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Loaded {} documents in {} clusters ({} superseded revisions), published {}",
            self.loaded, self.clusters, self.superseded, self.published
        )?;
        if !self.failures.is_empty() {
            writeln!(f, "{} documents excluded:", self.failures.len())?;
            for failure in &self.failures {
                writeln!(f, "  {}", failure)?;
            }
        }
        Ok(())
    }
}
