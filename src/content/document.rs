//! Document model

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use super::frontmatter::{FrontMatter, FrontMatterError};

/// Prefix that keeps draft ids apart from published ones
const DRAFT_ID_PREFIX: &str = "drafts";

/// Where a document came from. Decided by the input collection, never by front-matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Published,
    Draft,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Published => f.write_str("published"),
            Status::Draft => f.write_str("draft"),
        }
    }
}

/// Stable document identifier derived from the source path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Build an id from a path relative to its collection root:
    /// extension dropped, every component slugified.
    pub fn from_source(path: &str, status: Status) -> Self {
        let without_ext = Path::new(path).with_extension("");
        let mut parts: Vec<String> = without_ext
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .filter(|c| !matches!(*c, "." | ".." | "/"))
            .map(slug::slugify)
            .filter(|c| !c.is_empty())
            .collect();

        if parts.is_empty() {
            parts.push("untitled".to_string());
        }
        if status == Status::Draft {
            parts.insert(0, DRAFT_ID_PREFIX.to_string());
        }

        Self(parts.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of a revision cluster (the id of its canonical member)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionGroupId(String);

impl RevisionGroupId {
    pub fn new(canonical: &DocumentId) -> Self {
        Self(canonical.as_str().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One text unit handed over by source discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Path relative to the collection root
    pub path: String,
    /// Raw file content, front-matter included
    pub content: String,
}

impl SourceUnit {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// A parsed essay or draft
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: DocumentId,

    /// Source path relative to its collection root
    pub source: String,

    pub title: Option<String>,

    pub date: Option<NaiveDateTime>,

    pub categories: Vec<String>,

    /// Advisory only
    pub layout: Option<String>,

    pub status: Status,

    /// Markdown body with front-matter stripped
    pub body: String,

    /// Front-matter keys this pipeline does not interpret
    pub extra: IndexMap<String, serde_yaml::Value>,

    /// Revision cluster, set by the duplicate detector
    pub revision_group: Option<RevisionGroupId>,

    /// False only for non-canonical members of a revision cluster
    pub canonical: bool,
}

impl Document {
    /// Parse a source unit into a document with the given status
    pub fn parse(unit: &SourceUnit, status: Status) -> Result<Self, FrontMatterError> {
        let (fm, body) = FrontMatter::parse(&unit.content)?;

        Ok(Self {
            id: DocumentId::from_source(&unit.path, status),
            source: unit.path.clone(),
            title: fm.title(),
            date: fm.parse_date(),
            categories: fm.categories(),
            layout: fm.layout.clone(),
            status,
            body: body.to_string(),
            extra: fm.extra,
            revision_group: None,
            canonical: true,
        })
    }

    /// Title for display, "Untitled" when absent
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    pub fn is_draft(&self) -> bool {
        self.status == Status::Draft
    }
}
