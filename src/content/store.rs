//! Content store - the set of parsed documents for one run

use indexmap::IndexMap;
use rayon::prelude::*;
use thiserror::Error;

use super::document::{Document, DocumentId, RevisionGroupId, SourceUnit, Status};
use super::frontmatter::FrontMatterError;

/// Structural load failures; these abort the run
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Duplicate document id '{id}': {rejected:?} collides with {existing:?}")]
    IdCollision {
        id: DocumentId,
        existing: String,
        rejected: String,
    },
}

/// A document excluded at load time
#[derive(Debug)]
pub struct LoadFailure {
    pub source: String,
    pub status: Status,
    pub error: FrontMatterError,
}

/// Membership of a document in a revision cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionAssignment {
    pub group: RevisionGroupId,
    pub canonical: bool,
}

/// All documents of a run, keyed by id, in load order
#[derive(Debug, Default)]
pub struct ContentStore {
    documents: IndexMap<DocumentId, Document>,
    failures: Vec<LoadFailure>,
}

impl ContentStore {
    /// Parse both collections and build the store.
    ///
    /// Published units load before drafts; within a collection, input order is kept.
    /// A unit whose id is already taken fails the whole load.
    pub fn load(published: Vec<SourceUnit>, drafts: Vec<SourceUnit>) -> Result<Self, LoadError> {
        let parsed: Vec<_> = published
            .par_iter()
            .map(|unit| (unit, Status::Published))
            .chain(drafts.par_iter().map(|unit| (unit, Status::Draft)))
            .map(|(unit, status)| (unit, status, Document::parse(unit, status)))
            .collect();

        let mut store = Self::default();
        for (unit, status, result) in parsed {
            match result {
                Ok(doc) => store.insert(doc)?,
                Err(error) => {
                    tracing::warn!("Skipping {} {:?}: {}", status, unit.path, error);
                    store.failures.push(LoadFailure {
                        source: unit.path.clone(),
                        status,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            "Loaded {} documents ({} published, {} drafts, {} failed)",
            store.len(),
            store.published().count(),
            store.drafts().count(),
            store.failures.len()
        );

        Ok(store)
    }

    fn insert(&mut self, doc: Document) -> Result<(), LoadError> {
        if let Some(existing) = self.documents.get(&doc.id) {
            return Err(LoadError::IdCollision {
                id: doc.id.clone(),
                existing: existing.source.clone(),
                rejected: doc.source,
            });
        }
        self.documents.insert(doc.id.clone(), doc);
        Ok(())
    }

    pub fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.get(id)
    }

    /// Documents in load order
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Units that failed to parse and were excluded
    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    pub fn published(&self) -> impl Iterator<Item = &Document> {
        self.iter().filter(|d| d.status == Status::Published)
    }

    pub fn drafts(&self) -> impl Iterator<Item = &Document> {
        self.iter().filter(|d| d.status == Status::Draft)
    }

    /// Record revision clusters. Documents missing from `assignments` keep their state.
    pub(crate) fn assign_revisions(
        mut self,
        mut assignments: IndexMap<DocumentId, RevisionAssignment>,
    ) -> Self {
        for (id, doc) in self.documents.iter_mut() {
            if let Some(assignment) = assignments.swap_remove(id) {
                doc.revision_group = Some(assignment.group);
                doc.canonical = assignment.canonical;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(path: &str, title: &str) -> SourceUnit {
        SourceUnit::new(path, format!("---\ntitle: {}\n---\nBody of {}.\n", title, title))
    }

    #[test]
    fn test_load_assigns_status_by_collection() {
        let store = ContentStore::load(
            vec![unit("a.md", "A"), unit("b.md", "B")],
            vec![unit("c.md", "C")],
        )
        .unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.published().count(), 2);
        assert_eq!(store.drafts().count(), 1);
        let draft = store.get(&DocumentId::from("drafts/c")).unwrap();
        assert_eq!(draft.status, Status::Draft);
    }

    #[test]
    fn test_load_keeps_input_order() {
        let store = ContentStore::load(
            vec![unit("z.md", "Z"), unit("a.md", "A"), unit("m.md", "M")],
            Vec::new(),
        )
        .unwrap();
        let ids: Vec<_> = store.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_id_collision_fails_fast() {
        let result = ContentStore::load(
            vec![unit("Fair Gambling.md", "One"), unit("fair-gambling.md", "Two")],
            Vec::new(),
        );
        match result {
            Err(LoadError::IdCollision {
                id,
                existing,
                rejected,
            }) => {
                assert_eq!(id.as_str(), "fair-gambling");
                assert_eq!(existing, "Fair Gambling.md");
                assert_eq!(rejected, "fair-gambling.md");
            }
            other => panic!("expected collision, got {:?}", other.map(|s| s.len())),
        }
    }

    #[test]
    fn test_same_filename_in_drafts_does_not_collide() {
        let store = ContentStore::load(vec![unit("plus.md", "P")], vec![unit("plus.md", "P")])
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_malformed_frontmatter_isolated() {
        let store = ContentStore::load(
            vec![
                unit("good.md", "Good"),
                SourceUnit::new("bad.md", "---\ntitle: Bad\nno closing fence\n"),
            ],
            Vec::new(),
        )
        .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.failures().len(), 1);
        let failure = &store.failures()[0];
        assert_eq!(failure.source, "bad.md");
        assert!(matches!(failure.error, FrontMatterError::Unterminated));
    }
}
