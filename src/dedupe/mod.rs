//! Revision detection
//!
//! Essays are often committed more than once: a draft and its published
//! copy, or a retitled rewrite with a new date. This module groups such
//! documents into revision clusters and picks one canonical member per
//! cluster, deterministically.
//!
//! Documents are first grouped by title (normalized equality or high
//! title-token overlap). A title group becomes a single cluster when any
//! two of its bodies are similar enough; otherwise its members stay
//! independent.

mod similarity;

pub use similarity::{body_similarity, normalize_title, title_similarity, Shingles};

use indexmap::IndexMap;
use std::cmp::Ordering;

use crate::config::{ConfigError, DuplicatesConfig};
use crate::content::{
    ContentStore, Document, DocumentId, RevisionAssignment, RevisionGroupId, Status,
};

/// A set of documents judged to be revisions of one essay
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub group: RevisionGroupId,
    pub canonical: DocumentId,
    /// Members sorted by id, canonical included
    pub members: Vec<DocumentId>,
    /// Highest pairwise body similarity, 1.0 for singletons
    pub similarity: f64,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// Groups near-duplicate documents and selects canonical members
#[derive(Debug, Clone)]
pub struct DuplicateDetector {
    config: DuplicatesConfig,
}

impl DuplicateDetector {
    pub fn new(config: &DuplicatesConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
        })
    }

    /// Compute revision clusters for every document in the store, sorted by group id
    pub fn detect(&self, store: &ContentStore) -> Vec<Cluster> {
        let docs: Vec<&Document> = store.iter().collect();
        let mut clusters = Vec::new();

        for group in self.title_groups(&docs) {
            let members: Vec<&Document> = group.iter().map(|&i| docs[i]).collect();
            if members.len() == 1 {
                clusters.push(singleton(members[0]));
                continue;
            }

            let similarity = self.max_pairwise_similarity(&members);
            if similarity > self.config.threshold {
                tracing::debug!(
                    "Revision cluster of {} documents (similarity {:.2})",
                    members.len(),
                    similarity
                );
                clusters.extend(cluster_of(&members, similarity));
            } else {
                tracing::debug!(
                    "{} documents share a title but differ (similarity {:.2})",
                    members.len(),
                    similarity
                );
                clusters.extend(members.iter().map(|doc| singleton(doc)));
            }
        }

        clusters.sort_by(|a, b| a.group.cmp(&b.group));
        clusters
    }

    /// Annotate every document with its cluster and canonical flag
    pub fn canonicalize(&self, store: ContentStore) -> (ContentStore, Vec<Cluster>) {
        let clusters = self.detect(&store);

        let mut assignments = IndexMap::new();
        for cluster in &clusters {
            for member in &cluster.members {
                assignments.insert(
                    member.clone(),
                    RevisionAssignment {
                        group: cluster.group.clone(),
                        canonical: *member == cluster.canonical,
                    },
                );
            }
        }

        let revised = clusters.iter().filter(|c| !c.is_singleton()).count();
        tracing::info!(
            "Detected {} clusters ({} with revisions)",
            clusters.len(),
            revised
        );

        (store.assign_revisions(assignments), clusters)
    }

    /// Partition document indices into title groups (union-find over title pairs).
    /// Untitled documents always form their own group.
    fn title_groups(&self, docs: &[&Document]) -> Vec<Vec<usize>> {
        let titles: Vec<Option<String>> = docs
            .iter()
            .map(|d| {
                d.title
                    .as_deref()
                    .map(normalize_title)
                    .filter(|t| !t.is_empty())
            })
            .collect();

        let mut sets = DisjointSets::new(docs.len());
        for i in 0..docs.len() {
            let Some(a) = &titles[i] else { continue };
            for j in (i + 1)..docs.len() {
                let Some(b) = &titles[j] else { continue };
                if a == b || title_similarity(a, b) >= self.config.title_threshold {
                    sets.union(i, j);
                }
            }
        }

        sets.groups()
    }

    fn max_pairwise_similarity(&self, members: &[&Document]) -> f64 {
        let shingles: Vec<Shingles> = members
            .iter()
            .map(|d| Shingles::new(&d.body, self.config.shingle_size))
            .collect();

        let mut max = 0.0_f64;
        for i in 0..shingles.len() {
            for j in (i + 1)..shingles.len() {
                max = max.max(shingles[i].jaccard(&shingles[j]));
            }
        }
        max
    }
}

fn singleton(doc: &Document) -> Cluster {
    Cluster {
        group: RevisionGroupId::new(&doc.id),
        canonical: doc.id.clone(),
        members: vec![doc.id.clone()],
        similarity: 1.0,
    }
}

fn cluster_of(members: &[&Document], similarity: f64) -> Option<Cluster> {
    let canonical = members
        .iter()
        .copied()
        .max_by(|a, b| canonical_order(a, b))?
        .id
        .clone();

    let mut ids: Vec<DocumentId> = members.iter().map(|d| d.id.clone()).collect();
    ids.sort();

    Some(Cluster {
        group: RevisionGroupId::new(&canonical),
        canonical,
        members: ids,
        similarity,
    })
}

/// Total order for canonical selection; the greatest document wins.
///
/// Published beats Draft, a dated document beats an undated one, later
/// beats earlier, longer body beats shorter, and finally the
/// lexicographically smaller id wins.
pub fn canonical_order(a: &Document, b: &Document) -> Ordering {
    let status_rank = |d: &Document| match d.status {
        Status::Published => 1,
        Status::Draft => 0,
    };

    status_rank(a)
        .cmp(&status_rank(b))
        .then_with(|| a.date.cmp(&b.date))
        .then_with(|| a.body.chars().count().cmp(&b.body.chars().count()))
        .then_with(|| b.id.cmp(&a.id))
}

/// Union-find over document indices
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = i;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Lower index as root keeps group order stable
            let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[child] = root;
        }
    }

    /// Groups in order of their first member
    fn groups(&mut self) -> Vec<Vec<usize>> {
        let mut groups: IndexMap<usize, Vec<usize>> = IndexMap::new();
        for i in 0..self.parent.len() {
            let root = self.find(i);
            groups.entry(root).or_default().push(i);
        }
        groups.into_values().collect()
    }
}
