//! Publisher - selects, renders, orders and writes the published set

use anyhow::Result;
use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use crate::config::{PublishConfig, SiteConfig, SortOrder};
use crate::content::{
    html_escape, ContentStore, Document, DocumentId, MarkdownRenderer, RenderError,
    RenderedDocument, Status,
};

/// Index file written next to the rendered pages
pub const INDEX_JSON: &str = "index.json";

/// One line of the published index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexEntry {
    pub id: DocumentId,
    pub title: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub categories: Vec<String>,
    pub status: Status,
    /// Output path relative to the public dir
    pub path: String,
}

/// Ordered output of a publish pass
#[derive(Debug, Default)]
pub struct PublishedSet {
    pub documents: Vec<RenderedDocument>,
    pub index: Vec<IndexEntry>,
    /// Documents excluded because they failed to render
    pub failures: Vec<RenderError>,
}

/// Selects the documents to publish and renders them
pub struct Publisher<'a> {
    renderer: &'a MarkdownRenderer,
    config: &'a PublishConfig,
}

impl<'a> Publisher<'a> {
    pub fn new(renderer: &'a MarkdownRenderer, config: &'a PublishConfig) -> Self {
        Self { renderer, config }
    }

    /// Whether a document belongs in the output under this configuration
    pub fn selects(&self, doc: &Document) -> bool {
        let status_ok = self.config.include_drafts || doc.status == Status::Published;
        let revision_ok = !self.config.dedupe || doc.canonical;
        status_ok && revision_ok
    }

    pub fn publish(&self, store: &ContentStore) -> PublishedSet {
        let selected: Vec<&Document> = store.iter().filter(|d| self.selects(d)).collect();
        tracing::debug!(
            "Publishing {} of {} documents (include_drafts={}, dedupe={})",
            selected.len(),
            store.len(),
            self.config.include_drafts,
            self.config.dedupe
        );

        let results: Vec<Result<RenderedDocument, RenderError>> = selected
            .par_iter()
            .map(|doc| self.renderer.render(doc))
            .collect();

        let mut set = PublishedSet::default();
        for result in results {
            match result {
                Ok(rendered) => set.documents.push(rendered),
                Err(e) => {
                    tracing::warn!("Excluding document: {}", e);
                    set.failures.push(e);
                }
            }
        }

        let order = self.config.sort_order;
        set.documents.sort_by(|a, b| compare_for_output(a, b, order));
        set.index = set.documents.iter().map(index_entry).collect();

        tracing::info!(
            "Published {} documents ({} failed to render)",
            set.documents.len(),
            set.failures.len()
        );
        set
    }
}

/// Dated documents first in the requested direction, undated last, then by id
fn compare_for_output(a: &RenderedDocument, b: &RenderedDocument, order: SortOrder) -> Ordering {
    let by_date = match (a.date, b.date) {
        (Some(x), Some(y)) => match order {
            SortOrder::NewestFirst => y.cmp(&x),
            SortOrder::OldestFirst => x.cmp(&y),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date.then_with(|| a.id.cmp(&b.id))
}

/// Output path of a document's page, relative to the public dir
pub fn output_path(id: &DocumentId) -> String {
    format!("{}/index.html", id)
}

fn index_entry(doc: &RenderedDocument) -> IndexEntry {
    IndexEntry {
        id: doc.id.clone(),
        title: doc.title.clone(),
        date: doc.date,
        categories: doc.categories.clone(),
        status: doc.status,
        path: output_path(&doc.id),
    }
}

impl PublishedSet {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Write one page per document plus `index.html` and `index.json`.
    /// Output of earlier runs is removed first.
    pub fn write_to(&self, public_dir: &Path, site: &SiteConfig) -> Result<()> {
        if public_dir.exists() {
            fs::remove_dir_all(public_dir)?;
            tracing::debug!("Cleared {:?}", public_dir);
        }
        fs::create_dir_all(public_dir)?;

        for doc in &self.documents {
            let path = public_dir.join(output_path(&doc.id));
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, render_page(doc, site))?;
            tracing::debug!("Wrote {:?}", path);
        }

        fs::write(public_dir.join("index.html"), render_index(&self.index, site))?;
        fs::write(
            public_dir.join(INDEX_JSON),
            serde_json::to_string_pretty(&self.index)?,
        )?;

        tracing::info!("Wrote {} pages to {:?}", self.documents.len(), public_dir);
        Ok(())
    }
}

fn format_date(date: Option<NaiveDateTime>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn render_page(doc: &RenderedDocument, site: &SiteConfig) -> String {
    let title = html_escape(doc.title.as_deref().unwrap_or("Untitled"));
    let categories = doc
        .categories
        .iter()
        .map(|c| format!(r#"<li class="category">{}</li>"#, html_escape(c)))
        .collect::<String>();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title} | {site_title}</title>
</head>
<body>
<article class="{status}">
<h1>{title}</h1>
<time>{date}</time>
<ul class="categories">{categories}</ul>
{content}
</article>
</body>
</html>
"#,
        title = title,
        site_title = html_escape(&site.title),
        status = doc.status,
        date = format_date(doc.date),
        categories = categories,
        content = doc.html,
    )
}

fn render_index(index: &[IndexEntry], site: &SiteConfig) -> String {
    let items = index
        .iter()
        .map(|entry| {
            format!(
                r#"<li><time>{}</time> <a href="{}">{}</a></li>
"#,
                format_date(entry.date),
                html_escape(&entry.path),
                html_escape(entry.title.as_deref().unwrap_or("Untitled"))
            )
        })
        .collect::<String>();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<h1>{title}</h1>
<ul class="posts">
{items}</ul>
</body>
</html>
"#,
        title = html_escape(&site.title),
        items = items,
    )
}
