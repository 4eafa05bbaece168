//! Markdown rendering with verbatim code and math

use chrono::NaiveDateTime;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use serde::Serialize;
use std::ops::Range;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;
use thiserror::Error;

use super::document::{Document, DocumentId, Status};
use crate::config::HighlightConfig;

const EXCERPT_MARKER: &str = "<!-- more -->";

/// Per-document render failures
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("{id}: code fence opened at line {line} (byte {offset}) is never closed")]
    UnbalancedFence {
        id: DocumentId,
        offset: usize,
        line: usize,
    },
}

/// A fenced code block, exactly as written in the body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    pub lang: Option<String>,
    pub content: String,
    /// Byte offset of the opening fence within the body
    pub offset: usize,
}

/// Output of rendering one document
#[derive(Debug, Clone, Serialize)]
pub struct RenderedDocument {
    pub id: DocumentId,
    pub title: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub categories: Vec<String>,
    pub status: Status,
    pub html: String,
    /// Rendered text before `<!-- more -->`, if the body has one
    pub excerpt: Option<String>,
    pub code_blocks: Vec<CodeBlock>,
}

/// Markdown renderer with optional syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    highlight: HighlightConfig,
}

impl MarkdownRenderer {
    /// Create a renderer that emits code blocks as escaped text
    pub fn new() -> Self {
        Self::with_options(HighlightConfig::default())
    }

    /// Create with custom highlight settings
    pub fn with_options(highlight: HighlightConfig) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            highlight,
        }
    }

    /// Render a document body to HTML.
    ///
    /// Fails only when a code fence is opened and never closed.
    pub fn render(&self, doc: &Document) -> Result<RenderedDocument, RenderError> {
        let code_blocks = scan_fences(&doc.body).map_err(|open| RenderError::UnbalancedFence {
            id: doc.id.clone(),
            offset: open.offset,
            line: open.line,
        })?;

        let html = self.render_markdown(&doc.body);
        let excerpt = doc
            .body
            .find(EXCERPT_MARKER)
            .map(|pos| self.render_markdown(doc.body[..pos].trim_end()));

        Ok(RenderedDocument {
            id: doc.id.clone(),
            title: doc.title.clone(),
            date: doc.date,
            categories: doc.categories.clone(),
            status: doc.status,
            html,
            excerpt,
            code_blocks,
        })
    }

    /// Render markdown to HTML
    pub fn render_markdown(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, parser_options());

        let mut events: Vec<Event> = Vec::new();
        let mut in_code_block = false;
        let mut code_block_lang: Option<String> = None;
        let mut code_block_content = String::new();

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code_block_lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(str::to_string),
                        CodeBlockKind::Indented => None,
                    };
                    code_block_content.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code_block = false;
                    let block = self.code_block_html(&code_block_content, code_block_lang.take());
                    events.push(Event::Html(CowStr::from(block)));
                }
                Event::Text(text) if in_code_block => {
                    code_block_content.push_str(&text);
                }
                Event::InlineMath(math) => {
                    events.push(Event::InlineHtml(CowStr::from(format!(
                        r#"<span class="math inline">${}$</span>"#,
                        html_escape(&math)
                    ))));
                }
                Event::DisplayMath(math) => {
                    events.push(Event::InlineHtml(CowStr::from(format!(
                        r#"<span class="math display">$${}$$</span>"#,
                        html_escape(&math)
                    ))));
                }
                _ => events.push(event),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    fn code_block_html(&self, code: &str, lang: Option<String>) -> String {
        if self.highlight.enable {
            if let Some(highlighted) = self.highlight_code(code, lang.as_deref()) {
                return highlighted;
            }
        }

        match lang {
            Some(lang) => format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                html_escape(&lang),
                html_escape(code)
            ),
            None => format!("<pre><code>{}</code></pre>", html_escape(code)),
        }
    }

    /// Highlight a code block; `None` falls back to plain output
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> Option<String> {
        let lang = lang.unwrap_or("text");

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = self
            .theme_set
            .themes
            .get(&self.highlight.theme)
            .or_else(|| self.theme_set.themes.values().next())?;

        let highlighted = highlighted_html_for_string(code, &self.syntax_set, syntax, theme)
            .map_err(|e| tracing::debug!("Highlighting {} failed: {}", lang, e))
            .ok()?;

        if self.highlight.line_number {
            Some(add_line_numbers(&highlighted, lang))
        } else {
            Some(format!(
                r#"<figure class="highlight {}">{}</figure>"#,
                html_escape(lang),
                highlighted
            ))
        }
    }
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_SMART_PUNCTUATION
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_GFM
        | Options::ENABLE_MATH
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap highlighted code in a gutter table
fn add_line_numbers(code: &str, lang: &str) -> String {
    let lines: Vec<&str> = code.lines().collect();

    let gutter = (1..=lines.len())
        .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code">{}</td></tr></table></figure>"#,
        html_escape(lang),
        gutter,
        lines.join("\n")
    )
}

/// Location of a fence that was never closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenFence {
    offset: usize,
    line: usize,
}

struct Fence<'a> {
    marker: char,
    len: usize,
    info: &'a str,
}

/// Recognize a fence line: up to three spaces, then three or more backticks or tildes
fn parse_fence(line: &str) -> Option<Fence<'_>> {
    let line = line.trim_end_matches(['\n', '\r']);
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = rest.len() - rest.trim_start_matches(marker).len();
    if len < 3 {
        return None;
    }
    let info = rest[len..].trim();
    // A backtick fence's info string may not contain backticks
    if marker == '`' && info.contains('`') {
        return None;
    }
    Some(Fence { marker, len, info })
}

/// Whether the source of a fenced block ends with a fence that closes it.
///
/// `source` spans the block from its opening fence, container prefixes
/// (`>` markers, list indentation) included. A closed block has exactly one
/// line beyond its opener and content.
fn is_closed(source: &str, content: &str) -> bool {
    let strip = |line: &str| line.trim_start_matches([' ', '\t', '>']).to_string();
    let mut lines = source.lines().map(strip);
    let Some(first) = lines.next() else {
        return false;
    };
    let Some(open) = parse_fence(&first) else {
        return false;
    };
    if source.lines().count() != content.lines().count() + 2 {
        return false;
    }
    let Some(last) = lines.last() else {
        return false;
    };
    parse_fence(&last).is_some_and(|close| {
        close.marker == open.marker && close.len >= open.len && close.info.is_empty()
    })
}

/// Collect fenced code blocks at any nesting depth, content untouched.
/// Errors with the opening position of a fence that never closes, including
/// one cut short by the end of its list item or blockquote.
fn scan_fences(body: &str) -> Result<Vec<CodeBlock>, OpenFence> {
    let mut blocks = Vec::new();
    let mut open: Option<(Option<String>, Range<usize>, String)> = None;

    for (event, range) in Parser::new_ext(body, parser_options()).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                let lang = info.split_whitespace().next().map(str::to_string);
                open = Some((lang, range, String::new()));
            }
            Event::Text(text) => {
                if let Some((_, _, content)) = open.as_mut() {
                    content.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                let Some((lang, range, content)) = open.take() else {
                    continue;
                };
                if !is_closed(&body[range.clone()], &content) {
                    return Err(OpenFence {
                        offset: range.start,
                        line: body[..range.start].matches('\n').count() + 1,
                    });
                }
                blocks.push(CodeBlock {
                    lang,
                    content,
                    offset: range.start,
                });
            }
            _ => {}
        }
    }

    Ok(blocks)
}

/// Simple HTML escaping
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
