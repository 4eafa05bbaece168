//! Front-matter parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Per-document front-matter failures
#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("Front-matter block opened at line 1 is never closed")]
    Unterminated,

    #[error("Invalid YAML front-matter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Custom deserializer that accepts a list of strings, or a single string
/// holding comma- and/or whitespace-separated entries
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect())
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                vec.push(item);
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Front-matter data from a post or draft
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    #[serde(deserialize_with = "string_or_vec", default)]
    pub categories: Vec<String>,
    pub layout: Option<String>,

    /// Unrecognized keys, kept in source order
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    pub fn parse(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let mut lines = content.split_inclusive('\n');
        match lines.next() {
            Some(first) if first.trim_end() == "---" => {}
            _ => return Ok((FrontMatter::default(), content)),
        }

        let block_start = content
            .find('\n')
            .map(|pos| pos + 1)
            .unwrap_or(content.len());
        let mut offset = block_start;
        for line in lines {
            let marker = line.trim_end();
            if marker == "---" || marker == "..." {
                let yaml_content = &content[block_start..offset];
                let remaining = content[offset + line.len()..].trim_start_matches(['\n', '\r']);
                return Self::parse_block(content, yaml_content, remaining);
            }
            offset += line.len();
        }

        Err(FrontMatterError::Unterminated)
    }

    fn parse_block<'a>(
        content: &'a str,
        yaml_content: &str,
        remaining: &'a str,
    ) -> Result<(Self, &'a str), FrontMatterError> {
        if yaml_content.trim().is_empty() {
            return Ok((FrontMatter::default(), remaining));
        }

        // A pair of horizontal rules wrapping prose is not front-matter
        if !yaml_content.lines().any(looks_like_yaml_key) {
            return Ok((FrontMatter::default(), content));
        }

        let fm: FrontMatter = serde_yaml::from_str(yaml_content)?;
        Ok((fm, remaining))
    }

    /// Parse the date string into a timestamp.
    /// Unparseable dates are logged and treated as absent.
    pub fn parse_date(&self) -> Option<NaiveDateTime> {
        let raw = self.date.as_deref()?;
        let parsed = parse_date_string(raw);
        if parsed.is_none() {
            tracing::warn!("Unrecognized date {:?}, ordering as undated", raw);
        }
        parsed
    }

    /// Non-blank title, trimmed
    pub fn title(&self) -> Option<String> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }

    /// Categories with duplicates removed, first occurrence wins
    pub fn categories(&self) -> Vec<String> {
        let mut seen = indexmap::IndexSet::new();
        for category in &self.categories {
            let category = category.trim();
            if !category.is_empty() {
                seen.insert(category.to_string());
            }
        }
        seen.into_iter().collect()
    }
}

/// A `key:` line, where key is a plain identifier and not a URL scheme
fn looks_like_yaml_key(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return false;
    }
    let Some(colon_pos) = trimmed.find(':') else {
        return false;
    };
    let key = &trimmed[..colon_pos];
    let is_valid_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && !matches!(key, "http" | "https" | "ftp");
    let after_colon = &trimmed[colon_pos + 1..];
    is_valid_key && (after_colon.is_empty() || after_colon.starts_with(' '))
}

/// Parse a date string in various formats
fn parse_date_string(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    // RFC 3339 / ISO 8601 with offset, normalized to UTC
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
layout: post
title: Arithmetics Without Plus
date: 2019-03-02 10:30:00
categories:
  - haskell
  - types
---

This is the content.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title(), Some("Arithmetics Without Plus".to_string()));
        assert_eq!(fm.layout.as_deref(), Some("post"));
        assert_eq!(fm.categories, vec!["haskell", "types"]);
        assert_eq!(remaining, "This is the content.\n");
    }

    #[test]
    fn test_unterminated_frontmatter() {
        let content = "---\ntitle: Never closed\ndate: 2018-10-10\n\nBody text.\n";
        assert!(matches!(
            FrontMatter::parse(content),
            Err(FrontMatterError::Unterminated)
        ));
    }

    #[test]
    fn test_no_frontmatter() {
        let content = "# Just a heading\n\nSome text.";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert!(fm.title.is_none());
        assert_eq!(remaining, content);
    }

    #[test]
    fn test_scalar_categories_split() {
        let content = "---\ntitle: Knots\ncategories: climbing, knots  safety\n---\nBody";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.categories, vec!["climbing", "knots", "safety"]);
    }

    #[test]
    fn test_numeric_scalar_category() {
        let content = "---\ntitle: T\ncategories: 2018\n---\nBody";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.categories, vec!["2018"]);

        let (fm, _) = FrontMatter::parse("---\ncategories: true\n---\nBody").unwrap();
        assert_eq!(fm.categories, vec!["true"]);
    }

    #[test]
    fn test_categories_deduplicated() {
        let content = "---\ncategories: [ui, elm, ui]\n---\nBody";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.categories(), vec!["ui", "elm"]);
    }

    #[test]
    fn test_unknown_keys_preserved_in_order() {
        let content = "---\ntitle: T\nmathjax: true\ncomments: false\n---\nBody";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        let keys: Vec<_> = fm.extra.keys().cloned().collect();
        assert_eq!(keys, vec!["mathjax", "comments"]);
        assert_eq!(fm.extra["mathjax"], serde_yaml::Value::Bool(true));
    }

    #[test]
    fn test_missing_optional_fields() {
        let content = "---\nlayout: post\n---\nBody";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title(), None);
        assert!(fm.categories.is_empty());
        assert_eq!(fm.parse_date(), None);
        assert_eq!(remaining, "Body");
    }

    #[test]
    fn test_blank_title_is_absent() {
        let content = "---\ntitle: \"   \"\n---\nBody";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title(), None);
    }

    #[test]
    fn test_invalid_yaml() {
        let content = "---\ntitle: Test\nbroken: [unclosed\n---\nBody";
        assert!(matches!(
            FrontMatter::parse(content),
            Err(FrontMatterError::Yaml(_))
        ));
    }

    #[test]
    fn test_thematic_breaks_not_yaml() {
        let content = "---\n\nSome prose between rules.\n\n---\nMore prose.\n";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title, None);
        assert_eq!(remaining, content);
    }

    #[test]
    fn test_dotted_terminator() {
        let content = "---\ntitle: Dots\n...\nBody";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title(), Some("Dots".to_string()));
        assert_eq!(remaining, "Body");
    }

    #[test]
    fn test_crlf_line_endings() {
        let content = "---\r\ntitle: Windows\r\n---\r\nBody\r\n";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title(), Some("Windows".to_string()));
        assert_eq!(remaining, "Body\r\n");
    }

    #[test]
    fn test_parse_date_formats() {
        let date = |s: &str| FrontMatter {
            date: Some(s.to_string()),
            ..Default::default()
        }
        .parse_date()
        .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string());

        assert_eq!(date("2018-10-10"), Some("2018-10-10 00:00:00".into()));
        assert_eq!(date("2018/10/10 12:30"), Some("2018-10-10 12:30:00".into()));
        assert_eq!(date("2018-10-10T08:00:00"), Some("2018-10-10 08:00:00".into()));
        assert_eq!(
            date("2018-10-10T08:00:00+02:00"),
            Some("2018-10-10 06:00:00".into())
        );
        assert_eq!(date("last tuesday"), None);
    }
}
