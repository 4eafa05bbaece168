//! Title normalization and body similarity

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref TITLE_WORD: Regex = Regex::new(r"[\p{L}\p{N}']+").expect("valid title regex");
    static ref BODY_WORD: Regex = Regex::new(r"\w+").expect("valid word regex");
}

/// Case-fold a title and collapse it to single-space separated words
pub fn normalize_title(title: &str) -> String {
    let lower = title.to_lowercase().replace('\u{2019}', "'");
    TITLE_WORD
        .find_iter(&lower)
        .map(|m| m.as_str().trim_matches('\''))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Jaccard overlap of the word sets of two normalized titles
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let a: HashSet<&str> = a.split(' ').filter(|w| !w.is_empty()).collect();
    let b: HashSet<&str> = b.split(' ').filter(|w| !w.is_empty()).collect();
    jaccard(&a, &b)
}

/// Word shingles of a body: every run of `size` consecutive lower-cased words
#[derive(Debug, Clone)]
pub struct Shingles {
    set: HashSet<Vec<String>>,
}

impl Shingles {
    pub fn new(text: &str, size: usize) -> Self {
        let lower = text.to_lowercase();
        let words: Vec<String> = BODY_WORD
            .find_iter(&lower)
            .map(|m| m.as_str().to_string())
            .collect();

        let size = size.max(1);
        let set = if words.is_empty() {
            HashSet::new()
        } else if words.len() < size {
            // Too short for a full shingle: the whole text is one shingle
            std::iter::once(words).collect()
        } else {
            words.windows(size).map(<[String]>::to_vec).collect()
        };

        Self { set }
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Symmetric overlap in [0, 1]; two empty texts are identical
    pub fn jaccard(&self, other: &Shingles) -> f64 {
        jaccard(&self.set, &other.set)
    }
}

/// Similarity of two bodies using `size`-word shingles
pub fn body_similarity(a: &str, b: &str, size: usize) -> f64 {
    Shingles::new(a, size).jaccard(&Shingles::new(b, size))
}

fn jaccard<T: Eq + std::hash::Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title() {
        assert_eq!(
            normalize_title("  Fair   Gambling Isn\u{2019}t a GOOD Idea! "),
            "fair gambling isn't a good idea"
        );
        assert_eq!(normalize_title("Arithmetics: Without Plus"), "arithmetics without plus");
        assert_eq!(normalize_title("???"), "");
    }

    #[test]
    fn test_title_similarity() {
        let a = normalize_title("Fair Gambling Isn't a Good Idea");
        let b = normalize_title("Why Fair Gambling Isn't a Good Idea");
        let score = title_similarity(&a, &b);
        assert!((score - 6.0 / 7.0).abs() < 1e-9);
        assert!(title_similarity("climbing knots", "elm architecture") < 0.01);
    }

    #[test]
    fn test_similarity_symmetric() {
        let a = "the quick brown fox jumps over the lazy dog";
        let b = "the quick brown fox leaps over the lazy dog";
        assert_eq!(body_similarity(a, b, 3), body_similarity(b, a, 3));
        assert!(body_similarity(a, b, 3) > 0.0);
        assert!(body_similarity(a, b, 3) < 1.0);
    }

    #[test]
    fn test_similarity_total() {
        assert_eq!(body_similarity("", "", 3), 1.0);
        assert_eq!(body_similarity("", "words here", 3), 0.0);
        assert_eq!(body_similarity("one two", "one two", 3), 1.0);
        assert_eq!(body_similarity("Same Text.", "same text", 3), 1.0);
        assert_eq!(body_similarity("!!!", "???", 3), 1.0);
    }

    #[test]
    fn test_shingle_count() {
        let shingles = Shingles::new("a b c d e", 3);
        assert_eq!(shingles.len(), 3);
        assert!(!shingles.is_empty());
    }
}
