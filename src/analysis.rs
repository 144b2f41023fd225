//! Text analysis
//!
//! An analyzer turns a text into the ordered list of terms that are
//! indexed. The same analyzer must be used when indexing and querying.

use std::collections::HashSet;

use crate::base::Term;

pub trait Analyzer: Send + Sync {
    /// Returns the terms of `text`, in order
    fn analyze(&self, text: &str) -> Vec<Term>;

    fn name(&self) -> &'static str;
}

/// Lowercases the text and splits it on whitespace
#[derive(Clone, Copy, Default, Debug)]
pub struct NaiveAnalyzer {}

impl Analyzer for NaiveAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Term> {
        text.to_lowercase()
            .split_whitespace()
            .map(|s| s.to_string())
            .collect()
    }

    fn name(&self) -> &'static str {
        "naive"
    }
}

const PUNCTUATION: &[char] = &[',', '.', ';', '?', '!'];

const DEFAULT_ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "me", "more",
    "most", "my", "myself", "no", "nor", "not", "of", "off", "on", "once", "only", "or",
    "other", "ought", "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should",
    "so", "some", "such", "than", "that", "the", "their", "theirs", "them", "themselves",
    "then", "there", "these", "they", "this", "those", "through", "to", "too", "under",
    "until", "up", "very", "was", "we", "were", "what", "when", "where", "which", "while",
    "who", "whom", "why", "with", "would", "you", "your", "yours", "yourself", "yourselves",
];

/// Splits on whitespace and punctuation, lowercases, and removes
/// English stop words
#[derive(Clone, Debug)]
pub struct PunctuationAnalyzer {
    stop_words: HashSet<String>,
}

impl PunctuationAnalyzer {
    pub fn new() -> Self {
        Self::with_stop_words(DEFAULT_ENGLISH_STOP_WORDS.iter().copied())
    }

    pub fn with_stop_words<'a, I: IntoIterator<Item = &'a str>>(words: I) -> Self {
        Self {
            stop_words: words.into_iter().map(|w| w.to_lowercase()).collect(),
        }
    }
}

impl Default for PunctuationAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for PunctuationAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Term> {
        text.split(|c: char| c.is_whitespace() || PUNCTUATION.contains(&c))
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase())
            .filter(|s| !self.stop_words.contains(s))
            .collect()
    }

    fn name(&self) -> &'static str {
        "punctuation"
    }
}
