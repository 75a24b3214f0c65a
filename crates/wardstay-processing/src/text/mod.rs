//! Free-text cleaning for neighbourhood overview documents.
//!
//! The cleaning pipeline mirrors what the overview corpus needs before
//! polarity scoring: lowercase, contraction expansion, markup stripping,
//! stop-word removal, and light lemmatization. Each step is a pure string
//! transformation; the full pipeline is [`clean_document`].

pub mod sentiment;

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static NON_ALPHA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z\s]").unwrap());
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+|www\S+|https\S+").unwrap());
static MENTION_HASHTAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\w+|#\w+").unwrap());

/// English stop words dropped during cleaning.
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "and", "any", "are", "been",
        "before", "being", "below", "between", "both", "but", "can", "did", "does", "doing",
        "down", "during", "each", "few", "for", "from", "further", "had", "has", "have", "having",
        "her", "here", "hers", "herself", "him", "himself", "his", "how", "into", "its", "itself",
        "just", "more", "most", "myself", "nor", "not", "now", "off", "once", "only", "other",
        "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should", "some", "such",
        "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there", "these",
        "they", "this", "those", "through", "too", "under", "until", "very", "was", "were",
        "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with", "you",
        "your", "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

/// Contraction dictionary consulted literally during cleaning.
///
/// Pairs are applied longest-first so that overlapping contractions
/// ("can't've" vs "can't") expand deterministically.
#[derive(Debug, Clone, Default)]
pub struct ContractionMap {
    pairs: Vec<(String, String)>,
}

impl ContractionMap {
    /// Build from a contracted-form to expanded-form mapping.
    pub fn from_map(map: HashMap<String, String>) -> Self {
        let mut pairs: Vec<(String, String)> = map.into_iter().collect();
        pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(&b.0)));
        Self { pairs }
    }

    /// Number of known contractions.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Expand every known contraction by literal substring replacement.
    pub fn expand(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (contraction, expansion) in &self.pairs {
            if result.contains(contraction.as_str()) {
                result = result.replace(contraction.as_str(), expansion.as_str());
            }
        }
        result
    }
}

/// Light noun lemmatization by suffix stripping.
///
/// Reduces regular plurals ("parks" -> "park", "eateries" -> "eatery",
/// "beaches" -> "beach") without touching words that merely end in an
/// s-like suffix ("bus", "grass").
pub fn lemmatize(token: &str) -> String {
    let len = token.len();

    if len > 4 && token.ends_with("ies") {
        return format!("{}y", &token[..len - 3]);
    }
    if len > 4 && token.ends_with("sses") {
        return token[..len - 2].to_string();
    }
    if len > 3 && token.ends_with("es") {
        let stem = &token[..len - 2];
        if stem.ends_with('x')
            || stem.ends_with('z')
            || stem.ends_with("ch")
            || stem.ends_with("sh")
        {
            return stem.to_string();
        }
    }
    if len > 3 && token.ends_with('s') && !token.ends_with("ss") && !token.ends_with("us") {
        return token[..len - 1].to_string();
    }

    token.to_string()
}

/// Run the full cleaning pipeline over one document.
///
/// Steps, in order: lowercase, contraction expansion, non-alphabetic
/// stripping, URL stripping, @mention/#hashtag stripping, whitespace
/// tokenization, stop-word and short-token removal, lemmatization,
/// single-space rejoin.
pub fn clean_document(text: &str, contractions: &ContractionMap, min_token_len: usize) -> String {
    let lowered = text.to_lowercase();
    let expanded = contractions.expand(&lowered);
    let text = NON_ALPHA_RE.replace_all(&expanded, "");
    let text = URL_RE.replace_all(&text, "");
    let text = MENTION_HASHTAG_RE.replace_all(&text, "");

    text.split_whitespace()
        .filter(|token| token.len() > min_token_len && !STOP_WORDS.contains(*token))
        .map(lemmatize)
        .collect::<Vec<_>>()
        .join(" ")
}
