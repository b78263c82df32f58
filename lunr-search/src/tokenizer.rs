//! Token normalisation mirroring lunr's default pipeline.
//!
//! Text is split on whitespace and hyphens, lowercased, trimmed of leading
//! and trailing non-word characters (ASCII `\W`, as lunr's trimmer does),
//! filtered against lunr's English stop word list, and reduced by lunr's
//! Porter stemmer. Documents and queries go through the same pipeline, and
//! it matches the terms lunr itself wrote into published `invertedIndex`
//! postings.
//!
//! Phrase matching does not stem: it compares case-folded text with runs of
//! whitespace collapsed to a single space.

use std::collections::HashSet;
use std::sync::OnceLock;

use crate::stemmer;

/// lunr's built-in English stop word filter.
const STOP_WORDS: &[&str] = &[
    "a", "able", "about", "across", "after", "all", "almost", "also", "am", "among", "an",
    "and", "any", "are", "as", "at", "be", "because", "been", "but", "by", "can", "cannot",
    "could", "dear", "did", "do", "does", "either", "else", "ever", "every", "for", "from",
    "get", "got", "had", "has", "have", "he", "her", "hers", "him", "his", "how", "however",
    "i", "if", "in", "into", "is", "it", "its", "just", "least", "let", "like", "likely",
    "may", "me", "might", "most", "must", "my", "neither", "no", "nor", "not", "of", "off",
    "often", "on", "only", "or", "other", "our", "own", "rather", "said", "say", "says",
    "she", "should", "since", "so", "some", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "tis", "to", "too", "twas", "us", "wants", "was", "we",
    "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "would", "yet", "you", "your",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// lunr's `\w`: ASCII letters, digits and underscore only.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Trim leading and trailing non-word characters from a lowercased token.
fn trim(token: &str) -> &str {
    token.trim_matches(|c: char| !is_word_char(c))
}

/// Run `text` through the full pipeline, yielding terms in text order.
/// Duplicates are kept.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c == '-')
        .filter_map(|raw| {
            let lower = raw.to_lowercase();
            let trimmed = trim(&lower);
            if trimmed.is_empty() || stop_words().contains(trimmed) {
                return None;
            }
            Some(stemmer::stem(trimmed))
        })
        .collect()
}

/// Distinct query terms in first-occurrence order.
///
/// An empty result means the query has nothing searchable (blank, or only
/// stop words and punctuation).
pub fn query_terms(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(query)
        .into_iter()
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

/// Case-fold `text` and collapse whitespace runs to single spaces.
pub fn fold(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_stems() {
        assert_eq!(tokenize("Configuring Plugins"), vec!["configur", "plugin"]);
    }

    #[test]
    fn drops_stop_words() {
        assert_eq!(tokenize("install the CLI tool"), vec!["instal", "cli", "tool"]);
        assert!(tokenize("the and of").is_empty());
    }

    #[test]
    fn splits_on_hyphens() {
        let tokens = tokenize("server-side");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens, tokenize("server side"));
    }

    #[test]
    fn trims_surrounding_punctuation() {
        assert_eq!(tokenize("(config)."), vec!["config"]);
        assert_eq!(tokenize("\"hello,\""), vec!["hello"]);
        assert!(tokenize("... --- !!!").is_empty());
    }

    #[test]
    fn keeps_inner_punctuation() {
        // lunr only trims the ends; dotted names stay one token.
        let tokens = tokenize("config.yaml");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].starts_with("config."));
    }

    #[test]
    fn stems_like_forms_together() {
        assert_eq!(tokenize("configure"), tokenize("configuration"));
        assert_eq!(tokenize("running"), tokenize("runs"));
    }

    #[test]
    fn query_terms_are_distinct_in_order() {
        assert_eq!(query_terms("tool CLI tools cli"), vec!["tool", "cli"]);
    }

    #[test]
    fn empty_and_whitespace_queries_have_no_terms() {
        assert!(query_terms("").is_empty());
        assert!(query_terms("   \t\n ").is_empty());
        assert!(query_terms("the").is_empty());
    }

    #[test]
    fn fold_collapses_whitespace_and_case() {
        assert_eq!(fold("  Configure\tthe \n TOOL "), "configure the tool");
        assert_eq!(fold(""), "");
    }

    #[test]
    fn non_ascii_edges_are_trimmed_like_lunr() {
        assert_eq!(tokenize("café"), vec!["caf"]);
        assert_eq!(tokenize("«quoted»"), vec!["quot"]);
        assert_eq!(tokenize("naïve"), vec!["naïv"]);
    }

    #[test]
    fn stems_match_lunr_postings() {
        assert_eq!(query_terms("generate communication"), vec!["gener", "commun"]);
        assert_eq!(tokenize("dying news"), vec!["dy", "new"]);
    }
}
