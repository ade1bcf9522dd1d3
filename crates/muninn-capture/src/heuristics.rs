//! Name/fact/topic extraction over raw utterances.
//!
//! These heuristics belong to the callers of `MemoryStore::merge`; the store
//! itself never inspects text. Deliberately shallow: a word longer than the
//! threshold counts as a topic, and an utterance containing a personal keyword
//! is kept whole as a fact.

use crate::memory::MemoryUpdate;
use once_cell::sync::Lazy;
use regex::Regex;

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bmy name is (\w+)").expect("static pattern"));

/// Utterances containing one of these words are stored whole as facts.
const FACT_KEYWORDS: &[&str] = &["like", "love", "hate", "work", "live", "name", "age"];

/// "my name is X" → X. Case-insensitive; first match wins.
pub fn extract_name(text: &str) -> Option<String> {
    NAME_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Lowercased words strictly longer than `min_len`, deduplicated, in order of
/// first appearance. Surrounding punctuation is stripped.
pub fn extract_topics(text: &str, min_len: usize) -> Vec<String> {
    let mut topics = Vec::new();
    for word in text.split_whitespace() {
        let word = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if word.len() > min_len && !topics.contains(&word) {
            topics.push(word);
        }
    }
    topics
}

/// The whole utterance, kept once, when any fact keyword appears as a word.
pub fn extract_facts(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let has_keyword = lowered
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .any(|w| FACT_KEYWORDS.contains(&w));
    if has_keyword {
        vec![text.trim().to_string()]
    } else {
        Vec::new()
    }
}

/// All three heuristics over one message, packaged for `MemoryStore::merge`.
pub fn update_from_message(text: &str, topic_min_len: usize) -> MemoryUpdate {
    MemoryUpdate {
        name: extract_name(text),
        facts: extract_facts(text),
        topics: extract_topics(text, topic_min_len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_pattern_matches_case_insensitively() {
        assert_eq!(extract_name("My Name Is Ada"), Some("Ada".to_string()));
        assert_eq!(
            extract_name("well, my name is Grace actually"),
            Some("Grace".to_string())
        );
        assert_eq!(extract_name("names are hard"), None);
    }

    #[test]
    fn topics_are_long_lowercased_words() {
        let topics = extract_topics("We discuss the Quarterly Budget, again budget!", 4);
        assert_eq!(topics, vec!["discuss", "quarterly", "budget", "again"]);
    }

    #[test]
    fn short_words_are_not_topics() {
        assert!(extract_topics("a big cat ran fast", 4).is_empty());
    }

    #[test]
    fn fact_keyword_keeps_whole_utterance() {
        let facts = extract_facts("I like hiking and I love maps");
        assert_eq!(facts, vec!["I like hiking and I love maps"]);
        assert!(extract_facts("nothing personal here").is_empty());
    }

    #[test]
    fn keyword_must_match_whole_word() {
        // "liked" is not the keyword "like".
        assert!(extract_facts("she liked the idea").is_empty());
    }

    #[test]
    fn update_bundles_all_three() {
        let update = update_from_message("my name is Bob and I work on compilers", 4);
        assert_eq!(update.name.as_deref(), Some("Bob"));
        assert_eq!(update.facts.len(), 1);
        assert!(update.topics.contains(&"compilers".to_string()));
    }
}
