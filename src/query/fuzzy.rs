use crate::types::Document;
use serde_json::Value;

/// Typo-tolerant matcher over a fixed set of searchable fields (every
/// top-level field when the set is empty).
///
/// Every query word must match some word of some searchable field. A word
/// matches exactly, as a substring, or within the typo budget: one typo from
/// `min_word_size_for_1_typo` characters, two from `min_word_size_for_2_typos`.
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    keys: Vec<String>,
    min_word_size_for_1_typo: usize,
    min_word_size_for_2_typos: usize,
}

impl FuzzyMatcher {
    pub fn new(keys: Vec<String>, min_word_size_for_1_typo: usize, min_word_size_for_2_typos: usize) -> Self {
        FuzzyMatcher {
            keys,
            min_word_size_for_1_typo,
            min_word_size_for_2_typos,
        }
    }

    pub fn query_words(query: &str) -> Vec<String> {
        split_words(&query.to_lowercase())
    }

    /// Total typo count for the best match of every query word, or `None`
    /// when some word matches nothing. Lower is better.
    pub fn score(&self, doc: &Document, query_words: &[String]) -> Option<usize> {
        let mut text_words = Vec::new();
        if self.keys.is_empty() {
            doc.fields()
                .values()
                .for_each(|value| collect_words(value, &mut text_words));
        } else {
            for key in &self.keys {
                if let Some(value) = doc.get(key) {
                    collect_words(value, &mut text_words);
                }
            }
        }
        if text_words.is_empty() {
            return None;
        }

        query_words.iter().try_fold(0, |total, query_word| {
            text_words
                .iter()
                .filter_map(|text_word| self.word_distance(query_word, text_word))
                .min()
                .map(|d| total + d)
        })
    }

    fn max_typos(&self, chars: usize) -> usize {
        if chars >= self.min_word_size_for_2_typos {
            2
        } else if chars >= self.min_word_size_for_1_typo {
            1
        } else {
            0
        }
    }

    fn word_distance(&self, query_word: &str, text_word: &str) -> Option<usize> {
        if text_word.contains(query_word) {
            return Some(0);
        }

        let ql_chars = query_word.chars().count();
        let max_distance = self.max_typos(ql_chars);
        if max_distance == 0 {
            return None;
        }

        let distance = strsim::damerau_levenshtein(query_word, text_word);
        if distance <= max_distance {
            return Some(distance);
        }

        // Prefix typo: the user is still typing a longer word.
        let twl_chars = text_word.chars().count();
        if twl_chars > ql_chars {
            let prefix: String = text_word.chars().take(ql_chars).collect();
            let prefix_distance = strsim::damerau_levenshtein(query_word, &prefix);
            if prefix_distance <= max_distance {
                return Some(prefix_distance);
            }
        }

        None
    }
}

fn split_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect()
}

fn collect_words(value: &Value, words: &mut Vec<String>) {
    match value {
        Value::String(s) => words.extend(split_words(&s.to_lowercase())),
        Value::Number(n) => words.push(n.to_string()),
        Value::Array(items) => items.iter().for_each(|item| collect_words(item, words)),
        _ => {}
    }
}
