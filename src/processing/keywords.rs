//! Keyword normalization shared by the alignment and ATS scorers

use crate::error::{Result, ResumeOptimizerError};
use regex::Regex;
use std::collections::{BTreeSet, HashSet};

pub const DEFAULT_MIN_KEYWORD_LENGTH: usize = 3;

/// Turns free text into a set of lowercase keyword tokens
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    min_length: usize,
    stop_words: HashSet<&'static str>,
    word_regex: Regex,
}

impl KeywordExtractor {
    pub fn new(min_length: usize) -> Result<Self> {
        // Alphabetic runs bounded by word boundaries, so "python3" yields nothing
        let word_regex = Regex::new(r"\b[a-z]+\b")
            .map_err(|e| ResumeOptimizerError::Configuration(format!("Invalid word pattern: {}", e)))?;

        Ok(Self {
            min_length,
            stop_words: Self::create_stop_words(),
            word_regex,
        })
    }

    /// Lowercase, split into alphabetic runs, drop short tokens and stop words
    pub fn normalize(&self, text: &str) -> BTreeSet<String> {
        if text.is_empty() {
            return BTreeSet::new();
        }

        let lowered = text.to_lowercase();
        self.word_regex
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|word| word.len() >= self.min_length && !self.stop_words.contains(word))
            .map(str::to_string)
            .collect()
    }

    /// Normalize several fragments as if they were joined with spaces
    pub fn normalize_all<I, S>(&self, fragments: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = fragments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.normalize(&joined)
    }

    /// Token-set Jaccard similarity between two texts
    pub fn jaccard(&self, text1: &str, text2: &str) -> f32 {
        let set1 = self.normalize(text1);
        let set2 = self.normalize(text2);

        let union = set1.union(&set2).count();
        if union == 0 {
            0.0
        } else {
            set1.intersection(&set2).count() as f32 / union as f32
        }
    }

    fn create_stop_words() -> HashSet<&'static str> {
        [
            "a", "an", "and", "are", "as", "at", "be", "by", "for", "from",
            "has", "he", "in", "is", "it", "its", "of", "on", "that", "the",
            "to", "was", "will", "with", "or", "but", "not", "this", "have",
            "had", "what", "when", "where", "who", "which", "why", "how",
        ]
        .into_iter()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_normalize_lowercases_and_filters() {
        let extractor = KeywordExtractor::new(DEFAULT_MIN_KEYWORD_LENGTH).unwrap();
        let tokens = extractor.normalize("Senior Python Developer with AWS and the Cloud");

        assert_eq!(tokens, set(&["aws", "cloud", "developer", "python", "senior"]));
    }

    #[test]
    fn test_empty_input_is_empty_set() {
        let extractor = KeywordExtractor::new(DEFAULT_MIN_KEYWORD_LENGTH).unwrap();
        assert!(extractor.normalize("").is_empty());
        assert!(extractor.normalize("   \n\t").is_empty());
    }

    #[test]
    fn test_alphanumeric_runs_are_not_split() {
        let extractor = KeywordExtractor::new(DEFAULT_MIN_KEYWORD_LENGTH).unwrap();
        let tokens = extractor.normalize("python3 and C++ or node.js");

        assert!(!tokens.contains("python"));
        assert!(tokens.contains("node"));
        assert!(!tokens.contains("c"));
    }

    #[test]
    fn test_configurable_min_length() {
        let extractor = KeywordExtractor::new(2).unwrap();
        let tokens = extractor.normalize("go is ok");

        assert!(tokens.contains("go"));
        assert!(tokens.contains("ok"));
        assert!(!tokens.contains("is"));
    }

    #[test]
    fn test_new_builds_without_panicking_for_any_length() {
        for min_length in [0, 1, DEFAULT_MIN_KEYWORD_LENGTH, 64] {
            let extractor = KeywordExtractor::new(min_length);
            assert!(extractor.is_ok(), "min_length {}", min_length);
        }

        let permissive = KeywordExtractor::new(0).unwrap();
        assert!(permissive.normalize("c go").contains("c"));
        assert!(KeywordExtractor::new(64).unwrap().normalize("kubernetes").is_empty());
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let extractor = KeywordExtractor::new(DEFAULT_MIN_KEYWORD_LENGTH).unwrap();
        let text = "Docker Kubernetes docker PostgreSQL";
        assert_eq!(extractor.normalize(text), extractor.normalize(text));
        assert_eq!(extractor.normalize(text).len(), 3);
    }

    #[test]
    fn test_normalize_all_joins_fragments() {
        let extractor = KeywordExtractor::new(DEFAULT_MIN_KEYWORD_LENGTH).unwrap();
        let tokens = extractor.normalize_all(["REST APIs", "Django"]);
        assert_eq!(tokens, set(&["apis", "django", "rest"]));
    }

    #[test]
    fn test_jaccard_similarity() {
        let extractor = KeywordExtractor::new(DEFAULT_MIN_KEYWORD_LENGTH).unwrap();
        let similarity = extractor.jaccard("rust programming language", "programming in rust");

        assert!((similarity - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(extractor.jaccard("", ""), 0.0);
    }
}
