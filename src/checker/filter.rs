use crate::Config;
use lazy_static::lazy_static;
use log::warn;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

const VOWELS: &str = "aeiouy";

lazy_static! {
    static ref HEX_RUN: Regex = Regex::new(r"^[0-9a-f]{8,}$").unwrap();
}

/// Why a fragment is not sent to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TooShort,
    Numeric,
    Acronym,
    /// Letters outside ASCII; the engine reads bytes and would answer for
    /// a different word.
    NonAscii,
    NoVowels,
    /// Eight or more hex digits, like `deadbeef`.
    Hex,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Send this lower-cased query to the engine.
    Checkable(String),
    Skip(SkipReason),
}

/// Decides which fragments are worth asking the engine about.
#[derive(Debug, Clone)]
pub struct WordFilter {
    min_length: usize,
    consonant_threshold: usize,
    acronyms: HashSet<String>,
    ignore_patterns: Vec<Regex>,
}

impl WordFilter {
    pub fn new(config: &Config) -> Self {
        let mut ignore_patterns = Vec::new();
        for pattern in &config.ignore_patterns {
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(re) => ignore_patterns.push(re),
                Err(e) => warn!("Invalid ignore pattern '{}': {}", pattern, e),
            }
        }

        Self {
            min_length: config.min_fragment_len,
            consonant_threshold: config.consonant_threshold,
            acronyms: config.acronyms.iter().map(|a| a.to_lowercase()).collect(),
            ignore_patterns,
        }
    }

    pub fn classify(&self, fragment: &str) -> Classification {
        let lower = fragment.to_lowercase();
        let len = lower.chars().count();

        if len < self.min_length {
            return Classification::Skip(SkipReason::TooShort);
        }

        if lower.chars().all(|c| c.is_numeric()) {
            return Classification::Skip(SkipReason::Numeric);
        }

        if self.acronyms.contains(&lower) {
            return Classification::Skip(SkipReason::Acronym);
        }

        if !lower.is_ascii() {
            return Classification::Skip(SkipReason::NonAscii);
        }

        if len > self.consonant_threshold
            && lower.chars().all(char::is_alphabetic)
            && !lower.chars().any(|c| VOWELS.contains(c))
        {
            return Classification::Skip(SkipReason::NoVowels);
        }

        if HEX_RUN.is_match(&lower) {
            return Classification::Skip(SkipReason::Hex);
        }

        if self.ignore_patterns.iter().any(|re| re.is_match(fragment)) {
            return Classification::Skip(SkipReason::Ignored);
        }

        Classification::Checkable(lower)
    }

    /// The engine query for `fragment`, or `None` to skip it.
    pub fn query_for(&self, fragment: &str) -> Option<String> {
        match self.classify(fragment) {
            Classification::Checkable(query) => Some(query),
            Classification::Skip(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> WordFilter {
        WordFilter::new(&Config::default())
    }

    #[test]
    fn test_short_and_numeric() {
        let filter = filter();
        assert_eq!(filter.classify("x"), Classification::Skip(SkipReason::TooShort));
        assert_eq!(filter.classify("2"), Classification::Skip(SkipReason::TooShort));
        assert_eq!(filter.classify("404"), Classification::Skip(SkipReason::Numeric));
    }

    #[test]
    fn test_acronyms_case_insensitive() {
        let filter = filter();
        assert_eq!(filter.classify("HTTP"), Classification::Skip(SkipReason::Acronym));
        assert_eq!(filter.classify("Json"), Classification::Skip(SkipReason::Acronym));
    }

    #[test]
    fn test_consonant_runs() {
        let filter = filter();
        assert_eq!(filter.classify("xmpfgh"), Classification::Skip(SkipReason::NoVowels));
        // Not longer than the threshold
        assert_eq!(
            filter.classify("bcdf"),
            Classification::Checkable("bcdf".to_string())
        );
        // 'y' counts as a vowel
        assert_eq!(
            filter.classify("rhythm"),
            Classification::Checkable("rhythm".to_string())
        );
    }

    #[test]
    fn test_non_ascii_words_are_skipped() {
        let filter = filter();
        assert_eq!(filter.classify("Änderung"), Classification::Skip(SkipReason::NonAscii));
        assert_eq!(filter.query_for("café"), None);
        assert_eq!(filter.query_for("naïve"), None);
        assert_eq!(filter.query_for("cafe"), Some("cafe".to_string()));
    }

    #[test]
    fn test_hex_runs() {
        let filter = filter();
        assert_eq!(filter.classify("deadbeef"), Classification::Skip(SkipReason::Hex));
        assert_eq!(filter.classify("CAFEBABE"), Classification::Skip(SkipReason::Hex));
        // Too short to look encoded
        assert_eq!(
            filter.classify("facade"),
            Classification::Checkable("facade".to_string())
        );
    }

    #[test]
    fn test_checkable_is_lower_cased() {
        assert_eq!(
            filter().classify("Remaning"),
            Classification::Checkable("remaning".to_string())
        );
    }

    #[test]
    fn test_ignore_patterns() {
        let config = Config {
            ignore_patterns: vec!["^foo".to_string(), "[unclosed".to_string()],
            ..Default::default()
        };
        let filter = WordFilter::new(&config);
        assert_eq!(filter.classify("Foobar"), Classification::Skip(SkipReason::Ignored));
        assert_eq!(filter.query_for("barfoo"), Some("barfoo".to_string()));
    }
}
