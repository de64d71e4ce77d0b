use super::filter::WordFilter;
use super::tokenizer::{tokenize, SplitRule, WordFragment};
use crate::engine::{SessionError, Verdict, WordChecker};
use crate::{FlaggedFragment, Identifier, IdentifierReport};
use log::trace;
use std::collections::{HashMap, HashSet};

/// Maps engine verdicts back onto identifiers and source columns.
///
/// Verdicts are memoized by query, so each distinct word reaches the engine
/// once for the lifetime of the correlator.
pub struct Correlator<'a, C: WordChecker> {
    checker: &'a mut C,
    filter: &'a WordFilter,
    verdicts: HashMap<String, Verdict>,
}

/// Fragments of `identifier` in left-to-right order.
pub fn fragments_of(identifier: &Identifier) -> Vec<WordFragment<'_>> {
    if identifier.is_whole_word() {
        vec![WordFragment {
            text: &identifier.text,
            start: 0,
            end: identifier.text.len(),
            rule: SplitRule::Leading,
        }]
    } else {
        tokenize(&identifier.text).collect()
    }
}

impl<'a, C: WordChecker> Correlator<'a, C> {
    pub fn new(checker: &'a mut C, filter: &'a WordFilter) -> Self {
        Self {
            checker,
            filter,
            verdicts: HashMap::new(),
        }
    }

    pub fn correlate(
        &mut self,
        identifier: &Identifier,
    ) -> Result<Option<IdentifierReport>, SessionError> {
        Ok(self
            .correlate_all(std::slice::from_ref(identifier))?
            .pop())
    }

    /// Check every identifier and return reports for those with at least one
    /// flagged fragment, in input order.
    pub fn correlate_all(
        &mut self,
        identifiers: &[Identifier],
    ) -> Result<Vec<IdentifierReport>, SessionError> {
        let mut pending = Vec::new();
        let mut seen = HashSet::new();
        for identifier in identifiers {
            for fragment in fragments_of(identifier) {
                if let Some(query) = self.filter.query_for(fragment.text) {
                    if !self.verdicts.contains_key(&query) && seen.insert(query.clone()) {
                        pending.push(query);
                    }
                }
            }
        }

        if !pending.is_empty() {
            let verdicts = self.checker.check_words(&pending)?;
            if verdicts.len() != pending.len() {
                return Err(SessionError::Protocol(format!(
                    "asked about {} words, got {} verdicts",
                    pending.len(),
                    verdicts.len()
                )));
            }
            for (query, verdict) in pending.into_iter().zip(verdicts) {
                self.verdicts.insert(query, verdict);
            }
        }

        Ok(identifiers
            .iter()
            .filter_map(|identifier| self.assemble(identifier))
            .collect())
    }

    fn assemble(&self, identifier: &Identifier) -> Option<IdentifierReport> {
        let flagged = fragments_of(identifier)
            .into_iter()
            .filter_map(|fragment| {
                let query = self.filter.query_for(fragment.text)?;
                let verdict = self.verdicts.get(&query)?;
                if verdict.is_correct() || verdict.is_case_mismatch(fragment.text) {
                    return None;
                }
                trace!("{:?} flagged in {:?}", fragment.text, identifier.text);
                Some(FlaggedFragment {
                    text: fragment.text.to_string(),
                    start: fragment.start,
                    end: fragment.end,
                    column: identifier.location.column + fragment.start,
                    rule: fragment.rule,
                    verdict: verdict.clone(),
                })
            })
            .collect();

        IdentifierReport::new(identifier.clone(), flagged)
    }

    /// Number of distinct words sent to the engine so far.
    pub fn queried(&self) -> usize {
        self.verdicts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Status;
    use crate::{Config, IdentKind, SourceLocation};
    use std::path::PathBuf;
    use std::sync::Arc;

    /// Knows a fixed set of words; suggests `<word>s` for everything else.
    struct FakeChecker {
        known: Vec<&'static str>,
        asked: Vec<String>,
    }

    impl FakeChecker {
        fn new(known: &[&'static str]) -> Self {
            Self {
                known: known.to_vec(),
                asked: Vec::new(),
            }
        }
    }

    impl WordChecker for FakeChecker {
        fn check_words(&mut self, words: &[String]) -> Result<Vec<Verdict>, SessionError> {
            self.asked.extend(words.iter().cloned());
            Ok(words
                .iter()
                .map(|w| {
                    if self.known.iter().any(|k| *k == w.as_str()) {
                        Verdict::correct(w.as_str())
                    } else if w == "json" {
                        Verdict {
                            word: w.clone(),
                            status: Status::UnknownWithGuesses,
                            suggestions: vec!["JSON".to_string()],
                            root: None,
                            low_confidence: false,
                        }
                    } else if w == "zzyzx" {
                        Verdict {
                            word: w.clone(),
                            status: Status::Unknown,
                            suggestions: vec![],
                            root: None,
                            low_confidence: false,
                        }
                    } else {
                        Verdict {
                            word: w.clone(),
                            status: Status::UnknownWithGuesses,
                            suggestions: vec![format!("{}s", w)],
                            root: None,
                            low_confidence: false,
                        }
                    }
                })
                .collect())
        }
    }

    fn ident(text: &str, column: usize) -> Identifier {
        Identifier::new(
            text,
            SourceLocation {
                file: Arc::new(PathBuf::from("src/main.rs")),
                line: 7,
                column,
            },
            IdentKind::Identifier,
        )
    }

    fn filter() -> WordFilter {
        WordFilter::new(&Config {
            acronyms: vec![],
            ..Default::default()
        })
    }

    #[test]
    fn test_flagged_fragments_with_columns() {
        let filter = filter();
        let mut checker = FakeChecker::new(&["get", "objects"]);
        let mut correlator = Correlator::new(&mut checker, &filter);

        let report = correlator
            .correlate(&ident("getRemaningObjects", 10))
            .unwrap()
            .unwrap();

        assert_eq!(report.flagged().len(), 1);
        let flagged = &report.flagged()[0];
        assert_eq!(flagged.text, "Remaning");
        assert_eq!(flagged.start, 3);
        assert_eq!(flagged.column, 13);
        assert_eq!(flagged.verdict.suggestions, vec!["remanings"]);
    }

    #[test]
    fn test_order_follows_identifier() {
        let filter = filter();
        let mut checker = FakeChecker::new(&[]);
        let mut correlator = Correlator::new(&mut checker, &filter);

        let report = correlator
            .correlate(&ident("fooBarBaz", 1))
            .unwrap()
            .unwrap();
        let texts: Vec<_> = report.flagged().iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["foo", "Bar", "Baz"]);
    }

    #[test]
    fn test_no_report_for_skipped_or_correct() {
        let filter = filter();
        let mut checker = FakeChecker::new(&["count"]);
        let mut correlator = Correlator::new(&mut checker, &filter);

        assert!(correlator.correlate(&ident("i", 1)).unwrap().is_none());
        assert!(correlator.correlate(&ident("x2", 1)).unwrap().is_none());
        assert!(correlator.correlate(&ident("COUNT_2", 1)).unwrap().is_none());
        drop(correlator);
        assert_eq!(checker.asked, vec!["count"]);
    }

    #[test]
    fn test_unknown_without_guesses_is_flagged() {
        let filter = filter();
        let mut checker = FakeChecker::new(&[]);
        let mut correlator = Correlator::new(&mut checker, &filter);

        let report = correlator.correlate(&ident("zzyzx", 1)).unwrap().unwrap();
        assert_eq!(report.flagged()[0].verdict.status, Status::Unknown);
    }

    #[test]
    fn test_case_mismatch_not_flagged() {
        let filter = filter();
        let mut checker = FakeChecker::new(&["parse"]);
        let mut correlator = Correlator::new(&mut checker, &filter);

        assert!(correlator.correlate(&ident("parseJSON", 1)).unwrap().is_none());
    }

    #[test]
    fn test_each_word_queried_once() {
        let filter = filter();
        let mut checker = FakeChecker::new(&["get", "set"]);
        let mut correlator = Correlator::new(&mut checker, &filter);

        let reports = correlator
            .correlate_all(&[ident("getValeu", 1), ident("setValeu", 1), ident("VALEU", 1)])
            .unwrap();
        assert_eq!(reports.len(), 3);
        correlator.correlate(&ident("valeu_get", 1)).unwrap();
        assert_eq!(correlator.queried(), 3);
        drop(correlator);
        assert_eq!(checker.asked, vec!["get", "valeu", "set"]);
    }

    #[test]
    fn test_non_ascii_comment_words_never_queried() {
        let filter = filter();
        let mut checker = FakeChecker::new(&[]);
        let mut correlator = Correlator::new(&mut checker, &filter);

        let words: Vec<_> = ["Änderung", "café", "colr"]
            .iter()
            .map(|text| Identifier {
                kind: IdentKind::Word,
                ..ident(text, 3)
            })
            .collect();
        let reports = correlator.correlate_all(&words).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].identifier().text, "colr");
        drop(correlator);
        assert_eq!(checker.asked, vec!["colr"]);
    }

    #[test]
    fn test_apostrophe_word_checked_whole() {
        let filter = filter();
        let mut checker = FakeChecker::new(&[]);
        let mut correlator = Correlator::new(&mut checker, &filter);

        let word = Identifier {
            kind: IdentKind::Word,
            ..ident("arn't", 4)
        };
        let report = correlator.correlate(&word).unwrap().unwrap();
        assert_eq!(report.flagged()[0].text, "arn't");
        assert_eq!(report.flagged()[0].column, 4);
    }
}
