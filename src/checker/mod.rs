pub mod correlator;
pub mod filter;
pub mod tokenizer;

use crate::dict::{Wordlists, BASE_DICTIONARY};
use crate::engine::{EngineOptions, Session, SessionError, WordChecker};
use crate::parser::{self, SourceFile};
use crate::{CheckResult, Config, IdentifierReport};
use anyhow::{Context, Result};
use correlator::Correlator;
use filter::WordFilter;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

pub struct SpellChecker {
    config: Config,
    filter: WordFilter,
    wordlists: Wordlists,
}

impl SpellChecker {
    pub fn new(config: Config) -> Self {
        Self::with_wordlists(config, Wordlists::new())
    }

    pub fn with_wordlists(config: Config, wordlists: Wordlists) -> Self {
        let filter = WordFilter::new(&config);
        Self {
            config,
            filter,
            wordlists,
        }
    }

    /// Check files and directories. Unreadable files are skipped with a
    /// warning; an engine failure aborts the run.
    pub fn check_paths(&mut self, inputs: &[PathBuf]) -> Result<CheckResult> {
        let paths = parser::find_files(inputs);
        debug!("Checking {} files", paths.len());

        let files: Vec<SourceFile> = paths
            .par_iter()
            .filter_map(|path| match parser::parse_file(path) {
                Ok(file) => Some(file),
                Err(e) => {
                    warn!("{:#}", e);
                    None
                }
            })
            .collect();

        self.check_files(&files)
    }

    /// One engine session per distinct wordlist; reports come back in file
    /// order.
    pub fn check_files(&mut self, files: &[SourceFile]) -> Result<CheckResult> {
        let mut groups: BTreeMap<Vec<String>, Vec<usize>> = BTreeMap::new();
        for (index, file) in files.iter().enumerate() {
            groups
                .entry(self.wordlist_names(file))
                .or_default()
                .push(index);
        }

        let mut per_file: Vec<Vec<IdentifierReport>> = vec![Vec::new(); files.len()];
        for (names, indices) in groups {
            let wordlist = self.wordlists.merged(&names)?;
            let options = EngineOptions::from_config(&self.config).with_personal_dictionary(wordlist);
            info!(
                "Checking {} files against wordlists {:?}",
                indices.len(),
                names
            );

            let group: Vec<&SourceFile> = indices.iter().map(|&i| &files[i]).collect();
            let filter = &self.filter;
            let unique = self.config.unique;
            let reports = Session::scoped(options, |session| {
                check_group(session, filter, &group, unique)
            })
            .with_context(|| format!("Spellcheck failed with wordlists {:?}", names))?;

            for (index, file_reports) in indices.into_iter().zip(reports) {
                per_file[index] = file_reports;
            }
        }

        Ok(CheckResult {
            files_checked: files.len(),
            reports: per_file.into_iter().flatten().collect(),
        })
    }

    /// `base`, configured dictionaries, the language wordlist, then the
    /// personal dictionary.
    fn wordlist_names(&self, file: &SourceFile) -> Vec<String> {
        let mut names = vec![BASE_DICTIONARY.to_string()];
        names.extend(self.config.dictionaries.iter().cloned());
        if let Some(language) = file.language {
            names.push(language.dictionary_name().to_string());
        }
        if let Some(personal) = &self.config.personal_dictionary {
            names.push(personal.to_string_lossy().into_owned());
        }
        names
    }
}

/// Check a group of files sharing one engine, returning each file's reports.
pub fn check_group<C: WordChecker>(
    checker: &mut C,
    filter: &WordFilter,
    files: &[&SourceFile],
    unique: bool,
) -> Result<Vec<Vec<IdentifierReport>>, SessionError> {
    let mut correlator = Correlator::new(checker, filter);
    let mut reports = Vec::with_capacity(files.len());

    for file in files {
        let found = correlator.correlate_all(&file.identifiers)?;
        debug!(
            "{}: {} identifiers, {} reported",
            file.path.display(),
            file.identifiers.len(),
            found.len()
        );
        reports.push(if unique { first_occurrences(found) } else { found });
    }

    debug!("{} distinct words sent to the engine", correlator.queried());
    Ok(reports)
}

/// Drop repeats of a misspelled word (ignoring case) after its first
/// occurrence. Reports left with nothing flagged disappear.
pub fn first_occurrences(reports: Vec<IdentifierReport>) -> Vec<IdentifierReport> {
    let mut seen = HashSet::new();
    reports
        .into_iter()
        .filter_map(|report| report.retain(|flagged| seen.insert(flagged.text.to_lowercase())))
        .collect()
}
