pub mod checker;
pub mod cli;
pub mod config;
pub mod dict;
pub mod engine;
pub mod parser;

pub use checker::correlator::Correlator;
pub use checker::filter::WordFilter;
pub use checker::tokenizer::{tokenize, SplitRule, WordFragment};
pub use config::Config;
pub use engine::session::{EngineOptions, Session, SessionState};
pub use engine::{SessionError, Status, Verdict, WordChecker};

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Where an identifier was found. `line` and `column` are 1-based; the
/// column counts bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: Arc<PathBuf>,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentKind {
    /// A name from code: variable, function, type, constant.
    Identifier,
    /// A free-text word from a comment or string literal.
    Word,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub text: String,
    pub location: SourceLocation,
    pub kind: IdentKind,
}

impl Identifier {
    pub fn new(text: impl Into<String>, location: SourceLocation, kind: IdentKind) -> Self {
        Self {
            text: text.into(),
            location,
            kind,
        }
    }

    /// Apostrophe words like `aren't` are checked whole instead of being
    /// split at the apostrophe.
    pub fn is_whole_word(&self) -> bool {
        self.kind == IdentKind::Word && self.text.contains('\'')
    }
}

/// A fragment of an identifier the engine did not accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlaggedFragment {
    pub text: String,
    pub start: usize,
    pub end: usize,
    /// Absolute source column: identifier column + fragment start.
    pub column: usize,
    pub rule: SplitRule,
    pub verdict: Verdict,
}

/// An identifier with at least one flagged fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierReport {
    identifier: Identifier,
    flagged: Vec<FlaggedFragment>,
}

impl IdentifierReport {
    /// Returns `None` when nothing was flagged; empty reports never exist.
    pub fn new(identifier: Identifier, flagged: Vec<FlaggedFragment>) -> Option<Self> {
        if flagged.is_empty() {
            None
        } else {
            Some(Self {
                identifier,
                flagged,
            })
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn flagged(&self) -> &[FlaggedFragment] {
        &self.flagged
    }

    /// Keep only the flagged fragments matching `keep`. Returns `None` if
    /// that leaves the report empty.
    pub fn retain(mut self, keep: impl FnMut(&FlaggedFragment) -> bool) -> Option<Self> {
        self.flagged.retain(keep);
        Self::new(self.identifier, self.flagged)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckResult {
    pub files_checked: usize,
    pub reports: Vec<IdentifierReport>,
}

impl CheckResult {
    pub fn error_count(&self) -> usize {
        self.reports.iter().map(|r| r.flagged().len()).sum()
    }
}
