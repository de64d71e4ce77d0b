//! Conversation with the external spelling engine (`ispell -a` and
//! compatibles) over its pipe-mode line protocol.

pub mod protocol;
pub mod session;

use serde::Serialize;
use std::io;
use std::time::Duration;
use thiserror::Error;

pub use session::{EngineOptions, Session, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Found as-is (or accepted as part of a compound).
    Correct,
    /// Found through an affix rule applied to a root word.
    CorrectViaRoot,
    /// Not found, and the engine had nothing to offer.
    Unknown,
    /// Not found; the engine suggested replacements.
    UnknownWithGuesses,
}

impl Status {
    pub fn is_correct(self) -> bool {
        matches!(self, Status::Correct | Status::CorrectViaRoot)
    }
}

/// The engine's classification of a single word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub word: String,
    pub status: Status,
    /// Engine ranking order, never re-sorted. Empty unless
    /// `UnknownWithGuesses`.
    pub suggestions: Vec<String>,
    /// Root form for `CorrectViaRoot`.
    pub root: Option<String>,
    /// Set for `?` replies, whose guesses come from a different root.
    pub low_confidence: bool,
}

impl Verdict {
    pub fn correct(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            status: Status::Correct,
            suggestions: Vec::new(),
            root: None,
            low_confidence: false,
        }
    }

    pub fn is_correct(&self) -> bool {
        self.status.is_correct()
    }

    /// Whether one of the guesses is the word itself in another case, as in
    /// `json` -> `JSON`.
    pub fn is_case_mismatch(&self, original: &str) -> bool {
        let original = original.to_lowercase();
        self.suggestions.iter().any(|s| s.to_lowercase() == original)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to start spelling engine: {0}")]
    Start(String),

    #[error("spelling engine protocol error: {0}")]
    Protocol(String),

    #[error("spelling engine I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("spelling engine did not answer within {0:?}")]
    Timeout(Duration),

    #[error("spelling session is {0}, cannot {1}")]
    InvalidState(SessionState, &'static str),
}

/// Anything that can turn words into verdicts, in submission order.
pub trait WordChecker {
    fn check_words(&mut self, words: &[String]) -> Result<Vec<Verdict>, SessionError>;
}
