//! Splits identifiers into the words they were glued together from.
//!
//! The scan walks the identifier once, left to right, classifying each
//! character and opening a new fragment whenever one of the boundary rules
//! fires:
//!
//! 1. separators (`_` and any other non-alphanumeric character) end the
//!    current fragment and are dropped;
//! 2. an upper-case letter after a lower-case letter or a digit
//!    (`getAll` -> `get`, `All`);
//! 3. an upper-case letter after another upper-case letter and before a
//!    lower-case one (`HTTPResponse` -> `HTTP`, `Response`);
//! 4. the edge between a digit run and a letter run (`num2Objects` ->
//!    `num`, `2`, `Objects`).
//!
//! Rule 3 is checked before rule 2. The tokenizer is total: every input,
//! however odd, yields some fragmentation, and the empty string yields none.

use serde::Serialize;

/// Which boundary opened a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitRule {
    /// First fragment of the input, nothing precedes it.
    Leading,
    /// One or more separators preceded the fragment.
    Separator,
    /// lower/digit -> Upper transition.
    CaseTransition,
    /// End of an upper-case acronym run before a capitalised word.
    AcronymRun,
    /// digit <-> letter transition.
    DigitBoundary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Lower,
    Upper,
    Digit,
    Separator,
}

impl CharClass {
    fn of(c: char) -> Self {
        if c.is_uppercase() {
            CharClass::Upper
        } else if c.is_numeric() {
            CharClass::Digit
        } else if c.is_alphabetic() {
            // Letters without case (CJK etc.) behave like lower-case.
            CharClass::Lower
        } else {
            CharClass::Separator
        }
    }

    fn is_letter(self) -> bool {
        matches!(self, CharClass::Lower | CharClass::Upper)
    }
}

/// One segmented sub-word of an identifier. Offsets are byte offsets into the
/// identifier, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordFragment<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
    pub rule: SplitRule,
}

impl WordFragment<'_> {
    pub fn is_numeric(&self) -> bool {
        self.text.chars().all(|c| c.is_numeric())
    }
}

/// Lazy iterator over the fragments of one identifier. A clone resumes from
/// the same position, and [`tokenize`] can be called again to rescan.
#[derive(Debug, Clone)]
pub struct Fragments<'a> {
    text: &'a str,
    pos: usize,
    pending: SplitRule,
}

/// Split `text` into word fragments.
pub fn tokenize(text: &str) -> Fragments<'_> {
    Fragments {
        text,
        pos: 0,
        pending: SplitRule::Leading,
    }
}

/// Decide whether a boundary falls before `cur`.
fn boundary(prev: CharClass, cur: CharClass, next: Option<CharClass>) -> Option<SplitRule> {
    use CharClass::*;

    match (prev, cur) {
        (_, Separator) => Some(SplitRule::Separator),
        (Upper, Upper) if next == Some(Lower) => Some(SplitRule::AcronymRun),
        (Lower, Upper) | (Digit, Upper) => Some(SplitRule::CaseTransition),
        (Digit, c) if c.is_letter() => Some(SplitRule::DigitBoundary),
        (p, Digit) if p.is_letter() => Some(SplitRule::DigitBoundary),
        _ => None,
    }
}

impl<'a> Iterator for Fragments<'a> {
    type Item = WordFragment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.text[self.pos..];
        let skipped = match rest.find(|c: char| CharClass::of(c) != CharClass::Separator) {
            Some(skipped) => skipped,
            None => {
                self.pos = self.text.len();
                return None;
            }
        };

        let start = self.pos + skipped;
        let rule = if skipped > 0 {
            SplitRule::Separator
        } else {
            self.pending
        };

        let mut chars = self.text[start..].char_indices().peekable();
        // `find` guaranteed a non-separator here
        let (_, first) = chars.next()?;
        let mut prev = CharClass::of(first);
        let mut end = self.text.len();

        while let Some((offset, c)) = chars.next() {
            let cur = CharClass::of(c);
            let next = chars.peek().map(|&(_, n)| CharClass::of(n));
            if let Some(found) = boundary(prev, cur, next) {
                end = start + offset;
                self.pending = found;
                break;
            }
            prev = cur;
        }

        self.pos = end;
        Some(WordFragment {
            text: &self.text[start..end],
            start,
            end,
            rule,
        })
    }
}

impl std::iter::FusedIterator for Fragments<'_> {}

/// Convenience wrapper returning just the fragment texts.
pub fn split_identifier(text: &str) -> Vec<&str> {
    tokenize(text).map(|f| f.text).collect()
}
