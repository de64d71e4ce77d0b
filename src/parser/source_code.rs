use super::Language;
use crate::{IdentKind, Identifier, SourceLocation};
use lazy_static::lazy_static;
use regex::Regex;
use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;

lazy_static! {
    // Apostrophe words first (aren't, O'Reilly), then identifier-ish runs.
    static ref TOKEN: Regex = Regex::new(r"[A-Za-z]+(?:'[A-Za-z]+)+|[\p{L}\p{N}_]+").unwrap();
    // 'x', '\n', '\'', '\u{1F600}'; a bare 'a is a lifetime or label.
    static ref CHAR_LITERAL: Regex = Regex::new(r"^'(?:\\.[^'\\]*|[^'\\])'").unwrap();
}

struct Syntax {
    line_comment: &'static [&'static str],
    block_comment: Option<(&'static str, &'static str)>,
    quotes: &'static [char],
    char_literals: bool,
    /// Line comments only start at line start or after whitespace
    /// (`$#array`, `${#var}`).
    comment_after_space: bool,
}

impl Syntax {
    fn of(language: Language) -> Self {
        match language {
            Language::C | Language::Java | Language::Rust => Syntax {
                line_comment: &["//"],
                block_comment: Some(("/*", "*/")),
                quotes: &['"'],
                char_literals: true,
                comment_after_space: false,
            },
            Language::Go => Syntax {
                line_comment: &["//"],
                block_comment: Some(("/*", "*/")),
                quotes: &['"', '`'],
                char_literals: true,
                comment_after_space: false,
            },
            Language::JavaScript => Syntax {
                line_comment: &["//"],
                block_comment: Some(("/*", "*/")),
                quotes: &['"', '\'', '`'],
                char_literals: false,
                comment_after_space: false,
            },
            Language::Python => Syntax {
                line_comment: &["#"],
                block_comment: None,
                quotes: &['"', '\''],
                char_literals: false,
                comment_after_space: false,
            },
            Language::Perl | Language::Shell => Syntax {
                line_comment: &["#"],
                block_comment: None,
                quotes: &['"', '\''],
                char_literals: false,
                comment_after_space: true,
            },
        }
    }
}

/// Extract identifiers and free-text words from source text.
///
/// Tokens inside comments or string literals are `Word`s, everything else is
/// an `Identifier`. Without a known language every token is a `Word`.
/// Strings are not tracked across lines; block comments are.
pub fn parse(content: &str, file: &Arc<PathBuf>, language: Option<Language>) -> Vec<Identifier> {
    let syntax = language.map(Syntax::of);
    let mut in_block = false;
    let mut identifiers = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let text_spans = match &syntax {
            Some(syntax) => text_spans(line, syntax, &mut in_block),
            None => vec![0..line.len()],
        };

        for token in TOKEN.find_iter(line) {
            if !token.as_str().chars().any(char::is_alphabetic) {
                continue;
            }
            let kind = if text_spans.iter().any(|span| span.contains(&token.start())) {
                IdentKind::Word
            } else {
                IdentKind::Identifier
            };

            identifiers.push(Identifier::new(
                token.as_str(),
                SourceLocation {
                    file: Arc::clone(file),
                    line: line_num + 1,
                    column: token.start() + 1, // 1-indexed
                },
                kind,
            ));
        }
    }

    identifiers
}

/// Byte ranges of `line` holding comment or string text.
fn text_spans(line: &str, syntax: &Syntax, in_block: &mut bool) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut pos = 0;

    while pos < line.len() {
        let rest = &line[pos..];

        if *in_block {
            match syntax.block_comment {
                Some((_, close)) => match rest.find(close) {
                    Some(idx) => {
                        spans.push(pos..pos + idx);
                        pos += idx + close.len();
                        *in_block = false;
                    }
                    None => {
                        spans.push(pos..line.len());
                        return spans;
                    }
                },
                None => *in_block = false,
            }
            continue;
        }

        let comment_allowed = !syntax.comment_after_space
            || line[..pos].chars().next_back().map_or(true, char::is_whitespace);
        if comment_allowed && syntax.line_comment.iter().any(|marker| rest.starts_with(marker)) {
            spans.push(pos..line.len());
            return spans;
        }

        if let Some((open, _)) = syntax.block_comment {
            if rest.starts_with(open) {
                pos += open.len();
                *in_block = true;
                continue;
            }
        }

        let Some(c) = rest.chars().next() else {
            break;
        };

        if syntax.char_literals && c == '\'' {
            pos += CHAR_LITERAL.find(rest).map_or(1, |m| m.end());
            continue;
        }

        if syntax.quotes.contains(&c) {
            let body = pos + c.len_utf8();
            match string_end(&line[body..], c) {
                Some(len) => {
                    spans.push(body..body + len);
                    pos = body + len + c.len_utf8();
                }
                None => {
                    // Unterminated on this line
                    spans.push(body..line.len());
                    return spans;
                }
            }
            continue;
        }

        pos += c.len_utf8();
    }

    spans
}

fn string_end(body: &str, quote: char) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return Some(i);
        }
    }
    None
}
