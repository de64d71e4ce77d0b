//! Reply grammar of the ispell pipe protocol (`ispell -a`).
//!
//! Every query produces zero or more result lines followed by a blank
//! terminator. In terse mode correct words produce no result line at all.
//!
//! ```text
//! *                               found
//! + ROOT                          found via affix rule on ROOT
//! -                               found as a compound
//! & [WORD] COUNT OFFSET: a, b     not found, near misses
//! ? [WORD] COUNT OFFSET: a, b     not found, guesses from another root
//! # [WORD] [OFFSET]               not found, no idea
//! ```

use super::{SessionError, Status, Verdict};

/// Line the engine prints on startup in pipe mode.
pub const BANNER_PREFIX: &str = "@(#)";
/// Switches the engine to terse mode.
pub const TERSE_MODE: &str = "!";
/// Prefix forcing the rest of the line to be treated as text, never as a
/// command.
pub const QUERY_PREFIX: char = '^';

/// One decoded result line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Correct,
    Root(Option<String>),
    Compound,
    Guesses {
        original: Option<String>,
        suggestions: Vec<String>,
        low_confidence: bool,
    },
    NoGuess {
        original: Option<String>,
    },
}

/// Encode a word as a query line, newline included.
pub fn encode_query(word: &str) -> String {
    format!("{}{}\n", QUERY_PREFIX, word)
}

fn protocol_error(msg: impl Into<String>) -> SessionError {
    SessionError::Protocol(msg.into())
}

/// Decode a single non-blank result line.
pub fn parse_reply_line(line: &str) -> Result<Reply, SessionError> {
    let mut chars = line.chars();
    let code = chars
        .next()
        .ok_or_else(|| protocol_error("empty result line"))?;
    let rest = chars.as_str().trim();

    match code {
        '*' => Ok(Reply::Correct),
        '+' => Ok(Reply::Root(
            rest.split_whitespace().next().map(str::to_string),
        )),
        '-' => Ok(Reply::Compound),
        '&' | '?' => parse_guesses(line, rest, code == '?'),
        '#' => parse_no_guess(line, rest),
        other => Err(protocol_error(format!(
            "unrecognized reply prefix {:?} in {:?}",
            other, line
        ))),
    }
}

fn parse_number(token: &str, line: &str) -> Result<usize, SessionError> {
    token
        .parse()
        .map_err(|_| protocol_error(format!("expected a number, got {:?} in {:?}", token, line)))
}

fn parse_guesses(line: &str, rest: &str, low_confidence: bool) -> Result<Reply, SessionError> {
    let (header, list) = rest
        .split_once(':')
        .ok_or_else(|| protocol_error(format!("missing ':' in {:?}", line)))?;

    let fields: Vec<&str> = header.split_whitespace().collect();
    let (original, count, offset) = match fields.as_slice() {
        [count, offset] => (None, *count, *offset),
        [word, count, offset] => (Some(word.to_string()), *count, *offset),
        _ => return Err(protocol_error(format!("malformed guess header in {:?}", line))),
    };
    parse_number(count, line)?;
    parse_number(offset, line)?;

    let suggestions = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    Ok(Reply::Guesses {
        original,
        suggestions,
        low_confidence,
    })
}

fn parse_no_guess(line: &str, rest: &str) -> Result<Reply, SessionError> {
    let fields: Vec<&str> = rest.split_whitespace().collect();
    let original = match fields.as_slice() {
        [] => None,
        [offset] if offset.chars().all(|c| c.is_ascii_digit()) => None,
        [word] => Some(word.to_string()),
        [word, offset] => {
            parse_number(offset, line)?;
            Some(word.to_string())
        }
        _ => return Err(protocol_error(format!("malformed '#' line {:?}", line))),
    };
    Ok(Reply::NoGuess { original })
}

/// Turn the result lines collected for `word` into a verdict.
///
/// A query for a single word yields at most one result line. More than one,
/// or a line naming a different word, means queries and replies are out of
/// step.
pub fn decode_reply(word: &str, lines: &[String]) -> Result<Verdict, SessionError> {
    let line = match lines {
        [] => return Ok(Verdict::correct(word)),
        [line] => line,
        _ => {
            return Err(protocol_error(format!(
                "{} result lines for single word {:?}",
                lines.len(),
                word
            )))
        }
    };

    let mut verdict = Verdict::correct(word);
    match parse_reply_line(line)? {
        Reply::Correct | Reply::Compound => {}
        Reply::Root(root) => {
            verdict.status = Status::CorrectViaRoot;
            verdict.root = root;
        }
        Reply::Guesses {
            original,
            suggestions,
            low_confidence,
        } => {
            check_original(word, original.as_deref())?;
            verdict.status = if suggestions.is_empty() {
                Status::Unknown
            } else {
                Status::UnknownWithGuesses
            };
            verdict.suggestions = suggestions;
            verdict.low_confidence = low_confidence;
        }
        Reply::NoGuess { original } => {
            check_original(word, original.as_deref())?;
            verdict.status = Status::Unknown;
        }
    }
    Ok(verdict)
}

fn check_original(word: &str, original: Option<&str>) -> Result<(), SessionError> {
    match original {
        Some(original) if original != word => Err(protocol_error(format!(
            "reply for {:?} arrived while waiting for {:?}",
            original, word
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_encode_query() {
        assert_eq!(encode_query("colour"), "^colour\n");
    }

    #[test]
    fn test_correct_prefixes() {
        assert_eq!(parse_reply_line("*").unwrap(), Reply::Correct);
        assert_eq!(parse_reply_line("-").unwrap(), Reply::Compound);
        assert_eq!(
            parse_reply_line("+ WALK").unwrap(),
            Reply::Root(Some("WALK".to_string()))
        );
    }

    #[test]
    fn test_star_reply_is_correct() {
        let verdict = decode_reply("hello", &lines(&["*"])).unwrap();
        assert_eq!(verdict.status, Status::Correct);
        assert!(verdict.suggestions.is_empty());
    }

    #[test]
    fn test_no_result_line_is_correct() {
        let verdict = decode_reply("hello", &[]).unwrap();
        assert_eq!(verdict, Verdict::correct("hello"));
    }

    #[test]
    fn test_root_reply() {
        let verdict = decode_reply("walked", &lines(&["+ WALK"])).unwrap();
        assert_eq!(verdict.status, Status::CorrectViaRoot);
        assert_eq!(verdict.root.as_deref(), Some("WALK"));
        assert!(verdict.is_correct());
    }

    #[test]
    fn test_guesses_keep_engine_order() {
        let verdict = decode_reply("colr", &lines(&["& 2 0: color, colour"])).unwrap();
        assert_eq!(verdict.status, Status::UnknownWithGuesses);
        assert_eq!(verdict.suggestions, vec!["color", "colour"]);
        assert!(!verdict.low_confidence);

        let verdict =
            decode_reply("colr", &lines(&["& colr 3 0: colour, color, coir"])).unwrap();
        assert_eq!(verdict.suggestions, vec!["colour", "color", "coir"]);
    }

    #[test]
    fn test_question_mark_is_low_confidence() {
        let verdict = decode_reply("blorping", &lines(&["? blorping 0 0: blurping"])).unwrap();
        assert_eq!(verdict.status, Status::UnknownWithGuesses);
        assert!(verdict.low_confidence);
    }

    #[test]
    fn test_hash_reply_is_unknown() {
        let verdict = decode_reply("xyzzyq", &lines(&["# xyzzyq 0"])).unwrap();
        assert_eq!(verdict.status, Status::Unknown);
        assert!(verdict.suggestions.is_empty());

        assert_eq!(
            decode_reply("xyzzyq", &lines(&["#"])).unwrap().status,
            Status::Unknown
        );
    }

    #[test]
    fn test_unrecognized_prefix() {
        let err = decode_reply("word", &lines(&["% what"])).unwrap_err();
        assert!(matches!(err, SessionError::Protocol(_)));
    }

    #[test]
    fn test_malformed_guess_lines() {
        assert!(parse_reply_line("& colr 2 0 color, colour").is_err());
        assert!(parse_reply_line("& colr two 0: color").is_err());
        assert!(parse_reply_line("& a b c d: color").is_err());
    }

    #[test]
    fn test_multiple_result_lines_rejected() {
        let err = decode_reply("word", &lines(&["*", "*"])).unwrap_err();
        assert!(matches!(err, SessionError::Protocol(_)));
    }

    #[test]
    fn test_reply_for_other_word_rejected() {
        let err = decode_reply("colr", &lines(&["& teh 1 0: the"])).unwrap_err();
        assert!(matches!(err, SessionError::Protocol(_)));
        let err = decode_reply("colr", &lines(&["# teh 0"])).unwrap_err();
        assert!(matches!(err, SessionError::Protocol(_)));
    }
}
