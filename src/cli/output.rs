use crate::{CheckResult, FlaggedFragment, IdentKind, IdentifierReport};
use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonError<'a> {
    file: String,
    line: usize,
    column: usize,
    identifier: &'a str,
    word: &'a str,
    kind: IdentKind,
    suggestions: &'a [String],
    low_confidence: bool,
}

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    files_checked: usize,
    total_errors: usize,
    errors: Vec<JsonError<'a>>,
}

pub fn print_report(result: &CheckResult, format: OutputFormat, colored: bool) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for report in &result.reports {
                for flagged in report.flagged() {
                    println!("{}", format_text_line(report, flagged, colored));
                }
            }
        }
        OutputFormat::Json => println!("{}", format_json(result)?),
    }
    Ok(())
}

/// `file:line:col: word: guess, guess?`
pub fn format_text_line(report: &IdentifierReport, flagged: &FlaggedFragment, colored: bool) -> String {
    let location = &report.identifier().location;
    let position = format!("{}:{}:{}", location.file.display(), location.line, flagged.column);
    let guesses = flagged.verdict.suggestions.join(", ");

    if colored {
        format!(
            "{}: {}: {}{}",
            position.blue().bold(),
            flagged.text.red().bold(),
            guesses.green(),
            "?".dimmed()
        )
    } else {
        format!("{}: {}: {}?", position, flagged.text, guesses)
    }
}

pub fn format_json(result: &CheckResult) -> Result<String> {
    let errors = result
        .reports
        .iter()
        .flat_map(|report| {
            let identifier = report.identifier();
            report.flagged().iter().map(move |flagged| JsonError {
                file: identifier.location.file.display().to_string(),
                line: identifier.location.line,
                column: flagged.column,
                identifier: &identifier.text,
                word: &flagged.text,
                kind: identifier.kind,
                suggestions: &flagged.verdict.suggestions,
                low_confidence: flagged.verdict.low_confidence,
            })
        })
        .collect();

    let output = JsonOutput {
        files_checked: result.files_checked,
        total_errors: result.error_count(),
        errors,
    };
    serde_json::to_string_pretty(&output).context("Failed to serialize report")
}

pub fn print_check_summary(total_errors: usize, files_checked: usize, colored: bool) {
    let file_word = if files_checked == 1 { "file" } else { "files" };
    println!();
    if total_errors == 0 {
        let message = format!("✓ No spelling errors found in {} {}", files_checked, file_word);
        if colored {
            println!("{}", message.green().bold());
        } else {
            println!("{}", message);
        }
    } else {
        let error_word = if total_errors == 1 { "error" } else { "errors" };
        if colored {
            println!(
                "{} {} {} found in {} {}",
                "✗".red().bold(),
                total_errors.to_string().red().bold(),
                error_word,
                files_checked,
                file_word
            );
        } else {
            println!(
                "✗ {} {} found in {} {}",
                total_errors, error_word, files_checked, file_word
            );
        }
    }
}

/// Every flagged word, lower-cased, sorted and de-duplicated.
pub fn unknown_words(result: &CheckResult) -> Vec<String> {
    result
        .reports
        .iter()
        .flat_map(|report| report.flagged())
        .map(|flagged| flagged.text.to_lowercase())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Write the unknown words as a wordlist, one per line. Returns how many
/// were written.
pub fn write_dictionary(result: &CheckResult, path: &Path) -> Result<usize> {
    let words = unknown_words(result);
    let mut content = words.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(path, content)
        .with_context(|| format!("Failed to write dictionary: {}", path.display()))?;
    Ok(words.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Status, Verdict};
    use crate::{Identifier, SourceLocation, SplitRule};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn report(text: &str, line: usize, word: &str, start: usize, guesses: &[&str]) -> IdentifierReport {
        let identifier = Identifier::new(
            text,
            SourceLocation {
                file: Arc::new(PathBuf::from("src/app.py")),
                line,
                column: 5,
            },
            IdentKind::Identifier,
        );
        let flagged = FlaggedFragment {
            text: word.to_string(),
            start,
            end: start + word.len(),
            column: 5 + start,
            rule: SplitRule::CaseTransition,
            verdict: Verdict {
                word: word.to_lowercase(),
                status: if guesses.is_empty() {
                    Status::Unknown
                } else {
                    Status::UnknownWithGuesses
                },
                suggestions: guesses.iter().map(|g| g.to_string()).collect(),
                root: None,
                low_confidence: false,
            },
        };
        IdentifierReport::new(identifier, vec![flagged]).unwrap()
    }

    fn result() -> CheckResult {
        CheckResult {
            files_checked: 2,
            reports: vec![
                report("getRemaningItems", 3, "Remaning", 3, &["remaining", "remaking"]),
                report("zyxCount", 9, "zyx", 0, &[]),
            ],
        }
    }

    #[test]
    fn test_text_line() {
        let result = result();
        let first = &result.reports[0];
        assert_eq!(
            format_text_line(first, &first.flagged()[0], false),
            "src/app.py:3:8: Remaning: remaining, remaking?"
        );
        let second = &result.reports[1];
        assert_eq!(
            format_text_line(second, &second.flagged()[0], false),
            "src/app.py:9:5: zyx: ?"
        );
    }

    #[test]
    fn test_json_output() {
        let json: serde_json::Value = serde_json::from_str(&format_json(&result()).unwrap()).unwrap();
        assert_eq!(json["files_checked"], 2);
        assert_eq!(json["total_errors"], 2);
        assert_eq!(json["errors"][0]["identifier"], "getRemaningItems");
        assert_eq!(json["errors"][0]["word"], "Remaning");
        assert_eq!(json["errors"][0]["column"], 8);
        assert_eq!(json["errors"][0]["kind"], "identifier");
        assert_eq!(json["errors"][1]["suggestions"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_make_dictionary() {
        let mut result = result();
        result
            .reports
            .push(report("REMANING", 12, "REMANING", 0, &["remaining"]));
        assert_eq!(unknown_words(&result), vec!["remaning", "zyx"]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.dict");
        assert_eq!(write_dictionary(&result, &path).unwrap(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "remaning\nzyx\n");
    }
}
