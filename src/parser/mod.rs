pub mod source_code;

use crate::Identifier;
use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Serialize;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Go,
    Java,
    JavaScript,
    Perl,
    Python,
    Rust,
    Shell,
}

impl Language {
    pub fn from_extension(ext: &str) -> Option<Self> {
        let lang = match ext.to_lowercase().as_str() {
            "c" | "h" | "cc" | "cpp" | "cxx" | "hpp" | "hh" => Language::C,
            "go" => Language::Go,
            "java" => Language::Java,
            "js" | "mjs" | "cjs" | "jsx" | "ts" | "tsx" => Language::JavaScript,
            "pl" | "pm" => Language::Perl,
            "py" | "pyw" => Language::Python,
            "rs" => Language::Rust,
            "sh" | "bash" => Language::Shell,
            _ => return None,
        };
        Some(lang)
    }

    /// Detect from the extension, falling back to a `#!` interpreter line.
    pub fn detect(path: &Path) -> Option<Self> {
        if let Some(lang) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
        {
            return Some(lang);
        }

        let file = fs::File::open(path).ok()?;
        let mut first_line = String::new();
        BufReader::new(file).read_line(&mut first_line).ok()?;
        Self::from_shebang(&first_line)
    }

    fn from_shebang(line: &str) -> Option<Self> {
        let interpreter = line.strip_prefix("#!")?;
        if interpreter.contains("python") {
            Some(Language::Python)
        } else if interpreter.contains("perl") {
            Some(Language::Perl)
        } else if interpreter.contains("node") {
            Some(Language::JavaScript)
        } else if interpreter.contains("sh") {
            Some(Language::Shell)
        } else {
            None
        }
    }

    /// Name of the builtin wordlist for this language.
    pub fn dictionary_name(self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Go => "go",
            Language::Java => "java",
            Language::JavaScript => "javascript",
            Language::Perl => "perl",
            Language::Python => "python",
            Language::Rust => "rust",
            Language::Shell => "shell",
        }
    }
}

/// Identifiers of one file, ready for checking.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: Arc<PathBuf>,
    pub language: Option<Language>,
    pub identifiers: Vec<Identifier>,
}

/// Read and scan a file. Invalid UTF-8 is replaced, not rejected.
pub fn parse_file(path: &Path) -> Result<SourceFile> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let content = String::from_utf8_lossy(&bytes);
    let language = Language::detect(path);
    let shared = Arc::new(path.to_path_buf());

    debug!("Scanning {} as {:?}", path.display(), language);
    let identifiers = source_code::parse(&content, &shared, language);

    Ok(SourceFile {
        path: shared,
        language,
        identifiers,
    })
}

/// Expand inputs into the files to check. Directories are walked and only
/// files in a known language are kept; explicit files are always kept.
pub fn find_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", input.display(), e);
                    continue;
                }
            };
            let is_source = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .and_then(Language::from_extension)
                .is_some();
            if entry.file_type().is_file() && is_source {
                files.push(entry.into_path());
            }
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_language_from_extension() {
        assert_eq!(Language::detect(Path::new("main.rs")), Some(Language::Rust));
        assert_eq!(Language::detect(Path::new("util.H")), Some(Language::C));
        assert_eq!(Language::detect(Path::new("Lib.pm")), Some(Language::Perl));
        assert_eq!(Language::detect(Path::new("missing.txt")), None);
    }

    #[test]
    fn test_language_from_shebang() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("deploy");
        fs::write(&script, "#!/usr/bin/env python3\nprint('hi')\n").unwrap();
        assert_eq!(Language::detect(&script), Some(Language::Python));

        assert_eq!(Language::from_shebang("#!/bin/bash"), Some(Language::Shell));
        assert_eq!(Language::from_shebang("no shebang"), None);
    }

    #[test]
    fn test_find_files_filters_directories() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg/a.py"), "").unwrap();
        fs::write(dir.path().join("pkg/b.go"), "").unwrap();
        fs::write(dir.path().join("pkg/notes.txt"), "").unwrap();
        let explicit = dir.path().join("README");
        fs::write(&explicit, "").unwrap();

        let files = find_files(&[dir.path().join("pkg"), explicit.clone()]);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.py", "b.go", "README"]);
    }

    #[test]
    fn test_parse_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lib.rs");
        fs::write(&path, "fn getRemaningObjects() {}\n").unwrap();

        let file = parse_file(&path).unwrap();
        assert_eq!(file.language, Some(Language::Rust));
        let texts: Vec<_> = file.identifiers.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["fn", "getRemaningObjects"]);
    }
}
