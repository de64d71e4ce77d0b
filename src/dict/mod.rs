//! Wordlists handed to the engine as its personal dictionary.
//!
//! A name is resolved to an existing file, a `<name>.dict` file on the
//! search path, or one of the wordlists embedded in the binary. The lists a
//! run needs are concatenated into one file in the cache directory, keyed by
//! a hash of the names.

pub mod manager;

use crate::config::Config;
use anyhow::{Context, Result};
use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub const BASE_DICTIONARY: &str = "base";

const BUILTIN: &[(&str, &str)] = &[
    ("base", include_str!("../../dict/base.dict")),
    ("c", include_str!("../../dict/c.dict")),
    ("go", include_str!("../../dict/go.dict")),
    ("java", include_str!("../../dict/java.dict")),
    ("javascript", include_str!("../../dict/javascript.dict")),
    ("perl", include_str!("../../dict/perl.dict")),
    ("python", include_str!("../../dict/python.dict")),
    ("rust", include_str!("../../dict/rust.dict")),
    ("shell", include_str!("../../dict/shell.dict")),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Builtin(&'static str),
}

impl Source {
    pub fn read(&self) -> Result<String> {
        match self {
            Source::File(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read dictionary: {}", path.display())),
            Source::Builtin(name) => builtin(name)
                .map(str::to_string)
                .with_context(|| format!("No builtin dictionary named '{}'", name)),
        }
    }
}

pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTIN.iter().map(|(name, _)| *name)
}

fn builtin(name: &str) -> Option<&'static str> {
    BUILTIN
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, words)| *words)
}

/// Words of a wordlist, one per line, skipping blanks and `#` comments.
pub fn words(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Resolves dictionary names and writes merged wordlists.
#[derive(Debug)]
pub struct Wordlists {
    search_path: Vec<PathBuf>,
    cache_dir: PathBuf,
    merged: HashMap<String, PathBuf>,
}

impl Wordlists {
    pub fn new() -> Self {
        let mut search_path = Vec::new();
        if let Some(data_dir) = Config::data_dir() {
            search_path.push(data_dir.join("dict"));
        }
        search_path.push(PathBuf::from("dict"));

        let cache_dir = Config::cache_dir().unwrap_or_else(|| std::env::temp_dir().join("identspell"));
        Self::with_paths(search_path, cache_dir)
    }

    pub fn with_paths(search_path: Vec<PathBuf>, cache_dir: PathBuf) -> Self {
        Self {
            search_path,
            cache_dir,
            merged: HashMap::new(),
        }
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    pub fn resolve(&self, name: &str) -> Option<Source> {
        let as_path = Path::new(name);
        if as_path.is_file() {
            return Some(Source::File(as_path.to_path_buf()));
        }

        if let Some(found) = self
            .search_path
            .iter()
            .map(|dir| dir.join(format!("{}.dict", name)))
            .find(|candidate| candidate.is_file())
        {
            return Some(Source::File(found));
        }

        BUILTIN
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .map(|(builtin, _)| Source::Builtin(builtin))
    }

    /// Concatenate the named wordlists into one file and return its path.
    /// Unresolvable names are skipped with a warning.
    pub fn merged(&mut self, names: &[String]) -> Result<PathBuf> {
        let key = cache_key(names);
        if let Some(path) = self.merged.get(&key) {
            return Ok(path.clone());
        }

        let mut content = String::new();
        for name in names {
            let Some(source) = self.resolve(name) else {
                warn!("Dictionary not found: {}", name);
                continue;
            };
            for word in words(&source.read()?) {
                content.push_str(word);
                content.push('\n');
            }
        }

        fs::create_dir_all(&self.cache_dir).with_context(|| {
            format!("Failed to create cache directory: {}", self.cache_dir.display())
        })?;
        let path = self.cache_dir.join(format!("wordlist-{}.dict", &key[..16]));
        fs::write(&path, content)
            .with_context(|| format!("Failed to write wordlist: {}", path.display()))?;

        debug!("Merged wordlist {:?} into {}", names, path.display());
        self.merged.insert(key, path.clone());
        Ok(path)
    }
}

impl Default for Wordlists {
    fn default() -> Self {
        Self::new()
    }
}

fn cache_key(names: &[String]) -> String {
    let mut hasher = Sha256::new();
    for name in names {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
    }
    hasher
        .finalize()
        .iter()
        .fold(String::with_capacity(64), |mut hex, byte| {
            let _ = write!(hex, "{:02x}", byte);
            hex
        })
}
