use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const LOCAL_CONFIG_FILE: &str = ".identspell.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine dictionary to use (`-d`), engine default when unset.
    pub language: Option<String>,
    pub personal_dictionary: Option<PathBuf>,
    /// Extra wordlists: builtin names or file paths.
    pub dictionaries: Vec<String>,
    /// Fragments matching any of these (case-insensitive) are never checked.
    pub ignore_patterns: Vec<String>,
    pub acronyms: Vec<String>,
    pub min_fragment_len: usize,
    pub consonant_threshold: usize,

    pub engine_command: String,
    pub engine_args: Vec<String>,
    pub compound: bool,
    pub word_len: Option<usize>,
    pub exit_command: Option<String>,
    pub read_timeout_ms: Option<u64>,
    pub shutdown_timeout_ms: u64,
    pub batch_size: usize,

    /// Report each misspelled word once per file.
    pub unique: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: None,
            personal_dictionary: None,
            dictionaries: Vec::new(),
            ignore_patterns: Vec::new(),
            acronyms: default_acronyms(),
            min_fragment_len: 2,
            consonant_threshold: 4,
            engine_command: "ispell".to_string(),
            engine_args: vec!["-a".to_string()],
            compound: true,
            word_len: Some(3),
            exit_command: None,
            read_timeout_ms: None,
            shutdown_timeout_ms: 2000,
            batch_size: 64,
            unique: true,
        }
    }
}

fn default_acronyms() -> Vec<String> {
    [
        "api", "ascii", "cli", "cpu", "css", "csv", "dns", "gui", "html", "http", "https", "ipc",
        "json", "jwt", "sql", "ssh", "tcp", "tls", "udp", "uri", "url", "utf", "uuid", "xml",
        "yaml",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Values given on the command line; `None`/empty means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub language: Option<String>,
    pub personal_dictionary: Option<PathBuf>,
    pub dictionaries: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub engine_command: Option<String>,
    pub compound: Option<bool>,
    pub word_len: Option<usize>,
    pub unique: Option<bool>,
}

impl Config {
    /// Load configuration with priority: CLI args > local config > global config > defaults
    pub fn load(overrides: Overrides) -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                config = config.merge(Self::from_file(&global_path)?);
            }
        }

        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            config = config.merge(Self::from_file(&local_path)?);
        }

        Ok(config.apply(overrides))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn merge(mut self, other: Self) -> Self {
        // other's values override self's if they differ from defaults
        let defaults = Self::default();

        if other.language.is_some() {
            self.language = other.language;
        }
        if other.personal_dictionary.is_some() {
            self.personal_dictionary = other.personal_dictionary;
        }
        if !other.dictionaries.is_empty() {
            self.dictionaries = other.dictionaries;
        }
        if !other.ignore_patterns.is_empty() {
            self.ignore_patterns = other.ignore_patterns;
        }
        if other.acronyms != defaults.acronyms {
            self.acronyms = other.acronyms;
        }
        if other.min_fragment_len != defaults.min_fragment_len {
            self.min_fragment_len = other.min_fragment_len;
        }
        if other.consonant_threshold != defaults.consonant_threshold {
            self.consonant_threshold = other.consonant_threshold;
        }
        if other.engine_command != defaults.engine_command {
            self.engine_command = other.engine_command;
        }
        if other.engine_args != defaults.engine_args {
            self.engine_args = other.engine_args;
        }
        if other.compound != defaults.compound {
            self.compound = other.compound;
        }
        if other.word_len != defaults.word_len {
            self.word_len = other.word_len;
        }
        if other.exit_command.is_some() {
            self.exit_command = other.exit_command;
        }
        if other.read_timeout_ms.is_some() {
            self.read_timeout_ms = other.read_timeout_ms;
        }
        if other.shutdown_timeout_ms != defaults.shutdown_timeout_ms {
            self.shutdown_timeout_ms = other.shutdown_timeout_ms;
        }
        if other.batch_size != defaults.batch_size {
            self.batch_size = other.batch_size;
        }
        if other.unique != defaults.unique {
            self.unique = other.unique;
        }
        self
    }

    fn apply(mut self, overrides: Overrides) -> Self {
        if overrides.language.is_some() {
            self.language = overrides.language;
        }
        if overrides.personal_dictionary.is_some() {
            self.personal_dictionary = overrides.personal_dictionary;
        }
        // CLI dictionaries and patterns add to the configured ones
        self.dictionaries.extend(overrides.dictionaries);
        self.ignore_patterns.extend(overrides.ignore_patterns);
        if let Some(command) = overrides.engine_command {
            self.engine_command = command;
        }
        if let Some(compound) = overrides.compound {
            self.compound = compound;
        }
        if let Some(len) = overrides.word_len {
            self.word_len = Some(len);
        }
        if let Some(unique) = overrides.unique {
            self.unique = unique;
        }
        self
    }

    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "identspell").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn cache_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "identspell").map(|dirs| dirs.cache_dir().to_path_buf())
    }

    pub fn data_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "identspell").map(|dirs| dirs.data_dir().to_path_buf())
    }
}
