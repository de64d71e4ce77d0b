use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use identspell::cli::output::{self, OutputFormat};
use identspell::config::Overrides;
use identspell::dict::{manager, Wordlists};
use identspell::{checker, Config, SessionError};
use log::debug;
use std::io;
use std::path::PathBuf;
use std::process;

const EXIT_MISSPELLED: i32 = 1;
const EXIT_FATAL: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "identspell")]
#[command(version, about = "Spellcheck the identifiers, comments and strings in source code", long_about = None)]
struct Cli {
    /// Files or directories to check
    #[arg(value_name = "PATHS")]
    paths: Vec<PathBuf>,

    /// Report every occurrence of a misspelled word
    #[arg(short, long, conflicts_with = "unique")]
    all: bool,

    /// Report each misspelled word once per file (default)
    #[arg(short, long)]
    unique: bool,

    /// Extra dictionary: builtin name or wordlist file (repeatable)
    #[arg(short, long = "dictionary", value_name = "DICT")]
    dictionaries: Vec<String>,

    /// Regex of words to ignore, case-insensitive (repeatable)
    #[arg(short = 'I', long = "ignore", value_name = "REGEX")]
    ignore: Vec<String>,

    /// Let the engine accept run-together words
    #[arg(short = 'C', long, conflicts_with = "no_compound")]
    compound: bool,

    /// Reject run-together words
    #[arg(long)]
    no_compound: bool,

    /// Words of at most N characters are always accepted
    #[arg(short = 'W', long, value_name = "N")]
    wordlen: Option<usize>,

    /// Engine dictionary to use (e.g. american, british)
    #[arg(short, long)]
    language: Option<String>,

    /// Personal wordlist added to every check
    #[arg(long)]
    personal_dict: Option<PathBuf>,

    /// Spelling engine executable (default: ispell)
    #[arg(long, value_name = "COMMAND")]
    engine: Option<String>,

    /// Write every unknown word to FILE instead of reporting
    #[arg(long, value_name = "FILE")]
    make_dict: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(short = 'o', long, default_value = "text")]
    format: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Exit with code 0 even if errors are found
    #[arg(long)]
    no_fail: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dictionary management
    Dict {
        #[command(subcommand)]
        action: DictCommands,
    },
}

#[derive(Subcommand, Debug)]
enum DictCommands {
    /// List available dictionaries
    List,
    /// Show where a dictionary comes from and its size
    Info {
        /// Builtin name or wordlist file
        name: String,
    },
    /// Print the words of one or more dictionaries
    Dump {
        /// Dictionaries to print (default: base)
        names: Vec<String>,
    },
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            language: self.language.clone(),
            personal_dictionary: self.personal_dict.clone(),
            dictionaries: self.dictionaries.clone(),
            ignore_patterns: self.ignore.clone(),
            engine_command: self.engine.clone(),
            compound: match (self.compound, self.no_compound) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
            word_len: self.wordlen,
            unique: match (self.all, self.unique) {
                (true, _) => Some(false),
                (_, true) => Some(true),
                _ => None,
            },
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if let Some(SessionError::Start(_)) = e.downcast_ref::<SessionError>() {
                eprintln!("Is the spelling engine installed? Set it with --engine or engine_command.");
            }
            process::exit(EXIT_FATAL);
        }
    }
}

fn run(mut cli: Cli) -> Result<i32> {
    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "identspell", &mut io::stdout());
        return Ok(0);
    }

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Some(command) = cli.command.take() {
        handle_command(command)?;
        return Ok(0);
    }

    if cli.paths.is_empty() {
        anyhow::bail!("No files specified. Use --help for usage information.");
    }

    let config = Config::load(cli.overrides())?;
    debug!("Configuration: {:?}", config);

    let mut checker = checker::SpellChecker::new(config);
    let result = checker.check_paths(&cli.paths)?;

    if let Some(path) = &cli.make_dict {
        let count = output::write_dictionary(&result, path)?;
        eprintln!("Wrote {} words to {}", count, path.display());
        return Ok(0);
    }

    let colored = !cli.no_color;
    output::print_report(&result, cli.format, colored)?;
    if cli.format == OutputFormat::Text {
        output::print_check_summary(result.error_count(), result.files_checked, colored);
    }

    if result.error_count() > 0 && !cli.no_fail {
        return Ok(EXIT_MISSPELLED);
    }
    Ok(0)
}

fn handle_command(command: Commands) -> Result<()> {
    let wordlists = Wordlists::new();
    match command {
        Commands::Dict { action } => match action {
            DictCommands::List => manager::list_dictionaries(&wordlists)?,
            DictCommands::Info { name } => manager::show_info(&wordlists, &name)?,
            DictCommands::Dump { names } => manager::dump(&wordlists, &names)?,
        },
    }
    Ok(())
}
