use super::{builtin_names, words, Source, Wordlists, BASE_DICTIONARY};
use anyhow::Result;
use colored::*;

pub struct DictionaryInfo {
    pub name: String,
    pub source: Source,
    pub word_count: usize,
}

impl DictionaryInfo {
    pub fn load(wordlists: &Wordlists, name: &str) -> Result<Option<Self>> {
        let Some(source) = wordlists.resolve(name) else {
            return Ok(None);
        };
        let word_count = words(&source.read()?).count();
        Ok(Some(Self {
            name: name.to_string(),
            source,
            word_count,
        }))
    }

    fn location(&self) -> String {
        match &self.source {
            Source::File(path) => path.display().to_string(),
            Source::Builtin(_) => "builtin".to_string(),
        }
    }
}

pub fn list_dictionaries(wordlists: &Wordlists) -> Result<()> {
    println!("{}", "Available dictionaries:".bold());
    println!();

    for name in builtin_names() {
        if let Some(info) = DictionaryInfo::load(wordlists, name)? {
            println!(
                "  {} {} ({})",
                "✓".green(),
                info.name.cyan().bold(),
                format!("{} words, {}", info.word_count, info.location()).dimmed()
            );
        }
    }

    println!();
    let search_path: Vec<String> = wordlists
        .search_path()
        .iter()
        .map(|dir| dir.display().to_string())
        .collect();
    println!("Search path: {}", search_path.join(", ").dimmed());

    Ok(())
}

pub fn show_info(wordlists: &Wordlists, name: &str) -> Result<()> {
    let Some(info) = DictionaryInfo::load(wordlists, name)? else {
        println!(
            "{} Dictionary {} not found.",
            "✗".red().bold(),
            name.yellow()
        );
        println!(
            "Run {} to see the available dictionaries.",
            "identspell dict list".cyan()
        );
        return Ok(());
    };

    println!("{}", format!("Dictionary: {}", info.name).bold());
    println!("  Source: {}", info.location());
    println!("  Words: {}", info.word_count);

    Ok(())
}

/// Print the words of `names` (the base wordlist when empty), one per line.
pub fn dump(wordlists: &Wordlists, names: &[String]) -> Result<()> {
    let names = if names.is_empty() {
        vec![BASE_DICTIONARY.to_string()]
    } else {
        names.to_vec()
    };

    for name in &names {
        match wordlists.resolve(name) {
            Some(source) => {
                for word in words(&source.read()?) {
                    println!("{}", word);
                }
            }
            None => anyhow::bail!("Dictionary not found: {}", name),
        }
    }

    Ok(())
}
