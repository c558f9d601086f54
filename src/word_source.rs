use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::WordListError;

static WORDS_DIR: Dir = include_dir!("src/words");

/// Upper bound on the number of words drawn from a pool source.
pub const MAX_POOL_WORDS: usize = 100;

/// Used whenever the selected source cannot be loaded.
pub const FALLBACK_WORDS: [&str; 10] = ["the", "be", "to", "of", "and", "a", "in", "that", "have", "I"];

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WordSourceKind {
    #[default]
    Common,
    Programming,
    Quotes,
}

impl WordSourceKind {
    pub const ALL: [WordSourceKind; 3] = [
        WordSourceKind::Common,
        WordSourceKind::Programming,
        WordSourceKind::Quotes,
    ];

    /// Stable identifier used in file names and persisted results.
    pub fn id(&self) -> String {
        self.to_string()
    }

    pub fn label(&self) -> &'static str {
        match self {
            WordSourceKind::Common => "Common Words",
            WordSourceKind::Programming => "Programming Terms",
            WordSourceKind::Quotes => "Famous Quotes",
        }
    }
}

/// Raw content of a word list before selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WordListContent {
    /// Words to shuffle and draw from.
    Pool(Vec<String>),
    /// Whole quotes; one is picked per session.
    Quotes(Vec<String>),
}

/// Supplies the raw list behind a word source.
pub trait WordProvider {
    fn read(&self, source: WordSourceKind) -> Result<WordListContent, WordListError>;
}

#[derive(Deserialize, Clone, Debug)]
struct BundledList {
    name: String,
    #[serde(default)]
    words: Vec<String>,
    #[serde(default)]
    quotes: Vec<String>,
}

/// Lists compiled into the binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct BundledWords;

impl WordProvider for BundledWords {
    fn read(&self, source: WordSourceKind) -> Result<WordListContent, WordListError> {
        let file_name = format!("{}.json", source.id());
        let file = WORDS_DIR
            .get_file(&file_name)
            .ok_or_else(|| WordListError::UnknownBundled(file_name.clone()))?;

        let contents = file
            .contents_utf8()
            .ok_or_else(|| WordListError::UnknownBundled(file_name.clone()))?;

        let list: BundledList =
            serde_json::from_str(contents).map_err(|source| WordListError::Parse {
                name: file_name.clone(),
                source,
            })?;

        tracing::debug!("loaded bundled word list {}", list.name);

        Ok(match source {
            WordSourceKind::Quotes => WordListContent::Quotes(list.quotes),
            _ => WordListContent::Pool(list.words),
        })
    }
}

/// Plain-text lists read from `<dir>/<source id>.txt`. Pool lists are
/// whitespace separated; quote lists separate quotes with blank lines.
#[derive(Clone, Debug)]
pub struct FileWords {
    dir: PathBuf,
}

impl FileWords {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, source: WordSourceKind) -> PathBuf {
        self.dir.join(format!("{}.txt", source.id()))
    }
}

impl WordProvider for FileWords {
    fn read(&self, source: WordSourceKind) -> Result<WordListContent, WordListError> {
        let path = self.path_for(source);
        let content = fs::read_to_string(&path).map_err(|source| WordListError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(match source {
            WordSourceKind::Quotes => WordListContent::Quotes(split_quotes(&content)),
            _ => WordListContent::Pool(content.split_whitespace().map(String::from).collect()),
        })
    }
}

/// Splits text into paragraphs separated by blank lines, joining wrapped lines.
pub fn split_quotes(content: &str) -> Vec<String> {
    let mut quotes = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                quotes.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }

    if !current.is_empty() {
        quotes.push(current.join(" "));
    }

    quotes
}

/// Picks the words for one session: a shuffled pool capped at
/// [`MAX_POOL_WORDS`], or the tokens of a single random quote.
pub fn load_words<P, R>(
    provider: &P,
    source: WordSourceKind,
    rng: &mut R,
) -> Result<Vec<String>, WordListError>
where
    P: WordProvider + ?Sized,
    R: Rng + ?Sized,
{
    match provider.read(source)? {
        WordListContent::Pool(mut words) => {
            words.retain(|w| !w.trim().is_empty());
            if words.is_empty() {
                return Err(WordListError::Empty(source.id()));
            }
            words.shuffle(rng);
            words.truncate(MAX_POOL_WORDS);
            Ok(words)
        }
        WordListContent::Quotes(quotes) => {
            let quote = quotes
                .iter()
                .filter(|q| !q.trim().is_empty())
                .collect::<Vec<_>>()
                .choose(rng)
                .map(|q| q.split_whitespace().map(String::from).collect::<Vec<_>>())
                .ok_or_else(|| WordListError::Empty(source.id()))?;
            Ok(quote)
        }
    }
}

/// Like [`load_words`], but substitutes [`FALLBACK_WORDS`] on any error.
pub fn load_words_or_fallback<P, R>(provider: &P, source: WordSourceKind, rng: &mut R) -> Vec<String>
where
    P: WordProvider + ?Sized,
    R: Rng + ?Sized,
{
    match load_words(provider, source, rng) {
        Ok(words) => words,
        Err(e) => {
            tracing::warn!("falling back to built-in words for {source}: {e}");
            fallback_words()
        }
    }
}

pub fn fallback_words() -> Vec<String> {
    FALLBACK_WORDS.iter().map(|w| w.to_string()).collect()
}

/// The provider for a configured word list directory, or the bundled lists.
pub fn provider_for(word_list_dir: Option<&Path>) -> Box<dyn WordProvider> {
    match word_list_dir {
        Some(dir) => Box::new(FileWords::new(dir)),
        None => Box::new(BundledWords),
    }
}
