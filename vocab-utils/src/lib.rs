pub mod prompt;
pub mod relay;
pub mod story;

use std::path::Path;

use indexmap::IndexMap;

#[derive(
    Copy,
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    tsify::Tsify,
    parse_display::Display,
    parse_display::FromStr,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "lowercase")]
#[display(style = "lowercase")]
pub enum Article {
    Der,
    Die,
    Das,
}

impl Article {
    pub const ALL: [Article; 3] = [Article::Der, Article::Die, Article::Das];

    /// Parses user input such as `"Der"` or `" das "`.
    pub fn parse_loose(input: &str) -> Option<Article> {
        input.trim().to_lowercase().parse().ok()
    }
}

#[derive(
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    PartialEq,
    Eq,
    tsify::Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct WordEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<Article>,
    pub english: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_de: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_en: Option<String>,
}

impl WordEntry {
    /// The German form as shown to learners: `"der Hund"` for nouns, the bare word otherwise.
    pub fn german(&self, word: &str) -> String {
        match self.article {
            Some(article) => format!("{article} {word}"),
            None => word.to_string(),
        }
    }
}

/// One vocabulary item: the word key together with its entry.
#[derive(
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    PartialEq,
    Eq,
    tsify::Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Card {
    pub word: String,
    pub entry: WordEntry,
}

impl Card {
    pub fn new(word: impl Into<String>, entry: WordEntry) -> Self {
        Self {
            word: word.into(),
            entry,
        }
    }

    pub fn german(&self) -> String {
        self.entry.german(&self.word)
    }
}

#[derive(
    Copy,
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Nouns,
    Verbs,
    Adjectives,
    Phrases,
    Adverbs,
    Expressions,
}

impl PartOfSpeech {
    /// Order used when listing a set's words.
    pub const DISPLAY_ORDER: [PartOfSpeech; 6] = [
        PartOfSpeech::Nouns,
        PartOfSpeech::Verbs,
        PartOfSpeech::Adjectives,
        PartOfSpeech::Phrases,
        PartOfSpeech::Adverbs,
        PartOfSpeech::Expressions,
    ];

    /// Order in which categories are merged into a flashcard deck. Later categories win on
    /// duplicate keys.
    pub const FLASHCARD_ORDER: [PartOfSpeech; 6] = [
        PartOfSpeech::Nouns,
        PartOfSpeech::Adjectives,
        PartOfSpeech::Verbs,
        PartOfSpeech::Phrases,
        PartOfSpeech::Adverbs,
        PartOfSpeech::Expressions,
    ];
}

impl std::fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PartOfSpeech::Nouns => "Nouns",
            PartOfSpeech::Verbs => "Verbs",
            PartOfSpeech::Adjectives => "Adjectives",
            PartOfSpeech::Phrases => "Phrases",
            PartOfSpeech::Adverbs => "Adverbs",
            PartOfSpeech::Expressions => "Expressions",
        };
        write!(f, "{label}")
    }
}

pub type WordMap = IndexMap<String, WordEntry>;

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize, PartialEq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct VocabularySet {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[tsify(type = "Record<string, WordEntry>")]
    pub nouns: Option<WordMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[tsify(type = "Record<string, WordEntry>")]
    pub verbs: Option<WordMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[tsify(type = "Record<string, WordEntry>")]
    pub adjectives: Option<WordMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[tsify(type = "Record<string, WordEntry>")]
    pub phrases: Option<WordMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[tsify(type = "Record<string, WordEntry>")]
    pub adverbs: Option<WordMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[tsify(type = "Record<string, WordEntry>")]
    pub expressions: Option<WordMap>,
}

impl VocabularySet {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Untitled set")
    }

    pub fn category(&self, part: PartOfSpeech) -> Option<&WordMap> {
        match part {
            PartOfSpeech::Nouns => self.nouns.as_ref(),
            PartOfSpeech::Verbs => self.verbs.as_ref(),
            PartOfSpeech::Adjectives => self.adjectives.as_ref(),
            PartOfSpeech::Phrases => self.phrases.as_ref(),
            PartOfSpeech::Adverbs => self.adverbs.as_ref(),
            PartOfSpeech::Expressions => self.expressions.as_ref(),
        }
    }

    /// Non-empty categories in display order.
    pub fn categories(&self) -> impl Iterator<Item = (PartOfSpeech, &WordMap)> {
        PartOfSpeech::DISPLAY_ORDER
            .into_iter()
            .filter_map(|part| self.category(part).map(|words| (part, words)))
            .filter(|(_, words)| !words.is_empty())
    }

    pub fn has_nouns(&self) -> bool {
        self.nouns.as_ref().is_some_and(|nouns| !nouns.is_empty())
    }

    pub fn word_count(&self) -> usize {
        self.categories().map(|(_, words)| words.len()).sum()
    }

    /// Renders the set as `german - english` lines, the input format of story prompts.
    pub fn vocabulary_lines(&self) -> String {
        self.categories()
            .flat_map(|(_, words)| words.iter())
            .map(|(word, entry)| format!("{} - {}", entry.german(word), entry.english))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Theme {
    pub title: String,
    #[serde(default)]
    pub sets: Vec<VocabularySet>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Catalog {
    #[serde(default)]
    pub themes: Vec<Theme>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("could not read vocabulary catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("vocabulary catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn sets(&self) -> impl Iterator<Item = &VocabularySet> {
        self.themes.iter().flat_map(|theme| theme.sets.iter())
    }

    /// First set with the given id, searching themes in order.
    pub fn find_set(&self, id: &str) -> Option<&VocabularySet> {
        self.sets().find(|set| set.id == id)
    }
}
