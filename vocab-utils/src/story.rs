//! The JSON story the model is asked to produce, and a forgiving parser for it.
//!
//! Nothing forces the model to follow the requested format, so the parser accepts answers wrapped
//! in prose or Markdown code fences and callers fall back to the raw text when parsing fails.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::prompt::VocabularyPair;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct TranslationRow {
    pub position: u32,
    pub english: String,
    pub german: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct StorySentence {
    /// Word position (1-based, as a string key) to English word.
    #[serde(default)]
    #[tsify(type = "Record<string, string>")]
    pub english: IndexMap<String, String>,
    #[serde(default)]
    #[tsify(type = "Record<string, string>")]
    pub german: IndexMap<String, String>,
    #[serde(default)]
    pub translations: Vec<TranslationRow>,
}

impl StorySentence {
    pub fn english_text(&self) -> String {
        self.english.values().cloned().collect::<Vec<_>>().join(" ")
    }

    pub fn german_text(&self) -> String {
        self.german.values().cloned().collect::<Vec<_>>().join(" ")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct StoryResponse {
    /// Sentence index (1-based, as a string key) to sentence, in story order.
    #[tsify(type = "Record<string, StorySentence>")]
    pub story: IndexMap<String, StorySentence>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoryParseError {
    #[error("answer does not contain a JSON object")]
    NoJsonObject,

    #[error("story JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("story contains no sentences")]
    Empty,
}

pub fn parse_story(answer: &str) -> Result<StoryResponse, StoryParseError> {
    let start = answer.find('{').ok_or(StoryParseError::NoJsonObject)?;
    let end = answer.rfind('}').ok_or(StoryParseError::NoJsonObject)?;
    if end < start {
        return Err(StoryParseError::NoJsonObject);
    }

    let story: StoryResponse = serde_json::from_str(&answer[start..=end])?;
    if story.story.is_empty() {
        return Err(StoryParseError::Empty);
    }
    Ok(story)
}

impl StoryResponse {
    pub fn sentences(&self) -> impl Iterator<Item = (&str, &StorySentence)> {
        self.story.iter().map(|(index, sentence)| (index.as_str(), sentence))
    }

    /// Vocabulary items that appear neither in a translation row nor in any German sentence.
    pub fn missing_vocabulary<'a>(&self, pairs: &'a [VocabularyPair]) -> Vec<&'a VocabularyPair> {
        let german_rows: Vec<String> = self
            .story
            .values()
            .flat_map(|sentence| sentence.translations.iter())
            .map(|row| row.german.to_lowercase())
            .collect();
        let german_text = self
            .story
            .values()
            .map(StorySentence::german_text)
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        pairs
            .iter()
            .filter(|pair| {
                let wanted = pair.german.to_lowercase();
                !german_rows.iter().any(|row| *row == wanted) && !german_text.contains(&wanted)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANSWER: &str = r#"{
      "story": {
        "1": {
          "english": {"1": "The", "2": "dog", "3": "sleeps."},
          "german": {"1": "Der", "2": "Hund", "3": "schläft."},
          "translations": [
            {"position": 1, "english": "The", "german": "Der"},
            {"position": 2, "english": "dog", "german": "der Hund"},
            {"position": 3, "english": "sleeps", "german": "schläft"}
          ]
        },
        "2": {
          "english": {"1": "It", "2": "dreams."},
          "german": {"1": "Er", "2": "träumt."},
          "translations": []
        }
      }
    }"#;

    #[test]
    fn test_parse_plain_story() {
        let story = parse_story(ANSWER).unwrap();
        let indices: Vec<_> = story.sentences().map(|(index, _)| index).collect();
        assert_eq!(indices, vec!["1", "2"]);

        let first = &story.story["1"];
        assert_eq!(first.german_text(), "Der Hund schläft.");
        assert_eq!(first.english_text(), "The dog sleeps.");
        assert_eq!(first.translations[1].german, "der Hund");
    }

    #[test]
    fn test_parse_story_in_code_fence() {
        let fenced = format!("Here you go!\n```json\n{ANSWER}\n```\nEnjoy.");
        let story = parse_story(&fenced).unwrap();
        assert_eq!(story.story.len(), 2);
    }

    #[test]
    fn test_parse_story_errors() {
        assert!(matches!(
            parse_story("Sorry, I cannot help."),
            Err(StoryParseError::NoJsonObject)
        ));
        assert!(matches!(
            parse_story("} oops {"),
            Err(StoryParseError::NoJsonObject)
        ));
        assert!(matches!(
            parse_story(r#"{"story": {}}"#),
            Err(StoryParseError::Empty)
        ));
        assert!(matches!(
            parse_story(r#"{"tale": 1}"#),
            Err(StoryParseError::Json(_))
        ));
    }

    #[test]
    fn test_missing_vocabulary() {
        let story = parse_story(ANSWER).unwrap();
        let pairs = vec![
            VocabularyPair {
                german: "der Hund".to_string(),
                english: Some("dog".to_string()),
            },
            VocabularyPair {
                german: "träumen".to_string(),
                english: Some("to dream".to_string()),
            },
            VocabularyPair {
                german: "die Katze".to_string(),
                english: Some("cat".to_string()),
            },
        ];

        let missing: Vec<_> = story
            .missing_vocabulary(&pairs)
            .into_iter()
            .map(|pair| pair.german.as_str())
            .collect();
        assert_eq!(missing, vec!["träumen", "die Katze"]);
    }
}
