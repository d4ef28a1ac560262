//! Prompt templates sent through the relay to the language model.

use crate::Card;

/// The two kinds of request the trainer makes of the language model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromptKind<'a> {
    /// Build a short story out of `german - english` lines.
    Story { vocabulary: &'a str },
    /// Judge a sentence the student wrote with the given word.
    SentenceCheck {
        german_word: &'a str,
        english: &'a str,
        sentence: &'a str,
    },
}

const STORY_PREAMBLE: &str = r#"You are a creative and funny German teacher.
Given a list of German–English vocabulary in this format:
[german] - [english]

Example:
das Gericht - dish, meal
die silberne Hochzeit - silver wedding anniversary
die Sorgfalt - diligence, accuracy
...
Words: "#;

const STORY_TASK: &str = r#"
TASK:
1. If the list has only ONE word or phrase, create just ONE short sentence (not a story) using that word naturally.
2. If the list has multiple words, create a short, silly, or nonsensical English story that uses ALL given English meanings at least once. Number each sentence.
3. Translate each sentence into German, using the exact provided German equivalents in the correct places.
4. Avoid filler sentences: every sentence must include at least one of the provided target words.
5. For each sentence, create a translation table listing every word with:
- position in sentence
- german form
- english translation
6. Output everything in ONE JSON object where each sentence is a unified set containing:
- english sentence (with word positions)
- german sentence (with word positions)
- word-level translation table for that sentence

JSON structure:
{
"story": {
    "1": {
    "english": { "1": "word", "2": "word", ... },
    "german": { "1": "word", "2": "word", ... },
    "translations": [
        {"position": 1, "english": "dish", "german": "das Gericht"},
        {"position": 2, "english": "is", "german": "ist"},
        ...
    ]
    },
    "2": { ... }
}
}

Rules:
- Use all given vocabulary exactly once in context.
- Keep JSON valid, compact, and machine-readable.
- Output **only the JSON**, no explanations or extra text."#;

pub fn compose_prompt(kind: &PromptKind<'_>) -> String {
    match kind {
        PromptKind::Story { vocabulary } => {
            format!("{STORY_PREAMBLE}{vocabulary}\n{STORY_TASK}")
        }
        PromptKind::SentenceCheck {
            german_word,
            english,
            sentence,
        } => format!(
            r#"You are a friendly and helpful German teacher. A student is practicing the German word "{german_word}" (which means "{english}").

The student wrote this sentence: "{sentence}"

Please check their sentence and provide feedback following these rules:
1. Start by saying if the sentence is correct or has mistakes.
2. If it's incorrect, provide the corrected version.
3. Briefly and simply explain the main mistake (e.g., "we use a different case here," or "the word order is a bit different").
4. Keep your response short, clear, and encouraging.
5. Respond in English."#
        ),
    }
}

/// Sentence-check prompt for a flashcard, using the article-prefixed German form.
pub fn sentence_check_prompt(card: &Card, sentence: &str) -> String {
    let german_word = card.german();
    compose_prompt(&PromptKind::SentenceCheck {
        german_word: &german_word,
        english: &card.entry.english,
        sentence,
    })
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct VocabularyPair {
    pub german: String,
    pub english: Option<String>,
}

/// Splits `german - english` lines. Blank lines are dropped; a line without a separator is kept
/// as a German-only item.
pub fn parse_vocabulary_lines(text: &str) -> Vec<VocabularyPair> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let split = line.split_once(" - ").or_else(|| line.split_once(" – "));
            match split {
                Some((german, english)) => VocabularyPair {
                    german: german.trim().to_string(),
                    english: Some(english.trim().to_string()),
                },
                None => VocabularyPair {
                    german: line.to_string(),
                    english: None,
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Article, WordEntry};

    #[test]
    fn test_story_prompt_embeds_vocabulary() {
        let prompt = compose_prompt(&PromptKind::Story {
            vocabulary: "der Hund - dog\ndie Katze - cat",
        });
        assert!(prompt.starts_with("You are a creative and funny German teacher."));
        assert!(prompt.contains("Words: der Hund - dog\ndie Katze - cat\n"));
        assert!(prompt.contains("only ONE word or phrase"));
        assert!(prompt.contains(r#""translations": ["#));
        assert!(prompt.ends_with("no explanations or extra text."));
    }

    #[test]
    fn test_sentence_check_prompt_uses_article() {
        let card = Card::new(
            "Tisch",
            WordEntry {
                article: Some(Article::Der),
                english: "table".to_string(),
                example_de: None,
                example_en: None,
            },
        );
        let prompt = sentence_check_prompt(&card, "Der Tisch ist groß.");
        assert!(prompt.contains(r#"practicing the German word "der Tisch" (which means "table")"#));
        assert!(prompt.contains(r#"The student wrote this sentence: "Der Tisch ist groß.""#));
        assert!(prompt.contains("Respond in English."));
    }

    #[test]
    fn test_parse_vocabulary_lines() {
        let pairs = parse_vocabulary_lines(
            "das Gericht - dish, meal\n\n  die silberne Hochzeit – silver wedding anniversary \nlaufen",
        );
        assert_eq!(
            pairs,
            vec![
                VocabularyPair {
                    german: "das Gericht".to_string(),
                    english: Some("dish, meal".to_string()),
                },
                VocabularyPair {
                    german: "die silberne Hochzeit".to_string(),
                    english: Some("silver wedding anniversary".to_string()),
                },
                VocabularyPair {
                    german: "laufen".to_string(),
                    english: None,
                },
            ]
        );
    }
}
