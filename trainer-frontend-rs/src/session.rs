//! The practice session state machine shared by flashcards and the gender drill.
//!
//! A session is `Active` while `position < deck.len()` and `Terminal` afterwards. Terminal is
//! absorbing: answers are rejected until a new session is created, either from scratch or by
//! retraining the mistakes.

use indexmap::IndexMap;
use rand::Rng;
use rand::seq::SliceRandom as _;
use vocab_utils::{Article, Card, PartOfSpeech, VocabularySet, WordEntry};

#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    tsify::Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Drill {
    /// Free recall; the learner judges themselves.
    Flashcards,
    /// Forced choice of der/die/das for each noun.
    GenderDrill,
}

impl Drill {
    /// The practice deck for a set, before shuffling.
    pub fn deck(&self, set: &VocabularySet) -> Vec<Card> {
        match self {
            Drill::Flashcards => flashcard_deck(set),
            Drill::GenderDrill => gender_drill_deck(set),
        }
    }
}

fn flashcard_deck(set: &VocabularySet) -> Vec<Card> {
    let mut merged: IndexMap<String, WordEntry> = IndexMap::new();
    for part in PartOfSpeech::FLASHCARD_ORDER {
        if let Some(words) = set.category(part) {
            for (word, entry) in words {
                // keeps the first position, takes the later entry
                merged.insert(word.clone(), entry.clone());
            }
        }
    }
    merged
        .into_iter()
        .map(|(word, entry)| Card::new(word, entry))
        .collect()
}

fn gender_drill_deck(set: &VocabularySet) -> Vec<Card> {
    let Some(nouns) = set.nouns.as_ref() else {
        return Vec::new();
    };

    let cards: Vec<Card> = nouns
        .iter()
        .filter(|(_, entry)| entry.article.is_some())
        .map(|(word, entry)| Card::new(word.clone(), entry.clone()))
        .collect();

    let skipped = nouns.len() - cards.len();
    if skipped > 0 {
        log::warn!(
            "Skipping {skipped} noun(s) without an article in set {}",
            set.id
        );
    }
    cards
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Judgment {
    Good,
    Bad,
}

/// What happened to the card that was just answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub card: Card,
    pub correct: bool,
    /// The canonical article, for graded answers.
    pub expected: Option<Article>,
    pub finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("there are no words to practice")]
    EmptyDeck,

    #[error("the session is finished")]
    Finished,

    #[error("there are no mistakes to retrain")]
    NoMistakes,

    #[error("not available in a {0:?} session")]
    WrongDrill(Drill),
}

#[derive(Clone, Debug)]
pub struct Session {
    drill: Drill,
    deck: Vec<Card>,
    position: usize,
    correct_count: u32,
    incorrect_count: u32,
    mistakes: IndexMap<String, WordEntry>,
    revealed: bool,
}

impl Session {
    /// Starts a session over a uniformly shuffled copy of `words`.
    ///
    /// Repeated word keys are collapsed to their first occurrence so the deck never holds the same
    /// word twice.
    pub fn new<R: Rng + ?Sized>(
        drill: Drill,
        words: impl IntoIterator<Item = Card>,
        rng: &mut R,
    ) -> Result<Self, SessionError> {
        let mut unique: IndexMap<String, WordEntry> = IndexMap::new();
        for card in words {
            unique.entry(card.word).or_insert(card.entry);
        }
        if unique.is_empty() {
            return Err(SessionError::EmptyDeck);
        }

        let mut deck: Vec<Card> = unique
            .into_iter()
            .map(|(word, entry)| Card::new(word, entry))
            .collect();
        deck.shuffle(rng);

        Ok(Self {
            drill,
            deck,
            position: 0,
            correct_count: 0,
            incorrect_count: 0,
            mistakes: IndexMap::new(),
            revealed: false,
        })
    }

    /// A session over the words of `set` that suit `drill`.
    pub fn for_set<R: Rng + ?Sized>(
        drill: Drill,
        set: &VocabularySet,
        rng: &mut R,
    ) -> Result<Self, SessionError> {
        Self::new(drill, drill.deck(set), rng)
    }

    pub fn drill(&self) -> Drill {
        self.drill
    }

    pub fn deck(&self) -> &[Card] {
        &self.deck
    }

    pub fn len(&self) -> usize {
        self.deck.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deck.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.deck.len().saturating_sub(self.position)
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn incorrect_count(&self) -> u32 {
        self.incorrect_count
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.deck.len()
    }

    /// The card being asked, or `None` once the end of the deck is reached.
    pub fn current_card(&self) -> Option<&Card> {
        self.deck.get(self.position)
    }

    /// Missed words in the order they were first missed.
    pub fn mistakes(&self) -> impl Iterator<Item = (&str, &WordEntry)> {
        self.mistakes
            .iter()
            .map(|(word, entry)| (word.as_str(), entry))
    }

    pub fn mistake_count(&self) -> usize {
        self.mistakes.len()
    }

    /// Flips a flashcard between its German and English side.
    pub fn reveal(&mut self) -> Result<bool, SessionError> {
        if self.drill != Drill::Flashcards {
            return Err(SessionError::WrongDrill(self.drill));
        }
        if self.is_finished() {
            return Err(SessionError::Finished);
        }
        self.revealed = !self.revealed;
        Ok(self.revealed)
    }

    /// Records the learner's own verdict on the current flashcard and moves on.
    pub fn submit_judgment(&mut self, judgment: Judgment) -> Result<AnswerOutcome, SessionError> {
        if self.drill != Drill::Flashcards {
            return Err(SessionError::WrongDrill(self.drill));
        }
        self.advance(judgment == Judgment::Good, None)
    }

    /// Grades an article choice against the current noun and moves on.
    pub fn submit_article(&mut self, chosen: Article) -> Result<AnswerOutcome, SessionError> {
        if self.drill != Drill::GenderDrill {
            return Err(SessionError::WrongDrill(self.drill));
        }
        let expected = self
            .current_card()
            .ok_or(SessionError::Finished)?
            .entry
            .article;
        self.advance(expected == Some(chosen), expected)
    }

    fn advance(
        &mut self,
        correct: bool,
        expected: Option<Article>,
    ) -> Result<AnswerOutcome, SessionError> {
        let card = self.current_card().ok_or(SessionError::Finished)?.clone();

        if correct {
            self.correct_count += 1;
        } else {
            self.incorrect_count += 1;
            self.mistakes
                .entry(card.word.clone())
                .or_insert_with(|| card.entry.clone());
        }
        self.position += 1;
        self.revealed = false;

        Ok(AnswerOutcome {
            card,
            correct,
            expected,
            finished: self.is_finished(),
        })
    }

    /// A fresh session of the same drill over exactly the words missed so far.
    pub fn retrain_mistakes<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Session, SessionError> {
        if self.mistakes.is_empty() {
            return Err(SessionError::NoMistakes);
        }
        let words = self
            .mistakes
            .iter()
            .map(|(word, entry)| Card::new(word.clone(), entry.clone()));
        Session::new(self.drill, words, rng)
    }

    /// Percentage of the deck answered, in `[0, 100]`.
    pub fn progress(&self) -> f64 {
        if self.deck.is_empty() {
            return 0.0;
        }
        self.position as f64 / self.deck.len() as f64 * 100.0
    }
}
