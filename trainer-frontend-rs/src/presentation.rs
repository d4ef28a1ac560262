//! Turns practice pages into engine calls and engine state into something a UI can draw.
//!
//! A [`Controller`] owns the one live [`Session`] of a page. The terminal adapter renders its
//! [`SessionView`] through a [`Presenter`]; the wasm bindings hand the same view to JavaScript.

use rand::Rng;
use serde::{Deserialize, Serialize};
use vocab_utils::{Article, Card, Catalog, VocabularySet};

use crate::session::{AnswerOutcome, Drill, Judgment, Session, SessionError};

pub const FLASHCARDS_FINISHED: &str = "Congrats! You've finished the set.";
pub const GENDER_DRILL_FINISHED: &str = "Practice finished!";
pub const FLASHCARDS_NO_MISTAKES: &str = "You have no mistakes to practice. Well done!";
pub const GENDER_DRILL_NO_MISTAKES: &str = "You don't have any mistakes to practice yet!";
pub const EMPTY_SENTENCE: &str = "Please write a sentence first.";
pub const CHECKING_SENTENCE: &str = "Checking with AI teacher...";
pub const EMPTY_VOCABULARY: &str = "Please enter a question";
pub const OVERVIEW_SET_MISSING: &str =
    "The selected set was not found. Please return to the main page and select a set.";
const MISSING_EXAMPLE: &str = "—";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum EmptyState {
    NoSet,
    NoWords,
    NoNouns,
}

impl EmptyState {
    pub fn message(&self) -> &'static str {
        match self {
            EmptyState::NoSet => "No set found. Please go back and select one.",
            EmptyState::NoWords => "This set has no words!",
            EmptyState::NoNouns => "Set not found or has no nouns.",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "snake_case")]
pub enum UiEvent {
    Flip,
    Good,
    Bad,
    Choose(Article),
    RetrainMistakes,
}

/// How the last answer went, so the page can flash it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Feedback {
    pub word: String,
    pub correct: bool,
    pub expected: Option<Article>,
}

impl From<&AnswerOutcome> for Feedback {
    fn from(outcome: &AnswerOutcome) -> Self {
        Self {
            word: outcome.card.word.clone(),
            correct: outcome.correct,
            expected: outcome.expected,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct SessionView {
    pub drill: Drill,
    pub set_name: Option<String>,
    /// Card face, finished message, or empty-state message.
    pub headline: String,
    pub revealed: bool,
    pub correct: u32,
    pub incorrect: u32,
    pub position: usize,
    pub total: usize,
    pub progress: f64,
    pub mistakes: Vec<String>,
    pub finished: bool,
    pub controls_enabled: bool,
    pub feedback: Option<Feedback>,
    /// One-off message for the learner, shown as an alert by the browser.
    pub notice: Option<String>,
}

pub trait Presenter {
    fn render(&mut self, view: &SessionView);
    fn notify(&mut self, message: &str);
}

pub struct Controller<R> {
    drill: Drill,
    rng: R,
    set_name: Option<String>,
    session: Result<Session, EmptyState>,
    feedback: Option<Feedback>,
    notice: Option<String>,
}

impl<R: Rng> Controller<R> {
    /// Opens a practice page for the stored set, or for no set at all.
    pub fn start(drill: Drill, set: Option<&VocabularySet>, mut rng: R) -> Self {
        let session = match set {
            None => Err(empty_state(drill, None)),
            Some(set) => Session::for_set(drill, set, &mut rng).map_err(|e| {
                log::info!("Cannot start {drill:?} for set {}: {e}", set.id);
                empty_state(drill, Some(set))
            }),
        };

        Self {
            drill,
            rng,
            set_name: set.map(|set| set.display_name().to_string()),
            session,
            feedback: None,
            notice: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref().ok()
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.session().and_then(Session::current_card)
    }

    pub fn handle(&mut self, event: UiEvent) -> SessionView {
        self.notice = None;

        let Ok(session) = self.session.as_mut() else {
            log::debug!("Ignoring {event:?}: nothing to practice");
            return self.view();
        };

        let result = match event {
            UiEvent::Flip => session.reveal().map(|_| ()),
            UiEvent::Good => session
                .submit_judgment(Judgment::Good)
                .map(|outcome| self.feedback = Some(Feedback::from(&outcome))),
            UiEvent::Bad => session
                .submit_judgment(Judgment::Bad)
                .map(|outcome| self.feedback = Some(Feedback::from(&outcome))),
            UiEvent::Choose(article) => session
                .submit_article(article)
                .map(|outcome| self.feedback = Some(Feedback::from(&outcome))),
            UiEvent::RetrainMistakes => session.retrain_mistakes(&mut self.rng).map(|retrain| {
                *session = retrain;
                self.feedback = None;
            }),
        };

        match result {
            Ok(()) => {}
            Err(SessionError::NoMistakes) => {
                self.notice = Some(no_mistakes_notice(self.drill).to_string());
            }
            Err(e) => log::debug!("Ignoring {event:?}: {e}"),
        }
        self.view()
    }

    /// Handles an event and pushes the result to a presenter.
    pub fn dispatch(&mut self, event: UiEvent, presenter: &mut impl Presenter) {
        let view = self.handle(event);
        if let Some(notice) = &view.notice {
            presenter.notify(notice);
        }
        presenter.render(&view);
    }

    pub fn view(&self) -> SessionView {
        let session = match &self.session {
            Ok(session) => session,
            Err(empty) => {
                return SessionView {
                    drill: self.drill,
                    set_name: self.set_name.clone(),
                    headline: empty.message().to_string(),
                    revealed: false,
                    correct: 0,
                    incorrect: 0,
                    position: 0,
                    total: 0,
                    progress: 0.0,
                    mistakes: Vec::new(),
                    finished: false,
                    controls_enabled: false,
                    feedback: None,
                    notice: self.notice.clone(),
                };
            }
        };

        let headline = match session.current_card() {
            None => finished_headline(self.drill).to_string(),
            Some(card) => match self.drill {
                Drill::Flashcards if session.is_revealed() => card.entry.english.clone(),
                Drill::Flashcards => card.german(),
                Drill::GenderDrill => card.word.clone(),
            },
        };

        let mistakes = session
            .mistakes()
            .map(|(word, entry)| match self.drill {
                Drill::Flashcards => format!("{} - {}", entry.german(word), entry.english),
                Drill::GenderDrill => entry.german(word),
            })
            .collect();

        SessionView {
            drill: self.drill,
            set_name: self.set_name.clone(),
            headline,
            revealed: session.is_revealed(),
            correct: session.correct_count(),
            incorrect: session.incorrect_count(),
            position: session.position(),
            total: session.len(),
            progress: session.progress(),
            mistakes,
            finished: session.is_finished(),
            controls_enabled: !session.is_finished(),
            feedback: self.feedback.clone(),
            notice: self.notice.clone(),
        }
    }
}

fn empty_state(drill: Drill, set: Option<&VocabularySet>) -> EmptyState {
    match (drill, set) {
        (Drill::GenderDrill, _) => EmptyState::NoNouns,
        (Drill::Flashcards, None) => EmptyState::NoSet,
        (Drill::Flashcards, Some(_)) => EmptyState::NoWords,
    }
}

fn finished_headline(drill: Drill) -> &'static str {
    match drill {
        Drill::Flashcards => FLASHCARDS_FINISHED,
        Drill::GenderDrill => GENDER_DRILL_FINISHED,
    }
}

fn no_mistakes_notice(drill: Drill) -> &'static str {
    match drill {
        Drill::Flashcards => FLASHCARDS_NO_MISTAKES,
        Drill::GenderDrill => GENDER_DRILL_NO_MISTAKES,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct OverviewEntry {
    pub category: String,
    pub german: String,
    pub english: String,
    pub example_de: String,
    pub example_en: String,
}

/// Every entry of a set in display order, with missing examples shown as a dash.
pub fn overview_entries(set: &VocabularySet) -> Vec<OverviewEntry> {
    set.categories()
        .flat_map(|(part, words)| {
            words.iter().map(move |(word, entry)| OverviewEntry {
                category: part.to_string(),
                german: entry.german(word),
                english: entry.english.clone(),
                example_de: entry
                    .example_de
                    .clone()
                    .unwrap_or_else(|| MISSING_EXAMPLE.to_string()),
                example_en: entry
                    .example_en
                    .clone()
                    .unwrap_or_else(|| MISSING_EXAMPLE.to_string()),
            })
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct WordList {
    pub category: String,
    pub lines: Vec<String>,
}

/// The per-category word lists shown after choosing a set.
pub fn word_lists(set: &VocabularySet) -> Vec<WordList> {
    set.categories()
        .map(|(part, words)| WordList {
            category: part.to_string(),
            lines: words
                .iter()
                .map(|(word, entry)| format!("{} — {}", entry.german(word), entry.english))
                .collect(),
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct SetSummary {
    pub id: String,
    pub name: String,
    pub word_count: usize,
    pub has_nouns: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ThemeSummary {
    pub title: String,
    pub sets: Vec<SetSummary>,
}

pub fn theme_summaries(catalog: &Catalog) -> Vec<ThemeSummary> {
    catalog
        .themes
        .iter()
        .map(|theme| ThemeSummary {
            title: theme.title.clone(),
            sets: theme
                .sets
                .iter()
                .map(|set| SetSummary {
                    id: set.id.clone(),
                    name: set.display_name().to_string(),
                    word_count: set.word_count(),
                    has_nouns: set.has_nouns(),
                })
                .collect(),
        })
        .collect()
}
