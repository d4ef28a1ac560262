pub mod persistence;
pub mod presentation;
pub mod relay_client;
pub mod session;
mod utils;

use std::cell::RefCell;
use std::sync::LazyLock;

use rand::SeedableRng as _;
use rand_chacha::ChaCha8Rng;
use vocab_utils::VocabularySet;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub use persistence::{
    KeyValueStore, LaunchError, LaunchTarget, PersistenceBridge, PersistenceError,
};
pub use presentation::{Controller, Presenter, SessionView, UiEvent};
pub use relay_client::{RelayClient, RelayError, StoryAnswer};
pub use session::{Drill, Judgment, Session, SessionError};

#[cfg(test)]
static LOGGER_INITS: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

// putting this inside LOGGER prevents us from accidentally initializing the logger more than once
static LOGGER: LazyLock<()> = LazyLock::new(|| {
    #[cfg(test)]
    LOGGER_INITS.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

    utils::set_panic_hook();
    #[cfg(target_arch = "wasm32")]
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Logging initialized");
});

fn init_logging() {
    LazyLock::force(&LOGGER);
}

/// One open practice page: the running drill plus the relay client used for sentence checks.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub struct PracticePage {
    // never hold a borrow across an .await
    controller: RefCell<Controller<ChaCha8Rng>>,
    relay: RelayClient,
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
impl PracticePage {
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(constructor))]
    pub fn new(drill: Drill, set: Option<VocabularySet>, relay_url: String, seed: u32) -> Self {
        init_logging();

        let rng = ChaCha8Rng::seed_from_u64(u64::from(seed));
        Self {
            controller: RefCell::new(Controller::start(drill, set.as_ref(), rng)),
            relay: RelayClient::new(relay_url),
        }
    }

    /// Opens a practice page for the set stored by the set page.
    #[cfg(target_arch = "wasm32")]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn from_local_storage(
        drill: Drill,
        relay_url: String,
        seed: u32,
    ) -> Result<PracticePage, JsValue> {
        init_logging();

        let bridge = PersistenceBridge::new(persistence::LocalStorage::new().map_err(js_error)?);
        let set = bridge
            .selected_set()
            .inspect_err(|e| log::error!("Error reading the selected set: {e:?}"))
            .map_err(js_error)?;
        Ok(Self::new(drill, set, relay_url, seed))
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn handle(&self, event: UiEvent) -> SessionView {
        self.controller.borrow_mut().handle(event)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn view(&self) -> SessionView {
        self.controller.borrow().view()
    }

    /// Feedback text for a sentence written with the current word. `None` when there is no word
    /// left to check or a newer check has replaced this one.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn check_sentence(&self, sentence: String) -> Option<String> {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            return Some(presentation::EMPTY_SENTENCE.to_string());
        }
        let card = self.controller.borrow().current_card().cloned()?;

        match self.relay.check_sentence(&card, sentence).await {
            Err(RelayError::Superseded) => None,
            result => Some(relay_client::display_text(&result)),
        }
    }
}

/// The story page: one relay client so a new request replaces the previous one.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub struct StoryPage {
    relay: RelayClient,
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
impl StoryPage {
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(constructor))]
    pub fn new(relay_url: String) -> Self {
        init_logging();
        Self {
            relay: RelayClient::new(relay_url),
        }
    }

    /// `Ok(None)` when a newer story request has replaced this one; errors carry the text to show.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn generate(&self, vocabulary: String) -> Result<Option<StoryAnswer>, String> {
        if vocabulary.trim().is_empty() {
            return Err(presentation::EMPTY_VOCABULARY.to_string());
        }
        match self.relay.generate_story(&vocabulary).await {
            Ok(answer) => Ok(Some(answer)),
            Err(RelayError::Superseded) => Ok(None),
            Err(e) => Err(format!("Error: {e}")),
        }
    }
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn get_overview(set: VocabularySet) -> Vec<presentation::OverviewEntry> {
    presentation::overview_entries(&set)
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn get_word_lists(set: VocabularySet) -> Vec<presentation::WordList> {
    presentation::word_lists(&set)
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn get_vocabulary_lines(set: VocabularySet) -> String {
    set.vocabulary_lines()
}

/// The set page: the catalog, the chosen set, and the stored selection.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct SetPicker {
    catalog: vocab_utils::Catalog,
    selected: RefCell<Option<VocabularySet>>,
    bridge: RefCell<PersistenceBridge<persistence::LocalStorage>>,
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl SetPicker {
    #[wasm_bindgen(constructor)]
    pub fn new(catalog_json: &str) -> Result<SetPicker, JsValue> {
        init_logging();

        let catalog = vocab_utils::Catalog::from_json(catalog_json)
            .inspect_err(|e| log::error!("Error parsing vocabulary catalog: {e:?}"))
            .map_err(js_error)?;
        let bridge = PersistenceBridge::new(persistence::LocalStorage::new().map_err(js_error)?);
        Ok(Self {
            catalog,
            selected: RefCell::new(None),
            bridge: RefCell::new(bridge),
        })
    }

    pub fn themes(&self) -> Vec<presentation::ThemeSummary> {
        presentation::theme_summaries(&self.catalog)
    }

    pub fn select_set(&self, id: &str) -> Result<VocabularySet, JsValue> {
        let set = self
            .catalog
            .find_set(id)
            .cloned()
            .ok_or_else(|| JsValue::from_str(&format!("no set with id {id}")))?;
        self.bridge.borrow_mut().choose_set(&set).map_err(js_error)?;
        *self.selected.borrow_mut() = Some(set.clone());
        Ok(set)
    }

    pub fn restore_selection(&self) -> Result<Option<VocabularySet>, JsValue> {
        let restored = self
            .bridge
            .borrow()
            .restore_selection(&self.catalog)
            .map_err(js_error)?
            .cloned();
        if let Some(set) = &restored {
            *self.selected.borrow_mut() = Some(set.clone());
        }
        Ok(restored)
    }

    /// Stores the chosen set for `target`. The error text is meant for an alert.
    pub fn launch(&self, target: LaunchTarget) -> Result<(), JsValue> {
        let selected = self.selected.borrow();
        self.bridge
            .borrow_mut()
            .launch(selected.as_ref(), target)
            .map_err(js_error)
    }
}

#[cfg(target_arch = "wasm32")]
fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_is_initialized_once() {
        const RELAY: &str = "http://127.0.0.1:9/unused";
        init_logging();
        let _story = StoryPage::new(RELAY.to_string());
        let _first = PracticePage::new(Drill::Flashcards, None, RELAY.to_string(), 1);
        let _second = PracticePage::new(Drill::GenderDrill, None, RELAY.to_string(), 2);
        init_logging();

        assert_eq!(LOGGER_INITS.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
