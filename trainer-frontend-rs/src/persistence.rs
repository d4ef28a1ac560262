//! Set selection that survives page reloads.
//!
//! Two keys are kept: `lastSelectedSetId` remembers which set the learner chose on the set page,
//! `selectedSet` carries the whole chosen set to the practice pages.

use std::collections::BTreeMap;
#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

use vocab_utils::{Catalog, VocabularySet};

pub const SELECTED_SET_KEY: &str = "selectedSet";
pub const LAST_SELECTED_SET_ID_KEY: &str = "lastSelectedSetId";

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("storage is unavailable: {0}")]
    Unavailable(String),

    #[error("could not write {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A string key-value store, in the shape of the browser's `localStorage`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

#[derive(Default, Debug, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// All keys in one JSON object on disk. Used by the terminal trainer.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, PersistenceError> {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        std::fs::write(&self.path, serde_json::to_string_pretty(&values)?)?;
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    pub fn new() -> Result<Self, PersistenceError> {
        let window = web_sys::window()
            .ok_or_else(|| PersistenceError::Unavailable("no window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| PersistenceError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| PersistenceError::Unavailable("localStorage is disabled".to_string()))?;
        Ok(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.storage
            .get_item(key)
            .map_err(|e| PersistenceError::Unavailable(format!("{e:?}")))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| PersistenceError::Write {
                key: key.to_string(),
                reason: format!("{e:?}"),
            })
    }
}

/// Where a chosen set is being taken.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum LaunchTarget {
    Flashcards,
    GenderDrill,
    Overview,
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Please choose a word set first!")]
    NoSetChosen,

    #[error("This set does not contain any nouns to practice articles with.")]
    NoNouns,

    #[error(transparent)]
    Storage(#[from] PersistenceError),
}

pub struct PersistenceBridge<S> {
    store: S,
}

impl<S: KeyValueStore> PersistenceBridge<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The set handed to the practice pages. A value that no longer parses counts as no set.
    pub fn selected_set(&self) -> Result<Option<VocabularySet>, PersistenceError> {
        let Some(json) = self.store.get(SELECTED_SET_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&json) {
            Ok(set) => Ok(Some(set)),
            Err(e) => {
                log::warn!("Ignoring unreadable {SELECTED_SET_KEY}: {e}");
                Ok(None)
            }
        }
    }

    pub fn last_selected_set_id(&self) -> Result<Option<String>, PersistenceError> {
        self.store.get(LAST_SELECTED_SET_ID_KEY)
    }

    /// Remembers the set chosen on the set page.
    pub fn choose_set(&mut self, set: &VocabularySet) -> Result<(), PersistenceError> {
        self.store.set(LAST_SELECTED_SET_ID_KEY, &set.id)
    }

    /// Stores the chosen set for a practice page, refusing when the page has nothing to show.
    pub fn launch(
        &mut self,
        set: Option<&VocabularySet>,
        target: LaunchTarget,
    ) -> Result<(), LaunchError> {
        let set = set.ok_or(LaunchError::NoSetChosen)?;
        if target == LaunchTarget::GenderDrill && !set.has_nouns() {
            return Err(LaunchError::NoNouns);
        }
        self.store
            .set(SELECTED_SET_KEY, &serde_json::to_string(set).map_err(PersistenceError::from)?)?;
        log::info!("Launching {target:?} with set {}", set.id);
        Ok(())
    }

    /// The set chosen last time, if the catalog still has it.
    pub fn restore_selection<'a>(
        &self,
        catalog: &'a Catalog,
    ) -> Result<Option<&'a VocabularySet>, PersistenceError> {
        let Some(id) = self.last_selected_set_id()? else {
            return Ok(None);
        };
        let found = catalog.find_set(&id);
        if found.is_none() {
            log::info!("Last selected set {id} is no longer in the catalog");
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{"themes":[{"title":"Animals","sets":[
        {"id":"pets","name":"Pets","nouns":{"Hund":{"article":"der","english":"dog"}}},
        {"id":"verbs","name":"Verbs","verbs":{"laufen":{"english":"to run"}}}
    ]}]}"#;

    #[test]
    fn test_selected_set_roundtrip() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let pets = catalog.find_set("pets").unwrap();

        let mut bridge = PersistenceBridge::new(MemoryStore::default());
        assert_eq!(bridge.selected_set().unwrap(), None);

        bridge.launch(Some(pets), LaunchTarget::Flashcards).unwrap();
        assert_eq!(bridge.selected_set().unwrap().as_ref(), Some(pets));
    }

    #[test]
    fn test_restore_selection() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let mut bridge = PersistenceBridge::new(MemoryStore::default());
        assert!(bridge.restore_selection(&catalog).unwrap().is_none());

        bridge.choose_set(catalog.find_set("verbs").unwrap()).unwrap();
        assert_eq!(
            bridge.restore_selection(&catalog).unwrap().map(|set| set.id.as_str()),
            Some("verbs")
        );

        let mut store = MemoryStore::default();
        store.set(LAST_SELECTED_SET_ID_KEY, "gone").unwrap();
        let bridge = PersistenceBridge::new(store);
        assert!(bridge.restore_selection(&catalog).unwrap().is_none());
    }

    #[test]
    fn test_launch_guards() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let mut bridge = PersistenceBridge::new(MemoryStore::default());

        let err = bridge.launch(None, LaunchTarget::Overview).unwrap_err();
        assert_eq!(err.to_string(), "Please choose a word set first!");

        let verbs = catalog.find_set("verbs").unwrap();
        let err = bridge
            .launch(Some(verbs), LaunchTarget::GenderDrill)
            .unwrap_err();
        assert!(matches!(err, LaunchError::NoNouns));
        assert_eq!(bridge.selected_set().unwrap(), None);
    }

    #[test]
    fn test_corrupt_selected_set_reads_as_none() {
        let mut store = MemoryStore::default();
        store.set(SELECTED_SET_KEY, "{not json").unwrap();
        let bridge = PersistenceBridge::new(store);
        assert_eq!(bridge.selected_set().unwrap(), None);
    }

    #[test]
    fn test_file_store() {
        let path = std::env::temp_dir().join(format!(
            "vocab-trainer-test-{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let mut store = FileStore::new(&path);
        assert_eq!(store.get("missing").unwrap(), None);
        store.set(LAST_SELECTED_SET_ID_KEY, "pets").unwrap();
        store.set(SELECTED_SET_KEY, "{}").unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(
            reopened.get(LAST_SELECTED_SET_ID_KEY).unwrap().as_deref(),
            Some("pets")
        );
        assert_eq!(reopened.get(SELECTED_SET_KEY).unwrap().as_deref(), Some("{}"));
        std::fs::remove_file(&path).unwrap();
    }
}
