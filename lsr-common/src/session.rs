//! Review session: one reviewer's view of one loaded dataset
//!
//! The session owns the in-memory item list, the annotation file path, the
//! current item index and the injected choice configuration. Every handler
//! receives the session explicitly; nothing lives in global state.

use crate::config::ChoiceConfig;
use crate::expander::{self, Expansion, Scope};
use crate::model::DatasetItem;
use crate::store::{self, LoadedDataset};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Previous,
    Jump(usize),
}

/// State for one loaded dataset
#[derive(Debug, Clone)]
pub struct ReviewSession {
    pub(crate) name: String,
    pub(crate) path: PathBuf,
    pub(crate) items: Vec<DatasetItem>,
    pub(crate) current: usize,
    pub(crate) choices: ChoiceConfig,
    pub(crate) resumed: bool,
}

impl ReviewSession {
    /// Load an upload (or resume its annotation file) and start at item 0
    pub fn load(
        upload_name: &str,
        upload: &[u8],
        data_dir: &Path,
        choices: ChoiceConfig,
    ) -> Result<Self> {
        let loaded = store::load(upload_name, upload, data_dir)?;
        Ok(Self::from_loaded(loaded, choices))
    }

    pub fn from_loaded(loaded: LoadedDataset, choices: ChoiceConfig) -> Self {
        info!(
            dataset = %loaded.name,
            items = loaded.items.len(),
            resumed = loaded.resumed,
            "Review session started"
        );
        Self {
            name: loaded.name,
            path: loaded.path,
            items: loaded.items,
            current: 0,
            choices,
            resumed: loaded.resumed,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn items(&self) -> &[DatasetItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn choices(&self) -> &ChoiceConfig {
        &self.choices
    }

    /// True when the annotation file existed before this session
    pub fn resumed(&self) -> bool {
        self.resumed
    }

    /// Rewrite the annotation file with the current item list
    pub fn persist(&self) -> Result<()> {
        store::persist(&self.items, &self.path)
    }

    /// Annotation file bytes, identical to what `persist` writes
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        store::to_pretty_json(&self.items)
    }

    /// Move the current index; `Next`/`Previous` stop at the ends
    pub fn navigate(&mut self, nav: Navigation) -> Result<usize> {
        match nav {
            Navigation::Next => {
                if self.current + 1 < self.items.len() {
                    self.current += 1;
                }
            }
            Navigation::Previous => {
                self.current = self.current.saturating_sub(1);
            }
            Navigation::Jump(index) => {
                self.check_index(index)?;
                self.current = index;
            }
        }
        Ok(self.current)
    }

    /// Expand the item if needed, persist once if it changed, make it current
    ///
    /// An item without four decisions still opens: its aspects are built and
    /// persisted, `question2_situations` stays absent, and situation
    /// operations on it report `MalformedItem`.
    pub fn open_item(&mut self, index: usize) -> Result<&DatasetItem> {
        match self.ensure_expanded(index, Scope::All) {
            Ok(_) => {}
            Err(Error::MalformedItem { reason, .. }) => {
                self.ensure_expanded(index, Scope::Aspects)?;
                warn!(item = index, %reason, "Decision situations unavailable");
            }
            Err(e) => return Err(e),
        }
        self.current = index;
        Ok(&self.items[index])
    }

    /// Bounds-checked read without side effects
    pub fn item(&self, index: usize) -> Result<&DatasetItem> {
        self.check_index(index)?;
        Ok(&self.items[index])
    }

    /// Expand-then-borrow used by every field mutation
    pub(crate) fn expanded_item_mut(
        &mut self,
        index: usize,
        scope: Scope,
    ) -> Result<&mut DatasetItem> {
        self.ensure_expanded(index, scope)?;
        Ok(&mut self.items[index])
    }

    fn ensure_expanded(&mut self, index: usize, scope: Scope) -> Result<Expansion> {
        self.check_index(index)?;
        let expansion = expander::ensure_initialized(index, &mut self.items[index], scope)?;
        if expansion.changed() {
            self.persist()?;
        }
        Ok(expansion)
    }

    pub(crate) fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.items.len() {
            return Err(Error::NotFound(format!(
                "item {} (dataset has {} items)",
                index,
                self.items.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn upload(n: usize) -> Vec<u8> {
        let items: Vec<_> = (0..n)
            .map(|i| {
                serde_json::json!({
                    "Scenario": format!("scenario {}", i),
                    "Decisions": [
                        {"Decision": "a", "Consequence": "b"},
                        {"Decision": "a", "Consequence": "b"},
                        {"Decision": "a", "Consequence": "b"},
                        {"Decision": "a", "Consequence": "b"},
                    ],
                })
            })
            .collect();
        serde_json::to_vec(&items).unwrap()
    }

    #[test]
    fn test_navigation_clamps_at_ends() {
        let dir = TempDir::new().unwrap();
        let mut session =
            ReviewSession::load("nav.json", &upload(3), dir.path(), ChoiceConfig::default())
                .unwrap();

        assert_eq!(session.navigate(Navigation::Previous).unwrap(), 0);
        assert_eq!(session.navigate(Navigation::Next).unwrap(), 1);
        assert_eq!(session.navigate(Navigation::Next).unwrap(), 2);
        assert_eq!(session.navigate(Navigation::Next).unwrap(), 2);
        assert_eq!(session.navigate(Navigation::Jump(0)).unwrap(), 0);
        assert!(matches!(
            session.navigate(Navigation::Jump(3)),
            Err(Error::NotFound(_))
        ));
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn test_open_item_expands_and_persists_once() {
        let dir = TempDir::new().unwrap();
        let mut session =
            ReviewSession::load("open.json", &upload(2), dir.path(), ChoiceConfig::default())
                .unwrap();

        let item = session.open_item(1).unwrap();
        assert!(item.is_expanded());
        assert_eq!(session.current_index(), 1);

        let on_disk = store::read_annotation_file(session.path()).unwrap();
        assert!(on_disk[1].is_expanded());
        assert!(!on_disk[0].is_expanded());

        assert!(matches!(session.open_item(2), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_open_item_without_decisions_builds_aspects() {
        let dir = TempDir::new().unwrap();
        let bytes = serde_json::to_vec(&serde_json::json!([{
            "Scenario": "short",
            "Decisions": [{"Decision": "a", "Consequence": "b"}],
        }]))
        .unwrap();
        let mut session =
            ReviewSession::load("short.json", &bytes, dir.path(), ChoiceConfig::default())
                .unwrap();

        let item = session.open_item(0).unwrap();
        assert!(item.has_aspects());
        assert!(!item.has_situations());

        let on_disk = store::read_annotation_file(session.path()).unwrap();
        assert!(on_disk[0].has_aspects());
    }
}
