// Column layout persistence
// One layouts.json maps each grid instance key to its column layout.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use streamgrid_engine::column::ColumnState;

/// Persisted layout of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLayout {
    pub column_key: String,
    pub width: u32,
    pub visible: bool,
    pub order: usize,
}

impl From<&ColumnState> for ColumnLayout {
    fn from(state: &ColumnState) -> Self {
        Self {
            column_key: state.key.clone(),
            width: state.width,
            visible: state.visible,
            order: state.position,
        }
    }
}

impl From<&ColumnLayout> for ColumnState {
    fn from(layout: &ColumnLayout) -> Self {
        Self {
            key: layout.column_key.clone(),
            width: layout.width,
            visible: layout.visible,
            position: layout.order,
        }
    }
}

/// All persisted grid layouts, keyed by a flat grid-instance key
/// (e.g. "employees.main"). Loaded at mount, saved on any layout change.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutStore {
    #[serde(flatten)]
    grids: BTreeMap<String, Vec<ColumnLayout>>,
}

impl LayoutStore {
    /// The layouts file path.
    pub fn store_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("streamgrid")
            .join("layouts.json")
    }

    /// Load from the default location; a missing or corrupt file falls
    /// back to an empty store with a stderr diagnostic, never an error.
    pub fn load() -> Self {
        Self::load_from(&Self::store_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(store) => store,
                Err(e) => {
                    eprintln!("Error parsing layouts.json: {}", e);
                    eprintln!("Starting with empty layout store");
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Error reading layouts.json: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::store_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// The layout persisted for a grid key, as engine column states.
    pub fn get(&self, grid_key: &str) -> Option<Vec<ColumnState>> {
        self.grids
            .get(grid_key)
            .map(|entries| entries.iter().map(ColumnState::from).collect())
    }

    /// Record a grid's current layout under its key.
    pub fn set(&mut self, grid_key: impl Into<String>, layout: &[ColumnState]) {
        self.grids
            .insert(grid_key.into(), layout.iter().map(ColumnLayout::from).collect());
    }

    /// Forget a grid's layout. Returns whether one was stored.
    pub fn reset(&mut self, grid_key: &str) -> bool {
        self.grids.remove(grid_key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.grids.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}
