//! Saved chain state: JSON file holding controller names and HSV colors.
//!
//! The position in the `controllers` array is the controller id, so ids are
//! contiguous by construction on reload.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{LedchainError, Result};

/// One saved controller. `color` is stored as `[h, s, v]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedController {
    pub name: String,
    pub color: Color,
}

/// Ordered controllers of one chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainState {
    #[serde(default)]
    pub controllers: Vec<SavedController>,
}

/// Platform-specific data directory.
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("ledchain"))
}

/// Default state file path.
pub fn default_path() -> Option<PathBuf> {
    data_dir().map(|d| d.join("controllers.json"))
}

impl ChainState {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| LedchainError::Store(e.to_string()))
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| LedchainError::Store(e.to_string()))
    }

    /// Save atomically (write to temp file, then rename).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let contents = self.to_json()?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &contents)?;
        match std::fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(_) => {
                // Rename can fail across filesystems; fall back to direct write + cleanup
                let result = std::fs::write(path, &contents);
                let _ = std::fs::remove_file(&tmp);
                result.map_err(LedchainError::from)
            }
        }
    }

    /// Load saved state, returning it with any warnings.
    ///
    /// Returns `(None, [])` if the file doesn't exist.
    /// Returns `(None, [warning])` if it exists but can't be read or parsed,
    /// or holds no controllers. Callers fall back to a default chain.
    pub fn load_from(path: &Path) -> (Option<Self>, Vec<String>) {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return (None, vec![]),
            Err(e) => {
                let warning = format!("cannot read state ({}), using defaults: {e}", path.display());
                return (None, vec![warning]);
            }
        };
        match Self::from_json(&contents) {
            Ok(state) if state.controllers.is_empty() => {
                let warning = format!("state ({}) has no controllers, using defaults", path.display());
                (None, vec![warning])
            }
            Ok(state) => (Some(state), vec![]),
            Err(e) => {
                let warning = format!("state parse error ({}), using defaults: {e}", path.display());
                (None, vec![warning])
            }
        }
    }

    /// [`load_from`](Self::load_from), logging warnings.
    pub fn load(path: &Path) -> Option<Self> {
        let (state, warnings) = Self::load_from(path);
        for w in &warnings {
            log::warn!("{w}");
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChainState {
        ChainState {
            controllers: vec![
                SavedController {
                    name: "Desk".into(),
                    color: Color::from_hsv(210, 79, 33),
                },
                SavedController {
                    name: "Shelf".into(),
                    color: Color::OFF,
                },
            ],
        }
    }

    #[test]
    fn json_layout() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["controllers"][0]["name"], "Desk");
        assert_eq!(value["controllers"][0]["color"], serde_json::json!([210, 79, 33]));
        assert_eq!(value["controllers"][1]["color"], serde_json::json!([0, 0, 0]));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("controllers.json");
        sample().save_to(&path).unwrap();
        let (loaded, warnings) = ChainState::load_from(&path);
        assert!(warnings.is_empty());
        assert_eq!(loaded.unwrap(), sample());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn missing_file_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let (loaded, warnings) = ChainState::load_from(&dir.path().join("absent.json"));
        assert!(loaded.is_none());
        assert!(warnings.is_empty());
    }

    #[test]
    fn corrupt_file_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("controllers.json");
        std::fs::write(&path, "{ not json").unwrap();
        let (loaded, warnings) = ChainState::load_from(&path);
        assert!(loaded.is_none());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("parse error"));
    }

    #[test]
    fn empty_controller_list_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("controllers.json");
        std::fs::write(&path, r#"{"controllers": []}"#).unwrap();
        let (loaded, warnings) = ChainState::load_from(&path);
        assert!(loaded.is_none());
        assert!(warnings[0].contains("no controllers"));
    }

    #[test]
    fn out_of_range_colors_are_clamped() {
        let state =
            ChainState::from_json(r#"{"controllers": [{"name": "x", "color": [361, 100, 250]}]}"#)
                .unwrap();
        assert_eq!(state.controllers[0].color.hsv(), (1, 100, 100));
    }

    #[test]
    fn wrong_shape_is_store_error() {
        let err = ChainState::from_json(r#"{"controllers": [{"name": 3}]}"#).unwrap_err();
        assert!(matches!(err, LedchainError::Store(_)));
    }

    #[test]
    fn default_path_ends_with_json() {
        if let Some(path) = default_path() {
            assert_eq!(path.file_name().unwrap(), "controllers.json");
        }
    }
}
