use crate::statics;
use anyhow::Context;
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

/// String key/value preferences that outlive a session.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// Preferences kept in a JSON object on disk, rewritten after every `set`.
#[derive(Debug, Clone)]
pub struct JsonPreferences {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonPreferences {
    /// Opens (or starts) the preference file at `path`. A missing file is an
    /// empty store; an unreadable one is reported.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let text = fs::read_to_string(&path).with_context(|| format!("reading {path:?}"))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {path:?}"))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    /// `<config dir>/asset-grid/prefs.json`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(statics::PREFS_APP_DIR).join(statics::PREFS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {parent:?}"))?;
        }
        let text = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, text).with_context(|| format!("writing {:?}", self.path))?;
        Ok(())
    }
}

impl PreferenceStore for JsonPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush() {
            warn!(error = %format!("{e:#}"), "could not persist preferences");
        }
    }
}

/// Session-only preferences.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonPreferences, PreferenceStore};

    #[test]
    fn json_preferences_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let mut prefs = JsonPreferences::open(&path).unwrap();
        assert_eq!(prefs.get("k"), None);
        prefs.set("k", "35,35,150");

        let reopened = JsonPreferences::open(&path).unwrap();
        assert_eq!(reopened.get("k").as_deref(), Some("35,35,150"));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(JsonPreferences::open(&path).is_err());
    }
}
