//! # Extensions
//!
//! Loadable command packs. An extension is a document at
//! `<folder>/<name>.{yaml,yml,json}` holding `commands: [...]` in the same
//! schema as the settings `commands` section. Loaded extensions are keyed
//! `"<folder>.<name>"`.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 1.1.0: Folder-wide reload resyncs with the files on disk
//! - 1.0.0: Initial load/unload/reload

use dashmap::DashMap;
use log::{debug, info};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::core::BotError;
use crate::settings::commands::duplicate_names;
use crate::settings::{read_document, CommandConfig, CommandEntry, DOCUMENT_EXTENSIONS};

pub const DEFAULT_FOLDER: &str = "commands";

#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    pub name: String,
    pub folder: String,
    pub path: PathBuf,
    pub commands: Vec<CommandEntry>,
}

impl Extension {
    pub fn key(&self) -> String {
        extension_key(&self.folder, &self.name)
    }

    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|entry| entry.name.as_str())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExtensionDocument {
    commands: Vec<CommandEntry>,
}

pub fn extension_key(folder: &str, name: &str) -> String {
    format!("{folder}.{name}")
}

/// Extension names found in `folder`, sorted; one entry per stem
pub fn discover(folder: &str) -> Result<Vec<String>, BotError> {
    let dir = Path::new(folder);
    let entries = std::fs::read_dir(dir).map_err(|e| {
        BotError::extension(format!("cannot read extension folder '{folder}': {e}"))
    })?;

    let mut names = BTreeSet::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let known = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| DOCUMENT_EXTENSIONS.contains(&e));
        if let (true, Some(stem)) = (known, path.file_stem().and_then(|s| s.to_str())) {
            names.insert(stem.to_string());
        }
    }
    Ok(names.into_iter().collect())
}

fn locate(folder: &str, name: &str) -> Result<PathBuf, BotError> {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(BotError::extension(format!("invalid extension name '{name}'")));
    }
    DOCUMENT_EXTENSIONS
        .iter()
        .map(|ext| Path::new(folder).join(format!("{name}.{ext}")))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| {
            BotError::extension(format!("extension '{}' not found", extension_key(folder, name)))
        })
}

/// Read and validate one extension without loading it
pub fn parse_extension(folder: &str, name: &str) -> Result<Extension, BotError> {
    let path = locate(folder, name)?;
    let doc: ExtensionDocument = read_document(&path).map_err(|e| match e {
        BotError::Settings(msg) => BotError::Extension(msg),
        other => other,
    })?;

    let key = extension_key(folder, name);
    for entry in &doc.commands {
        entry
            .validate()
            .map_err(|e| BotError::extension(format!("{key}: {e}")))?;
    }
    let duplicates = duplicate_names(doc.commands.iter().map(|e| e.name.as_str()));
    if !duplicates.is_empty() {
        return Err(BotError::extension(format!(
            "{key}: commands defined twice: {}",
            duplicates.join(", ")
        )));
    }

    debug!("Parsed extension {key} with {} commands", doc.commands.len());
    Ok(Extension {
        name: name.to_string(),
        folder: folder.to_string(),
        path,
        commands: doc.commands,
    })
}

/// Registry of loaded extensions
#[derive(Default)]
pub struct ExtensionManager {
    loaded: DashMap<String, Arc<Extension>>,
    /// Serialises load/unload/reload so collision checks see a stable set
    lifecycle: Mutex<()>,
}

impl ExtensionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self, key: &str) -> bool {
        self.loaded.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    pub fn loaded_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.loaded.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Config of a command provided by any loaded extension
    pub fn command(&self, name: &str) -> Option<CommandConfig> {
        self.loaded.iter().find_map(|ext| {
            ext.commands
                .iter()
                .find(|entry| entry.name == name)
                .map(|entry| entry.config.clone())
        })
    }

    /// Every command provided by loaded extensions, ordered by extension key
    pub fn commands(&self) -> Vec<CommandEntry> {
        let mut extensions: Vec<Arc<Extension>> =
            self.loaded.iter().map(|e| Arc::clone(e.value())).collect();
        extensions.sort_by_key(|ext| ext.key());
        extensions
            .iter()
            .flat_map(|ext| ext.commands.iter().cloned())
            .collect()
    }

    pub fn command_names(&self) -> HashSet<String> {
        self.loaded
            .iter()
            .flat_map(|ext| {
                ext.commands
                    .iter()
                    .map(|entry| entry.name.clone())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Load one extension, or every not-yet-loaded extension in `folder`.
    ///
    /// `taken` holds names owned by builtins and settings commands.
    pub fn load(
        &self,
        name: Option<&str>,
        folder: &str,
        taken: &HashSet<String>,
    ) -> Result<Vec<String>, BotError> {
        let _guard = self.lifecycle.lock().unwrap_or_else(|e| e.into_inner());

        let fresh = match name {
            Some(name) => {
                let key = extension_key(folder, name);
                if self.is_loaded(&key) {
                    return Err(BotError::extension(format!("extension '{key}' is already loaded")));
                }
                vec![parse_extension(folder, name)?]
            }
            None => discover(folder)?
                .into_iter()
                .filter(|n| !self.is_loaded(&extension_key(folder, n)))
                .map(|n| parse_extension(folder, &n))
                .collect::<Result<Vec<_>, _>>()?,
        };

        let keys = self.commit(&[], fresh, taken)?;
        info!("🧩 Loaded extensions: {keys:?}");
        Ok(keys)
    }

    /// Unload one extension, or every extension loaded from `folder`
    pub fn unload(&self, name: Option<&str>, folder: &str) -> Result<Vec<String>, BotError> {
        let _guard = self.lifecycle.lock().unwrap_or_else(|e| e.into_inner());

        let keys = match name {
            Some(name) => {
                let key = extension_key(folder, name);
                if !self.is_loaded(&key) {
                    return Err(BotError::extension(format!("extension '{key}' is not loaded")));
                }
                vec![key]
            }
            None => self.keys_in(folder),
        };

        for key in &keys {
            self.loaded.remove(key);
        }
        info!("🧩 Unloaded extensions: {keys:?}");
        Ok(keys)
    }

    /// Re-read one loaded extension, or resync `folder` with the files on disk.
    ///
    /// Everything is parsed and checked before anything is swapped; on error
    /// the previously loaded extensions stay in place.
    pub fn reload(
        &self,
        name: Option<&str>,
        folder: &str,
        taken: &HashSet<String>,
    ) -> Result<Vec<String>, BotError> {
        let _guard = self.lifecycle.lock().unwrap_or_else(|e| e.into_inner());

        let (replaced, fresh) = match name {
            Some(name) => {
                let key = extension_key(folder, name);
                if !self.is_loaded(&key) {
                    return Err(BotError::extension(format!("extension '{key}' is not loaded")));
                }
                (vec![key], vec![parse_extension(folder, name)?])
            }
            None => {
                let fresh = discover(folder)?
                    .into_iter()
                    .map(|n| parse_extension(folder, &n))
                    .collect::<Result<Vec<_>, _>>()?;
                (self.keys_in(folder), fresh)
            }
        };

        let keys = self.commit(&replaced, fresh, taken)?;
        info!("🧩 Reloaded extensions: {keys:?}");
        Ok(keys)
    }

    fn keys_in(&self, folder: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .loaded
            .iter()
            .filter(|ext| ext.folder == folder)
            .map(|ext| ext.key().clone())
            .collect();
        keys.sort();
        keys
    }

    /// Check `fresh` for name collisions, then swap it in for `replaced`
    fn commit(
        &self,
        replaced: &[String],
        fresh: Vec<Extension>,
        taken: &HashSet<String>,
    ) -> Result<Vec<String>, BotError> {
        let mut owned: HashSet<String> = self
            .loaded
            .iter()
            .filter(|ext| !replaced.contains(ext.key()))
            .flat_map(|ext| ext.command_names().map(str::to_string).collect::<Vec<_>>())
            .collect();

        for ext in &fresh {
            let collisions: Vec<&str> = ext
                .command_names()
                .filter(|n| taken.contains(*n) || owned.contains(*n))
                .collect();
            if !collisions.is_empty() {
                return Err(BotError::extension(format!(
                    "{}: command names already in use: {}",
                    ext.key(),
                    collisions.join(", ")
                )));
            }
            owned.extend(ext.command_names().map(str::to_string));
        }

        for key in replaced {
            self.loaded.remove(key);
        }
        let mut keys = Vec::with_capacity(fresh.len());
        for ext in fresh {
            let key = ext.key();
            self.loaded.insert(key.clone(), Arc::new(ext));
            keys.push(key);
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::tests::temp_dir;
    use std::fs;

    fn pack_dir() -> (PathBuf, String) {
        let dir = temp_dir("confbot-ext");
        fs::write(dir.join("fun.yaml"), "commands:\n  - name: joke\n    content: knock knock\n").unwrap();
        fs::write(
            dir.join("info.json"),
            r#"{"commands": [{"name": "about", "embed": {"title": "About"}}]}"#,
        )
        .unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();
        let folder = dir.to_string_lossy().to_string();
        (dir, folder)
    }

    #[test]
    fn test_discover_lists_documents_only() {
        let (dir, folder) = pack_dir();
        assert_eq!(discover(&folder).unwrap(), vec!["fun", "info"]);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_load_all_then_unload_all() {
        let (dir, folder) = pack_dir();
        let manager = ExtensionManager::new();

        let loaded = manager.load(None, &folder, &HashSet::new()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(manager.command("joke").is_some());
        assert!(manager.command("about").is_some());
        assert_eq!(manager.commands().len(), 2);

        let unloaded = manager.unload(None, &folder).unwrap();
        assert_eq!(unloaded.len(), 2);
        assert!(manager.is_empty());
        assert!(manager.command("joke").is_none());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_load_single_and_reject_double_load() {
        let (dir, folder) = pack_dir();
        let manager = ExtensionManager::new();

        manager.load(Some("fun"), &folder, &HashSet::new()).unwrap();
        assert!(manager.is_loaded(&extension_key(&folder, "fun")));
        assert!(!manager.is_loaded(&extension_key(&folder, "info")));
        assert!(manager.load(Some("fun"), &folder, &HashSet::new()).is_err());

        // Folder-wide load skips what is already loaded
        let loaded = manager.load(None, &folder, &HashSet::new()).unwrap();
        assert_eq!(loaded, vec![extension_key(&folder, "info")]);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_colliding_names_rejected() {
        let (dir, folder) = pack_dir();
        let manager = ExtensionManager::new();

        let taken: HashSet<String> = ["joke".to_string()].into_iter().collect();
        let err = manager.load(None, &folder, &taken).unwrap_err();
        assert!(err.to_string().contains("joke"));
        assert!(manager.is_empty(), "nothing is loaded when any extension collides");

        fs::write(dir.join("more.yaml"), "commands:\n  - name: about\n    content: again\n").unwrap();
        manager.load(Some("info"), &folder, &HashSet::new()).unwrap();
        assert!(manager.load(Some("more"), &folder, &HashSet::new()).is_err());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_reload_swaps_only_on_success() {
        let (dir, folder) = pack_dir();
        let manager = ExtensionManager::new();
        manager.load(Some("fun"), &folder, &HashSet::new()).unwrap();

        fs::write(dir.join("fun.yaml"), "commands:\n  - name: joke\n    content: updated\n").unwrap();
        manager.reload(Some("fun"), &folder, &HashSet::new()).unwrap();
        assert_eq!(
            manager.command("joke").and_then(|c| c.response.content),
            Some("updated".to_string())
        );

        fs::write(dir.join("fun.yaml"), "commands: [not, valid").unwrap();
        assert!(manager.reload(Some("fun"), &folder, &HashSet::new()).is_err());
        assert_eq!(
            manager.command("joke").and_then(|c| c.response.content),
            Some("updated".to_string())
        );

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_folder_reload_resyncs_with_disk() {
        let (dir, folder) = pack_dir();
        let manager = ExtensionManager::new();
        manager.load(Some("fun"), &folder, &HashSet::new()).unwrap();

        fs::remove_file(dir.join("fun.yaml")).unwrap();
        let keys = manager.reload(None, &folder, &HashSet::new()).unwrap();
        assert_eq!(keys, vec![extension_key(&folder, "info")]);
        assert!(manager.command("joke").is_none());
        assert!(manager.command("about").is_some());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_unload_unknown_is_an_error() {
        let manager = ExtensionManager::new();
        assert!(manager.unload(Some("ghost"), DEFAULT_FOLDER).is_err());
        assert!(manager.reload(Some("ghost"), DEFAULT_FOLDER, &HashSet::new()).is_err());
    }

    #[test]
    fn test_path_like_names_rejected() {
        assert!(parse_extension(DEFAULT_FOLDER, "../secrets").is_err());
        assert!(parse_extension(DEFAULT_FOLDER, "a/b").is_err());
    }
}
