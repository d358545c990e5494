//! Copy-on-write settings cell
//!
//! Readers clone the current `Arc<Settings>` and keep a consistent snapshot
//! for the whole invocation. A reload builds a complete new store and swaps
//! it in; nothing is merged.

use log::{info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use super::Settings;
use crate::core::BotError;

#[derive(Debug, Clone)]
pub struct SettingsHandle {
    inner: Arc<RwLock<Arc<Settings>>>,
}

impl SettingsHandle {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(settings))),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BotError> {
        Ok(Self::new(Settings::load(path)?))
    }

    /// Snapshot of the store as of now
    pub fn current(&self) -> Arc<Settings> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Swap in `settings`, returning the previous store
    pub fn replace(&self, settings: Settings) -> Arc<Settings> {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *guard, Arc::new(settings))
    }

    /// Rebuild the store from its original path, or from `path` when given.
    ///
    /// The new store is rejected, and the old one kept, when it fails to
    /// load, when two commands share a name, or when a command reuses one of
    /// the `taken` names (builtins and extension commands).
    pub fn reload(
        &self,
        path: Option<&Path>,
        taken: &HashSet<String>,
    ) -> Result<Arc<Settings>, BotError> {
        let target: PathBuf = match path {
            Some(p) => p.to_path_buf(),
            None => self.current().path.clone(),
        };

        let fresh = Settings::load(&target)?;
        let mut duplicates = fresh.duplicate_command_names();
        for name in fresh.command_names() {
            if taken.contains(name) && !duplicates.iter().any(|d| d == name) {
                duplicates.push(name.to_string());
            }
        }
        if !duplicates.is_empty() {
            warn!(
                "⚠️ Rejected settings from {}: duplicate commands {:?}",
                target.display(),
                duplicates
            );
            return Err(BotError::Build(duplicates));
        }

        let fresh = Arc::new(fresh);
        {
            let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
            *guard = Arc::clone(&fresh);
        }
        info!("🔄 Settings reloaded from {}", target.display());
        Ok(fresh)
    }
}
