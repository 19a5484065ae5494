//! Persisted app list: the last scan and how often each entry was opened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::{AppEntry, Launcher};
use crate::config::find_config;
use crate::error::ConfigError;
use crate::pal::PlatformError;

pub const STORE_FILE: &str = "apps.json";

#[derive(Debug, Default, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct AppStore {
    #[serde(default)]
    pub apps: Vec<AppEntry>,
    #[serde(default)]
    pub last_scan_time: Option<DateTime<Utc>>,
}

impl AppStore {
    /// Replaces the stored apps with a fresh scan. Open counts of apps that
    /// are still present carry over.
    pub fn save_apps(&mut self, apps: Vec<AppEntry>, scanned_at: DateTime<Utc>) {
        let counts: HashMap<&str, u32> = self
            .apps
            .iter()
            .map(|app| (app.path.as_str(), app.open_count))
            .collect();

        let apps = apps
            .into_iter()
            .map(|mut app| {
                app.open_count = counts.get(app.path.as_str()).copied().unwrap_or(0);
                app
            })
            .collect();

        self.apps = apps;
        self.last_scan_time = Some(scanned_at);
    }

    pub fn app(&self, path: &str) -> Option<&AppEntry> {
        self.apps.iter().find(|app| app.path == path)
    }

    /// Counts one more launch of the app stored under `path`. Returns false
    /// when no such app is stored.
    pub fn increment_open_count(&mut self, path: &str) -> bool {
        match self.apps.iter_mut().find(|app| app.path == path) {
            Some(app) => {
                app.open_count = app.open_count.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Launches `target` and, once the launch went through, counts it for the
    /// stored app with that path. Returns whether an app was counted.
    pub fn open(&mut self, launcher: &dyn Launcher, target: &Path) -> Result<bool, PlatformError> {
        launcher.launch(target)?;

        let counted = self.increment_open_count(&target.to_string_lossy());
        if !counted {
            tracing::debug!("{} is not in the app store, not counted", target.display());
        }
        Ok(counted)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Loads the store at `path`; a missing file is an empty store.
pub fn load_store<P: AsRef<Path>>(path: P) -> Result<AppStore, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!("No app store at {}, starting empty", path.display());
        return Ok(AppStore::default());
    }

    let content = fs::read_to_string(path)?;
    let store: AppStore = serde_json::from_str(&content)?;
    Ok(store)
}

pub fn save_store<P: AsRef<Path>>(path: P, store: &AppStore) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(store)?;
    fs::write(path, json)?;
    tracing::debug!("Saved {} apps to {}", store.apps.len(), path.display());
    Ok(())
}

/// Drops the store file. Nothing to do when it does not exist.
pub fn reset_store<P: AsRef<Path>>(path: P) -> Result<(), ConfigError> {
    match fs::remove_file(path.as_ref()) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// `apps.json` in the same directory as the config file.
pub fn find_store() -> PathBuf {
    find_config().with_file_name(STORE_FILE)
}
