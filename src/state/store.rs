//! Durable bot state: subscriptions and per-module baselines.
//!
//! One JSON document on disk, loaded once at startup and rewritten after
//! every mutation. A missing or corrupt file yields an empty document; a
//! failed save is logged and swallowed, leaving the in-memory document
//! authoritative until the next successful save.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::topics::Topic;

/// Errors while persisting the state document. Never propagated to
/// callers of the store; surfaced only in logs.
#[derive(Debug, Error)]
pub enum StateError {
    /// Writing the document to disk failed.
    #[error("failed to write state file: {0}")]
    Write(#[from] std::io::Error),

    /// Encoding the document failed.
    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A user's subscription record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Selected module key, at most one per user.
    #[serde(default)]
    pub module: Option<u32>,
    /// Root folder of the selected module.
    #[serde(default)]
    pub module_folder_id: Option<String>,
    /// Whether direct delivery of notifications is enabled.
    #[serde(default)]
    pub dm_enabled: bool,
}

/// The persisted document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateDocument {
    /// Per-user subscription records, keyed by Telegram user id.
    #[serde(default)]
    pub users: HashMap<i64, UserRecord>,
    /// Per-module baselines: item ids already seen, keyed by the
    /// module's root folder id. Entries are never deleted once created.
    #[serde(default)]
    pub last_seen: HashMap<String, HashSet<String>>,
}

/// Synchronized owner of the state document.
///
/// Every read-modify-persist sequence runs under one coarse write lock,
/// which serializes subscription edits from the bot handlers against
/// baseline replacement from the scan loop.
pub struct StateStore {
    path: PathBuf,
    doc: RwLock<StateDocument>,
}

impl StateStore {
    /// Load the document from `path`, falling back to an empty one.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let doc = Self::read_document(&path);
        Self {
            path,
            doc: RwLock::new(doc),
        }
    }

    fn read_document(path: &Path) -> StateDocument {
        match fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!("state file {} is corrupt, starting empty: {e}", path.display());
                    StateDocument::default()
                }
            },
            Err(_) => StateDocument::default(),
        }
    }

    /// Baseline id set for a module root, empty if never scanned.
    pub async fn baseline(&self, folder_id: &str) -> HashSet<String> {
        self.doc
            .read()
            .await
            .last_seen
            .get(folder_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace a module's baseline with the current scan's id set.
    pub async fn replace_baseline(&self, folder_id: &str, ids: HashSet<String>) {
        let mut doc = self.doc.write().await;
        doc.last_seen.insert(folder_id.to_string(), ids);
        self.save(&doc);
    }

    /// Select a module for a user, replacing any prior selection.
    ///
    /// First-time users start with direct delivery enabled.
    pub async fn select_module(&self, user_id: i64, topic: &Topic) {
        let mut doc = self.doc.write().await;
        let record = doc.users.entry(user_id).or_insert(UserRecord {
            module: None,
            module_folder_id: None,
            dm_enabled: true,
        });
        record.module = Some(topic.key);
        record.module_folder_id = Some(topic.folder_id.clone());
        self.save(&doc);
    }

    /// Toggle direct delivery for a user; returns the new setting.
    pub async fn toggle_dm(&self, user_id: i64) -> bool {
        let mut doc = self.doc.write().await;
        let record = doc.users.entry(user_id).or_insert(UserRecord {
            module: None,
            module_folder_id: None,
            dm_enabled: true,
        });
        record.dm_enabled = !record.dm_enabled;
        let enabled = record.dm_enabled;
        self.save(&doc);
        enabled
    }

    /// A user's current subscription record, if any.
    pub async fn subscription(&self, user_id: i64) -> Option<UserRecord> {
        self.doc.read().await.users.get(&user_id).cloned()
    }

    /// Users subscribed to `module_key` with direct delivery enabled.
    pub async fn subscribers_of(&self, module_key: u32) -> Vec<i64> {
        self.doc
            .read()
            .await
            .users
            .iter()
            .filter(|(_, record)| record.module == Some(module_key) && record.dm_enabled)
            .map(|(user_id, _)| *user_id)
            .collect()
    }

    fn save(&self, doc: &StateDocument) {
        if let Err(e) = self.try_save(doc) {
            tracing::warn!("failed to persist state to {}: {e}", self.path.display());
        }
    }

    fn try_save(&self, doc: &StateDocument) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_string_pretty(doc)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
