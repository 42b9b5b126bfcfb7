//! Module topics derived from root folder names.
//!
//! A root-level folder named `M<digits> …` is a "module": the unit of
//! subscription and change notification. Folders that do not match the
//! pattern are not topics and are simply excluded.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::cache::SwrCache;
use crate::drive::{DriveError, ListMode, NodeKind};

static MODULE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[Mm](\d+)\b").expect("module name pattern is valid")
});

/// A tracked root-level subtree identified by its parsed numeric key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    /// Numeric key parsed from the folder name (`M19 Foo` -> 19).
    pub key: u32,
    /// Root folder of the module's subtree (shortcuts already resolved).
    pub folder_id: String,
    /// Display name as shown in Drive.
    pub name: String,
}

/// Parse the module key from a folder display name.
pub fn parse_module_key(name: &str) -> Option<u32> {
    MODULE_RE
        .captures(name)
        .and_then(|captures| captures[1].parse().ok())
}

/// Sort key for root listings: modules by key ascending, everything
/// else lexicographically after all modules.
pub fn root_sort_key(name: &str) -> (u8, u32, String) {
    match parse_module_key(name) {
        Some(key) => (0, key, name.to_lowercase()),
        None => (1, u32::MAX, name.to_lowercase()),
    }
}

/// Derives the ordered set of module topics from the root listing.
///
/// Pure derivation over the cached root listing; holds no state of its
/// own, so topics appear and disappear as the remote tree changes.
#[derive(Clone)]
pub struct TopicIndex {
    cache: Arc<SwrCache>,
    root_folder_id: String,
}

impl TopicIndex {
    /// Create an index rooted at `root_folder_id`.
    pub fn new(cache: Arc<SwrCache>, root_folder_id: impl Into<String>) -> Self {
        Self {
            cache,
            root_folder_id: root_folder_id.into(),
        }
    }

    /// Current topics, sorted by key ascending.
    pub async fn list_topics(&self) -> Result<Vec<Topic>, DriveError> {
        let nodes = self.cache.get(&self.root_folder_id, ListMode::Light).await?;

        let mut topics: Vec<Topic> = nodes
            .iter()
            .filter(|node| node.kind == NodeKind::Folder)
            .filter_map(|node| {
                parse_module_key(&node.name).map(|key| Topic {
                    key,
                    folder_id: node.id.clone(),
                    name: node.name.clone(),
                })
            })
            .collect();
        topics.sort_by_key(|topic| topic.key);

        Ok(topics)
    }
}
