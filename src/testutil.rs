//! In-memory fakes shared across unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::drive::{DriveError, ListMode, Lister, Node, NodeKind};
use crate::notify::telegram::{MessageSender, SendError};

/// A `Lister` backed by a map of folder id -> children.
pub(crate) struct FakeLister {
    listings: Mutex<HashMap<String, Vec<Node>>>,
    failing: Mutex<HashSet<String>>,
    fetches: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeLister {
    pub(crate) fn new() -> Self {
        Self {
            listings: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            fetches: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Make every fetch sleep first, to keep refreshes observably in flight.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn insert(&self, folder_id: &str, nodes: Vec<Node>) {
        self.listings
            .lock()
            .unwrap()
            .insert(folder_id.to_string(), nodes);
    }

    pub(crate) fn fail(&self, folder_id: &str) {
        self.failing.lock().unwrap().insert(folder_id.to_string());
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Lister for FakeLister {
    async fn list(&self, folder_id: &str, _mode: ListMode) -> Result<Vec<Node>, DriveError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(folder_id) {
            return Err(DriveError::Status(
                reqwest::StatusCode::SERVICE_UNAVAILABLE,
            ));
        }
        Ok(self
            .listings
            .lock()
            .unwrap()
            .get(folder_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// A `MessageSender` that records sends and can fail per chat.
pub(crate) struct RecordingSender {
    sent: Mutex<Vec<(i64, String)>>,
    failing: Mutex<HashSet<i64>>,
}

impl RecordingSender {
    pub(crate) fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    pub(crate) fn fail_for(&self, chat_id: i64) {
        self.failing.lock().unwrap().insert(chat_id);
    }

    pub(crate) fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), SendError> {
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        if self.failing.lock().unwrap().contains(&chat_id) {
            return Err(SendError::Api("blocked".to_string()));
        }
        Ok(())
    }
}

pub(crate) fn folder(id: &str, name: &str) -> Node {
    Node {
        id: id.to_string(),
        ui_id: id.to_string(),
        name: name.to_string(),
        kind: NodeKind::Folder,
        mime: crate::drive::FOLDER_MIME.to_string(),
        web_view_link: None,
        modified: None,
    }
}

pub(crate) fn file(id: &str, name: &str) -> Node {
    Node {
        id: id.to_string(),
        ui_id: id.to_string(),
        name: name.to_string(),
        kind: NodeKind::File,
        mime: "application/pdf".to_string(),
        web_view_link: None,
        modified: None,
    }
}

pub(crate) fn file_modified(id: &str, name: &str, modified: &str) -> Node {
    let mut node = file(id, name);
    node.modified = Some(modified.to_string());
    node
}
