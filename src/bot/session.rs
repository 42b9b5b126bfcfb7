//! Per-chat navigation state for the folder menus.

use std::collections::HashMap;

use tokio::sync::RwLock;

/// One entry in the navigation stack.
#[derive(Debug, Clone)]
pub struct NavFrame {
    /// Real folder id being viewed.
    pub folder_id: String,
    /// Human-readable path label ("Home › M19 Foo › Week 1").
    pub label: String,
}

/// Navigation state for one chat.
#[derive(Debug, Clone)]
pub struct Session {
    /// Stack of opened folders; the last frame is the current view.
    pub stack: Vec<NavFrame>,
    /// Pagination offset into the current merged listing.
    pub offset: usize,
    /// Displayed id -> real folder id, rebuilt per view (handles shortcuts).
    pub folder_ids: HashMap<String, String>,
    /// Displayed id -> display name, rebuilt per view.
    pub names: HashMap<String, String>,
}

impl Session {
    /// Fresh session sitting at the root folder.
    pub fn at_root(root_folder_id: &str) -> Self {
        Self {
            stack: vec![NavFrame {
                folder_id: root_folder_id.to_string(),
                label: "Home".to_string(),
            }],
            offset: 0,
            folder_ids: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// The folder currently being viewed.
    pub fn current(&self) -> &NavFrame {
        self.stack.last().expect("session stack is never empty")
    }

    /// Whether the current view is the root listing.
    pub fn at_root_view(&self) -> bool {
        self.stack.len() == 1
    }

    /// Push a folder onto the stack and reset pagination.
    pub fn open(&mut self, folder_id: String, name: &str) {
        let label = format!("{} › {}", self.current().label, name);
        self.stack.push(NavFrame { folder_id, label });
        self.offset = 0;
    }

    /// Pop back one level; stays put at the root.
    pub fn back(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
        self.offset = 0;
    }

    /// Jump back to the root view.
    pub fn home(&mut self, root_folder_id: &str) {
        *self = Self::at_root(root_folder_id);
    }
}

/// Sessions for all chats, keyed by chat id.
pub struct SessionMap {
    root_folder_id: String,
    sessions: RwLock<HashMap<i64, Session>>,
}

impl SessionMap {
    /// Create a session map rooted at `root_folder_id`.
    pub fn new(root_folder_id: impl Into<String>) -> Self {
        Self {
            root_folder_id: root_folder_id.into(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Snapshot of a chat's session, creating one at the root if absent.
    pub async fn get(&self, chat_id: i64) -> Session {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(chat_id)
            .or_insert_with(|| Session::at_root(&self.root_folder_id))
            .clone()
    }

    /// Mutate a chat's session in place and return the updated snapshot.
    pub async fn modify<F>(&self, chat_id: i64, mutate: F) -> Session
    where
        F: FnOnce(&mut Session),
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(chat_id)
            .or_insert_with(|| Session::at_root(&self.root_folder_id));
        mutate(session);
        session.clone()
    }

    /// Reset a chat back to the root view.
    pub async fn reset(&self, chat_id: i64) -> Session {
        let root = self.root_folder_id.clone();
        self.modify(chat_id, |session| session.home(&root)).await
    }
}
