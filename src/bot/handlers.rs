//! Update dispatch: commands, callbacks, and the membership gate.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::SwrCache;
use crate::drive::ListMode;
use crate::notify::telegram::{
    CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, Message, SendError, TelegramClient,
    Update,
};
use crate::state::StateStore;
use crate::topics::TopicIndex;

use super::menu::build_menu;
use super::session::SessionMap;

const UNAVAILABLE_TEXT: &str = "⚠️ Drive is unavailable right now, try again later.";
const NOT_A_MEMBER_TEXT: &str = "This bot is only available to course group members.";

/// Parsed callback data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    /// Jump to the root view.
    Home,
    /// Pop one navigation level.
    Back,
    /// Previous page of the current listing.
    Prev,
    /// Next page of the current listing.
    Next,
    /// Open a folder by its displayed id.
    Open(String),
    /// Subscribe to the module with this key.
    Subscribe(u32),
}

impl Callback {
    /// Parse a callback data string; unknown data yields `None`.
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "HOME" => Some(Callback::Home),
            "BACK" => Some(Callback::Back),
            "PREV" => Some(Callback::Prev),
            "NEXT" => Some(Callback::Next),
            _ => {
                if let Some(id) = data.strip_prefix("OPEN:") {
                    Some(Callback::Open(id.to_string()))
                } else if let Some(key) = data.strip_prefix("SUB:") {
                    key.parse().ok().map(Callback::Subscribe)
                } else {
                    None
                }
            }
        }
    }
}

/// Routes incoming Telegram updates to browsing and subscription actions.
pub struct BotHandler {
    telegram: Arc<TelegramClient>,
    cache: Arc<SwrCache>,
    topics: TopicIndex,
    store: Arc<StateStore>,
    sessions: SessionMap,
    root_folder_id: String,
    broadcast_chat_id: i64,
    page_size: usize,
}

impl BotHandler {
    /// Wire up a handler over the shared collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        telegram: Arc<TelegramClient>,
        cache: Arc<SwrCache>,
        topics: TopicIndex,
        store: Arc<StateStore>,
        root_folder_id: impl Into<String>,
        broadcast_chat_id: i64,
        page_size: usize,
    ) -> Self {
        let root_folder_id = root_folder_id.into();
        Self {
            telegram,
            cache,
            topics,
            store,
            sessions: SessionMap::new(root_folder_id.clone()),
            root_folder_id,
            broadcast_chat_id,
            page_size,
        }
    }

    /// Long-poll for updates forever. Errors are logged and retried
    /// after a short pause; this loop never exits.
    pub async fn run(self: Arc<Self>) {
        let mut offset = 0i64;
        loop {
            match self.telegram.get_updates(offset, 30).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        self.handle_update(update).await;
                    }
                }
                Err(e) => {
                    tracing::warn!("getUpdates failed: {e}");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }

    async fn handle_update(&self, update: Update) {
        if let Some(message) = update.message {
            self.handle_message(message).await;
        } else if let Some(query) = update.callback_query {
            self.handle_callback(query).await;
        }
    }

    /// Gate: only members of the broadcast group may use the bot.
    async fn is_allowed(&self, user_id: i64) -> bool {
        match self.telegram.is_member(self.broadcast_chat_id, user_id).await {
            Ok(member) => member,
            Err(e) => {
                tracing::warn!(user = user_id, "membership check failed: {e}");
                false
            }
        }
    }

    async fn handle_message(&self, message: Message) {
        let Some(text) = message.text.as_deref() else {
            return;
        };
        let chat_id = message.chat.id;
        let Some(user) = message.from.as_ref() else {
            return;
        };

        if !self.is_allowed(user.id).await {
            self.reply(chat_id, NOT_A_MEMBER_TEXT).await;
            return;
        }

        match text.split_whitespace().next() {
            Some("/start") => {
                self.sessions.reset(chat_id).await;
                self.send_current_folder(chat_id).await;
            }
            Some("/modules") => {
                self.send_module_picker(chat_id).await;
            }
            Some("/dm") => {
                let enabled = self.store.toggle_dm(user.id).await;
                let text = if enabled {
                    "Direct delivery is on. New materials for your module will be sent here."
                } else {
                    "Direct delivery is off."
                };
                self.reply(chat_id, text).await;
            }
            _ => {
                self.reply(chat_id, "Commands: /start — browse, /modules — pick a module, /dm — toggle direct delivery.")
                    .await;
            }
        }
    }

    async fn handle_callback(&self, query: CallbackQuery) {
        if let Err(e) = self.telegram.answer_callback_query(&query.id).await {
            tracing::debug!("answerCallbackQuery failed: {e}");
        }

        let Some(message) = query.message.as_ref() else {
            return;
        };
        let chat_id = message.chat.id;

        if !self.is_allowed(query.from.id).await {
            self.reply(chat_id, NOT_A_MEMBER_TEXT).await;
            return;
        }

        let Some(callback) = query.data.as_deref().and_then(Callback::parse) else {
            return;
        };

        match callback {
            Callback::Home => {
                self.sessions.reset(chat_id).await;
                self.send_current_folder(chat_id).await;
            }
            Callback::Back => {
                self.sessions.modify(chat_id, |s| s.back()).await;
                self.send_current_folder(chat_id).await;
            }
            Callback::Prev => {
                let page_size = self.page_size;
                self.sessions
                    .modify(chat_id, |s| s.offset = s.offset.saturating_sub(page_size))
                    .await;
                self.send_current_folder(chat_id).await;
            }
            Callback::Next => {
                let page_size = self.page_size;
                self.sessions
                    .modify(chat_id, |s| s.offset += page_size)
                    .await;
                self.send_current_folder(chat_id).await;
            }
            Callback::Open(displayed_id) => {
                let session = self.sessions.get(chat_id).await;
                // Shortcuts resolve through the per-view map; an unknown
                // id (stale keyboard) opens as itself.
                let folder_id = session
                    .folder_ids
                    .get(&displayed_id)
                    .cloned()
                    .unwrap_or_else(|| displayed_id.clone());
                let name = session
                    .names
                    .get(&displayed_id)
                    .cloned()
                    .unwrap_or_else(|| "Folder".to_string());
                self.sessions
                    .modify(chat_id, |s| s.open(folder_id, &name))
                    .await;
                self.send_current_folder(chat_id).await;
            }
            Callback::Subscribe(key) => {
                self.subscribe(chat_id, query.from.id, key).await;
            }
        }
    }

    /// Render and send the chat's current folder view.
    async fn send_current_folder(&self, chat_id: i64) {
        let session = self.sessions.get(chat_id).await;
        let folder_id = session.current().folder_id.clone();

        let nodes = match self.cache.get(&folder_id, ListMode::Light).await {
            Ok(nodes) => nodes,
            Err(e) => {
                tracing::warn!(folder = %folder_id, "listing failed: {e}");
                self.reply(chat_id, UNAVAILABLE_TEXT).await;
                return;
            }
        };

        let at_root = folder_id == self.root_folder_id;
        let page = build_menu(&nodes, &session, at_root, self.page_size);

        self.sessions
            .modify(chat_id, |s| {
                s.folder_ids = page.folder_ids.clone();
                s.names = page.names.clone();
            })
            .await;

        if let Err(e) = self
            .telegram
            .send_message(chat_id, &page.text, Some(&page.keyboard))
            .await
        {
            tracing::warn!(chat = chat_id, "menu send failed: {e}");
        }
    }

    /// Send the list of modules as subscription buttons.
    async fn send_module_picker(&self, chat_id: i64) {
        let topics = match self.topics.list_topics().await {
            Ok(topics) => topics,
            Err(e) => {
                tracing::warn!("topic listing failed: {e}");
                self.reply(chat_id, UNAVAILABLE_TEXT).await;
                return;
            }
        };

        let rows: Vec<Vec<InlineKeyboardButton>> = topics
            .iter()
            .map(|topic| {
                vec![InlineKeyboardButton::callback(
                    format!("🔔 {}", topic.name),
                    format!("SUB:{}", topic.key),
                )]
            })
            .collect();

        if let Err(e) = self
            .telegram
            .send_message(
                chat_id,
                "Pick a module to follow:",
                Some(&InlineKeyboardMarkup {
                    inline_keyboard: rows,
                }),
            )
            .await
        {
            tracing::warn!(chat = chat_id, "picker send failed: {e}");
        }
    }

    async fn subscribe(&self, chat_id: i64, user_id: i64, key: u32) {
        let topics = match self.topics.list_topics().await {
            Ok(topics) => topics,
            Err(e) => {
                tracing::warn!("topic listing failed: {e}");
                self.reply(chat_id, UNAVAILABLE_TEXT).await;
                return;
            }
        };

        let Some(topic) = topics.into_iter().find(|t| t.key == key) else {
            self.reply(chat_id, "That module no longer exists.").await;
            return;
        };

        self.store.select_module(user_id, &topic).await;
        self.reply(chat_id, &format!("Following {} — you'll be notified about new materials.", topic.name))
            .await;
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.send_plain(chat_id, text).await {
            tracing::warn!(chat = chat_id, "reply failed: {e}");
        }
    }

    async fn send_plain(&self, chat_id: i64, text: &str) -> Result<(), SendError> {
        self.telegram.send_message(chat_id, text, None).await?;
        Ok(())
    }
}
