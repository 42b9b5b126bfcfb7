//! Notification fan-out for newly observed items.

use std::sync::Arc;

use crate::drive::Node;
use crate::notify::telegram::MessageSender;
use crate::state::StateStore;
use crate::topics::Topic;

/// Render the announcement for one new item.
pub fn render_notification(topic: &Topic, item: &Node) -> String {
    format!(
        "📢 M{} | {} {}\n{}",
        topic.key,
        item.icon(),
        item.name,
        item.link()
    )
}

/// Delivers rendered announcements to the broadcast chat and to every
/// subscriber of the item's module.
///
/// Every send is independent: a failure to one recipient is logged and
/// never aborts delivery to the remaining recipients or items.
pub struct Notifier {
    sender: Arc<dyn MessageSender>,
    store: Arc<StateStore>,
    broadcast_chat_id: i64,
}

impl Notifier {
    /// Create a notifier announcing into `broadcast_chat_id`.
    pub fn new(sender: Arc<dyn MessageSender>, store: Arc<StateStore>, broadcast_chat_id: i64) -> Self {
        Self {
            sender,
            store,
            broadcast_chat_id,
        }
    }

    /// Announce `items` for `topic`, in the order given.
    pub async fn notify(&self, topic: &Topic, items: &[Node]) {
        if items.is_empty() {
            return;
        }

        let subscribers = self.store.subscribers_of(topic.key).await;
        tracing::info!(
            module = topic.key,
            items = items.len(),
            subscribers = subscribers.len(),
            "announcing new items"
        );

        for item in items {
            let text = render_notification(topic, item);

            if let Err(e) = self.sender.send(self.broadcast_chat_id, &text).await {
                tracing::warn!(chat = self.broadcast_chat_id, "broadcast send failed: {e}");
            }

            for &user_id in &subscribers {
                if let Err(e) = self.sender.send(user_id, &text).await {
                    tracing::warn!(user = user_id, "direct send failed: {e}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{file, file_modified, RecordingSender};
    use tempfile::tempdir;

    fn topic() -> Topic {
        Topic {
            key: 19,
            folder_id: "f19".to_string(),
            name: "M19 Foo".to_string(),
        }
    }

    async fn store_with_subscribers(dir: &tempfile::TempDir, users: &[i64]) -> Arc<StateStore> {
        let store = Arc::new(StateStore::load(dir.path().join("state.json")));
        for &user in users {
            store.select_module(user, &topic()).await;
        }
        store
    }

    #[test]
    fn rendering_includes_badge_icon_name_and_link() {
        let text = render_notification(&topic(), &file("d1", "plan.pdf"));
        assert!(text.starts_with("📢 M19 | "));
        assert!(text.contains("plan.pdf"));
        assert!(text.contains("https://drive.google.com/file/d/d1/view"));
    }

    #[tokio::test]
    async fn fans_out_to_broadcast_then_subscribers() {
        let dir = tempdir().unwrap();
        let store = store_with_subscribers(&dir, &[42]).await;
        let sender = Arc::new(RecordingSender::new());
        let notifier = Notifier::new(sender.clone(), store, -100);

        notifier.notify(&topic(), &[file("d1", "plan.pdf")]).await;

        let sent = sender.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, -100);
        assert_eq!(sent[1].0, 42);
    }

    #[tokio::test]
    async fn one_failing_recipient_never_halts_the_batch() {
        let dir = tempdir().unwrap();
        let store = store_with_subscribers(&dir, &[42, 43]).await;
        let sender = Arc::new(RecordingSender::new());
        sender.fail_for(42);
        let notifier = Notifier::new(sender.clone(), store, -100);

        notifier
            .notify(
                &topic(),
                &[
                    file_modified("d1", "a.pdf", "2026-02-01T00:00:00Z"),
                    file_modified("d2", "b.pdf", "2026-01-01T00:00:00Z"),
                ],
            )
            .await;

        // Both items went to broadcast plus both subscribers: the failing
        // recipient was still attempted every time.
        let sent = sender.sent();
        assert_eq!(sent.len(), 6);
        assert_eq!(sent.iter().filter(|(chat, _)| *chat == 42).count(), 2);
        assert_eq!(sent.iter().filter(|(chat, _)| *chat == 43).count(), 2);
    }

    #[tokio::test]
    async fn dm_disabled_subscribers_are_skipped() {
        let dir = tempdir().unwrap();
        let store = store_with_subscribers(&dir, &[42]).await;
        store.toggle_dm(42).await;
        let sender = Arc::new(RecordingSender::new());
        let notifier = Notifier::new(sender.clone(), store, -100);

        notifier.notify(&topic(), &[file("d1", "plan.pdf")]).await;

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, -100);
    }
}
