//! Change scanning.
//!
//! This module provides:
//! - `scanner`: depth-bounded worklist traversal of a module's subtree
//! - `diff`: baseline comparison and new-item selection
//! - [`ScanCycle`]: one full pass over all eligible modules

pub mod diff;
pub mod scanner;

pub use diff::{diff, DiffOutcome};
pub use scanner::ChangeScanner;

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::drive::{DriveError, Node};
use crate::notify::Notifier;
use crate::state::StateStore;
use crate::topics::{Topic, TopicIndex};

/// Summary of one module's scan, fanned out to in-process listeners.
#[derive(Debug, Clone)]
pub struct ScanUpdate {
    /// The module that was scanned.
    pub topic: Topic,
    /// Items announced this cycle (already ordered and capped).
    pub new_items: Vec<Node>,
    /// Total items observed in the subtree.
    pub scanned: usize,
}

/// One scheduled pass: list topics, then scan, diff, notify, and persist
/// each eligible module in turn.
///
/// A failure inside one module aborts only that module's cycle; its
/// baseline is left unchanged and the module is retried next interval.
pub struct ScanCycle {
    topics: TopicIndex,
    scanner: ChangeScanner,
    store: Arc<StateStore>,
    notifier: Notifier,
    min_module_key: u32,
    max_new_per_cycle: usize,
    updates: broadcast::Sender<ScanUpdate>,
}

impl ScanCycle {
    /// Wire up a cycle over the given collaborators.
    ///
    /// Returns the cycle and a receiver for per-module scan summaries.
    pub fn new(
        topics: TopicIndex,
        scanner: ChangeScanner,
        store: Arc<StateStore>,
        notifier: Notifier,
        min_module_key: u32,
        max_new_per_cycle: usize,
    ) -> (Self, broadcast::Receiver<ScanUpdate>) {
        let (updates, updates_rx) = broadcast::channel(64);
        (
            Self {
                topics,
                scanner,
                store,
                notifier,
                min_module_key,
                max_new_per_cycle,
                updates,
            },
            updates_rx,
        )
    }

    /// Subscribe another in-process listener to scan summaries.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanUpdate> {
        self.updates.subscribe()
    }

    /// Run one pass over all eligible modules.
    ///
    /// Fails only when the topic listing itself is unavailable; per-module
    /// failures are logged and skipped.
    pub async fn run_once(&self) -> Result<(), DriveError> {
        let topics = self.topics.list_topics().await?;
        tracing::debug!(topics = topics.len(), "scan cycle starting");

        for topic in topics {
            if topic.key < self.min_module_key {
                continue;
            }
            if let Err(e) = self.scan_topic(&topic).await {
                tracing::warn!(module = topic.key, "scan of {} failed: {e}", topic.name);
            }
        }

        Ok(())
    }

    async fn scan_topic(&self, topic: &Topic) -> Result<(), DriveError> {
        let current = self.scanner.scan(&topic.folder_id).await?;
        let baseline = self.store.baseline(&topic.folder_id).await;
        let outcome = diff(&baseline, &current, self.max_new_per_cycle);

        self.notifier.notify(topic, &outcome.new_items).await;
        self.store
            .replace_baseline(&topic.folder_id, outcome.next_baseline)
            .await;

        // Ignore errors: no in-process listener is not a failure.
        let _ = self.updates.send(ScanUpdate {
            topic: topic.clone(),
            new_items: outcome.new_items,
            scanned: current.len(),
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SwrCache;
    use crate::testutil::{file, file_modified, folder, FakeLister, RecordingSender};
    use std::time::Duration;
    use tempfile::tempdir;

    struct Fixture {
        lister: Arc<FakeLister>,
        sender: Arc<RecordingSender>,
        store: Arc<StateStore>,
        cycle: ScanCycle,
        _dir: tempfile::TempDir,
    }

    fn fixture(min_module_key: u32) -> Fixture {
        let lister = Arc::new(FakeLister::new());
        // TTL zero so every cycle sees the current fake listings after
        // the stale read's refresh; tests drive cycles far enough apart.
        let cache = Arc::new(SwrCache::new(lister.clone(), Duration::ZERO));
        let topics = TopicIndex::new(cache.clone(), "root");
        let scanner = ChangeScanner::new(cache, 3);

        let dir = tempdir().unwrap();
        let store = Arc::new(StateStore::load(dir.path().join("state.json")));
        let sender = Arc::new(RecordingSender::new());
        let notifier = Notifier::new(sender.clone(), store.clone(), -100);

        let (cycle, _rx) = ScanCycle::new(topics, scanner, store.clone(), notifier, min_module_key, 6);
        Fixture {
            lister,
            sender,
            store,
            cycle,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn first_cycle_announces_then_stays_quiet() {
        let fx = fixture(0);
        fx.lister.insert("root", vec![folder("f19", "M19 Foo")]);
        fx.lister
            .insert("f19", vec![file_modified("d1", "plan.pdf", "2026-02-01T00:00:00Z")]);

        fx.cycle.run_once().await.unwrap();
        assert_eq!(fx.sender.sent().len(), 1);
        assert!(fx.store.baseline("f19").await.contains("d1"));

        // Cache entries are stale (TTL zero); wait for refreshes to land
        // so the second cycle reads current data.
        tokio::time::sleep(Duration::from_millis(50)).await;

        fx.cycle.run_once().await.unwrap();
        assert_eq!(fx.sender.sent().len(), 1);
    }

    #[tokio::test]
    async fn below_threshold_modules_are_skipped() {
        let fx = fixture(17);
        fx.lister.insert(
            "root",
            vec![folder("f5", "M5 Old"), folder("f19", "M19 Foo")],
        );
        fx.lister.insert("f19", vec![file("d1", "plan.pdf")]);
        fx.lister.insert("f5", vec![file("d9", "legacy.pdf")]);

        fx.cycle.run_once().await.unwrap();

        assert_eq!(fx.sender.sent().len(), 1);
        assert!(fx.store.baseline("f5").await.is_empty());
    }

    #[tokio::test]
    async fn failing_module_leaves_baseline_untouched_and_others_run() {
        let fx = fixture(0);
        fx.lister.insert(
            "root",
            vec![folder("f19", "M19 Foo"), folder("f20", "M20 Bar")],
        );
        fx.lister.fail("f19");
        fx.lister.insert("f20", vec![file("d2", "notes.pdf")]);

        fx.cycle.run_once().await.unwrap();

        assert!(fx.store.baseline("f19").await.is_empty());
        assert!(fx.store.baseline("f20").await.contains("d2"));
        assert_eq!(fx.sender.sent().len(), 1);
    }

    #[tokio::test]
    async fn scan_updates_are_broadcast() {
        let fx = fixture(0);
        let mut rx = fx.cycle.subscribe();
        fx.lister.insert("root", vec![folder("f19", "M19 Foo")]);
        fx.lister.insert("f19", vec![file("d1", "plan.pdf")]);

        fx.cycle.run_once().await.unwrap();

        let update = rx.try_recv().unwrap();
        assert_eq!(update.topic.key, 19);
        assert_eq!(update.new_items.len(), 1);
        assert_eq!(update.scanned, 1);
    }
}
