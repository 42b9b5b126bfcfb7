//! Baseline diffing for change notification.
//!
//! Compares the current scan result against the persisted baseline for a
//! module and decides what to announce. The next baseline is always the
//! full replacement id set of the current scan, so an item that vanishes
//! is forgotten and an item recreated later under the same id is never
//! re-reported.

use std::collections::HashSet;

use crate::drive::Node;

/// Result of diffing one module's scan against its baseline.
#[derive(Debug, Clone)]
pub struct DiffOutcome {
    /// Newly observed items, most recently modified first, capped.
    pub new_items: Vec<Node>,
    /// Id set of everything currently in the subtree (full replacement).
    pub next_baseline: HashSet<String>,
}

/// Diff `current` against `baseline`.
///
/// `new_items` holds items whose id is absent from the baseline, sorted
/// by modification timestamp descending (missing timestamps sort last)
/// and truncated to `max_new`. Truncation is an accepted lossy policy:
/// the baseline still absorbs every current id, so over-cap items are
/// never reported later either.
pub fn diff(baseline: &HashSet<String>, current: &[Node], max_new: usize) -> DiffOutcome {
    let next_baseline: HashSet<String> = current.iter().map(|node| node.id.clone()).collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut new_items: Vec<Node> = current
        .iter()
        .filter(|node| !baseline.contains(&node.id) && seen.insert(node.id.as_str()))
        .cloned()
        .collect();

    new_items.sort_by(|a, b| {
        let a_modified = a.modified.as_deref().unwrap_or("");
        let b_modified = b.modified.as_deref().unwrap_or("");
        b_modified
            .cmp(a_modified)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    new_items.truncate(max_new);

    DiffOutcome {
        new_items,
        next_baseline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{file, file_modified};

    fn id_set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn first_scan_reports_everything_once() {
        let current = vec![file("a", "a.pdf"), file("b", "b.pdf")];

        let first = diff(&HashSet::new(), &current, 10);
        assert_eq!(first.new_items.len(), 2);
        assert_eq!(first.next_baseline, id_set(&["a", "b"]));

        // The same items never re-report on the next cycle.
        let second = diff(&first.next_baseline, &current, 10);
        assert!(second.new_items.is_empty());
    }

    #[test]
    fn deleted_item_leaves_baseline_without_notification() {
        let baseline = id_set(&["a", "b"]);
        let current = vec![file("a", "a.pdf")];

        let outcome = diff(&baseline, &current, 10);
        assert!(outcome.new_items.is_empty());
        assert_eq!(outcome.next_baseline, id_set(&["a"]));

        // Recreated under the same id after the deletion scan: reported
        // again, because the baseline forgot it.
        let recreated = vec![file("a", "a.pdf"), file("b", "b.pdf")];
        let outcome = diff(&outcome.next_baseline, &recreated, 10);
        assert_eq!(outcome.new_items.len(), 1);
        assert_eq!(outcome.new_items[0].id, "b");
    }

    #[test]
    fn new_items_sorted_by_modified_descending_missing_last() {
        let current = vec![
            file_modified("old", "old.pdf", "2026-01-01T00:00:00Z"),
            file("untimed", "untimed.pdf"),
            file_modified("new", "new.pdf", "2026-03-01T00:00:00Z"),
        ];

        let outcome = diff(&HashSet::new(), &current, 10);
        let ids: Vec<&str> = outcome.new_items.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "untimed"]);
    }

    #[test]
    fn truncation_keeps_every_id_in_the_baseline() {
        let current: Vec<_> = (0..10)
            .map(|i| {
                file_modified(
                    &format!("id{i}"),
                    &format!("file{i}.pdf"),
                    &format!("2026-01-{:02}T00:00:00Z", i + 1),
                )
            })
            .collect();

        let outcome = diff(&HashSet::new(), &current, 6);
        assert_eq!(outcome.new_items.len(), 6);
        // The six most recently modified win.
        assert_eq!(outcome.new_items[0].id, "id9");
        assert_eq!(outcome.new_items[5].id, "id4");
        // All ten ids are absorbed regardless.
        assert_eq!(outcome.next_baseline.len(), 10);
    }

    #[test]
    fn duplicate_ids_in_scan_report_once() {
        // The same target reached through two folder shortcuts.
        let current = vec![file("a", "a.pdf"), file("a", "a.pdf")];
        let outcome = diff(&HashSet::new(), &current, 10);
        assert_eq!(outcome.new_items.len(), 1);
    }
}
