//! Depth-bounded subtree traversal.

use std::collections::HashSet;
use std::sync::Arc;

use crate::drive::{DriveError, ListMode, Lister, Node, NodeKind};

/// Recursively lists a module's subtree and collects every descendant.
///
/// The traversal is an explicit worklist of `(folder id, depth)` pairs
/// rather than recursion, so the depth cutoff is trivial to test and the
/// stack stays bounded. A visited set guards against shortcut cycles.
pub struct ChangeScanner {
    source: Arc<dyn Lister>,
    max_depth: u32,
}

impl ChangeScanner {
    /// Create a scanner reading through `source` (normally the SWR cache).
    pub fn new(source: Arc<dyn Lister>, max_depth: u32) -> Self {
        Self { source, max_depth }
    }

    /// Collect every item under `root_folder_id`, down to the depth bound.
    ///
    /// Folders at the bound are still reported; their contents are
    /// silently excluded. Any listing failure aborts the whole scan.
    pub async fn scan(&self, root_folder_id: &str) -> Result<Vec<Node>, DriveError> {
        let mut found = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut worklist: Vec<(String, u32)> = vec![(root_folder_id.to_string(), 0)];

        while let Some((folder_id, depth)) = worklist.pop() {
            if !visited.insert(folder_id.clone()) {
                continue;
            }

            let children = self.source.list(&folder_id, ListMode::Full).await?;
            for child in children {
                if child.kind == NodeKind::Folder && depth < self.max_depth {
                    worklist.push((child.id.clone(), depth + 1));
                }
                found.push(child);
            }
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{file, folder, FakeLister};

    fn chain_lister() -> Arc<FakeLister> {
        // root -> A -> B -> C, where C holds a file.
        let lister = Arc::new(FakeLister::new());
        lister.insert("root", vec![folder("a", "A")]);
        lister.insert("a", vec![folder("b", "B")]);
        lister.insert("b", vec![folder("c", "C")]);
        lister.insert("c", vec![file("deep", "deep.pdf")]);
        lister
    }

    fn ids(nodes: &[Node]) -> Vec<&str> {
        let mut ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    #[tokio::test]
    async fn depth_bound_excludes_deeper_contents() {
        let scanner = ChangeScanner::new(chain_lister(), 1);
        let nodes = scanner.scan("root").await.unwrap();
        // A and B are reached; B's contents are past the bound.
        assert_eq!(ids(&nodes), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn deeper_bound_reaches_the_file() {
        let scanner = ChangeScanner::new(chain_lister(), 3);
        let nodes = scanner.scan("root").await.unwrap();
        assert_eq!(ids(&nodes), vec!["a", "b", "c", "deep"]);
    }

    #[tokio::test]
    async fn listing_failure_aborts_the_scan() {
        let lister = chain_lister();
        lister.fail("a");
        let scanner = ChangeScanner::new(lister, 3);
        assert!(scanner.scan("root").await.is_err());
    }

    #[tokio::test]
    async fn shortcut_cycle_is_visited_once() {
        let lister = Arc::new(FakeLister::new());
        // Two folders that point back at each other.
        lister.insert("root", vec![folder("x", "X")]);
        lister.insert("x", vec![folder("root", "Back"), file("f", "f.pdf")]);
        let scanner = ChangeScanner::new(lister.clone(), 10);

        let nodes = scanner.scan("root").await.unwrap();
        assert_eq!(ids(&nodes), vec!["f", "root", "x"]);
        // root, x, and nothing twice.
        assert_eq!(lister.fetch_count(), 2);
    }
}
