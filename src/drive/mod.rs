//! Google Drive access layer.
//!
//! This module provides:
//! - `node`: the resolved tree node model (shortcut indirection handled)
//! - `client`: the paginated `files.list` client and the `Lister` seam

pub mod client;
pub mod node;

pub use client::{DriveClient, DriveError, ListMode, Lister};
pub use node::{DriveFile, Node, NodeKind, ShortcutDetails, FOLDER_MIME, SHORTCUT_MIME};
