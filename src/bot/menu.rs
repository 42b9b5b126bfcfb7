//! Folder menu rendering.
//!
//! Builds the inline keyboard for one folder view: navigation row,
//! pagination row, then one row per visible item. Folders (including
//! folder shortcuts) become callback buttons that open in-bot; files
//! become URL buttons.

use std::collections::HashMap;

use crate::drive::{Node, NodeKind};
use crate::notify::telegram::{InlineKeyboardButton, InlineKeyboardMarkup};
use crate::topics::root_sort_key;

use super::session::Session;

/// A rendered folder view ready to send.
#[derive(Debug, Clone)]
pub struct MenuPage {
    /// Message text: the breadcrumb path.
    pub text: String,
    /// The inline keyboard.
    pub keyboard: InlineKeyboardMarkup,
    /// Displayed id -> real folder id for the folders in this listing.
    pub folder_ids: HashMap<String, String>,
    /// Displayed id -> display name for the folders in this listing.
    pub names: HashMap<String, String>,
}

/// Render one folder listing into a menu page.
///
/// `at_root` selects the root ordering (modules by key, the rest after);
/// every other listing sorts folders before files, both by name.
pub fn build_menu(nodes: &[Node], session: &Session, at_root: bool, page_size: usize) -> MenuPage {
    let mut folders: Vec<&Node> = nodes.iter().filter(|n| n.kind == NodeKind::Folder).collect();
    let mut files: Vec<&Node> = nodes.iter().filter(|n| n.kind == NodeKind::File).collect();

    if at_root {
        folders.sort_by_key(|n| root_sort_key(&n.name));
    } else {
        folders.sort_by_key(|n| n.name.to_lowercase());
    }
    files.sort_by_key(|n| n.name.to_lowercase());

    // The callback carries the displayed id; it resolves to the real
    // folder id (shortcut target) through this map when pressed.
    let mut folder_ids = HashMap::new();
    let mut names = HashMap::new();
    for node in &folders {
        folder_ids.insert(node.ui_id.clone(), node.id.clone());
        names.insert(node.ui_id.clone(), node.name.clone());
    }

    let merged: Vec<&Node> = folders.into_iter().chain(files).collect();
    let offset = session.offset.min(merged.len());
    let page = &merged[offset..(offset + page_size).min(merged.len())];

    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();

    if session.at_root_view() {
        rows.push(vec![InlineKeyboardButton::callback("🏠 Home", "HOME")]);
    } else {
        rows.push(vec![
            InlineKeyboardButton::callback("⬅️ Back", "BACK"),
            InlineKeyboardButton::callback("🏠 Home", "HOME"),
        ]);
    }

    let mut paging = Vec::new();
    if offset > 0 {
        paging.push(InlineKeyboardButton::callback("◀️ Prev", "PREV"));
    }
    if offset + page_size < merged.len() {
        paging.push(InlineKeyboardButton::callback("Next ▶️", "NEXT"));
    }
    if !paging.is_empty() {
        rows.push(paging);
    }

    for node in page {
        let row = match node.kind {
            NodeKind::Folder => InlineKeyboardButton::callback(
                format!("📁 {}", node.name),
                format!("OPEN:{}", node.ui_id),
            ),
            NodeKind::File => {
                InlineKeyboardButton::url(format!("{} {}", node.icon(), node.name), node.link())
            }
        };
        rows.push(vec![row]);
    }

    MenuPage {
        text: format!("📂 {}", session.current().label),
        keyboard: InlineKeyboardMarkup {
            inline_keyboard: rows,
        },
        folder_ids,
        names,
    }
}
