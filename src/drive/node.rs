//! Drive node model: files, folders, and shortcut resolution.
//!
//! This module converts raw `files.list` entries into [`Node`] values in
//! which shortcut indirection is already resolved: a shortcut to a folder
//! carries the target folder's id as its traversal identity, while the
//! shortcut's own id is kept only as the UI key used in callback data.

use serde::Deserialize;

/// MIME type Drive uses for folders.
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
/// MIME type Drive uses for shortcuts.
pub const SHORTCUT_MIME: &str = "application/vnd.google-apps.shortcut";

/// Raw `files.list` entry as returned by the Drive API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// Drive file id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// MIME type of the entry itself.
    pub mime_type: String,
    /// Link to open the entry in a browser.
    #[serde(default)]
    pub web_view_link: Option<String>,
    /// RFC 3339 modification timestamp (only requested in full listings).
    #[serde(default)]
    pub modified_time: Option<String>,
    /// Present when the entry is a shortcut.
    #[serde(default)]
    pub shortcut_details: Option<ShortcutDetails>,
}

/// Shortcut target information from `shortcutDetails`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutDetails {
    /// Id of the item the shortcut points at.
    #[serde(default)]
    pub target_id: Option<String>,
    /// MIME type of the item the shortcut points at.
    #[serde(default)]
    pub target_mime_type: Option<String>,
}

/// Whether a node can hold children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A folder (or a shortcut resolved to a folder).
    Folder,
    /// Anything that cannot hold children.
    File,
}

/// A tree node with shortcut indirection already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Traversal identity. For folder shortcuts this is the target folder
    /// id; everything else keeps its own id.
    pub id: String,
    /// The entry's own id as listed, used as the UI key in callback data.
    pub ui_id: String,
    /// Display name as shown in Drive.
    pub name: String,
    /// Folder or file, after shortcut resolution.
    pub kind: NodeKind,
    /// Effective MIME type (the target's for shortcuts), drives the icon.
    pub mime: String,
    /// Browser link for the entry.
    pub web_view_link: Option<String>,
    /// RFC 3339 modification timestamp, if requested and present.
    pub modified: Option<String>,
}

impl Node {
    /// Resolve a raw listing entry into a node.
    pub fn from_raw(raw: DriveFile) -> Self {
        let shortcut = if raw.mime_type == SHORTCUT_MIME {
            raw.shortcut_details.as_ref()
        } else {
            None
        };

        let target_mime = shortcut
            .and_then(|s| s.target_mime_type.clone())
            .unwrap_or_else(|| raw.mime_type.clone());

        // Only folder shortcuts swap their traversal identity; file
        // shortcuts keep their own id and open via their own link.
        let id = if target_mime == FOLDER_MIME {
            shortcut
                .and_then(|s| s.target_id.clone())
                .unwrap_or_else(|| raw.id.clone())
        } else {
            raw.id.clone()
        };

        let kind = if target_mime == FOLDER_MIME {
            NodeKind::Folder
        } else {
            NodeKind::File
        };

        Self {
            id,
            ui_id: raw.id,
            name: raw.name,
            kind,
            mime: target_mime,
            web_view_link: raw.web_view_link,
            modified: raw.modified_time,
        }
    }

    /// Icon shown in menus and notifications.
    pub fn icon(&self) -> &'static str {
        if self.kind == NodeKind::Folder {
            return "📁";
        }
        icon_for_mime(&self.mime)
    }

    /// Browser link for the entry, with a Drive viewer fallback.
    pub fn link(&self) -> String {
        self.web_view_link
            .clone()
            .unwrap_or_else(|| format!("https://drive.google.com/file/d/{}/view", self.ui_id))
    }
}

/// Icon for a file MIME type.
fn icon_for_mime(mime: &str) -> &'static str {
    match mime {
        "application/pdf" => "📕",
        "application/vnd.google-apps.document"
        | "application/msword"
        | "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "📝",
        "application/vnd.google-apps.presentation"
        | "application/vnd.ms-powerpoint"
        | "application/vnd.openxmlformats-officedocument.presentationml.presentation" => "📊",
        "application/vnd.google-apps.spreadsheet"
        | "application/vnd.ms-excel"
        | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "📗",
        _ => "📄",
    }
}
