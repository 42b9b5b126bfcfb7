//! Drive module watcher
//!
//! A Telegram bot over a shared Google Drive folder tree. It serves
//! interactive browsing of the tree through inline-keyboard menus and
//! periodically scans module subtrees (root folders named `M<digits> …`)
//! for newly published materials, announcing them to a broadcast chat
//! and to per-user subscribers.
//!
//! ## Architecture
//!
//! ```text
//! Drive files.list
//!        ↓
//! DriveClient (paginated listing, shortcut resolution)
//!        ↓
//! SwrCache (stale-while-revalidate, one refresh per key)
//!      ↓                    ↓
//! BotHandler menus    ChangeScanner (depth-bounded worklist)
//!                           ↓
//!                      diff vs baseline  →  StateStore (state.json)
//!                           ↓
//!                      Notifier → broadcast chat + subscribers
//! ```
//!
//! The scan loop and the bot's update polling run concurrently and share
//! two synchronized resources: the cache table and the state document.
//!
//! ## Module Structure
//!
//! - [`drive`]: node model and the paginated listing client
//! - [`cache`]: the stale-while-revalidate listing cache
//! - [`topics`]: module topics parsed from root folder names
//! - [`scan`]: subtree scanning, baseline diffing, and the scan cycle
//! - [`notify`]: Telegram client and notification fan-out
//! - [`state`]: the durable subscriptions/baselines document
//! - [`bot`]: interactive menus, sessions, and update dispatch
//! - [`http`]: the liveness endpoint
//! - [`config`]: environment configuration

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bot;
pub mod cache;
pub mod config;
pub mod drive;
pub mod http;
pub mod notify;
pub mod scan;
pub mod state;
pub mod topics;

#[cfg(test)]
pub(crate) mod testutil;

/// Re-exports for convenience.
pub mod prelude {
    pub use crate::bot::{BotHandler, SessionMap};
    pub use crate::cache::SwrCache;
    pub use crate::config::Config;
    pub use crate::drive::{DriveClient, DriveError, ListMode, Lister, Node, NodeKind};
    pub use crate::http::HealthServer;
    pub use crate::notify::{MessageSender, Notifier, TelegramClient};
    pub use crate::scan::{ChangeScanner, ScanCycle, ScanUpdate};
    pub use crate::state::StateStore;
    pub use crate::topics::{Topic, TopicIndex};
}

/// Run the scan loop forever.
///
/// Each pass lists the current topics and scans every eligible module;
/// failures are logged and the loop simply sleeps until the next
/// interval. This function never returns.
pub async fn run_scan_loop(cycle: scan::ScanCycle, interval: std::time::Duration) {
    loop {
        if let Err(e) = cycle.run_once().await {
            tracing::warn!("scan cycle failed: {e}");
        }
        tokio::time::sleep(interval).await;
    }
}
