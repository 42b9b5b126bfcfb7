//! Interactive Telegram surface.
//!
//! This module provides:
//! - `session`: per-chat navigation state
//! - `menu`: folder menu rendering
//! - `handlers`: update dispatch and the membership gate

pub mod handlers;
pub mod menu;
pub mod session;

pub use handlers::{BotHandler, Callback};
pub use menu::{build_menu, MenuPage};
pub use session::{NavFrame, Session, SessionMap};
