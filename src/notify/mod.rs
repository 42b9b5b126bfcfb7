//! Message delivery.
//!
//! - `telegram`: the Bot API client and wire types
//! - `notifier`: rendering and fan-out of new-item announcements

pub mod notifier;
pub mod telegram;

pub use notifier::{render_notification, Notifier};
pub use telegram::{
    CallbackQuery, Chat, InlineKeyboardButton, InlineKeyboardMarkup, Message, MessageSender,
    SendError, TelegramClient, Update, User,
};
