//! Durable state.
//!
//! - `store`: the JSON-backed document of subscriptions and baselines

pub mod store;

pub use store::{StateDocument, StateError, StateStore, UserRecord};
