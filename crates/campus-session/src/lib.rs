/// Campus chat session engine.
///
/// Reconciles the push-based live transport with the paginated REST history
/// for one room at a time:
/// - `MessageStore`: paged history, optimistic sends, dedup/merge of events
/// - `RoomDirectory`: conversation list and unread accounting
/// - `TypingIndicator`: local debounce + remote auto-expiry state machines
/// - `ChatSession`: per-room coordinator wiring transport events into the
///   components above, with a live-first / REST-fallback send path
///
/// The REST client and the Connection Manager are consumed through the
/// `ChatApi` and `Connection` traits and are not implemented here.

pub mod api;
pub mod connection;
pub mod rooms;
pub mod session;
pub mod store;
pub mod typing;

#[cfg(test)]
mod testkit;

// Re-export key types for convenience.
pub use api::{ApiError, ChatApi};
pub use connection::Connection;
pub use rooms::RoomDirectory;
pub use session::{ChatSession, SessionContext};
pub use store::MessageStore;
pub use typing::TypingIndicator;
