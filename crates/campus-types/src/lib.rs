/// Shared data model for the campus chat engine.
///
/// Pure data: serde-friendly models and the typed events delivered by the
/// live transport. No I/O and no engine logic lives here.

pub mod events;
pub mod models;

// Re-export key types for convenience.
pub use events::{ConnectionEvent, MessageUpdate};
pub use models::{
    ChatRoom, Message, MessagePage, MessageStatus, MessageType, OutgoingAttachment, ReactionGroup,
    User,
};
