use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Message, MessageStatus, ReactionGroup};

/// Events pushed by the live transport for an open room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ConnectionEvent {
    /// A new message was delivered to this room
    ChatMessage { message: Message },

    /// The counterpart started or stopped typing
    TypingIndicator { is_typing: bool },

    /// Fields of an existing message changed (status, content, reactions)
    MessageUpdated {
        message_id: Uuid,
        updates: MessageUpdate,
    },

    /// A message was deleted on the server
    MessageDeleted { message_id: Uuid },
}

/// Partial message patch carried by `message_updated`. Absent fields are
/// left untouched by the merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MessageStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactions: Option<Vec<ReactionGroup>>,
}
