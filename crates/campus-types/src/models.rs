use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    File,
    Voice,
    Video,
    Location,
    Contact,
    Sticker,
    Gif,
}

/// Delivery status of a message. `Pending -> Sent -> Delivered -> Read` is
/// strictly forward; `Failed` is terminal and reachable only from `Pending`
/// or `Sent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl MessageStatus {
    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Sent => 1,
            Self::Delivered => 2,
            Self::Read => 3,
            Self::Failed => 4, // terminal, ranked apart via can_transition_to
        }
    }

    /// Whether a status update from `self` to `next` is legal.
    /// Forward-only along the delivery ladder; `Failed` only from
    /// `Pending`/`Sent`; nothing leaves `Failed`.
    pub fn can_transition_to(self, next: MessageStatus) -> bool {
        match (self, next) {
            (Self::Failed, _) => false,
            (Self::Pending | Self::Sent, Self::Failed) => true,
            (_, Self::Failed) => false,
            (from, to) => from.rank() < to.rank(),
        }
    }
}

/// Users who reacted with a given emoji, in the grouped shape the REST
/// layer returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionGroup {
    pub emoji: String,
    pub count: usize,
    pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender: User,
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
    pub status: MessageStatus,
    /// Authoritative ordering key; transport delivery order is not.
    pub created_at: DateTime<Utc>,
    /// Back-reference to another message's id, never an ownership edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Uuid>,
    #[serde(default)]
    pub reactions: Vec<ReactionGroup>,
}

/// A 1:1 conversation with `other_user`. `last_message` is denormalized by
/// value for list rendering; `unread_count` is maintained by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRoom {
    pub id: Uuid,
    pub other_user: User,
    #[serde(default)]
    pub last_message: Option<Message>,
    #[serde(default)]
    pub unread_count: u32,
    pub created_at: DateTime<Utc>,
}

/// One page of room history. The server returns pages newest-first,
/// 1-indexed, with page 1 holding the most recent messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePage {
    pub results: Vec<Message>,
    pub count: u32,
    pub page_size: u32,
}

impl MessagePage {
    /// Total number of pages implied by `count` and `page_size`.
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            0
        } else {
            self.count.div_ceil(self.page_size)
        }
    }
}

/// Opaque file payload handed to the REST collaborator on media sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingAttachment {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}
