use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use campus_types::{ChatRoom, Message, MessagePage, MessageType, OutgoingAttachment};

/// Failure from the REST collaborator. Reads capture this into component
/// `error` state; writes return it to the caller.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request never produced a response (connectivity, timeout).
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
}

/// REST history/persistence collaborator. Implementations live in the app
/// shell; the engine only depends on this contract.
///
/// Pagination: pages are 1-indexed, page 1 holds the most recent messages,
/// and each page's `results` arrive newest-first.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn get_chat_messages(&self, room_id: Uuid, page: u32) -> Result<MessagePage, ApiError>;

    async fn send_message(
        &self,
        room_id: Uuid,
        content: &str,
        message_type: MessageType,
        attachment: Option<OutgoingAttachment>,
    ) -> Result<Message, ApiError>;

    async fn mark_messages_read(&self, room_id: Uuid) -> Result<(), ApiError>;

    async fn delete_message(&self, message_id: Uuid) -> Result<(), ApiError>;

    async fn get_chat_rooms(&self) -> Result<Vec<ChatRoom>, ApiError>;

    /// Idempotent: at most one room exists per unordered pair of users.
    async fn get_or_create_chat_room(&self, other_user_id: Uuid) -> Result<ChatRoom, ApiError>;
}
