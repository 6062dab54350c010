use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use campus_types::{
    Message, MessageStatus, MessageType, MessageUpdate, OutgoingAttachment, User,
};

use crate::api::{ApiError, ChatApi};

/// One room's message history: paged loads, optimistic sends, and
/// dedup/merge of transport-pushed events.
///
/// Messages are kept in ascending `created_at` order (server pages arrive
/// newest-first and are reversed on insert). Message id is the sole merge
/// key, which makes a racing page load and live event safe to interleave.
#[derive(Clone)]
pub struct MessageStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    room_id: Uuid,
    current_user: User,
    api: Arc<dyn ChatApi>,
    state: RwLock<StoreState>,
}

#[derive(Default)]
struct StoreState {
    messages: Vec<Message>,
    loading: bool,
    loading_more: bool,
    sending: bool,
    error: Option<String>,
    last_page: u32,
    total_pages: u32,
}

impl StoreState {
    fn has_next_page(&self) -> bool {
        self.last_page < self.total_pages
    }
}

impl MessageStore {
    pub fn new(room_id: Uuid, current_user: User, api: Arc<dyn ChatApi>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                room_id,
                current_user,
                api,
                state: RwLock::new(StoreState::default()),
            }),
        }
    }

    pub fn room_id(&self) -> Uuid {
        self.inner.room_id
    }

    /// Load one page of history. Page 1 replaces the list; later pages are
    /// "load older" requests and are prepended. A failed load keeps whatever
    /// is already loaded and surfaces the failure via `error()`.
    pub async fn load_messages(&self, page: u32) {
        let append = page > 1;
        {
            let mut state = self.inner.state.write().await;
            if append {
                state.loading_more = true;
            } else {
                state.loading = true;
            }
            state.error = None;
        }
        self.fetch(page, append).await;
    }

    /// Request the next older page. No-op while a paging load is in flight
    /// or when the history is exhausted — double-taps and scroll races are
    /// normal, not errors.
    pub async fn load_more_messages(&self) {
        let next = {
            let mut state = self.inner.state.write().await;
            if state.loading_more || !state.has_next_page() {
                return;
            }
            state.loading_more = true;
            state.error = None;
            state.last_page + 1
        };
        self.fetch(next, true).await;
    }

    async fn fetch(&self, page: u32, append: bool) {
        match self.inner.api.get_chat_messages(self.inner.room_id, page).await {
            Ok(page_data) => {
                let total_pages = page_data.total_pages();
                let mut batch = page_data.results;
                // Server pages are newest-first; the store is ascending.
                batch.reverse();

                {
                    let mut state = self.inner.state.write().await;
                    if append {
                        let newer = std::mem::take(&mut state.messages);
                        state.messages = batch;
                        state.messages.extend(newer);
                    } else {
                        state.messages = batch;
                    }
                    state.last_page = page;
                    state.total_pages = total_pages;
                    state.loading = false;
                    state.loading_more = false;
                }

                // Only a first-page load counts as "seen". Fire-and-forget:
                // a mark-read failure never fails the load itself.
                if page == 1 {
                    let api = Arc::clone(&self.inner.api);
                    let room_id = self.inner.room_id;
                    tokio::spawn(async move {
                        if let Err(e) = api.mark_messages_read(room_id).await {
                            warn!("mark read failed for room {}: {}", room_id, e);
                        }
                    });
                }
            }
            Err(e) => {
                let mut state = self.inner.state.write().await;
                state.error = Some(e.to_string());
                state.loading = false;
                state.loading_more = false;
            }
        }
    }

    /// Send via the REST collaborator, staging an optimistic `Pending`
    /// placeholder first. On success the placeholder is replaced in place by
    /// the canonical message; on failure it is marked `Failed` (and kept)
    /// and the error is returned. Empty content with no attachment is a
    /// silent no-op.
    pub async fn send_message(
        &self,
        content: &str,
        message_type: MessageType,
        attachment: Option<OutgoingAttachment>,
    ) -> Result<Option<Message>, ApiError> {
        if content.trim().is_empty() && attachment.is_none() {
            return Ok(None);
        }

        let placeholder = self.add_pending_message(content, message_type).await;
        self.send_pending(placeholder.id, content, message_type, attachment)
            .await
            .map(Some)
    }

    /// Append an optimistic placeholder (`Pending`, client-side temporary
    /// id) for an outgoing message and return it.
    pub async fn add_pending_message(&self, content: &str, message_type: MessageType) -> Message {
        let message = Message {
            id: Uuid::new_v4(),
            room_id: self.inner.room_id,
            sender: self.inner.current_user.clone(),
            content: content.to_string(),
            message_type,
            status: MessageStatus::Pending,
            created_at: Utc::now(),
            reply_to: None,
            reactions: Vec::new(),
        };

        let mut state = self.inner.state.write().await;
        state.messages.push(message.clone());
        message
    }

    /// REST half of a send: deliver `content` and resolve the placeholder
    /// with the canonical result.
    pub(crate) async fn send_pending(
        &self,
        placeholder_id: Uuid,
        content: &str,
        message_type: MessageType,
        attachment: Option<OutgoingAttachment>,
    ) -> Result<Message, ApiError> {
        self.inner.state.write().await.sending = true;

        let result = self
            .inner
            .api
            .send_message(self.inner.room_id, content, message_type, attachment)
            .await;

        let mut state = self.inner.state.write().await;
        state.sending = false;

        match result {
            Ok(message) => {
                if state.messages.iter().any(|m| m.id == message.id) {
                    // The live echo beat the REST response and already
                    // reconciled; the placeholder is now redundant.
                    state.messages.retain(|m| m.id != placeholder_id);
                } else if let Some(slot) =
                    state.messages.iter_mut().find(|m| m.id == placeholder_id)
                {
                    *slot = message.clone();
                } else {
                    state.messages.push(message.clone());
                }
                Ok(message)
            }
            Err(e) => {
                if let Some(slot) = state.messages.iter_mut().find(|m| m.id == placeholder_id) {
                    if slot.status.can_transition_to(MessageStatus::Failed) {
                        slot.status = MessageStatus::Failed;
                    }
                }
                Err(e)
            }
        }
    }

    /// Idempotent insert for transport-pushed messages. A duplicate id is a
    /// no-op; an echo of our own send replaces the oldest matching `Pending`
    /// placeholder in place; anything else appends to the tail.
    pub async fn add_message(&self, message: Message) {
        let mut state = self.inner.state.write().await;

        if state.messages.iter().any(|m| m.id == message.id) {
            debug!("duplicate message {} ignored", message.id);
            return;
        }

        if message.sender.id == self.inner.current_user.id {
            if let Some(slot) = state.messages.iter_mut().find(|m| {
                m.status == MessageStatus::Pending
                    && m.sender.id == message.sender.id
                    && m.content == message.content
            }) {
                *slot = message;
                return;
            }
        }

        state.messages.push(message);
    }

    /// Merge a partial update into the matching message. Status changes
    /// respect the delivery ladder; a stale or backward update is dropped.
    /// Unknown ids are a no-op.
    pub async fn update_message(&self, id: Uuid, updates: MessageUpdate) {
        let mut state = self.inner.state.write().await;
        let Some(message) = state.messages.iter_mut().find(|m| m.id == id) else {
            return;
        };

        if let Some(content) = updates.content {
            message.content = content;
        }
        if let Some(status) = updates.status {
            if message.status.can_transition_to(status) {
                message.status = status;
            } else {
                debug!(
                    "dropping status update {:?} -> {:?} for message {}",
                    message.status, status, id
                );
            }
        }
        if let Some(reactions) = updates.reactions {
            message.reactions = reactions;
        }
    }

    /// Local removal — the `message_deleted` event path. The server already
    /// deleted the message, so no REST call is made.
    pub async fn remove_message(&self, id: Uuid) {
        let mut state = self.inner.state.write().await;
        state.messages.retain(|m| m.id != id);
    }

    /// Explicit delete: REST first, local removal only on success. On
    /// failure the message stays and the error propagates.
    pub async fn delete_message(&self, id: Uuid) -> Result<(), ApiError> {
        self.inner.api.delete_message(id).await?;
        self.remove_message(id).await;
        Ok(())
    }

    // -- Read accessors --

    pub async fn messages(&self) -> Vec<Message> {
        self.inner.state.read().await.messages.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.state.read().await.loading
    }

    pub async fn is_loading_more(&self) -> bool {
        self.inner.state.read().await.loading_more
    }

    pub async fn is_sending(&self) -> bool {
        self.inner.state.read().await.sending
    }

    pub async fn has_next_page(&self) -> bool {
        self.inner.state.read().await.has_next_page()
    }

    pub async fn error(&self) -> Option<String> {
        self.inner.state.read().await.error.clone()
    }
}
