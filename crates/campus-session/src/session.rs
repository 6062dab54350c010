use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use campus_types::{ConnectionEvent, Message, MessageType, OutgoingAttachment, User};

use crate::api::{ApiError, ChatApi};
use crate::connection::Connection;
use crate::store::MessageStore;
use crate::typing::TypingIndicator;

/// Explicit identity for the engine: which user this process is acting as.
/// Passed at construction so several simulated users can coexist in one
/// test process.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub current_user: User,
}

/// Per-room coordinator. Owns the room's `MessageStore` and
/// `TypingIndicator`, pumps the live transport's events into them, and
/// exposes one blended send path: live transport first, REST fallback.
///
/// The event subscription is a scoped resource: one receiver, one pump
/// task, released exactly once by `close` (also run from `Drop`).
pub struct ChatSession {
    room_id: Uuid,
    connection: Arc<dyn Connection>,
    store: MessageStore,
    typing: TypingIndicator,
    pump: Option<JoinHandle<()>>,
}

impl ChatSession {
    /// Activate a session: subscribe to the room's event stream, start the
    /// pump, and load the first history page. Load failures surface through
    /// the store's `error()`; `open` itself does not fail.
    pub async fn open(
        ctx: SessionContext,
        room_id: Uuid,
        api: Arc<dyn ChatApi>,
        connection: Arc<dyn Connection>,
    ) -> Self {
        let store = MessageStore::new(room_id, ctx.current_user.clone(), api);
        let typing = TypingIndicator::new(Arc::clone(&connection));

        // Subscribe before the initial load so nothing delivered while the
        // first page is in flight is missed; dedup-by-id absorbs overlap.
        let events = connection.subscribe();
        let pump = tokio::spawn(run_event_pump(events, store.clone(), typing.clone()));

        info!("chat session open for room {}", room_id);
        store.load_messages(1).await;

        Self {
            room_id,
            connection,
            store,
            typing,
            pump: Some(pump),
        }
    }

    pub fn room_id(&self) -> Uuid {
        self.room_id
    }

    /// Send a message. Blank content with no attachment is a silent no-op.
    /// Text-only sends try the live transport first; when it accepts, the
    /// canonical message arrives back as a `chat_message` event and
    /// reconciles the staged placeholder. Attachment sends, and any send
    /// the transport declines, go through REST.
    pub async fn send_message(
        &self,
        content: &str,
        message_type: MessageType,
        attachment: Option<OutgoingAttachment>,
    ) -> Result<Option<Message>, ApiError> {
        if content.trim().is_empty() && attachment.is_none() {
            return Ok(None);
        }

        // Sending is an explicit end of local typing.
        self.typing.handle_typing_stop();

        let placeholder = self.store.add_pending_message(content, message_type).await;

        if attachment.is_none() && self.connection.send(content) {
            debug!("message accepted by live transport for room {}", self.room_id);
            return Ok(Some(placeholder));
        }

        self.store
            .send_pending(placeholder.id, content, message_type, attachment)
            .await
            .map(Some)
    }

    pub async fn load_more_messages(&self) {
        self.store.load_more_messages().await;
    }

    pub async fn delete_message(&self, id: Uuid) -> Result<(), ApiError> {
        self.store.delete_message(id).await
    }

    pub fn handle_typing_start(&self) {
        self.typing.handle_typing_start();
    }

    pub fn handle_typing_stop(&self) {
        self.typing.handle_typing_stop();
    }

    /// The room's message store, for list rendering and direct queries.
    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn typing(&self) -> &TypingIndicator {
        &self.typing
    }

    // -- Connection state pass-through, unmodified --

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn is_connecting(&self) -> bool {
        self.connection.is_connecting()
    }

    pub fn connection_error(&self) -> Option<String> {
        self.connection.connection_error()
    }

    pub fn reconnect_attempt(&self) -> u32 {
        self.connection.reconnect_attempt()
    }

    /// Deactivate: stop the event pump (dropping the one subscription) and
    /// cancel any pending typing timers. Idempotent.
    pub fn close(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
            self.typing.reset();
            info!("chat session closed for room {}", self.room_id);
        }
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Dispatch inbound events to the room's components until the stream
/// closes or the session is torn down.
async fn run_event_pump(
    mut events: broadcast::Receiver<ConnectionEvent>,
    store: MessageStore,
    typing: TypingIndicator,
) {
    loop {
        match events.recv().await {
            Ok(ConnectionEvent::ChatMessage { message }) => {
                store.add_message(message).await;
            }
            Ok(ConnectionEvent::TypingIndicator { is_typing }) => {
                typing.set_remote_typing(is_typing);
            }
            Ok(ConnectionEvent::MessageUpdated { message_id, updates }) => {
                store.update_message(message_id, updates).await;
            }
            Ok(ConnectionEvent::MessageDeleted { message_id }) => {
                store.remove_message(message_id).await;
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("event receiver lagged by {} events", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
