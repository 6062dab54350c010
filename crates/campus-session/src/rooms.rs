use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use campus_types::{ChatRoom, Message};

use crate::api::{ApiError, ChatApi};

/// The current user's conversation list: load/refresh, idempotent room
/// creation, and unread accounting. This is the only state shared across
/// rooms, and only these operations mutate it.
#[derive(Clone)]
pub struct RoomDirectory {
    inner: Arc<DirectoryInner>,
}

struct DirectoryInner {
    api: Arc<dyn ChatApi>,
    state: RwLock<DirectoryState>,
}

#[derive(Default)]
struct DirectoryState {
    rooms: Vec<ChatRoom>,
    loading: bool,
    refreshing: bool,
    error: Option<String>,
}

impl RoomDirectory {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self {
            inner: Arc::new(DirectoryInner {
                api,
                state: RwLock::new(DirectoryState::default()),
            }),
        }
    }

    /// Initial fetch of the full room list, behind the `loading` flag.
    pub async fn load_chat_rooms(&self) {
        self.fetch(false).await;
    }

    /// Same fetch behind the `refreshing` flag, so a pull-to-refresh UI can
    /// avoid the full-screen spinner.
    pub async fn refresh_chat_rooms(&self) {
        self.fetch(true).await;
    }

    async fn fetch(&self, refresh: bool) {
        {
            let mut state = self.inner.state.write().await;
            if refresh {
                state.refreshing = true;
            } else {
                state.loading = true;
            }
            state.error = None;
        }

        let result = self.inner.api.get_chat_rooms().await;

        let mut state = self.inner.state.write().await;
        state.loading = false;
        state.refreshing = false;
        match result {
            Ok(rooms) => {
                info!("loaded {} chat rooms", rooms.len());
                state.rooms = rooms;
            }
            Err(e) => {
                // existing list stays usable
                state.error = Some(e.to_string());
            }
        }
    }

    /// Resolve the room for a counterpart, creating it server-side if
    /// needed. The collaborator guarantees one room per user pair, so a
    /// locally known id leaves the list untouched; a new room is prepended.
    pub async fn create_or_get_room(&self, user_id: Uuid) -> Result<ChatRoom, ApiError> {
        let room = self.inner.api.get_or_create_chat_room(user_id).await?;

        let mut state = self.inner.state.write().await;
        if !state.rooms.iter().any(|r| r.id == room.id) {
            state.rooms.insert(0, room.clone());
        }
        Ok(room)
    }

    /// Record an inbound message for a room that is not currently open:
    /// update the denormalized `last_message` and bump `unread_count` by
    /// exactly one.
    pub async fn update_room_last_message(&self, room_id: Uuid, message: Message) {
        let mut state = self.inner.state.write().await;
        if let Some(room) = state.rooms.iter_mut().find(|r| r.id == room_id) {
            room.last_message = Some(message);
            room.unread_count += 1;
        }
    }

    /// The room became the active one; clear its unread counter.
    pub async fn mark_room_as_read(&self, room_id: Uuid) {
        let mut state = self.inner.state.write().await;
        if let Some(room) = state.rooms.iter_mut().find(|r| r.id == room_id) {
            room.unread_count = 0;
        }
    }

    // -- Read accessors --

    pub async fn rooms(&self) -> Vec<ChatRoom> {
        self.inner.state.read().await.rooms.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.state.read().await.loading
    }

    pub async fn is_refreshing(&self) -> bool {
        self.inner.state.read().await.refreshing
    }

    pub async fn error(&self) -> Option<String> {
        self.inner.state.read().await.error.clone()
    }
}
