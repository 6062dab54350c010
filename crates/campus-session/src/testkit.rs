/// Hand-rolled collaborator fakes shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use campus_types::{
    ChatRoom, ConnectionEvent, Message, MessagePage, MessageStatus, MessageType,
    OutgoingAttachment, User,
};

use crate::api::{ApiError, ChatApi};
use crate::connection::Connection;

pub fn user(name: &str) -> User {
    User {
        id: Uuid::new_v4(),
        username: name.to_string(),
    }
}

/// A sent message from `sender`, `seq` seconds after the test's base time.
pub fn message(room_id: Uuid, sender: &User, content: &str, seq: i64) -> Message {
    Message {
        id: Uuid::new_v4(),
        room_id,
        sender: sender.clone(),
        content: content.to_string(),
        message_type: MessageType::Text,
        status: MessageStatus::Sent,
        created_at: Utc::now() + Duration::seconds(seq),
        reply_to: None,
        reactions: Vec::new(),
    }
}

/// Scripted REST collaborator. `user` is the authenticated user the server
/// would attribute sends to.
pub struct FakeApi {
    pub user: User,
    pub pages: Mutex<HashMap<u32, MessagePage>>,
    pub rooms: Mutex<Vec<ChatRoom>>,
    rooms_by_user: Mutex<HashMap<Uuid, ChatRoom>>,

    pub fail_loads: AtomicBool,
    pub fail_sends: AtomicBool,
    pub fail_deletes: AtomicBool,

    pub load_calls: AtomicU32,
    pub sent: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<Uuid>>,
    pub mark_read_calls: Mutex<Vec<Uuid>>,
}

impl FakeApi {
    pub fn new(user: User) -> Arc<Self> {
        Arc::new(Self {
            user,
            pages: Mutex::new(HashMap::new()),
            rooms: Mutex::new(Vec::new()),
            rooms_by_user: Mutex::new(HashMap::new()),
            fail_loads: AtomicBool::new(false),
            fail_sends: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            load_calls: AtomicU32::new(0),
            sent: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            mark_read_calls: Mutex::new(Vec::new()),
        })
    }

    pub fn put_page(&self, page: u32, page_data: MessagePage) {
        self.pages.lock().unwrap().insert(page, page_data);
    }
}

#[async_trait]
impl ChatApi for FakeApi {
    async fn get_chat_messages(&self, _room_id: Uuid, page: u32) -> Result<MessagePage, ApiError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(ApiError::Request("connection reset".to_string()));
        }
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(&page)
            .cloned()
            .unwrap_or(MessagePage {
                results: Vec::new(),
                count: 0,
                page_size: 20,
            }))
    }

    async fn send_message(
        &self,
        room_id: Uuid,
        content: &str,
        message_type: MessageType,
        _attachment: Option<OutgoingAttachment>,
    ) -> Result<Message, ApiError> {
        self.sent.lock().unwrap().push(content.to_string());
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 500,
                message: "send rejected".to_string(),
            });
        }
        Ok(Message {
            id: Uuid::new_v4(),
            room_id,
            sender: self.user.clone(),
            content: content.to_string(),
            message_type,
            status: MessageStatus::Sent,
            created_at: Utc::now(),
            reply_to: None,
            reactions: Vec::new(),
        })
    }

    async fn mark_messages_read(&self, room_id: Uuid) -> Result<(), ApiError> {
        self.mark_read_calls.lock().unwrap().push(room_id);
        Ok(())
    }

    async fn delete_message(&self, message_id: Uuid) -> Result<(), ApiError> {
        self.deleted.lock().unwrap().push(message_id);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 403,
                message: "not the author".to_string(),
            });
        }
        Ok(())
    }

    async fn get_chat_rooms(&self) -> Result<Vec<ChatRoom>, ApiError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(ApiError::Request("connection reset".to_string()));
        }
        Ok(self.rooms.lock().unwrap().clone())
    }

    async fn get_or_create_chat_room(&self, other_user_id: Uuid) -> Result<ChatRoom, ApiError> {
        let mut by_user = self.rooms_by_user.lock().unwrap();
        let room = by_user.entry(other_user_id).or_insert_with(|| ChatRoom {
            id: Uuid::new_v4(),
            other_user: User {
                id: other_user_id,
                username: "counterpart".to_string(),
            },
            last_message: None,
            unread_count: 0,
            created_at: Utc::now(),
        });
        Ok(room.clone())
    }
}

/// Scripted live transport with a real broadcast stream behind `subscribe`.
pub struct FakeConnection {
    pub connected: AtomicBool,
    pub accept_sends: AtomicBool,
    pub sent: Mutex<Vec<String>>,
    pub typing_sent: Mutex<Vec<bool>>,
    events: broadcast::Sender<ConnectionEvent>,
}

impl FakeConnection {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            connected: AtomicBool::new(true),
            accept_sends: AtomicBool::new(true),
            sent: Mutex::new(Vec::new()),
            typing_sent: Mutex::new(Vec::new()),
            events,
        })
    }

    /// Push an inbound event to every live subscriber.
    pub fn emit(&self, event: ConnectionEvent) {
        let _ = self.events.send(event);
    }
}

impl Connection for FakeConnection {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn is_connecting(&self) -> bool {
        false
    }

    fn connection_error(&self) -> Option<String> {
        None
    }

    fn reconnect_attempt(&self) -> u32 {
        0
    }

    fn send(&self, content: &str) -> bool {
        self.sent.lock().unwrap().push(content.to_string());
        self.accept_sends.load(Ordering::SeqCst)
    }

    fn send_typing(&self, is_typing: bool) {
        self.typing_sent.lock().unwrap().push(is_typing);
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }
}
