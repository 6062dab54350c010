use tokio::sync::broadcast;

use campus_types::ConnectionEvent;

/// Live transport contract for one room (the Connection Manager).
///
/// Reconnection and backoff happen behind this interface; the engine only
/// reads the resulting state flags. `subscribe` hands out an independent
/// receiver onto the transport's event stream — a session holds exactly one
/// and drops it on close.
pub trait Connection: Send + Sync {
    fn is_connected(&self) -> bool;

    fn is_connecting(&self) -> bool;

    fn connection_error(&self) -> Option<String>;

    fn reconnect_attempt(&self) -> u32;

    /// Attempt to push `content` over the live socket. Returns true if the
    /// transport accepted it for delivery; the canonical message then comes
    /// back asynchronously as a `chat_message` event.
    fn send(&self, content: &str) -> bool;

    fn send_typing(&self, is_typing: bool);

    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent>;
}
