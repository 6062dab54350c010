use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

use crate::connection::Connection;

/// Inactivity window after the last keystroke before "stopped typing" is
/// broadcast.
pub const LOCAL_TYPING_TIMEOUT: Duration = Duration::from_millis(2000);

/// Lifetime of a remote "is typing" signal with no follow-up. Bounds the
/// indicator so a dropped "stopped" event cannot wedge it on.
pub const REMOTE_TYPING_EXPIRY: Duration = Duration::from_millis(3000);

/// Typing state for one room: a debounced local broadcast axis and a
/// remote display axis with auto-expiry.
///
/// Each axis has at most one scheduled timer. Arming a timer aborts the
/// previous task and bumps an epoch the task re-checks before acting, so an
/// already-running stale timer can never fire a duplicate transition.
#[derive(Clone)]
pub struct TypingIndicator {
    inner: Arc<TypingInner>,
}

struct TypingInner {
    connection: Arc<dyn Connection>,
    state: Mutex<TypingState>,
}

#[derive(Default)]
struct TypingState {
    local_typing: bool,
    local_epoch: u64,
    local_timer: Option<JoinHandle<()>>,
    remote_typing: bool,
    remote_epoch: u64,
    remote_timer: Option<JoinHandle<()>>,
}

impl TypingIndicator {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            inner: Arc::new(TypingInner {
                connection,
                state: Mutex::new(TypingState::default()),
            }),
        }
    }

    /// A local keystroke. Broadcasts "started typing" only on the
    /// idle-to-typing edge; every call restarts the inactivity timer.
    pub fn handle_typing_start(&self) {
        let started = {
            let mut state = self.inner.state.lock().expect("typing lock poisoned");
            let started = !state.local_typing;
            state.local_typing = true;
            Self::arm_local_timer(&self.inner, &mut state);
            started
        };
        if started {
            self.inner.connection.send_typing(true);
        }
    }

    /// Explicit return to idle (e.g. the message was sent). Cancels the
    /// pending timer; broadcasts "stopped" only if we were typing.
    pub fn handle_typing_stop(&self) {
        let stopped = {
            let mut state = self.inner.state.lock().expect("typing lock poisoned");
            if let Some(timer) = state.local_timer.take() {
                timer.abort();
            }
            state.local_epoch += 1;
            let stopped = state.local_typing;
            state.local_typing = false;
            stopped
        };
        if stopped {
            self.inner.connection.send_typing(false);
        }
    }

    /// Inbound `typing_indicator` signal. `true` (re)starts the expiry
    /// window; `false` clears immediately.
    pub fn set_remote_typing(&self, is_typing: bool) {
        let mut state = self.inner.state.lock().expect("typing lock poisoned");
        if let Some(timer) = state.remote_timer.take() {
            timer.abort();
        }
        state.remote_epoch += 1;
        state.remote_typing = is_typing;
        if is_typing {
            Self::arm_remote_timer(&self.inner, &mut state);
        }
    }

    /// Cancel both timers without broadcasting. Session teardown path.
    pub fn reset(&self) {
        let mut state = self.inner.state.lock().expect("typing lock poisoned");
        if let Some(timer) = state.local_timer.take() {
            timer.abort();
        }
        if let Some(timer) = state.remote_timer.take() {
            timer.abort();
        }
        state.local_epoch += 1;
        state.remote_epoch += 1;
        state.local_typing = false;
        state.remote_typing = false;
    }

    pub fn is_typing(&self) -> bool {
        self.inner.state.lock().expect("typing lock poisoned").local_typing
    }

    pub fn other_user_typing(&self) -> bool {
        self.inner
            .state
            .lock()
            .expect("typing lock poisoned")
            .remote_typing
    }

    fn arm_local_timer(inner: &Arc<TypingInner>, state: &mut TypingState) {
        if let Some(timer) = state.local_timer.take() {
            timer.abort();
        }
        state.local_epoch += 1;
        let epoch = state.local_epoch;

        let inner = Arc::clone(inner);
        state.local_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(LOCAL_TYPING_TIMEOUT).await;
            let expired = {
                let mut state = inner.state.lock().expect("typing lock poisoned");
                if state.local_epoch != epoch || !state.local_typing {
                    false
                } else {
                    state.local_typing = false;
                    state.local_timer = None;
                    true
                }
            };
            if expired {
                trace!("local typing debounce expired");
                inner.connection.send_typing(false);
            }
        }));
    }

    fn arm_remote_timer(inner: &Arc<TypingInner>, state: &mut TypingState) {
        let epoch = state.remote_epoch;

        let inner = Arc::clone(inner);
        state.remote_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(REMOTE_TYPING_EXPIRY).await;
            let mut state = inner.state.lock().expect("typing lock poisoned");
            if state.remote_epoch == epoch && state.remote_typing {
                trace!("remote typing indicator expired");
                state.remote_typing = false;
                state.remote_timer = None;
            }
        }));
    }
}
