use std::thread::JoinHandle;

use crate::capture::CancelToken;

/// Handle to one background capture run. Cancelling lets in-flight
/// gateway calls finish but keeps their results away from the store.
pub struct TaskHandle {
    cancel_token: CancelToken,
    join_handle: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub fn new(cancel_token: CancelToken, join_handle: JoinHandle<()>) -> Self {
        Self { cancel_token, join_handle: Some(join_handle) }
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle.as_ref().map(|h| h.is_finished()).unwrap_or(true)
    }
}
