//! Transient notifications with a severity tag and automatic expiry.

use shared::{Toast, ToastSeverity};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct ToastState {
    next_id: u64,
    entries: Vec<(Toast, Instant)>,
}

impl ToastState {
    fn drop_expired(&mut self, now: Instant) {
        let before = self.entries.len();
        self.entries.retain(|(_, expires)| *expires > now);
        if self.entries.len() != before {
            debug!("Dismissed {} expired toasts", before - self.entries.len());
        }
    }
}

/// Queue of active toasts; each entry expires `ttl` after it was pushed
#[derive(Debug, Clone)]
pub struct ToastQueue {
    ttl: Duration,
    state: Arc<Mutex<ToastState>>,
}

impl ToastQueue {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, state: Arc::new(Mutex::new(ToastState::default())) }
    }

    pub fn push(&self, message: impl Into<String>, severity: ToastSeverity) -> Toast {
        self.push_at(message, severity, Instant::now())
    }

    pub fn push_at(&self, message: impl Into<String>, severity: ToastSeverity, now: Instant) -> Toast {
        let message = message.into();
        match severity {
            ToastSeverity::Danger => warn!("🔔 Toast [{:?}]: {}", severity, message),
            _ => info!("🔔 Toast [{:?}]: {}", severity, message),
        }

        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.drop_expired(now);
        state.next_id += 1;
        let toast = Toast { id: state.next_id, message, severity };
        state.entries.push((toast.clone(), now + self.ttl));
        toast
    }

    /// Toasts still visible now, oldest first
    pub fn active(&self) -> Vec<Toast> {
        self.active_at(Instant::now())
    }

    pub fn active_at(&self, now: Instant) -> Vec<Toast> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.drop_expired(now);
        state.entries.iter().map(|(toast, _)| toast.clone()).collect()
    }

    pub fn dismiss(&self, id: u64) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.entries.retain(|(toast, _)| toast.id != id);
    }
}
