//! Single global modal slot. Opening a modal replaces whatever is open.

use shared::{ModalAction, ModalView};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ModalOptions {
    pub cancel_label: String,
    pub show_cancel: bool,
}

impl Default for ModalOptions {
    fn default() -> Self {
        Self { cancel_label: "Cancel".to_string(), show_cancel: true }
    }
}

impl ModalOptions {
    /// Only a confirm button, e.g. for announcements
    pub fn without_cancel() -> Self {
        Self { show_cancel: false, ..Self::default() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModalSlot {
    current: Arc<Mutex<Option<ModalView>>>,
}

impl ModalSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
        confirm_label: impl Into<String>,
        on_confirm: ModalAction,
        options: ModalOptions,
    ) -> ModalView {
        let view = ModalView {
            title: title.into(),
            body: body.into(),
            confirm_label: confirm_label.into(),
            cancel_label: options.cancel_label,
            show_cancel: options.show_cancel,
            on_confirm,
        };

        let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = current.replace(view.clone()) {
            debug!("Modal '{}' replaced by '{}'", previous.title, view.title);
        }
        info!("🪟 Opened modal: {}", view.title);
        view
    }

    pub fn current(&self) -> Option<ModalView> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    /// Close the modal, returning what was open
    pub fn close(&self) -> Option<ModalView> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).take()
    }
}
