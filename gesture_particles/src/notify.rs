//! User-facing alerts.

use std::sync::{Arc, Mutex, PoisonError};

/// A blocking, user-facing alert surface.
pub trait Notifier {
    fn alert(&self, message: &str);
}

/// Alerts go to the log only (headless runs).
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        log::warn!("ALERT: {message}");
    }
}

/// Alert held until the user dismisses it; the window draws it as a modal
/// and swallows other input while it is up.
#[derive(Clone, Default)]
pub struct AlertSlot {
    message: Arc<Mutex<Option<String>>>,
}

impl AlertSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<String> {
        self.message.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_showing(&self) -> bool {
        self.current().is_some()
    }

    pub fn dismiss(&self) {
        *self.message.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Notifier for AlertSlot {
    fn alert(&self, message: &str) {
        log::warn!("ALERT: {message}");
        *self.message.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.to_string());
    }
}
