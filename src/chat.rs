//! Web-originated chat: immutable event, listener verdicts, and one-pass dispatch.

use log::debug;
use parking_lot::RwLock;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// Chat message received from a web map user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebChatEvent {
    source: String,
    name: String,
    message: String,
}

impl WebChatEvent {
    pub fn new(
        source: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
            message: message.into(),
        }
    }

    /// Build an event from raw web input, truncating the message to
    /// `max_chars`. Blank messages produce no event.
    pub fn from_web_input(source: &str, name: &str, message: &str, max_chars: usize) -> Option<Self> {
        let message = message.trim();
        if message.is_empty() {
            return None;
        }
        let message: String = message.chars().take(max_chars).collect();
        Some(Self::new(source, name, message))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

// ---------------------------------------------------------------------------
// Verdicts / outcome
// ---------------------------------------------------------------------------

/// What a single listener decided about an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerVerdict {
    /// Not interested.
    Ignore,
    /// Listener delivered the message itself; skip the default relay.
    Handled,
    /// Drop the message entirely.
    Cancel,
}

/// Terminal state of an event after one pass through all listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebChatOutcome {
    /// Nobody objected; the default relay runs.
    Delivered,
    SuppressedCancelled,
    SuppressedHandled,
}

pub trait WebChatListener: Send + Sync {
    fn on_web_chat(&self, event: &WebChatEvent) -> ListenerVerdict;
}

impl<F> WebChatListener for F
where
    F: Fn(&WebChatEvent) -> ListenerVerdict + Send + Sync,
{
    fn on_web_chat(&self, event: &WebChatEvent) -> ListenerVerdict {
        self(event)
    }
}

// ---------------------------------------------------------------------------
// Bus
// ---------------------------------------------------------------------------

/// Registered web chat listeners, called in registration order.
#[derive(Default)]
pub struct WebChatBus {
    listeners: RwLock<Vec<Arc<dyn WebChatListener>>>,
}

impl WebChatBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: Arc<dyn WebChatListener>) {
        self.listeners.write().push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Offer `event` to every listener once and fold their verdicts.
    ///
    /// Cancel beats Handled; all listeners see the event either way.
    pub fn dispatch(&self, event: &WebChatEvent) -> WebChatOutcome {
        let listeners: Vec<_> = self.listeners.read().iter().cloned().collect();

        let mut cancelled = false;
        let mut handled = false;
        for listener in listeners {
            match listener.on_web_chat(event) {
                ListenerVerdict::Ignore => {}
                ListenerVerdict::Handled => handled = true,
                ListenerVerdict::Cancel => cancelled = true,
            }
        }

        let outcome = if cancelled {
            WebChatOutcome::SuppressedCancelled
        } else if handled {
            WebChatOutcome::SuppressedHandled
        } else {
            WebChatOutcome::Delivered
        };
        debug!("Web chat from '{}' -> {:?}", event.name(), outcome);
        outcome
    }
}
