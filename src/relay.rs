//! Web relay – forwards chat, join/quit and broadcast text to the web front-end.

use crate::chat::WebChatEvent;
use crate::error::{MapError, Result};
use crate::protocol::{
    subjects, PlayerChat, PlayerJoinQuit, WebBroadcast, WebChatRelay, WebEvent,
};
use crate::visibility::PlayerVisibility;
use bytes::Bytes;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

// ---------------------------------------------------------------------------
// Channel seam
// ---------------------------------------------------------------------------

/// Outbound publishing channel to the web front-end.
pub trait WebChannel: Send + Sync {
    fn publish(&self, subject: &str, payload: Bytes) -> Result<()>;
}

/// One published message as seen by a web subscriber.
#[derive(Debug, Clone)]
pub struct WebFrame {
    pub subject: String,
    pub payload: Bytes,
}

/// [`WebChannel`] fanning out to in-process subscribers (web sockets, SSE
/// streams, …). Publishing with nobody subscribed counts as the channel
/// being down.
pub struct BroadcastWebChannel {
    sender: broadcast::Sender<WebFrame>,
}

impl BroadcastWebChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WebFrame> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl WebChannel for BroadcastWebChannel {
    fn publish(&self, subject: &str, payload: Bytes) -> Result<()> {
        self.sender
            .send(WebFrame {
                subject: subject.to_string(),
                payload,
            })
            .map(|_| ())
            .map_err(|_| MapError::RelayFailure("no web subscribers connected".into()))
    }
}

/// Log every frame a subscriber receives until the channel closes.
///
/// A subscriber that falls behind skips the overwritten frames with a
/// warning and keeps going. Returns the number of frames logged.
pub async fn log_web_frames(mut rx: broadcast::Receiver<WebFrame>) -> usize {
    let mut logged = 0;
    loop {
        match rx.recv().await {
            Ok(frame) => {
                info!(
                    "web <- {} {}",
                    frame.subject,
                    String::from_utf8_lossy(&frame.payload)
                );
                logged += 1;
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Web frame logger lagged, skipped {} frames", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
    logged
}

// ---------------------------------------------------------------------------
// Relay
// ---------------------------------------------------------------------------

/// Applies visibility rules and publishes [`WebEvent`]s on a [`WebChannel`].
pub struct WebRelay {
    channel: Arc<dyn WebChannel>,
    visibility: Arc<PlayerVisibility>,
    seq: AtomicU64,
}

impl WebRelay {
    pub fn new(channel: Arc<dyn WebChannel>, visibility: Arc<PlayerVisibility>) -> Self {
        Self {
            channel,
            visibility,
            seq: AtomicU64::new(0),
        }
    }

    /// Relay an in-game chat line. Hidden players are not relayed; failures
    /// are logged only.
    pub fn post_player_message(&self, player_id: &str, display_name: &str, message: &str) {
        if !self.visibility.get(player_id) {
            debug!("Not relaying chat from hidden player '{}'", player_id);
            return;
        }

        let chat = PlayerChat {
            player_id: player_id.to_string(),
            display_name: display_name.to_string(),
            message: message.to_string(),
        };
        if let Err(e) = self.publish(subjects::PLAYER_CHAT, chat) {
            warn!("Failed to relay chat from '{}': {}", player_id, e);
        }
    }

    pub fn post_player_join_quit(&self, player_id: &str, display_name: &str, is_join: bool) {
        if !self.visibility.get(player_id) {
            debug!("Not relaying join/quit of hidden player '{}'", player_id);
            return;
        }

        let subject = if is_join {
            subjects::PLAYER_JOIN
        } else {
            subjects::PLAYER_QUIT
        };
        let event = PlayerJoinQuit {
            player_id: player_id.to_string(),
            display_name: display_name.to_string(),
            joined: is_join,
        };
        if let Err(e) = self.publish(subject, event) {
            warn!("Failed to relay join/quit of '{}': {}", player_id, e);
        }
    }

    /// Send a message to every web user. Returns `false` if the channel
    /// could not take it.
    pub fn send_broadcast(&self, sender: Option<&str>, message: &str) -> bool {
        let broadcast = WebBroadcast {
            sender: sender.map(str::to_string),
            message: message.to_string(),
        };
        match self.publish(subjects::BROADCAST, broadcast) {
            Ok(()) => true,
            Err(e) => {
                warn!("Broadcast to web failed: {}", e);
                false
            }
        }
    }

    /// Default delivery for web chat no listener handled or cancelled.
    pub fn relay_web_chat(&self, event: &WebChatEvent) {
        let relay = WebChatRelay {
            source: event.source().to_string(),
            name: event.name().to_string(),
            message: event.message().to_string(),
        };
        if let Err(e) = self.publish(subjects::WEB_CHAT, relay) {
            warn!("Failed to relay web chat from '{}': {}", event.name(), e);
        }
    }

    fn publish<T: Serialize>(&self, subject: &str, payload: T) -> Result<()> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let event = WebEvent::new(seq, now_ms(), payload);
        let bytes = serde_json::to_vec(&event)?;
        self.channel.publish(subject, Bytes::from(bytes))
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
