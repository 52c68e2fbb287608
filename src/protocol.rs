//! `web.*` wire protocol.
//!
//! This module owns **every message that crosses the boundary** between the
//! coordinator and the web front-end.
//!
//! ## Channel namespaces
//!
//! | Namespace  | Direction       |
//! |------------|-----------------|
//! | `web.*`    | server → web    |
//! | `web.in.*` | web → server    |
//!
//! Every outbound message is a JSON [`WebEvent`] with snake_case fields.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Common envelope
// ---------------------------------------------------------------------------

/// Every outbound message is wrapped in this envelope.
///
/// `seq` increases by one per published message so the front-end can detect
/// gaps; `timestamp_ms` is wall-clock milliseconds since the Unix epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebEvent<T> {
    pub seq: u64,
    pub timestamp_ms: u64,
    pub payload: T,
}

impl<T> WebEvent<T> {
    pub fn new(seq: u64, timestamp_ms: u64, payload: T) -> Self {
        Self {
            seq,
            timestamp_ms,
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Player events  (subjects: web.chat.player, web.player.*)
// ---------------------------------------------------------------------------

/// Chat line typed in-game by a player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerChat {
    pub player_id: String,
    pub display_name: String,
    pub message: String,
}

/// A player joined or left the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerJoinQuit {
    pub player_id: String,
    pub display_name: String,
    pub joined: bool,
}

// ---------------------------------------------------------------------------
// Broadcasts  (subject: web.broadcast)
// ---------------------------------------------------------------------------

/// Generic message to every web user.
///
/// With no `sender` the front-end shows the text without a "from" notice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebBroadcast {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Web chat  (inbound web.in.chat, echoed on web.chat.web)
// ---------------------------------------------------------------------------

/// Chat line typed by a web user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebChatRequest {
    /// Where the message came from (e.g. "web", "plugin").
    pub source: String,
    pub name: String,
    pub message: String,
}

/// Web chat line after listeners let it through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebChatRelay {
    pub source: String,
    pub name: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Subject helpers
// ---------------------------------------------------------------------------

pub mod subjects {
    pub const PLAYER_CHAT: &str = "web.chat.player";
    pub const WEB_CHAT: &str = "web.chat.web";

    pub const PLAYER_JOIN: &str = "web.player.join";
    pub const PLAYER_QUIT: &str = "web.player.quit";

    pub const BROADCAST: &str = "web.broadcast";

    /// Inbound chat from web users.
    pub const IN_CHAT: &str = "web.in.chat";
}
