//! Error types for the map render coordinator.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MapError>;

#[derive(Error, Debug)]
pub enum MapError {
    /// Volume corner ordering violated on one axis.
    #[error("invalid volume: {axis} min {min} > max {max}")]
    InvalidVolume { axis: char, min: i32, max: i32 },

    /// Volume covers more tiles than one request may queue.
    #[error("volume covers {tiles} tiles, limit is {limit}")]
    VolumeTooLarge { tiles: u64, limit: u64 },

    #[error("unknown world: {0}")]
    UnknownWorld(String),

    /// Two corners of one volume named different worlds.
    #[error("corners are in different worlds: {first} and {second}")]
    WorldMismatch { first: String, second: String },

    #[error("render of tile {tile} failed: {reason}")]
    RenderFailure { tile: String, reason: String },

    /// The web publishing channel is unavailable.
    #[error("web relay failed: {0}")]
    RelayFailure(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
