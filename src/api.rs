//! The public map capability interface other plugins program against.
//!
//! ## Operations
//!
//! | Operation                        | Result                         |
//! |----------------------------------|--------------------------------|
//! | `trigger_render_of_volume`       | tiles queued, or invalid volume |
//! | `trigger_render_of_block`        | tiles queued                   |
//! | `set/get_pause_full_radius_renders` | full-render gate            |
//! | `set/get_pause_update_renders`   | update-render gate             |
//! | `set/get_player_visibility`      | default visible                |
//! | `post_player_message_to_web`     | skipped for hidden players     |
//! | `post_player_join_quit_to_web`   | skipped for hidden players     |
//! | `send_broadcast_to_web`          | `false` if the web is down     |
//! | `marker_api` / `marker_api_initialized` | marker capability       |
//! | `core_version`                   | `major.minor.patch-build`      |
//!
//! Locations are plain world id + block coordinates. Hosts with native
//! location handles go through [`crate::host::HostAdapter`].

use crate::error::Result;
use crate::markers::MarkerApi;
use crate::types::BlockPos;
use std::sync::Arc;

pub trait MapApi: Send + Sync {
    /// Queue every tile intersecting the inclusive box `min..=max`.
    ///
    /// Returns the number of tiles covered; all of them are pending afterwards.
    /// Unknown worlds queue nothing and return 0.
    fn trigger_render_of_volume(&self, world: &str, min: BlockPos, max: BlockPos) -> Result<usize>;

    fn trigger_render_of_block(&self, world: &str, x: i32, y: i32, z: i32) -> usize;

    fn set_pause_full_radius_renders(&self, paused: bool);
    fn get_pause_full_radius_renders(&self) -> bool;

    fn set_pause_update_renders(&self, paused: bool);
    fn get_pause_update_renders(&self) -> bool;

    fn set_player_visibility(&self, player_id: &str, visible: bool);
    fn get_player_visibility(&self, player_id: &str) -> bool;

    fn post_player_message_to_web(&self, player_id: &str, display_name: &str, message: &str);
    fn post_player_join_quit_to_web(&self, player_id: &str, display_name: &str, is_join: bool);

    /// `sender` labels the message ("Message from <plugin>:"); `None` for no label.
    fn send_broadcast_to_web(&self, sender: Option<&str>, message: &str) -> bool;

    fn marker_api(&self) -> Option<Arc<dyn MarkerApi>>;
    fn marker_api_initialized(&self) -> bool;

    fn core_version(&self) -> String;
}
