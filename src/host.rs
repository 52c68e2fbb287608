//! Host adapter: native location/player handles onto [`MapApi`].

use crate::api::MapApi;
use crate::error::{MapError, Result};
use crate::types::{BlockPos, WorldVolume};
use std::sync::Arc;

/// A position handle as the host game server exposes it.
pub trait HostLocation {
    fn world_id(&self) -> &str;
    fn block_pos(&self) -> BlockPos;
}

/// A player handle as the host game server exposes it.
pub trait HostPlayer {
    fn id(&self) -> &str;
    fn display_name(&self) -> &str;
}

/// Wraps a [`MapApi`] with host-handle convenience calls.
pub struct HostAdapter<A: ?Sized> {
    /// Version of the plugin packaging, as reported by the host's plugin loader.
    plugin_version: Option<String>,
    api: Arc<A>,
}

impl<A: MapApi + ?Sized> HostAdapter<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            plugin_version: None,
            api,
        }
    }

    pub fn with_plugin_version(mut self, version: impl Into<String>) -> Self {
        self.plugin_version = Some(version.into());
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Plugin version supplied by the host, or the core version when the host
    /// gave none.
    pub fn plugin_version(&self) -> String {
        match &self.plugin_version {
            Some(version) => version.clone(),
            None => self.api.core_version(),
        }
    }

    /// Queue the cuboid with `l0` and `l1` on opposite corners, or just the
    /// block at `l0` when there is no second corner.
    pub fn trigger_render_between<L: HostLocation>(&self, l0: &L, l1: Option<&L>) -> Result<usize> {
        let volume = match l1 {
            None => WorldVolume::block(l0.world_id(), l0.block_pos()),
            Some(l1) => {
                if l0.world_id() != l1.world_id() {
                    return Err(MapError::WorldMismatch {
                        first: l0.world_id().to_string(),
                        second: l1.world_id().to_string(),
                    });
                }
                WorldVolume::from_corners(l0.world_id(), l0.block_pos(), l1.block_pos())
            }
        };
        self.api
            .trigger_render_of_volume(&volume.world, volume.min, volume.max)
    }

    pub fn set_player_visibility<P: HostPlayer>(&self, player: &P, visible: bool) {
        self.api.set_player_visibility(player.id(), visible);
    }

    pub fn get_player_visibility<P: HostPlayer>(&self, player: &P) -> bool {
        self.api.get_player_visibility(player.id())
    }

    pub fn post_player_message_to_web<P: HostPlayer>(&self, player: &P, message: &str) {
        self.api
            .post_player_message_to_web(player.id(), player.display_name(), message);
    }

    pub fn post_player_join_quit_to_web<P: HostPlayer>(&self, player: &P, is_join: bool) {
        self.api
            .post_player_join_quit_to_web(player.id(), player.display_name(), is_join);
    }
}
