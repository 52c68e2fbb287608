//! MapService – invalidation entry point, pause control, visibility and web relay.

use crate::api::MapApi;
use crate::chat::{WebChatBus, WebChatEvent, WebChatOutcome};
use crate::error::{MapError, Result};
use crate::gate::PauseGate;
use crate::mapper::TileMapper;
use crate::markers::{MarkerApi, MarkerSlot};
use crate::queue::RenderQueue;
use crate::relay::{WebChannel, WebRelay};
use crate::types::{BlockPos, CoordinatorConfig, JobClass, MapStats, RenderJob, WorldVolume};
use crate::visibility::PlayerVisibility;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Build label appended to the crate version, set at compile time.
const BUILD_LABEL: &str = match option_env!("MAP_RENDER_BUILD") {
    Some(label) => label,
    None => "0",
};

// ---------------------------------------------------------------------------
// Dispatch counters
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Counters {
    dispatched: AtomicU64,
    failures: AtomicU64,
    dropped: AtomicU64,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub struct MapService {
    config: CoordinatorConfig,
    mapper: TileMapper,
    queue: RenderQueue,
    gate: PauseGate,
    visibility: Arc<PlayerVisibility>,
    relay: WebRelay,
    chat: WebChatBus,
    markers: MarkerSlot,
    counters: Counters,
}

impl MapService {
    pub fn new(config: CoordinatorConfig, channel: Arc<dyn WebChannel>) -> Self {
        let visibility = Arc::new(PlayerVisibility::new(config.default_player_visible));
        Self {
            mapper: TileMapper::new(&config),
            queue: RenderQueue::new(),
            gate: PauseGate::new(),
            relay: WebRelay::new(channel, visibility.clone()),
            visibility,
            chat: WebChatBus::new(),
            markers: MarkerSlot::new(),
            counters: Counters::default(),
            config,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn mapper(&self) -> &TileMapper {
        &self.mapper
    }

    pub fn queue(&self) -> &RenderQueue {
        &self.queue
    }

    pub fn gate(&self) -> &PauseGate {
        &self.gate
    }

    pub fn chat(&self) -> &WebChatBus {
        &self.chat
    }

    pub fn markers(&self) -> &MarkerSlot {
        &self.markers
    }

    // -----------------------------------------------------------------------
    // Invalidation
    // -----------------------------------------------------------------------

    /// Queue the tiles covering `volume` as `class` jobs.
    ///
    /// Returns the number of tiles covered (already pending ones included).
    /// Volumes covering more than `max_tiles_per_request` tiles are rejected
    /// with [`MapError::VolumeTooLarge`] before any tile is built or queued.
    pub fn invalidate(&self, volume: &WorldVolume, class: JobClass) -> Result<usize> {
        if !self.mapper.is_known_world(&volume.world) {
            debug!("Ignoring invalidation of unknown world '{}'", volume.world);
            return Ok(0);
        }

        let count = self.mapper.tile_count(volume);
        let limit = self.config.max_tiles_per_request.max(1);
        if count > limit {
            warn!(
                "Rejecting invalidation of {}: {} tiles exceeds limit {}",
                volume, count, limit
            );
            return Err(MapError::VolumeTooLarge {
                tiles: count,
                limit,
            });
        }

        let tiles = self.mapper.map_volume_to_tiles(volume);
        let added = self.queue.enqueue(&tiles, class);
        debug!(
            "Invalidated {}: {} tiles ({} new) as {}",
            volume,
            tiles.len(),
            added,
            class
        );
        Ok(tiles.len())
    }

    /// Queue a full render of every tile in a bounded world.
    ///
    /// Unbounded worlds cannot be enumerated and queue nothing.
    pub fn queue_full_render(&self, world: &str) -> Result<usize> {
        if !self.mapper.is_known_world(world) {
            return Err(MapError::UnknownWorld(world.to_string()));
        }
        let Some(tiles) = self.mapper.all_tiles(world) else {
            warn!("World '{}' has no bounds; full render not queued", world);
            return Ok(0);
        };
        let added = self.queue.enqueue(&tiles, JobClass::Full);
        info!(
            "Full render of '{}' queued: {} tiles ({} new)",
            world,
            tiles.len(),
            added
        );
        Ok(tiles.len())
    }

    /// Drop pending jobs of one class. Returns how many were removed.
    pub fn cancel_renders(&self, class: JobClass) -> usize {
        let removed = self.queue.clear(class);
        info!("Cancelled {} pending {} renders", removed, class);
        removed
    }

    pub fn drain(&self, class: JobClass, max: usize) -> Vec<RenderJob> {
        self.queue.drain(class, max, &self.gate)
    }

    // -----------------------------------------------------------------------
    // Web chat
    // -----------------------------------------------------------------------

    /// Run inbound web chat through the listeners, then the default relay if
    /// nobody suppressed it. Blank messages are ignored (`None`).
    pub fn handle_web_chat(&self, source: &str, name: &str, message: &str) -> Option<WebChatOutcome> {
        let event = WebChatEvent::from_web_input(
            source,
            name,
            message,
            self.config.max_web_chat_length,
        )?;

        let outcome = self.chat.dispatch(&event);
        if outcome == WebChatOutcome::Delivered {
            self.relay.relay_web_chat(&event);
        }
        Some(outcome)
    }

    // -----------------------------------------------------------------------
    // Stats
    // -----------------------------------------------------------------------

    pub(crate) fn record_dispatched(&self) {
        self.counters.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.counters.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.counters.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> MapStats {
        MapStats {
            pending_full: self.queue.pending(JobClass::Full),
            pending_update: self.queue.pending(JobClass::Update),
            full_paused: self.gate.is_paused(JobClass::Full),
            update_paused: self.gate.is_paused(JobClass::Update),
            tiles_dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            render_failures: self.counters.failures.load(Ordering::Relaxed),
            jobs_dropped: self.counters.dropped.load(Ordering::Relaxed),
            hidden_players: self.visibility.hidden_players().len(),
        }
    }
}

// ---------------------------------------------------------------------------
// MapApi
// ---------------------------------------------------------------------------

impl MapApi for MapService {
    fn trigger_render_of_volume(&self, world: &str, min: BlockPos, max: BlockPos) -> Result<usize> {
        let volume = WorldVolume::new(world, min, max)?;
        self.invalidate(&volume, JobClass::Update)
    }

    fn trigger_render_of_block(&self, world: &str, x: i32, y: i32, z: i32) -> usize {
        let volume = WorldVolume::block(world, BlockPos::new(x, y, z));
        // One block is one tile, which the limit always admits.
        self.invalidate(&volume, JobClass::Update).unwrap_or(0)
    }

    fn set_pause_full_radius_renders(&self, paused: bool) {
        self.gate.set(JobClass::Full, paused);
    }

    fn get_pause_full_radius_renders(&self) -> bool {
        self.gate.is_paused(JobClass::Full)
    }

    fn set_pause_update_renders(&self, paused: bool) {
        self.gate.set(JobClass::Update, paused);
    }

    fn get_pause_update_renders(&self) -> bool {
        self.gate.is_paused(JobClass::Update)
    }

    fn set_player_visibility(&self, player_id: &str, visible: bool) {
        self.visibility.set(player_id, visible);
    }

    fn get_player_visibility(&self, player_id: &str) -> bool {
        self.visibility.get(player_id)
    }

    fn post_player_message_to_web(&self, player_id: &str, display_name: &str, message: &str) {
        self.relay.post_player_message(player_id, display_name, message);
    }

    fn post_player_join_quit_to_web(&self, player_id: &str, display_name: &str, is_join: bool) {
        self.relay.post_player_join_quit(player_id, display_name, is_join);
    }

    fn send_broadcast_to_web(&self, sender: Option<&str>, message: &str) -> bool {
        self.relay.send_broadcast(sender, message)
    }

    fn marker_api(&self) -> Option<Arc<dyn MarkerApi>> {
        self.markers.get()
    }

    fn marker_api_initialized(&self) -> bool {
        self.markers.is_initialized()
    }

    fn core_version(&self) -> String {
        format!("{}-{}", env!("CARGO_PKG_VERSION"), BUILD_LABEL)
    }
}
