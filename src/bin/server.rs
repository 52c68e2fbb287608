//! map-render-server binary
//!
//! Starts the render coordinator: dispatch loop and web relay. Outbound web
//! frames are logged. Inbound web chat is a library surface: embedders that
//! host the web UI feed `web.in.chat` frames to [`MapBusAgent::run`] through
//! its mpsc sender; this binary serves no web UI and feeds none.
//!
//! ## Configuration (CLI / env, optional TOML via `config` crate)
//!
//! | Key                               | Default | Description                        |
//! |-----------------------------------|---------|------------------------------------|
//! | `MAP_RENDER_CONFIG`               | –       | TOML file with `CoordinatorConfig` |
//! | `MAP_RENDER_TILE_SIZE`            | `32`    | Tile width/depth in blocks         |
//! | `MAP_RENDER_BATCH_SIZE`           | `64`    | Jobs per class per dispatch tick   |
//! | `MAP_RENDER_DISPATCH_INTERVAL_MS` | `500`   | Dispatch tick interval             |
//! | `MAP_RENDER_MAX_ATTEMPTS`         | `3`     | Render attempts before dropping    |
//! | `MAP_RENDER_WORLDS`               | `world` | Extra unbounded worlds (comma list)|

use anyhow::{Context, Result};
use clap::Parser;
use map_render_coordinator::{
    bus::{MapBusAgent, MapBusConfig},
    dispatch::{Dispatcher, TileRenderer},
    relay::{log_web_frames, BroadcastWebChannel, WebFrame},
    service::MapService,
    types::{CoordinatorConfig, RenderJob, WorldConfig},
    MapApi,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "map-render-server", about = "Map render coordinator", version)]
struct Args {
    /// TOML config file
    #[arg(long, env = "MAP_RENDER_CONFIG")]
    config: Option<String>,

    /// Tile width/depth in blocks
    #[arg(long, env = "MAP_RENDER_TILE_SIZE")]
    tile_size: Option<i32>,

    /// Jobs drained per class per dispatch tick
    #[arg(long, env = "MAP_RENDER_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Dispatch tick interval (ms)
    #[arg(long, env = "MAP_RENDER_DISPATCH_INTERVAL_MS")]
    dispatch_interval_ms: Option<u64>,

    /// Render attempts before a failing tile is dropped
    #[arg(long, env = "MAP_RENDER_MAX_ATTEMPTS")]
    max_render_attempts: Option<u32>,

    /// Extra unbounded worlds to render
    #[arg(long, env = "MAP_RENDER_WORLDS", value_delimiter = ',')]
    worlds: Vec<String>,

    /// Hide players on the web map unless explicitly shown
    #[arg(long, env = "MAP_RENDER_HIDE_BY_DEFAULT")]
    hide_players_by_default: bool,
}

impl Args {
    fn load_config(&self) -> Result<CoordinatorConfig> {
        let mut config = match &self.config {
            Some(path) => config::Config::builder()
                .add_source(config::File::with_name(path))
                .build()
                .and_then(|c| c.try_deserialize::<CoordinatorConfig>())
                .with_context(|| format!("Failed to load config from '{}'", path))?,
            None => CoordinatorConfig::default(),
        };

        if let Some(tile_size) = self.tile_size {
            config.tile_size = tile_size;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(interval) = self.dispatch_interval_ms {
            config.dispatch_interval_ms = interval;
        }
        if let Some(attempts) = self.max_render_attempts {
            config.max_render_attempts = attempts;
        }
        for world in &self.worlds {
            if !config.worlds.iter().any(|w| &w.name == world) {
                config.worlds.push(WorldConfig::unbounded(world.as_str()));
            }
        }
        if self.hide_players_by_default {
            config.default_player_visible = false;
        }
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Renderer stand-in
// ---------------------------------------------------------------------------

/// Logs each tile; the rasterizer is a separate process.
struct LoggingRenderer;

impl TileRenderer for LoggingRenderer {
    fn render(&self, job: &RenderJob) -> map_render_coordinator::error::Result<()> {
        tracing::debug!(tile = %job.tile, class = %job.class, "render tile");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("map_render_coordinator=debug".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = args.load_config()?;

    log::info!(
        "Starting map-render-server (tile_size={}, worlds={}, batch={})",
        config.tile_size,
        config.worlds.len(),
        config.batch_size,
    );

    let channel = Arc::new(BroadcastWebChannel::new(256));

    // Log outbound web traffic until a real front-end subscribes.
    tokio::spawn(log_web_frames(channel.subscribe()));

    let bus_config = MapBusConfig {
        dispatch_interval: Duration::from_millis(config.dispatch_interval_ms),
        ..Default::default()
    };
    let service = Arc::new(MapService::new(config, channel));
    log::info!("Core version {}", service.core_version());

    let dispatcher = Dispatcher::new(service.clone(), Arc::new(LoggingRenderer));

    // This binary has no web front-end of its own, so nothing feeds inbound
    // chat here. Embedders that serve the web UI build the agent themselves
    // and push `web.in.chat` frames through the sender.
    let (inbound_tx, inbound_rx) = mpsc::channel::<WebFrame>(256);
    drop(inbound_tx);

    // Run until shutdown
    MapBusAgent::new(bus_config, service, dispatcher)
        .run(inbound_rx)
        .await
}
