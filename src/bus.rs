//! Agent runtime – dispatch tick loop plus inbound web traffic.
//!
//! ## Event contract (inbound)
//!
//! | Subject       | Payload                 | Effect                                |
//! |---------------|-------------------------|---------------------------------------|
//! | `web.in.chat` | `WebChatRequest` JSON   | listeners, then default relay         |
//!
//! ## Event contract (outbound)
//!
//! Everything the [`WebRelay`](crate::relay::WebRelay) publishes; see
//! [`crate::protocol::subjects`].

use crate::dispatch::Dispatcher;
use crate::error::MapError;
use crate::protocol::{subjects, WebChatRequest};
use crate::relay::WebFrame;
use crate::service::MapService;
use anyhow::Result;
use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Config for MapBusAgent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MapBusConfig {
    /// Name used in log lines.
    pub server_id: String,
    /// Interval between dispatch ticks.
    pub dispatch_interval: Duration,
}

impl Default for MapBusConfig {
    fn default() -> Self {
        Self {
            server_id: "map-render".into(),
            dispatch_interval: Duration::from_millis(500),
        }
    }
}

// ---------------------------------------------------------------------------
// MapBusAgent
// ---------------------------------------------------------------------------

/// Drives a [`MapService`]: runs the dispatch loop and feeds it inbound web
/// messages.
pub struct MapBusAgent {
    config: MapBusConfig,
    service: Arc<MapService>,
    dispatcher: Arc<Dispatcher>,
}

impl MapBusAgent {
    pub fn new(config: MapBusConfig, service: Arc<MapService>, dispatcher: Dispatcher) -> Self {
        Self {
            config,
            service,
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Run until Ctrl-C.
    pub async fn run(self, inbound: mpsc::Receiver<WebFrame>) -> Result<()> {
        self.run_until(inbound, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("MapBusAgent shutting down (SIGINT)");
        })
        .await
    }

    /// Run until `shutdown` completes.
    pub async fn run_until<F>(self, mut inbound: mpsc::Receiver<WebFrame>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(
            "MapBusAgent '{}' active – dispatching every {:?}",
            self.config.server_id, self.config.dispatch_interval
        );

        // -----------------------------------------------------------------------
        // Spawn dispatch loop
        // -----------------------------------------------------------------------

        let dispatcher = self.dispatcher.clone();
        let interval = self.config.dispatch_interval.max(Duration::from_millis(1));
        let mut tick_handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            loop {
                timer.tick().await;

                // Rendering may block; keep it off the async workers.
                let d = dispatcher.clone();
                match tokio::task::spawn_blocking(move || d.run_once()).await {
                    Ok(report) if !report.is_idle() => debug!("Dispatch tick: {:?}", report),
                    Ok(_) => {}
                    Err(e) => warn!("Dispatch tick panicked: {}", e),
                }
            }
        });

        // -----------------------------------------------------------------------
        // Inbound web traffic until shutdown
        // -----------------------------------------------------------------------

        tokio::pin!(shutdown);
        let mut inbound_open = true;
        loop {
            tokio::select! {
                frame = inbound.recv(), if inbound_open => match frame {
                    Some(frame) => self.handle_inbound(&frame),
                    None => {
                        info!("Inbound web channel closed");
                        inbound_open = false;
                    }
                },
                _ = &mut shutdown => break,
                _ = &mut tick_handle => {
                    log::error!("Dispatch loop exited unexpectedly");
                    break;
                }
            }
        }

        tick_handle.abort();
        Ok(())
    }

    fn handle_inbound(&self, frame: &WebFrame) {
        match frame.subject.as_str() {
            subjects::IN_CHAT => match decode_web_chat(&frame.payload) {
                Ok(req) => {
                    self.service
                        .handle_web_chat(&req.source, &req.name, &req.message);
                }
                Err(e) => warn!("Invalid web chat payload: {}", e),
            },
            other => debug!("Ignoring inbound web message on '{}'", other),
        }
    }
}

/// Parse a `web.in.chat` payload.
pub fn decode_web_chat(payload: &[u8]) -> Result<WebChatRequest, MapError> {
    Ok(serde_json::from_slice(payload)?)
}
