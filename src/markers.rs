//! Marker capability handle. The marker subsystem itself lives elsewhere.

use log::warn;
use std::sync::{Arc, OnceLock};

/// Capability surface of the marker subsystem.
pub trait MarkerApi: Send + Sync {
    /// IDs of the marker sets currently defined.
    fn marker_set_ids(&self) -> Vec<String>;
}

/// Holds the marker API once the markers component has started.
#[derive(Default)]
pub struct MarkerSlot {
    api: OnceLock<Arc<dyn MarkerApi>>,
}

impl MarkerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the marker API. Returns `false` if one was already installed.
    pub fn install(&self, api: Arc<dyn MarkerApi>) -> bool {
        self.api.set(api).is_ok()
    }

    /// The marker API, or `None` if markers are not configured.
    pub fn get(&self) -> Option<Arc<dyn MarkerApi>> {
        let api = self.api.get().cloned();
        if api.is_none() {
            warn!("Marker API has been requested but is not configured");
        }
        api
    }

    pub fn is_initialized(&self) -> bool {
        self.api.get().is_some()
    }
}
