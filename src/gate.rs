//! Pause gate: one switch per job class.

use crate::types::JobClass;
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};

/// Independent pause flags for full/radius and update renders.
///
/// Pausing only stops draining; queued jobs stay where they are.
#[derive(Debug, Default)]
pub struct PauseGate {
    paused: [AtomicBool; 2],
}

impl PauseGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, class: JobClass, paused: bool) {
        let previous = self.paused[class.index()].swap(paused, Ordering::SeqCst);
        if previous != paused {
            info!(
                "{} renders {}",
                class,
                if paused { "paused" } else { "resumed" }
            );
        }
    }

    pub fn is_paused(&self, class: JobClass) -> bool {
        self.paused[class.index()].load(Ordering::SeqCst)
    }
}
