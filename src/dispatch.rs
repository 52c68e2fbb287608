//! Dispatcher – drains pending tiles and hands them to the renderer.

use crate::error::Result;
use crate::service::MapService;
use crate::types::{JobClass, RenderJob};
use log::{debug, warn};
use std::sync::Arc;

/// The tile rasterizer. Timeouts and cancellation are its own business.
pub trait TileRenderer: Send + Sync {
    fn render(&self, job: &RenderJob) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Tick result
// ---------------------------------------------------------------------------

/// Outcome of one [`Dispatcher::run_once`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Jobs rendered successfully, per class (`[full, update]`).
    pub dispatched: [usize; 2],
    /// Failed jobs put back for another attempt.
    pub retried: usize,
    /// Failed jobs given up on.
    pub dropped: usize,
}

impl DispatchReport {
    pub fn dispatched(&self, class: JobClass) -> usize {
        self.dispatched[class.index()]
    }

    pub fn total_dispatched(&self) -> usize {
        self.dispatched.iter().sum()
    }

    pub fn is_idle(&self) -> bool {
        self.total_dispatched() == 0 && self.retried == 0 && self.dropped == 0
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher {
    service: Arc<MapService>,
    renderer: Arc<dyn TileRenderer>,
}

impl Dispatcher {
    pub fn new(service: Arc<MapService>, renderer: Arc<dyn TileRenderer>) -> Self {
        Self { service, renderer }
    }

    /// Drain one batch per unpaused class and render it.
    ///
    /// A job that fails is requeued until it has failed
    /// `max_render_attempts` times, then dropped with a warning.
    pub fn run_once(&self) -> DispatchReport {
        let config = self.service.config();
        let batch_size = config.batch_size;
        let max_attempts = config.max_render_attempts.max(1);

        let mut report = DispatchReport::default();

        for class in JobClass::ALL {
            for job in self.service.drain(class, batch_size) {
                match self.renderer.render(&job) {
                    Ok(()) => {
                        self.service.record_dispatched();
                        report.dispatched[class.index()] += 1;
                    }
                    Err(e) => {
                        self.service.record_failure();
                        let attempts = job.attempts + 1;
                        if attempts < max_attempts {
                            debug!(
                                "Render of {} failed (attempt {}/{}): {}",
                                job.tile, attempts, max_attempts, e
                            );
                            if self.service.queue().requeue(RenderJob { attempts, ..job }) {
                                report.retried += 1;
                            } else {
                                debug!("Retry of {} superseded by a fresh invalidation", class);
                            }
                        } else {
                            warn!(
                                "Dropping {} render of {} after {} attempts: {}",
                                class, job.tile, attempts, e
                            );
                            self.service.record_dropped();
                            report.dropped += 1;
                        }
                    }
                }
            }
        }

        report
    }
}
