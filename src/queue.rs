//! Deduplicating FIFO of pending tile renders, one lane per job class.

use crate::gate::PauseGate;
use crate::types::{JobClass, RenderJob, TileId};
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};

/// Tiles inserted per lock acquisition in [`RenderQueue::enqueue`].
pub const ENQUEUE_CHUNK: usize = 1024;

// ---------------------------------------------------------------------------
// Per-class lane
// ---------------------------------------------------------------------------

/// `order` and `pending` always hold the same tile set.
#[derive(Debug, Default)]
struct Lane {
    order: VecDeque<TileId>,
    /// Failed attempts carried by each pending tile.
    pending: HashMap<TileId, u32>,
}

impl Lane {
    fn push(&mut self, tile: TileId, attempts: u32) -> bool {
        match self.pending.entry(tile) {
            Entry::Occupied(_) => false,
            Entry::Vacant(v) => {
                self.order.push_back(v.key().clone());
                v.insert(attempts);
                true
            }
        }
    }

    fn pop(&mut self) -> Option<(TileId, u32)> {
        let tile = self.order.pop_front()?;
        let attempts = self.pending.remove(&tile).unwrap_or(0);
        Some((tile, attempts))
    }
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// Pending render jobs keyed by tile.
///
/// Each class has its own lock; check-and-insert happens under it, so
/// concurrent invalidations of overlapping volumes never produce duplicates.
#[derive(Debug, Default)]
pub struct RenderQueue {
    lanes: [Mutex<Lane>; 2],
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue each tile once for `class`. Returns how many were newly added.
    ///
    /// The lane lock is taken per chunk of [`ENQUEUE_CHUNK`] tiles so a large
    /// invalidation never holds off the dispatcher for long.
    pub fn enqueue<'a>(&self, tiles: impl IntoIterator<Item = &'a TileId>, class: JobClass) -> usize {
        let mut tiles = tiles.into_iter().peekable();
        let mut added = 0;
        while tiles.peek().is_some() {
            let mut lane = self.lanes[class.index()].lock();
            added += tiles
                .by_ref()
                .take(ENQUEUE_CHUNK)
                .filter(|tile| lane.push((*tile).clone(), 0))
                .count();
        }
        added
    }

    /// Remove up to `max` jobs, oldest first.
    ///
    /// Returns nothing while `class` is paused; the jobs stay queued.
    pub fn drain(&self, class: JobClass, max: usize, gate: &PauseGate) -> Vec<RenderJob> {
        if gate.is_paused(class) {
            return Vec::new();
        }

        let mut lane = self.lanes[class.index()].lock();
        let mut jobs = Vec::with_capacity(max.min(lane.order.len()));
        while jobs.len() < max {
            let Some((tile, attempts)) = lane.pop() else {
                break;
            };
            jobs.push(RenderJob {
                tile,
                class,
                attempts,
            });
        }
        jobs
    }

    /// Put a failed job back at the tail.
    ///
    /// Returns `false` if the tile was invalidated again in the meantime; the
    /// fresh entry already covers it.
    pub fn requeue(&self, job: RenderJob) -> bool {
        let mut lane = self.lanes[job.class.index()].lock();
        lane.push(job.tile, job.attempts)
    }

    pub fn pending(&self, class: JobClass) -> usize {
        self.lanes[class.index()].lock().order.len()
    }

    pub fn is_pending(&self, tile: &TileId, class: JobClass) -> bool {
        self.lanes[class.index()].lock().pending.contains_key(tile)
    }

    pub fn is_empty(&self) -> bool {
        JobClass::ALL.iter().all(|c| self.pending(*c) == 0)
    }

    /// Drop all pending work for `class`. Returns how many jobs were removed.
    pub fn clear(&self, class: JobClass) -> usize {
        let mut lane = self.lanes[class.index()].lock();
        let removed = lane.order.len();
        lane.order.clear();
        lane.pending.clear();
        removed
    }
}
