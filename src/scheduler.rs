use std::collections::VecDeque;
use std::ops::Range;
use std::rc::Rc;

use tracing::debug;

use crate::constants::DEFAULT_BATCH_SIZE;
use crate::models::ReplayRecord;

/// A slice of a shared row list, stamped with the epoch it was scheduled in.
#[derive(Debug, Clone)]
pub struct RenderBatch {
    epoch: u64,
    rows: Rc<[Rc<ReplayRecord>]>,
    range: Range<usize>,
}

impl RenderBatch {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &ReplayRecord> + '_ {
        self.rows[self.range.clone()].iter().map(|record| &**record)
    }
}

/// Splits row lists into fixed-size batches and tracks the render epoch.
///
/// The epoch goes up on every table reset. Batches are never removed on reset;
/// a batch whose epoch no longer matches is stale and must paint nothing.
#[derive(Debug)]
pub struct RenderScheduler {
    epoch: u64,
    batch_size: usize,
    queue: VecDeque<RenderBatch>,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl RenderScheduler {
    pub fn new(batch_size: usize) -> Self {
        Self {
            epoch: 0,
            batch_size: batch_size.max(1),
            queue: VecDeque::new(),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Queued batches, stale ones included.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn reset(&mut self) -> u64 {
        self.epoch += 1;
        debug!(epoch = self.epoch, stale = self.queue.len(), "render epoch advanced");
        self.epoch
    }

    pub fn is_current(&self, batch: &RenderBatch) -> bool {
        batch.epoch == self.epoch
    }

    /// Splits `rows` into batches. Returns the batch to paint right away, if
    /// any; the rest are queued.
    ///
    /// Nothing is painted synchronously while current batches are still
    /// queued, otherwise new rows would land ahead of older ones.
    pub fn schedule(&mut self, rows: Vec<Rc<ReplayRecord>>) -> Option<RenderBatch> {
        if rows.is_empty() {
            return None;
        }
        let rows: Rc<[Rc<ReplayRecord>]> = rows.into();
        let total = rows.len();
        let epoch = self.epoch;
        let batch_size = self.batch_size;
        let mut batches = (0..total).step_by(batch_size).map(move |start| RenderBatch {
            epoch,
            rows: Rc::clone(&rows),
            range: start..(start + batch_size).min(total),
        });

        let immediate = if self.has_current_pending() {
            None
        } else {
            batches.next()
        };
        self.queue.extend(batches);
        immediate
    }

    pub fn next_batch(&mut self) -> Option<RenderBatch> {
        self.queue.pop_front()
    }

    fn has_current_pending(&self) -> bool {
        self.queue.iter().any(|batch| batch.epoch == self.epoch)
    }
}
