use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::columns::{Cell, ColumnPolicy};
use crate::config::TableConfig;
use crate::error::IngestError;
use crate::filter::{apply_filters, FilterMode, FilterSelection, Selection};
use crate::models::{Field, ReplayRecord};
use crate::scheduler::{RenderBatch, RenderScheduler};

/// Where rendered rows go. The browser writes into the table body; tests
/// collect rows in memory.
pub trait TableSink {
    fn clear(&mut self);

    fn append_rows(&mut self, rows: &[Vec<Cell>]);

    fn show_error(&mut self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStatus {
    Idle,
    Streaming,
    Complete,
    Failed(u16),
    Interrupted,
}

/// Rows painted synchronously, and batches left for the host to run later.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scheduled {
    pub painted: usize,
    pub deferred: usize,
}

pub struct TableController<S: TableSink> {
    records: Vec<Rc<ReplayRecord>>,
    selection: Selection,
    scheduler: RenderScheduler,
    columns: ColumnPolicy,
    sink: S,
    status: IngestStatus,
    failure_message: String,
}

impl<S: TableSink> TableController<S> {
    pub fn new(config: &TableConfig, mode: FilterMode, sink: S) -> Self {
        Self::with_selection(config, Selection::new(mode), sink)
    }

    pub fn with_selection(config: &TableConfig, selection: Selection, sink: S) -> Self {
        Self {
            records: Vec::new(),
            selection,
            scheduler: RenderScheduler::new(config.batch_size),
            columns: config.columns.clone(),
            sink,
            status: IngestStatus::Idle,
            failure_message: config.failure_message.clone(),
        }
    }

    pub fn records(&self) -> &[Rc<ReplayRecord>] {
        &self.records
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn epoch(&self) -> u64 {
        self.scheduler.epoch()
    }

    pub fn pending_batches(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn status(&self) -> IngestStatus {
        self.status
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn begin(&mut self) {
        self.status = IngestStatus::Streaming;
    }

    pub fn complete(&mut self) {
        self.status = IngestStatus::Complete;
        info!(records = self.records.len(), "replay feed complete");
    }

    /// Ends ingestion. Only a bad HTTP status is surfaced in the table; any
    /// other fault leaves the rows already painted as they are.
    pub fn fail(&mut self, err: &IngestError) {
        match err.status_code() {
            Some(code) => {
                warn!(status = code, "replay feed request failed");
                self.sink.show_error(&self.failure_message);
                self.status = IngestStatus::Failed(code);
            }
            None => {
                debug!(error = %err, records = self.records.len(), "replay feed interrupted");
                self.status = IngestStatus::Interrupted;
            }
        }
    }

    /// Appends newly streamed records. The filtered subset goes to the
    /// renderer before the records join the full collection.
    pub fn ingest(&mut self, records: Vec<ReplayRecord>) -> Scheduled {
        if records.is_empty() {
            return Scheduled::default();
        }
        let incoming: Vec<Rc<ReplayRecord>> = records.into_iter().map(Rc::new).collect();
        let visible = apply_filters(&self.selection, &incoming);
        debug!(
            received = incoming.len(),
            visible = visible.len(),
            "ingested replay batch"
        );
        let scheduled = self.render(visible);
        self.records.extend(incoming);
        scheduled
    }

    pub fn update_filter(&mut self, field: Field, value: &str) -> Scheduled {
        self.selection.update(field, value);
        self.refresh()
    }

    /// Clears the table and renders the full filtered set from the first batch.
    pub fn refresh(&mut self) -> Scheduled {
        self.sink.clear();
        self.scheduler.reset();
        let visible = apply_filters(&self.selection, &self.records);
        self.render(visible)
    }

    /// Rebuilds the selection from the controls that are actually checked or
    /// pressed on screen, then refreshes once.
    pub fn resync_filters<I, V>(&mut self, controls: I) -> Scheduled
    where
        I: IntoIterator<Item = (Field, V)>,
        V: AsRef<str>,
    {
        self.selection.clear();
        for (field, value) in controls {
            self.selection.update(field, value.as_ref());
        }
        self.refresh()
    }

    pub fn is_selected(&self, field: Field, value: &str) -> bool {
        self.selection.is_selected(field, value)
    }

    /// Runs the oldest queued batch that is still current. Stale batches met
    /// on the way are dropped. Returns the number of rows painted.
    pub fn run_next_batch(&mut self) -> usize {
        while let Some(batch) = self.scheduler.next_batch() {
            if self.scheduler.is_current(&batch) {
                return self.paint(&batch);
            }
            debug!(
                batch_epoch = batch.epoch(),
                epoch = self.scheduler.epoch(),
                rows = batch.len(),
                "discarded stale render batch"
            );
        }
        0
    }

    pub fn drain(&mut self) -> usize {
        let mut painted = 0;
        while self.scheduler.pending() > 0 {
            painted += self.run_next_batch();
        }
        painted
    }

    /// Paints one batch if its epoch is still current.
    pub fn paint(&mut self, batch: &RenderBatch) -> usize {
        if !self.scheduler.is_current(batch) {
            return 0;
        }
        let rows: Vec<Vec<Cell>> = batch
            .records()
            .map(|record| self.columns.cells(record))
            .collect();
        self.sink.append_rows(&rows);
        rows.len()
    }

    fn render(&mut self, rows: Vec<Rc<ReplayRecord>>) -> Scheduled {
        let before = self.scheduler.pending();
        let painted = match self.scheduler.schedule(rows) {
            Some(batch) => self.paint(&batch),
            None => 0,
        };
        Scheduled {
            painted,
            deferred: self.scheduler.pending() - before,
        }
    }
}
