//! Client-side replay leaderboard table.
//!
//! Replay records stream in as newline-delimited JSON ([`ingest`]), pass
//! through the active attribute filters ([`filter`]) and are painted into the
//! table in fixed-size batches ([`scheduler`]). [`table::TableController`]
//! owns the state that ties these together; the browser front end lives in
//! `wasm_app` and a native streaming client in [`feed`].

pub mod columns;
pub mod config;
pub mod constants;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod models;
pub mod scheduler;
pub mod table;

#[cfg(not(target_arch = "wasm32"))]
pub mod feed;

#[cfg(target_arch = "wasm32")]
mod wasm_app;

#[cfg(target_arch = "wasm32")]
pub use wasm_app::*;


pub use columns::{Cell, CellContent, ColumnPolicy};
pub use config::{resolve_feed_url, TableConfig};
pub use error::{IngestError, UnknownField};
pub use filter::{apply_filters, FilterMode, FilterSelection, MultiSelect, Selection, SingleSelect};
pub use ingest::FeedDecoder;
pub use models::{Field, FieldValue, Link, ReplayRecord};
pub use scheduler::{RenderBatch, RenderScheduler};
pub use table::{IngestStatus, Scheduled, TableController, TableSink};

#[cfg(not(target_arch = "wasm32"))]
pub use feed::FeedClient;
