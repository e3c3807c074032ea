use tracing::warn;
use url::Url;

use crate::columns::ColumnPolicy;
use crate::constants::{
    DEFAULT_BATCH_DELAY_MS, DEFAULT_BATCH_SIZE, FEED_SUFFIX, INDEX_FEED_PATH,
    LOAD_FAILURE_MESSAGE, SHOW_GAME_COLUMN_FLAG, SHOW_ROUTE_COLUMN_FLAG,
};

#[derive(Debug, Clone)]
pub struct TableConfig {
    pub feed_url: String,
    pub batch_size: usize,
    pub batch_delay_ms: u32,
    pub columns: ColumnPolicy,
    pub failure_message: String,
}

impl TableConfig {
    pub fn new(feed_url: impl Into<String>) -> Self {
        Self {
            feed_url: feed_url.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay_ms: DEFAULT_BATCH_DELAY_MS,
            columns: ColumnPolicy::default(),
            failure_message: LOAD_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn with_columns(mut self, columns: ColumnPolicy) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Builds the config from what the surrounding page provides: its
    /// location, an optional feed URL override and the column flags.
    pub fn from_page(
        origin: &str,
        pathname: &str,
        feed_override: Option<&str>,
        show_game_column: Option<bool>,
        show_route_column: Option<bool>,
    ) -> Self {
        let feed_url = feed_override
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| resolve_feed_url(origin, pathname));
        let columns = ColumnPolicy::new(
            read_flag(SHOW_GAME_COLUMN_FLAG, show_game_column),
            read_flag(SHOW_ROUTE_COLUMN_FLAG, show_route_column),
        );
        Self::new(feed_url).with_columns(columns)
    }
}

/// `/` maps to the site-wide index feed; any other page serves its own rows
/// at `<path>/json`.
pub fn resolve_feed_url(origin: &str, pathname: &str) -> String {
    let trimmed = pathname.trim_end_matches('/');
    let path = if trimmed.is_empty() {
        INDEX_FEED_PATH.to_string()
    } else {
        format!("{}/{}", trimmed, FEED_SUFFIX)
    };
    match Url::parse(origin).and_then(|base| base.join(&path)) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{}", origin.trim_end_matches('/'), path),
    }
}

fn read_flag(name: &str, value: Option<bool>) -> bool {
    match value {
        Some(value) => value,
        None => {
            warn!(flag = name, "page flag missing; showing column");
            true
        }
    }
}
